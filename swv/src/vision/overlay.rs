// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Detection overlays for the remote view.

use crate::vision::frame::{Frame, Region};

const BORDER: usize = 2;
const BRIGHT: u8 = 255;

/// Burn region outlines into a copy of `frame` for the streaming view.
pub fn draw_regions(frame: &Frame, regions: &[Region]) -> Frame {
    let mut out = frame.clone();
    for region in regions {
        let right = (region.x + region.width).min(out.width());
        let bottom = (region.y + region.height).min(out.height());

        out.fill_rect(region.x, region.y, region.width, BORDER, BRIGHT);
        out.fill_rect(region.x, bottom.saturating_sub(BORDER), region.width, BORDER, BRIGHT);
        out.fill_rect(region.x, region.y, BORDER, region.height, BRIGHT);
        out.fill_rect(right.saturating_sub(BORDER), region.y, BORDER, region.height, BRIGHT);
    }
    out
}

#[cfg(test)]
mod test {
    use super::draw_regions;
    use crate::vision::frame::{Frame, Region};

    #[test]
    fn outline_only() {
        let frame = Frame::filled(20, 20, 0);
        let out = draw_regions(&frame, &[Region::new(4, 4, 10, 10)]);

        assert_eq!(out.get(4, 4), 255);
        assert_eq!(out.get(13, 13), 255);
        // Interior untouched.
        assert_eq!(out.get(9, 9), 0);
        // Source frame untouched.
        assert_eq!(frame.get(4, 4), 0);
    }
}
