// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Single-obstacle avoidance planning.

use crate::vision::Region;

/// Steering decision for the current frame. Exactly one per planning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Forward,
    Left,
    Right,
}

/// Fraction of the frame width on each side of the center that counts as
/// "dead ahead".
const CENTER_BAND: f64 = 0.15;

/// Derive a steering decision from the obstacles in view.
///
/// Obstacles are bucketed left/center/right by their horizontal center
/// against `frame_center +- 0.15 * frame_width`. Anything dead ahead forces a
/// turn towards the side with strictly fewer obstacles; equal counts default
/// to the right (documented tie-break). An obstacle on one side only steers
/// away from it. Pure function: same inputs, same output.
pub fn plan(frame_width: usize, obstacles: &[Region]) -> Decision {
    if obstacles.is_empty() {
        return Decision::Forward;
    }

    let center = frame_width as f64 / 2.0;
    let band = frame_width as f64 * CENTER_BAND;

    let (mut left, mut middle, mut right) = (0usize, 0usize, 0usize);
    for obstacle in obstacles {
        let x = obstacle.center_x() as f64;
        if x < center - band {
            left += 1;
        } else if x > center + band {
            right += 1;
        } else {
            middle += 1;
        }
    }

    if middle > 0 {
        if left < right {
            Decision::Left
        } else {
            Decision::Right
        }
    } else if left > 0 && right == 0 {
        Decision::Right
    } else if right > 0 && left == 0 {
        Decision::Left
    } else {
        Decision::Forward
    }
}

#[cfg(test)]
mod test {
    use super::{plan, Decision};
    use crate::vision::Region;

    const WIDTH: usize = 640;

    // Centers: band is 320 +- 96.
    fn at(center_x: usize) -> Region {
        Region::new(center_x - 10, 100, 20, 40)
    }

    #[test]
    fn empty_means_forward() {
        assert_eq!(plan(WIDTH, &[]), Decision::Forward);
    }

    #[test]
    fn center_only_ties_to_right() {
        assert_eq!(plan(WIDTH, &[at(320)]), Decision::Right);
    }

    #[test]
    fn center_with_fewer_on_left_goes_left() {
        let obstacles = [at(320), at(500), at(550)];
        assert_eq!(plan(WIDTH, &obstacles), Decision::Left);
    }

    #[test]
    fn center_with_fewer_on_right_goes_right() {
        let obstacles = [at(320), at(100), at(150), at(500)];
        assert_eq!(plan(WIDTH, &obstacles), Decision::Right);
    }

    #[test]
    fn left_only_steers_right() {
        assert_eq!(plan(WIDTH, &[at(100)]), Decision::Right);
    }

    #[test]
    fn right_only_steers_left() {
        assert_eq!(plan(WIDTH, &[at(550)]), Decision::Left);
    }

    #[test]
    fn both_sides_clear_center_means_forward() {
        assert_eq!(plan(WIDTH, &[at(100), at(550)]), Decision::Forward);
    }

    #[test]
    fn deterministic_across_calls() {
        let obstacles = [at(320), at(100)];
        let first = plan(WIDTH, &obstacles);
        for _ in 0..10 {
            assert_eq!(plan(WIDTH, &obstacles), first);
        }
    }
}
