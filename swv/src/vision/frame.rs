// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Grayscale frames and detected regions.

/// An owned 8-bit grayscale image.
///
/// The capture boundary converts whatever the camera hardware yields into
/// this; everything downstream (detection, overlay, streaming) works on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// A frame filled with a single luminance value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap a raw luminance buffer. Panics if the buffer length does not
    /// match the dimensions; the capture boundary guarantees it does.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height, "frame buffer size mismatch");
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn put(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Paint an axis-aligned rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, value: u8) {
        for yy in y..(y + height).min(self.height) {
            for xx in x..(x + width).min(self.width) {
                self.put(xx, yy, value);
            }
        }
    }

    /// Encode as a binary PGM (P5) image, the simplest portable container
    /// for a grayscale snapshot attached to an incident report.
    pub fn to_pgm(&self) -> Vec<u8> {
        let header = format!("P5\n{} {}\n255\n", self.width, self.height);
        let mut out = Vec::with_capacity(header.len() + self.data.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Decode a binary PGM (P5) image with a 255 maxval. Returns `None` for
    /// anything malformed or truncated.
    pub fn from_pgm(bytes: &[u8]) -> Option<Self> {
        let mut fields = [0usize; 3];
        let mut cursor = bytes.strip_prefix(b"P5")?;
        for field in &mut fields {
            cursor = skip_pgm_whitespace(cursor)?;
            let end = cursor
                .iter()
                .position(|b| b.is_ascii_whitespace())
                .unwrap_or(cursor.len());
            *field = std::str::from_utf8(&cursor[..end]).ok()?.parse().ok()?;
            cursor = &cursor[end..];
        }
        let [width, height, maxval] = fields;
        if maxval != 255 {
            return None;
        }
        // Exactly one whitespace byte separates the header from the pixels.
        let data = cursor.get(1..)?;
        if data.len() != width.checked_mul(height)? {
            return None;
        }
        Some(Self {
            width,
            height,
            data: data.to_vec(),
        })
    }
}

fn skip_pgm_whitespace(mut bytes: &[u8]) -> Option<&[u8]> {
    while bytes.first()?.is_ascii_whitespace() {
        bytes = &bytes[1..];
    }
    Some(bytes)
}

/// Classification attached to a detected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLabel {
    Obstacle,
    Person,
}

/// A rectangular image area flagged as containing an obstacle or person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub label: Option<RegionLabel>,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            label: None,
        }
    }

    pub fn with_label(mut self, label: RegionLabel) -> Self {
        self.label = Some(label);
        self
    }

    /// Bounding-box area in pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Horizontal center, used for attention-band filtering and avoidance
    /// bucketing.
    pub fn center_x(&self) -> usize {
        self.x + self.width / 2
    }
}
