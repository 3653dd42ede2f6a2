// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Pixel operations backing the default detectors.
//!
//! Grayscale blur, Canny-style edge extraction, morphological closing,
//! connected-region extraction and thresholding, all on owned [Frame]
//! buffers. Edge pixels of a frame are treated as gradient-free.

use crate::vision::frame::{Frame, Region};

/// 5x5 Gaussian blur (separable [1, 4, 6, 4, 1] kernel, edge replication).
pub fn gaussian_blur5(src: &Frame) -> Frame {
    const KERNEL: [u32; 5] = [1, 4, 6, 4, 1];
    let (w, h) = (src.width(), src.height());

    let mut horizontal = Frame::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u32;
            for (i, k) in KERNEL.iter().enumerate() {
                let xx = (x + i).saturating_sub(2).min(w - 1);
                acc += k * src.get(xx, y) as u32;
            }
            horizontal.put(x, y, (acc / 16) as u8);
        }
    }

    let mut out = Frame::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u32;
            for (i, k) in KERNEL.iter().enumerate() {
                let yy = (y + i).saturating_sub(2).min(h - 1);
                acc += k * horizontal.get(x, yy) as u32;
            }
            out.put(x, y, (acc / 16) as u8);
        }
    }
    out
}

/// Sobel gradient components for every pixel; frame borders are zero.
fn sobel(src: &Frame) -> (Vec<i32>, Vec<i32>) {
    let (w, h) = (src.width(), src.height());
    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];
    if w < 3 || h < 3 {
        return (gx, gy);
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p = |dx: i64, dy: i64| {
                src.get((x as i64 + dx) as usize, (y as i64 + dy) as usize) as i32
            };
            gx[y * w + x] = (p(1, -1) + 2 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2 * p(-1, 0) + p(-1, 1));
            gy[y * w + x] = (p(-1, 1) + 2 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2 * p(0, -1) + p(1, -1));
        }
    }
    (gx, gy)
}

/// Sobel gradient magnitude per pixel.
pub fn sobel_magnitude(src: &Frame) -> Vec<i32> {
    let (gx, gy) = sobel(src);
    gx.iter()
        .zip(&gy)
        .map(|(&x, &y)| ((x as f64).hypot(y as f64)) as i32)
        .collect()
}

/// Canny-style edge extraction: gradient magnitude, non-maximum suppression
/// along the quantized gradient direction, then hysteresis between `low` and
/// `high`. Returns a binary mask (0 / 255).
pub fn canny(src: &Frame, low: i32, high: i32) -> Frame {
    let (w, h) = (src.width(), src.height());
    let (gx, gy) = sobel(src);
    let mag: Vec<i32> = gx
        .iter()
        .zip(&gy)
        .map(|(&x, &y)| ((x as f64).hypot(y as f64)) as i32)
        .collect();

    // Non-maximum suppression: a pixel survives only if it is at least as
    // strong as its two neighbors along the gradient direction.
    let mut thin = vec![0i32; w * h];
    if w >= 3 && h >= 3 {
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let idx = y * w + x;
                let m = mag[idx];
                if m < low {
                    continue;
                }
                let (ax, ay) = (gx[idx].abs() as f64, gy[idx].abs() as f64);
                // tan(22.5 deg) and tan(67.5 deg) sector boundaries.
                let (n1, n2) = if ay <= 0.4142 * ax {
                    (mag[idx - 1], mag[idx + 1])
                } else if ay >= 2.4142 * ax {
                    (mag[idx - w], mag[idx + w])
                } else if (gx[idx] > 0) == (gy[idx] > 0) {
                    (mag[idx - w - 1], mag[idx + w + 1])
                } else {
                    (mag[idx - w + 1], mag[idx + w - 1])
                };
                if m >= n1 && m >= n2 {
                    thin[idx] = m;
                }
            }
        }
    }

    // Hysteresis: strong pixels seed, weak pixels join if 8-connected.
    let mut out = Frame::filled(w, h, 0);
    let mut stack = Vec::new();
    for idx in 0..thin.len() {
        if thin[idx] >= high {
            stack.push(idx);
            out.put(idx % w, idx / w, 255);
        }
    }
    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % w, idx / w);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let nidx = ny as usize * w + nx as usize;
                if out.get(nx as usize, ny as usize) == 0 && thin[nidx] >= low {
                    out.put(nx as usize, ny as usize, 255);
                    stack.push(nidx);
                }
            }
        }
    }
    out
}

/// Morphological closing (5x5 square dilation followed by erosion) on a
/// binary mask; bridges small gaps in edge chains.
pub fn close5(mask: &Frame) -> Frame {
    erode5(&dilate5(mask))
}

fn dilate5(mask: &Frame) -> Frame {
    morph5(mask, true)
}

fn erode5(mask: &Frame) -> Frame {
    morph5(mask, false)
}

/// 5x5 square structuring element. `dilate` sets a pixel if any neighbor is
/// set; erosion clears it if any neighbor is clear. Pixels outside the frame
/// count as clear.
fn morph5(mask: &Frame, dilate: bool) -> Frame {
    let (w, h) = (mask.width(), mask.height());
    let mut out = Frame::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            let mut hit = !dilate;
            'probe: for dy in -2i64..=2 {
                for dx in -2i64..=2 {
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    let set = nx >= 0
                        && ny >= 0
                        && nx < w as i64
                        && ny < h as i64
                        && mask.get(nx as usize, ny as usize) != 0;
                    if set == dilate {
                        hit = dilate;
                        break 'probe;
                    }
                }
            }
            out.put(x, y, if hit { 255 } else { 0 });
        }
    }
    out
}

/// Extract bounding boxes of 8-connected nonzero regions.
pub fn connected_regions(mask: &Frame) -> Vec<Region> {
    let (w, h) = (mask.width(), mask.height());
    let mut visited = vec![false; w * h];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if visited[start] || mask.get(start % w, start / w) == 0 {
            continue;
        }
        let (mut min_x, mut min_y, mut max_x, mut max_y) =
            (start % w, start / w, start % w, start / w);
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if !visited[nidx] && mask.get(nx as usize, ny as usize) != 0 {
                        visited[nidx] = true;
                        stack.push(nidx);
                    }
                }
            }
        }

        regions.push(Region::new(
            min_x,
            min_y,
            max_x - min_x + 1,
            max_y - min_y + 1,
        ));
    }
    regions
}

/// Binary mask of pixels darker than `threshold` (dark-blob extraction).
pub fn threshold_below(src: &Frame, threshold: u8) -> Frame {
    let (w, h) = (src.width(), src.height());
    let mut out = Frame::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            if src.get(x, y) < threshold {
                out.put(x, y, 255);
            }
        }
    }
    out
}

/// Nearest-neighbor resize.
pub fn resize(src: &Frame, width: usize, height: usize) -> Frame {
    let mut out = Frame::filled(width, height, 0);
    for y in 0..height {
        for x in 0..width {
            let sx = (x * src.width() / width).min(src.width() - 1);
            let sy = (y * src.height() / height).min(src.height() - 1);
            out.put(x, y, src.get(sx, sy));
        }
    }
    out
}
