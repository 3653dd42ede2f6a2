// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Geodetic position fixes and NMEA sentence parsing.
//!
//! The positioning receiver emits line-oriented NMEA 0183 sentences. Only the
//! position-bearing sentence types are interpreted (`RMC` and `GGA`); anything
//! else, anything malformed and anything the receiver itself flags as invalid
//! is discarded silently. A parsed fix of exactly (0, 0) is also discarded:
//! receivers report it while they have no satellite lock.

use log::debug;

/// A single geodetic sample, degrees, signed. Immutable value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl PositionFix {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// A fix at exactly (0, 0) is the receiver's "no lock yet" placeholder.
    pub fn is_valid(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// Parse one NMEA sentence into a fix.
///
/// Returns `None` for sentences that are not position-bearing, fail their
/// checksum, carry an invalid status or quality flag, or do not parse.
pub fn parse_sentence(line: &str) -> Option<PositionFix> {
    let line = line.trim();
    let body = line.strip_prefix('$')?;

    // Optional trailing "*hh" checksum: XOR over the bytes between '$' and '*'.
    let body = match body.split_once('*') {
        Some((data, checksum)) => {
            let expected = u8::from_str_radix(checksum.trim(), 16).ok()?;
            let actual = data.bytes().fold(0u8, |acc, b| acc ^ b);
            if actual != expected {
                debug!("discarding NMEA sentence with bad checksum: {line}");
                return None;
            }
            data
        }
        None => body,
    };

    let fields: Vec<&str> = body.split(',').collect();
    let sentence_type = fields.first()?;

    if sentence_type.ends_with("RMC") {
        parse_rmc(&fields)
    } else if sentence_type.ends_with("GGA") {
        parse_gga(&fields)
    } else {
        None
    }
}

/// `$xxRMC,time,status,lat,N/S,lon,E/W,...` with status 'A' = valid, 'V' = void.
fn parse_rmc(fields: &[&str]) -> Option<PositionFix> {
    if fields.len() < 7 {
        return None;
    }
    if fields[2] != "A" {
        debug!("discarding RMC sentence with status {:?}", fields[2]);
        return None;
    }
    build_fix(fields[3], fields[4], fields[5], fields[6])
}

/// `$xxGGA,time,lat,N/S,lon,E/W,quality,...` with quality 0 = no fix.
fn parse_gga(fields: &[&str]) -> Option<PositionFix> {
    if fields.len() < 7 {
        return None;
    }
    if fields[6].parse::<u8>().ok()? == 0 {
        debug!("discarding GGA sentence without fix quality");
        return None;
    }
    build_fix(fields[2], fields[3], fields[4], fields[5])
}

fn build_fix(lat: &str, lat_hemi: &str, lon: &str, lon_hemi: &str) -> Option<PositionFix> {
    let latitude = parse_coordinate(lat, 2)? * hemisphere_sign(lat_hemi, "N", "S")?;
    let longitude = parse_coordinate(lon, 3)? * hemisphere_sign(lon_hemi, "E", "W")?;

    let fix = PositionFix::new(latitude, longitude);
    fix.is_valid().then_some(fix)
}

/// NMEA coordinates are "ddmm.mmmm" (latitude) or "dddmm.mmmm" (longitude).
fn parse_coordinate(field: &str, degree_digits: usize) -> Option<f64> {
    if field.len() < degree_digits {
        return None;
    }
    let (degrees, minutes) = field.split_at(degree_digits);
    let degrees: f64 = degrees.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    if !(0.0..60.0).contains(&minutes) {
        return None;
    }
    Some(degrees + minutes / 60.0)
}

fn hemisphere_sign(field: &str, positive: &str, negative: &str) -> Option<f64> {
    if field == positive {
        Some(1.0)
    } else if field == negative {
        Some(-1.0)
    } else {
        None
    }
}
