// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! SWV Error implementation

/// SWV Error type
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// The video source could not be acquired or validated
    Video(&'static str),
    /// Report delivery failure, terminal for the attempt
    Report(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Video(description) => write!(f, "Video error, {}", description),
            Error::Report(description) => write!(f, "Report error, {}", description),
        }
    }
}
