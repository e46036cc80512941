//! Error types for the edgequake-collage library.
//!
//! A single fatal error type, [`ComposeError`], covers every failure. There
//! is no partial-success mode: a tile that cannot be decoded fails the whole
//! collage, and a page that cannot be rasterised fails the whole PDF.
//!
//! Callers that need to decide whether a retry with different input could
//! help should match on [`ComposeError::kind`]:
//!
//! * [`ErrorKind::Contract`]: bad arguments or configuration, detected
//!   before any file is decoded.
//! * [`ErrorKind::Resource`]: the file system refused (missing output
//!   folder, unreadable source, failed write).
//! * [`ErrorKind::Processing`]: a source could not be decoded, rasterised
//!   or encoded, or it would not fit the engine memory budget.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a [`ComposeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller contract violation; never worth retrying unchanged.
    Contract,
    /// File-system level failure.
    Resource,
    /// Decode, rasterisation or encode failure.
    Processing,
}

/// All fatal errors returned by the edgequake-collage library.
#[derive(Debug, Error)]
pub enum ComposeError {
    // ── Contract violations ───────────────────────────────────────────────
    /// A required argument was missing or empty.
    #[error("Missing required argument: {name}")]
    MissingArgument { name: &'static str },

    /// An input record carries an empty filename.
    #[error("Input list '{name}' contains an entry with an empty filename")]
    EmptyFilename { name: &'static str },

    /// A target width is below the minimum width floor.
    #[error("The {name} is invalid: got {width}px, the minimum value accepted is {min}px")]
    WidthBelowMinimum {
        name: &'static str,
        width: u32,
        min: u32,
    },

    /// The configured memory-limit percentage is negative.
    #[error("Memory limit percentage must be ≥ 0, got {0}")]
    NegativeMemoryPercentage(i32),

    /// Collage or PDF settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Engine configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Resource errors ───────────────────────────────────────────────────
    /// The output folder does not exist.
    #[error("The output folder does not exist: '{path}'")]
    OutputFolderNotFound { path: PathBuf },

    /// A source file was not found.
    #[error("Source file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Generic I/O failure while reading a source.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or persist the output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Processing errors ─────────────────────────────────────────────────
    /// A source image could not be decoded.
    #[error("Failed to decode '{path}': {detail}")]
    DecodeFailed { path: PathBuf, detail: String },

    /// pdfium failed on a PDF source or one of its pages.
    #[error("Rasterisation failed for '{path}' (page {page}): {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// No pdfium library could be bound.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set the rasterizer directory to a folder containing the platform pdfium\n\
library, or install libpdfium where the system loader can find it.\n"
    )]
    RasterizerUnavailable(String),

    /// An image or PDF could not be encoded.
    #[error("Failed to encode '{path}': {detail}")]
    EncodeFailed { path: PathBuf, detail: String },

    /// A pixel buffer would exceed the engine memory budget.
    #[error("A {width}x{height} image needs {bytes} bytes, over the engine memory limit of {limit} bytes")]
    ResourceLimitExceeded {
        width: u32,
        height: u32,
        bytes: u64,
        limit: u64,
    },
}

impl ComposeError {
    /// Classify this error as contract, resource or processing failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComposeError::MissingArgument { .. }
            | ComposeError::EmptyFilename { .. }
            | ComposeError::WidthBelowMinimum { .. }
            | ComposeError::NegativeMemoryPercentage(_)
            | ComposeError::InvalidSettings(_)
            | ComposeError::InvalidConfig(_) => ErrorKind::Contract,
            ComposeError::OutputFolderNotFound { .. }
            | ComposeError::FileNotFound { .. }
            | ComposeError::Io { .. }
            | ComposeError::OutputWriteFailed { .. } => ErrorKind::Resource,
            ComposeError::DecodeFailed { .. }
            | ComposeError::RasterisationFailed { .. }
            | ComposeError::RasterizerUnavailable(_)
            | ComposeError::EncodeFailed { .. }
            | ComposeError::ResourceLimitExceeded { .. } => ErrorKind::Processing,
        }
    }

    /// `true` when the caller passed bad input or configuration.
    pub fn is_contract_violation(&self) -> bool {
        self.kind() == ErrorKind::Contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_below_minimum_display() {
        let e = ComposeError::WidthBelowMinimum {
            name: "collage image width",
            width: 599,
            min: 600,
        };
        let msg = e.to_string();
        assert!(msg.contains("599px"), "got: {msg}");
        assert!(msg.contains("600px"), "got: {msg}");
        assert!(e.is_contract_violation());
    }

    #[test]
    fn output_folder_is_resource_error() {
        let e = ComposeError::OutputFolderNotFound {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(e.kind(), ErrorKind::Resource);
        assert!(e.to_string().contains("/nope"));
    }

    #[test]
    fn rasterisation_is_processing_error() {
        let e = ComposeError::RasterisationFailed {
            path: PathBuf::from("a.pdf"),
            page: 3,
            detail: "bad xref".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Processing);
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn resource_limit_is_processing_error() {
        let e = ComposeError::ResourceLimitExceeded {
            width: 1200,
            height: 300_000,
            bytes: 360_000_000,
            limit: 1_000_000,
        };
        assert_eq!(e.kind(), ErrorKind::Processing);
        assert!(e.to_string().contains("1200x300000"));
    }

    #[test]
    fn negative_percentage_display() {
        let e = ComposeError::NegativeMemoryPercentage(-5);
        assert!(e.to_string().contains("-5"));
        assert!(e.is_contract_violation());
    }
}
