/// Error taxonomy for probing an alignment file
///
/// Each variant is a distinct failure surfaced to whoever invoked the probe.
/// Nothing here is retried: an unreadable source or an absent read name stays
/// that way until the input changes.
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// File missing, unreadable, not BAM, or lacking a usable index
    #[error("alignment source {} unavailable: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    /// No record carries the requested name
    #[error("no alignment named '{name}' in source")]
    NotFound { name: String },
    /// Malformed interval or reference unknown to the header
    #[error("invalid region '{region}': {reason}")]
    InvalidRegion { region: String, reason: String },
    /// Report could not be written to its destination
    #[error("failed to write report {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    pub fn source_unavailable<P: AsRef<Path>>(path: P, reason: impl fmt::Display) -> Self {
        ExtractError::SourceUnavailable {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_region(region: impl fmt::Display, reason: impl fmt::Display) -> Self {
        ExtractError::InvalidRegion {
            region: region.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failure<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        ExtractError::WriteFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_names_the_culprit() {
        let err = ExtractError::NotFound {
            name: "read_42".to_string(),
        };
        assert_eq!(err.to_string(), "no alignment named 'read_42' in source");

        let err = ExtractError::invalid_region("chrZ:1-10", "unknown reference 'chrZ'");
        assert!(err.to_string().contains("chrZ:1-10"));
        assert!(err.to_string().contains("unknown reference"));
    }

    #[test]
    fn test_write_failure_keeps_io_source() {
        let err = ExtractError::write_failure(
            "/nonexistent/out.out",
            io::Error::new(io::ErrorKind::NotFound, "missing directory"),
        );
        let source = err.source().expect("io error kept as source");
        assert_eq!(source.to_string(), "missing directory");
        assert!(err.to_string().contains("/nonexistent/out.out"));
    }
}
