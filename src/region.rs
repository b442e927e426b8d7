/// Genomic intervals for region queries
///
/// Coordinates are held 0-based half-open, the convention htslib's `fetch`
/// uses. Region strings (`chr1:1,001-2,000`) follow samtools and are 1-based
/// closed, so parsing converts.
use std::fmt;
use std::str::FromStr;

use rust_htslib::bam::HeaderView;

use crate::error::{ExtractError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    contig: String,
    start: u64,
    end: u64,
}

impl Region {
    /// Build a region from 0-based half-open bounds
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        let contig = contig.into();
        if contig.is_empty() {
            return Err(ExtractError::invalid_region(
                format!(":{start}-{end}"),
                "reference name is empty",
            ));
        }
        if start > end {
            return Err(ExtractError::invalid_region(
                format!("{contig}:{start}-{end}"),
                format!("start {start} is past end {end}"),
            ));
        }
        Ok(Region { contig, start, end })
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `[pos, end)` shares at least one base with this region
    pub fn overlaps(&self, pos: u64, end: u64) -> bool {
        pos < self.end && end > self.start
    }

    /// Look up the region's reference in a header, returning its tid
    pub fn resolve(&self, header: &HeaderView) -> Result<u32> {
        header.tid(self.contig.as_bytes()).ok_or_else(|| {
            ExtractError::invalid_region(self, format!("unknown reference '{}'", self.contig))
        })
    }
}

/// Parse a position that may carry thousands separators ("1,000,000")
fn parse_position(s: &str) -> std::result::Result<u64, String> {
    let digits: String = s.chars().filter(|&c| c != ',').collect();
    if digits.is_empty() {
        return Err("missing position".to_string());
    }
    digits
        .parse::<u64>()
        .map_err(|e| format!("invalid position '{s}': {e}"))
}

impl FromStr for Region {
    type Err = ExtractError;

    /// `contig:start-end`, 1-based closed. Contig names may contain ':'
    /// (HLA alleles do), so the interval is split off the last one.
    fn from_str(s: &str) -> Result<Self> {
        let (contig, interval) = s
            .rsplit_once(':')
            .ok_or_else(|| ExtractError::invalid_region(s, "expected CONTIG:START-END"))?;

        let (start, end) = interval
            .split_once('-')
            .ok_or_else(|| ExtractError::invalid_region(s, "expected CONTIG:START-END"))?;

        let start = parse_position(start).map_err(|e| ExtractError::invalid_region(s, e))?;
        let end = parse_position(end).map_err(|e| ExtractError::invalid_region(s, e))?;

        if start == 0 {
            return Err(ExtractError::invalid_region(s, "positions are 1-based"));
        }
        if start > end {
            return Err(ExtractError::invalid_region(
                s,
                format!("start {start} is past end {end}"),
            ));
        }

        Region::new(contig, start - 1, end)
    }
}

impl fmt::Display for Region {
    /// Renders back in the 1-based closed string form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start + 1, self.end)
    }
}
