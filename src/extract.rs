/// Record extraction: header, leading reads, a named read and a region sample
use log::{debug, warn};
use rust_htslib::bam::Record;

use crate::error::{ExtractError, Result};
use crate::region::Region;
use crate::report::{Report, Section};
use crate::sam;
use crate::source::AlignmentSource;

/// Records taken from the start of the source when no count is given
pub const DEFAULT_HEAD_COUNT: usize = 20;

/// Records kept from a region query
pub const DEFAULT_REGION_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub head_count: usize,
    pub read_name: Option<String>,
    pub region: Option<Region>,
    pub region_limit: usize,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        SelectionCriteria {
            head_count: DEFAULT_HEAD_COUNT,
            read_name: None,
            region: None,
            region_limit: DEFAULT_REGION_LIMIT,
        }
    }
}

impl SelectionCriteria {
    pub fn new(head_count: usize) -> Self {
        SelectionCriteria {
            head_count,
            ..Default::default()
        }
    }

    pub fn with_read_name(mut self, name: impl Into<String>) -> Self {
        self.read_name = Some(name.into());
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_region_limit(mut self, limit: usize) -> Self {
        self.region_limit = limit;
        self
    }
}

fn render<S>(source: &S, records: &[Record]) -> Result<Vec<String>>
where
    S: AlignmentSource + ?Sized,
{
    records
        .iter()
        .map(|record| {
            sam::record_line(source.header(), record).map_err(|e| {
                ExtractError::source_unavailable(
                    source.location(),
                    format!("malformed record: {e}"),
                )
            })
        })
        .collect()
}

/// Build the report for `criteria` from `source`.
///
/// Fails before reading any record if the region does not resolve against
/// the header, and with `NotFound` if a read name was asked for and no record
/// carries it.
pub fn extract<S>(source: &mut S, criteria: &SelectionCriteria) -> Result<Report>
where
    S: AlignmentSource + ?Sized,
{
    if let Some(region) = &criteria.region {
        source.resolve(region)?;
    }

    let mut report = Report::new();
    report.insert(Section::Header, sam::header_lines(source.header()));

    let head = source.head(criteria.head_count)?;
    debug!(
        "Collected {} of {} requested leading records",
        head.len(),
        criteria.head_count
    );
    let lines = render(source, &head)?;
    report.insert(Section::Head, lines);

    if let Some(name) = &criteria.read_name {
        let record = source
            .find_by_name(name)?
            .ok_or_else(|| ExtractError::NotFound { name: name.clone() })?;
        debug!("Found read '{name}' at tid {} pos {}", record.tid(), record.pos());
        let lines = render(source, std::slice::from_ref(&record))?;
        report.insert(Section::Read, lines);
    }

    if let Some(region) = &criteria.region {
        let hits = source
            .query(region)?
            .take(criteria.region_limit)
            .collect::<Result<Vec<_>>>()?;
        if hits.len() < criteria.region_limit {
            warn!(
                "Region {region} yielded {} record(s), fewer than the {} requested",
                hits.len(),
                criteria.region_limit
            );
        }
        let lines = render(source, &hits)?;
        report.insert(Section::SerialAccess, lines);
    }

    Ok(report)
}
