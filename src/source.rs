/// Alignment sources: the read-only handle the extractor pulls records from
///
/// `BamSource` delegates decoding, decompression and indexed access to
/// htslib. `MemorySource` serves records held in memory with the same
/// semantics, for embedding and tests.
use std::fs::File;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use log::{debug, info};
use noodles::bgzf;
use rust_htslib::bam::{self, FetchDefinition, Header, HeaderView, Read, Record};

use crate::error::{ExtractError, Result};
use crate::region::Region;

/// Magic bytes at the start of a decompressed BAM stream
const BAM_MAGIC: &[u8; 4] = b"BAM\x01";

pub type Records<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

pub trait AlignmentSource {
    fn header(&self) -> &HeaderView;

    /// Where the records come from, for error messages
    fn location(&self) -> &Path;

    /// Iterate records in storage order, starting from the first record on
    /// every call
    fn records(&mut self) -> Result<Records<'_>>;

    /// Iterate records overlapping `region` in the order the source yields
    /// them. The region is validated before any record is read.
    fn query(&mut self, region: &Region) -> Result<Records<'_>>;

    /// Validate a region against the header, returning its tid
    fn resolve(&self, region: &Region) -> Result<u32> {
        region.resolve(self.header())
    }

    /// First `n` records in storage order; fewer if the source is shorter
    fn head(&mut self, n: usize) -> Result<Vec<Record>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.records()?.take(n).collect()
    }

    /// First record, in storage order, whose name equals `name`
    fn find_by_name(&mut self, name: &str) -> Result<Option<Record>> {
        let name = name.as_bytes();
        for record in self.records()? {
            let record = record?;
            if record.qname() == name {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Check that `path` is a BGZF container holding a BAM stream.
///
/// htslib sniffs formats on open and would accept SAM or CRAM here as well.
pub fn check_bam_magic<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ExtractError::source_unavailable(path, e))?;
    let mut reader = bgzf::io::reader::Reader::new(file);

    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| ExtractError::source_unavailable(path, format!("not a BGZF file: {e}")))?;

    if &magic != BAM_MAGIC {
        return Err(ExtractError::source_unavailable(
            path,
            "BGZF file does not contain BAM data",
        ));
    }
    Ok(())
}

/// BAM file opened through htslib
pub struct BamSource {
    path: PathBuf,
    index: Option<PathBuf>,
    threads: usize,
    header: HeaderView,
    /// Reader opened with the source, not yet read from
    unread: Option<bam::Reader>,
    /// Reader behind the most recent `records` pass
    reader: Option<bam::Reader>,
    indexed: Option<bam::IndexedReader>,
}

impl BamSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_bam_magic(&path)?;

        let reader = bam::Reader::from_path(&path)
            .map_err(|e| ExtractError::source_unavailable(&path, e))?;
        let header = reader.header().clone();
        info!(
            "Opened {} ({} reference sequences)",
            path.display(),
            header.target_count()
        );

        Ok(BamSource {
            path,
            index: None,
            threads: 1,
            header,
            unread: Some(reader),
            reader: None,
            indexed: None,
        })
    }

    /// Use an index at a non-default location for region queries
    pub fn with_index(mut self, index: Option<PathBuf>) -> Self {
        self.index = index;
        self
    }

    /// Number of htslib decompression threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    fn open_reader(&self) -> Result<bam::Reader> {
        let mut reader = bam::Reader::from_path(&self.path)
            .map_err(|e| ExtractError::source_unavailable(&self.path, e))?;
        if self.threads > 1 {
            reader
                .set_threads(self.threads)
                .map_err(|e| ExtractError::source_unavailable(&self.path, e))?;
        }
        Ok(reader)
    }

    fn open_indexed(&self) -> Result<bam::IndexedReader> {
        let opened = match &self.index {
            Some(index) => bam::IndexedReader::from_path_and_index(&self.path, index),
            None => bam::IndexedReader::from_path(&self.path),
        };
        let mut indexed = opened.map_err(|e| {
            ExtractError::source_unavailable(&self.path, format!("cannot load index: {e}"))
        })?;
        if self.threads > 1 {
            indexed
                .set_threads(self.threads)
                .map_err(|e| ExtractError::source_unavailable(&self.path, e))?;
        }
        debug!("Loaded index for {}", self.path.display());
        Ok(indexed)
    }
}

impl AlignmentSource for BamSource {
    fn header(&self) -> &HeaderView {
        &self.header
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn records(&mut self) -> Result<Records<'_>> {
        // Reopening is the only rewind htslib offers for plain streams. The
        // reader opened with the source serves the first pass only.
        let reader = match self.unread.take() {
            Some(reader) => reader,
            None => self.open_reader()?,
        };
        let path = &self.path;
        let reader = self.reader.insert(reader);

        Ok(Box::new(reader.records().map(move |record| {
            record.map_err(|e| ExtractError::source_unavailable(path, e))
        })))
    }

    fn query(&mut self, region: &Region) -> Result<Records<'_>> {
        let tid = self.resolve(region)?;

        let indexed = match self.indexed.take() {
            Some(indexed) => indexed,
            None => self.open_indexed()?,
        };
        let path = &self.path;
        let indexed = self.indexed.insert(indexed);

        // Coordinates past i64::MAX lie beyond any contig
        let start = i64::try_from(region.start()).unwrap_or(i64::MAX);
        let end = i64::try_from(region.end()).unwrap_or(i64::MAX);
        indexed
            .fetch(FetchDefinition::Region(tid as i32, start, end))
            .map_err(|e| ExtractError::source_unavailable(path, format!("fetch {region}: {e}")))?;

        Ok(Box::new(indexed.records().map(move |record| {
            record.map_err(|e| ExtractError::source_unavailable(path, e))
        })))
    }
}

/// Records held in memory, in storage order
pub struct MemorySource {
    header: HeaderView,
    records: Vec<Record>,
}

impl MemorySource {
    pub fn new(header: &Header, records: Vec<Record>) -> Self {
        MemorySource {
            header: HeaderView::from_header(header),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reference span of a record; records without aligned bases occupy one
/// base, as htslib treats them when indexing
fn reference_span(record: &Record) -> (u64, u64) {
    let pos = record.pos().max(0) as u64;
    let end = if record.cigar_len() == 0 {
        pos + 1
    } else {
        (record.cigar().end_pos().max(0) as u64).max(pos + 1)
    };
    (pos, end)
}

impl AlignmentSource for MemorySource {
    fn header(&self) -> &HeaderView {
        &self.header
    }

    fn location(&self) -> &Path {
        Path::new("<memory>")
    }

    fn records(&mut self) -> Result<Records<'_>> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }

    fn query(&mut self, region: &Region) -> Result<Records<'_>> {
        let tid = self.resolve(region)? as i32;
        let region = region.clone();

        Ok(Box::new(
            self.records
                .iter()
                .filter(move |record| {
                    let (pos, end) = reference_span(record);
                    record.tid() == tid && record.pos() >= 0 && region.overlaps(pos, end)
                })
                .cloned()
                .map(Ok),
        ))
    }
}
