/// The probe step: open a BAM, extract the report, write it out
///
/// This is the boundary a workflow runtime (or the CLI) calls. The source is
/// owned by `run` and dropped before the report is written, so the file
/// handle is released on every exit path.
use std::path::PathBuf;

use log::info;

use crate::error::Result;
use crate::extract::{extract, SelectionCriteria};
use crate::source::BamSource;

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// BAM file to read
    pub input: PathBuf,
    /// Index for region queries; `<input>.bai` and friends when absent
    pub index: Option<PathBuf>,
    /// Directory the report is written to
    pub output_dir: PathBuf,
    /// Report file stem, written as `<output_dir>/<output_name>.out`
    pub output_name: String,
    /// htslib decompression threads
    pub threads: usize,
    pub criteria: SelectionCriteria,
}

impl ProbeConfig {
    pub fn new(
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        output_name: impl Into<String>,
        criteria: SelectionCriteria,
    ) -> Self {
        ProbeConfig {
            input: input.into(),
            index: None,
            output_dir: output_dir.into(),
            output_name: output_name.into(),
            threads: 1,
            criteria,
        }
    }

    pub fn with_index(mut self, index: impl Into<PathBuf>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Run the probe and return the path of the written report
pub fn run(config: &ProbeConfig) -> Result<PathBuf> {
    let report = {
        let mut source = BamSource::open(&config.input)?
            .with_index(config.index.clone())
            .with_threads(config.threads);
        extract(&mut source, &config.criteria)?
    };

    info!(
        "Extracted {} section(s) from {}",
        report.sections().count(),
        config.input.display()
    );

    report.save(&config.output_dir, &config.output_name)
}
