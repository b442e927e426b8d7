use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;

use bamprobe::extract::{DEFAULT_HEAD_COUNT, DEFAULT_REGION_LIMIT};
use bamprobe::{ProbeConfig, Region, SelectionCriteria};

/// Parse a count that may have metric suffix (k/K=1000, m/M=1e6)
fn parse_metric_count(s: &str) -> Result<usize, String> {
    if s.is_empty() {
        return Err("Empty string".to_string());
    }

    let (num_part, suffix) = match s.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&s[..s.len() - c.len_utf8()], Some(c)),
        _ => (s, None),
    };

    let base: u64 = num_part
        .parse()
        .map_err(|e| format!("Invalid number: {e}"))?;

    let multiplier = match suffix {
        Some('k') | Some('K') => 1_000,
        Some('m') | Some('M') => 1_000_000,
        Some(c) => {
            return Err(format!(
                "Unknown suffix '{c}'. Use k/K (1000) or m/M (1e6)"
            ))
        }
        None => 1,
    };

    base.checked_mul(multiplier)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| format!("Value {s} too large"))
}

fn parse_region(s: &str) -> Result<Region, String> {
    s.parse::<Region>().map_err(|e| e.to_string())
}

/// bamprobe - Sample a BAM file: header, leading reads, a named read, a region
///
/// Writes <OUTPUT_DIR>/<NAME>.out and prints its path
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Input BAM file
    #[clap(value_name = "BAM")]
    input: PathBuf,

    /// Directory the report is written to
    #[clap(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// Number of leading reads to report
    #[clap(short = 'n', long = "reads", default_value_t = DEFAULT_HEAD_COUNT, value_parser = parse_metric_count)]
    reads: usize,

    /// Report the first read with this name
    #[clap(short = 'r', long = "read-name", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    read_name: Option<String>,

    /// Report file stem (defaults to the read name)
    #[clap(long = "name", required_unless_present = "read_name", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    name: Option<String>,

    /// Region to sample, 1-based closed (chr1:1,001-2,000)
    #[clap(long = "region", value_parser = parse_region, conflicts_with = "chrom")]
    region: Option<Region>,

    /// Reference name of a 0-based half-open region
    #[clap(long = "chrom", requires_all = ["start", "end"])]
    chrom: Option<String>,

    /// Region start, 0-based inclusive
    #[clap(long = "start", requires = "chrom")]
    start: Option<u64>,

    /// Region end, 0-based exclusive
    #[clap(long = "end", requires = "chrom")]
    end: Option<u64>,

    /// BAM index, if not next to the BAM file
    #[clap(long = "index")]
    index: Option<PathBuf>,

    /// Maximum number of reads reported from the region
    #[clap(long = "region-limit", default_value_t = DEFAULT_REGION_LIMIT)]
    region_limit: usize,

    /// Number of htslib decompression threads
    #[clap(short = 't', long = "threads", default_value = "1")]
    threads: usize,

    /// Quiet mode (warnings and errors only)
    #[clap(long = "quiet")]
    quiet: bool,
}

impl Args {
    fn region(&self) -> Result<Option<Region>> {
        if let Some(region) = &self.region {
            return Ok(Some(region.clone()));
        }
        match (&self.chrom, self.start, self.end) {
            (Some(chrom), Some(start), Some(end)) => {
                Ok(Some(Region::new(chrom.clone(), start, end)?))
            }
            _ => Ok(None),
        }
    }

    fn into_config(self) -> Result<ProbeConfig> {
        let mut criteria =
            SelectionCriteria::new(self.reads).with_region_limit(self.region_limit);
        if let Some(region) = self.region()? {
            criteria = criteria.with_region(region);
        }
        if let Some(name) = &self.read_name {
            criteria = criteria.with_read_name(name.clone());
        }

        let output_name = self
            .name
            .or(self.read_name)
            .context("An output name is required: pass --name or --read-name")?;

        let mut config = ProbeConfig::new(self.input, self.output_dir, output_name, criteria)
            .with_threads(self.threads);
        if let Some(index) = self.index {
            config = config.with_index(index);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let config = args.into_config()?;

    match bamprobe::run(&config) {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            Err(e).with_context(|| format!("Failed to probe {}", config.input.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric_count() {
        assert_eq!(parse_metric_count("20"), Ok(20));
        assert_eq!(parse_metric_count("2k"), Ok(2_000));
        assert_eq!(parse_metric_count("1M"), Ok(1_000_000));
        assert!(parse_metric_count("").is_err());
        assert!(parse_metric_count("5x").is_err());
        assert!(parse_metric_count("-1").is_err());
    }

    #[test]
    fn test_args_need_a_name() {
        assert!(Args::try_parse_from(["bamprobe", "in.bam"]).is_err());
        assert!(Args::try_parse_from(["bamprobe", "in.bam", "--read-name", ""]).is_err());

        let args = Args::try_parse_from(["bamprobe", "in.bam", "-r", "read7"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.output_name, "read7");
        assert_eq!(config.criteria.read_name.as_deref(), Some("read7"));
        assert_eq!(config.criteria.head_count, DEFAULT_HEAD_COUNT);

        let args = Args::try_parse_from(["bamprobe", "in.bam", "--name", "sample"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.output_name, "sample");
        assert!(config.criteria.read_name.is_none());
    }

    #[test]
    fn test_region_flags() {
        let args = Args::try_parse_from([
            "bamprobe", "in.bam", "--name", "s", "--region", "chr1:101-200",
        ])
        .unwrap();
        let region = args.into_config().unwrap().criteria.region.unwrap();
        assert_eq!((region.start(), region.end()), (100, 200));

        let args = Args::try_parse_from([
            "bamprobe", "in.bam", "--name", "s", "--chrom", "chr1", "--start", "100", "--end", "200",
        ])
        .unwrap();
        let region = args.into_config().unwrap().criteria.region.unwrap();
        assert_eq!((region.start(), region.end()), (100, 200));

        let args = Args::try_parse_from([
            "bamprobe", "in.bam", "--name", "s", "--chrom", "chr1", "--start", "300", "--end", "200",
        ])
        .unwrap();
        assert!(args.into_config().is_err());

        let chrom_only = ["bamprobe", "in.bam", "--name", "s", "--chrom", "chr1"];
        assert!(Args::try_parse_from(chrom_only).is_err());
        let bare_contig = ["bamprobe", "in.bam", "--name", "s", "--region", "chr1"];
        assert!(Args::try_parse_from(bare_contig).is_err());
    }
}
