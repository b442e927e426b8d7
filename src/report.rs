/// The probe report: labelled text sections in a fixed order
///
/// On disk a report is a sequence of label lines (`Header:`, `Head:`,
/// `Read:`, `Serial Access:`) each followed by one line per entry. SAM
/// header lines start with '@' and SAM records have eleven or more tab
/// separated fields, so neither can be mistaken for a label.
use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use tempfile::NamedTempFile;

use crate::error::{ExtractError, Result};
use crate::sam::line_name;

/// Extension of written reports
pub const REPORT_EXTENSION: &str = "out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Header,
    Head,
    Read,
    SerialAccess,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Header,
        Section::Head,
        Section::Read,
        Section::SerialAccess,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Header => "Header:",
            Section::Head => "Head:",
            Section::Read => "Read:",
            Section::SerialAccess => "Serial Access:",
        }
    }

    pub fn from_label(line: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.label() == line)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    sections: IndexMap<Section, Vec<String>>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a section's content. Sections must be added in their fixed order.
    pub fn insert(&mut self, section: Section, lines: Vec<String>) {
        debug_assert!(
            self.sections.keys().all(|&s| s < section),
            "section {section:?} added out of order"
        );
        self.sections.insert(section, lines);
    }

    pub fn get(&self, section: Section) -> Option<&[String]> {
        self.sections.get(&section).map(Vec::as_slice)
    }

    pub fn contains(&self, section: Section) -> bool {
        self.sections.contains_key(&section)
    }

    pub fn sections(&self) -> impl Iterator<Item = (Section, &[String])> {
        self.sections.iter().map(|(&s, lines)| (s, lines.as_slice()))
    }

    /// Record names (QNAME column) of a record section
    pub fn record_names(&self, section: Section) -> Vec<&str> {
        self.get(section)
            .map(|lines| lines.iter().map(|l| line_name(l)).collect())
            .unwrap_or_default()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (section, lines) in &self.sections {
            writeln!(writer, "{}", section.label())?;
            for line in lines {
                writeln!(writer, "{line}")?;
            }
        }
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // Vec<u8> writes cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write the report to `<dir>/<name>.out`, replacing any previous file.
    ///
    /// The content goes to a temporary file in `dir` first and is renamed into
    /// place, so a failed write never leaves a truncated report behind.
    pub fn save<P: AsRef<Path>>(&self, dir: P, name: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let dest = report_path(dir, name)?;

        let write = || -> io::Result<()> {
            let temp = NamedTempFile::new_in(dir)?;
            let mut writer = BufWriter::new(temp);
            self.write_to(&mut writer)?;
            let temp = writer.into_inner().map_err(|e| e.into_error())?;
            temp.as_file().sync_all()?;
            temp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| ExtractError::write_failure(&dest, e))?;

        info!("Wrote report to {}", dest.display());
        Ok(dest)
    }

    /// Re-read a report written by [`Report::write_to`]
    pub fn parse<R: BufRead>(reader: R) -> io::Result<Report> {
        let mut report = Report::new();
        let mut current: Option<Section> = None;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if let Some(section) = Section::from_label(&line) {
                if report.sections.keys().any(|&s| s >= section) {
                    return Err(invalid_data(format!(
                        "line {}: section '{}' out of order or repeated",
                        lineno + 1,
                        section.label()
                    )));
                }
                report.sections.insert(section, Vec::new());
                current = Some(section);
                continue;
            }

            match current.and_then(|s| report.sections.get_mut(&s)) {
                Some(lines) => lines.push(line),
                None => {
                    return Err(invalid_data(format!(
                        "line {}: content before first section label",
                        lineno + 1
                    )))
                }
            }
        }

        Ok(report)
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Report> {
        let file = fs::File::open(path)?;
        Report::parse(io::BufReader::new(file))
    }
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Destination of a report named `name` inside `dir`
pub fn report_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let file_name = format!("{name}.{REPORT_EXTENSION}");
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ExtractError::write_failure(
            dir.join(&file_name),
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{name}' is not usable as a report name"),
            ),
        ));
    }
    Ok(dir.join(file_name))
}
