/// SAM text rendering for headers and records
///
/// The report stores every record in its SAM line form, the default textual
/// representation of an alignment.
use std::fmt::Write;

use rust_htslib::bam::record::Aux;
use rust_htslib::bam::{HeaderView, Record};

/// Quality byte htslib uses when a record carries no qualities
const MISSING_QUALITY: u8 = 0xff;

/// Header text split into lines, blank lines dropped
pub fn header_lines(header: &HeaderView) -> Vec<String> {
    String::from_utf8_lossy(header.as_bytes())
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn reference_name(header: &HeaderView, tid: i32) -> String {
    if tid < 0 || tid as u32 >= header.target_count() {
        return "*".to_string();
    }
    String::from_utf8_lossy(header.tid2name(tid as u32)).into_owned()
}

/// Render one record as a tab-separated SAM line (no trailing newline)
pub fn record_line(
    header: &HeaderView,
    record: &Record,
) -> Result<String, rust_htslib::errors::Error> {
    let mut line = String::new();

    let rname = reference_name(header, record.tid());
    let rnext = if record.mtid() >= 0 && record.mtid() == record.tid() {
        "=".to_string()
    } else {
        reference_name(header, record.mtid())
    };

    let cigar = record.cigar().to_string();
    let seq = record.seq().as_bytes();
    let qual = record.qual();

    // Writing into a String is infallible
    let _ = write!(
        line,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
        String::from_utf8_lossy(record.qname()),
        record.flags(),
        rname,
        record.pos() + 1,
        record.mapq(),
        if cigar.is_empty() { "*" } else { cigar.as_str() },
        rnext,
        record.mpos() + 1,
        record.insert_size(),
    );

    if seq.is_empty() {
        line.push('*');
    } else {
        line.push_str(&String::from_utf8_lossy(&seq));
    }
    line.push('\t');

    if qual.is_empty() || qual[0] == MISSING_QUALITY {
        line.push('*');
    } else {
        line.extend(qual.iter().map(|&q| (q.saturating_add(33)) as char));
    }

    for aux in record.aux_iter() {
        let (tag, value) = aux?;
        line.push('\t');
        line.push_str(&String::from_utf8_lossy(tag));
        line.push(':');
        push_aux_value(&mut line, &value);
    }

    Ok(line)
}

fn push_array<T: std::fmt::Display>(
    line: &mut String,
    subtype: char,
    values: impl Iterator<Item = T>,
) {
    line.push_str("B:");
    line.push(subtype);
    for v in values {
        let _ = write!(line, ",{v}");
    }
}

fn push_aux_value(line: &mut String, value: &Aux<'_>) {
    let _ = match value {
        Aux::Char(c) => write!(line, "A:{}", *c as char),
        Aux::I8(v) => write!(line, "i:{v}"),
        Aux::U8(v) => write!(line, "i:{v}"),
        Aux::I16(v) => write!(line, "i:{v}"),
        Aux::U16(v) => write!(line, "i:{v}"),
        Aux::I32(v) => write!(line, "i:{v}"),
        Aux::U32(v) => write!(line, "i:{v}"),
        Aux::Float(v) => write!(line, "f:{v}"),
        Aux::Double(v) => write!(line, "f:{v}"),
        Aux::String(s) => write!(line, "Z:{s}"),
        Aux::HexByteArray(s) => write!(line, "H:{s}"),
        Aux::ArrayI8(a) => {
            push_array(line, 'c', a.iter());
            Ok(())
        }
        Aux::ArrayU8(a) => {
            push_array(line, 'C', a.iter());
            Ok(())
        }
        Aux::ArrayI16(a) => {
            push_array(line, 's', a.iter());
            Ok(())
        }
        Aux::ArrayU16(a) => {
            push_array(line, 'S', a.iter());
            Ok(())
        }
        Aux::ArrayI32(a) => {
            push_array(line, 'i', a.iter());
            Ok(())
        }
        Aux::ArrayU32(a) => {
            push_array(line, 'I', a.iter());
            Ok(())
        }
        Aux::ArrayFloat(a) => {
            push_array(line, 'f', a.iter());
            Ok(())
        }
    };
}

/// QNAME of a rendered SAM line
pub fn line_name(line: &str) -> &str {
    line.split('\t').next().unwrap_or("")
}
