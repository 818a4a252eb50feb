use crate::{
    error::{FilterError, Result},
    point::{fields, Point},
    point_cloud::PointCloud,
    retain_mask::RetainMask,
};

/// Lines preceding the first point record.
#[derive(Clone, Debug, PartialEq)]
enum HeaderLine {
    Verbatim(String),
    /// `.pts` style point count, rewritten on output
    Count,
}

impl HeaderLine {
    fn as_str(&self) -> &str {
        match self {
            HeaderLine::Verbatim(line) => line,
            HeaderLine::Count => "",
        }
    }
}

/// Delimited text records (`x y z [attributes...]`), one point per line.
#[derive(Clone, Debug, Default)]
pub(crate) struct TextRecords {
    header: Vec<HeaderLine>,
    lines: Vec<String>,
}

fn is_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.starts_with("//")
}

fn is_count(line: &str) -> bool {
    let mut split = fields(line);
    matches!((split.next(), split.next()), (Some(n), None) if n.parse::<usize>().is_ok())
}

fn is_identifier(field: &str) -> bool {
    let mut chars = field.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A column header such as `x,y,z,red,green,blue`: names only, led by `x y z`.
fn is_column_header(line: &str) -> bool {
    let names: Vec<_> = fields(line).collect();
    names.len() >= 3
        && names.iter().all(|f| is_identifier(f))
        && names
            .iter()
            .zip(["x", "y", "z"])
            .all(|(f, axis)| f.eq_ignore_ascii_case(axis))
}

pub(crate) fn decode(text: &str) -> Result<(PointCloud, TextRecords)> {
    let mut records = TextRecords::default();
    let mut points = vec![];
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if points.is_empty() {
            let first_content = !records
                .header
                .iter()
                .any(|h| matches!(h, HeaderLine::Count) || !is_comment(h.as_str()));
            if is_comment(line) {
                records.header.push(HeaderLine::Verbatim(line.to_string()));
                continue;
            }
            if first_content && is_count(line) {
                records.header.push(HeaderLine::Count);
                continue;
            }
            if first_content && is_column_header(line) {
                records.header.push(HeaderLine::Verbatim(line.to_string()));
                continue;
            }
        } else if is_comment(line) {
            continue;
        }

        let point = Point::try_parse(line).map_err(|e| match e {
            FilterError::MalformedInput(details) => {
                FilterError::MalformedInput(format!("line {}: {}", i + 1, details))
            }
            e => e,
        })?;
        points.push(point);
        records.lines.push(line.to_string());
    }

    log::debug!(
        "decoded {} text records ({} header lines)",
        points.len(),
        records.header.len()
    );
    Ok((PointCloud::new(points), records))
}

pub(crate) fn encode(records: TextRecords, mask: &RetainMask) -> Vec<u8> {
    let retained = mask.retain(records.lines);
    let mut out = String::new();
    for h in &records.header {
        match h {
            HeaderLine::Verbatim(line) => out.push_str(line),
            HeaderLine::Count => out.push_str(&retained.len().to_string()),
        }
        out.push('\n');
    }
    for line in &retained {
        out.push_str(line);
        out.push('\n');
    }
    out.into_bytes()
}
