//! Helpers shared by the delimited-text parsers.

use std::borrow::Cow;

use csv::ByteRecord;

use crate::IngestError;

/// Column positions resolved from a header row.
pub struct Header {
    names: Vec<String>,
}

impl Header {
    /// Reads the header names, trimmed and uppercased. A UTF-8 byte order
    /// mark on the first column is dropped.
    #[must_use]
    pub fn new(record: &ByteRecord) -> Self {
        let names = record
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let raw = if i == 0 {
                    raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw)
                } else {
                    raw
                };
                String::from_utf8_lossy(raw)
                    .trim()
                    .trim_matches('"')
                    .to_ascii_uppercase()
            })
            .collect();
        Self { names }
    }

    /// Header names in file order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position of an exact column name.
    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|n| n == column)
    }

    /// Position of a column that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingColumn`] if the column is absent.
    pub fn require(&self, file: &str, column: &str) -> Result<usize, IngestError> {
        self.position(column)
            .ok_or_else(|| IngestError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            })
    }

    /// First column whose name contains any of `needles`, skipping `exclude`.
    #[must_use]
    pub fn find_containing(&self, needles: &[&str], exclude: Option<usize>) -> Option<usize> {
        self.names.iter().enumerate().find_map(|(i, name)| {
            (Some(i) != exclude && needles.iter().any(|n| name.contains(n))).then_some(i)
        })
    }
}

/// Field `i` decoded as text (lossy), trimmed.
#[must_use]
pub fn text(record: &ByteRecord, i: usize) -> Cow<'_, str> {
    match record.get(i) {
        Some(raw) => match String::from_utf8_lossy(raw) {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim().trim_matches('"')),
            Cow::Owned(s) => Cow::Owned(s.trim().trim_matches('"').to_string()),
        },
        None => Cow::Borrowed(""),
    }
}

/// Field `i` as a number. Accepts a decimal comma. Blank, missing or
/// non-numeric fields give `None`.
#[must_use]
pub fn number(record: &ByteRecord, i: usize) -> Option<f64> {
    let value = text(record, i);
    if value.is_empty() {
        return None;
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Picks `;` or `,` by counting both in the first line.
#[must_use]
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|&&b| b == b';').count();
    let commas = first_line.iter().filter(|&&b| b == b',').count();
    if commas > semicolons { b',' } else { b';' }
}

/// Rounds a non-negative count read as a float.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn count(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_strips_bom_and_uppercases() {
        let header = Header::new(&ByteRecord::from(vec!["\u{feff}codgeo", " libgeo ", "P21_MEN"]));
        assert_eq!(header.position("CODGEO"), Some(0));
        assert_eq!(header.position("LIBGEO"), Some(1));
        assert!(matches!(
            header.require("x.csv", "P21_POP"),
            Err(IngestError::MissingColumn { .. })
        ));
    }

    #[test]
    fn finds_columns_by_substring() {
        let header = Header::new(&ByteRecord::from(vec![
            "CODE_COMMUNE",
            "NOM",
            "REVENU_MEDIAN",
        ]));
        let code = header.find_containing(&["CODE", "COM"], None);
        assert_eq!(code, Some(0));
        assert_eq!(header.find_containing(&["MEDIAN", "REVENU"], code), Some(2));
    }

    #[test]
    fn parses_numbers() {
        let record = ByteRecord::from(vec!["1234.5", "12,5", "", "n/a", "\"7\""]);
        assert_eq!(number(&record, 0), Some(1234.5));
        assert_eq!(number(&record, 1), Some(12.5));
        assert_eq!(number(&record, 2), None);
        assert_eq!(number(&record, 3), None);
        assert_eq!(number(&record, 4), Some(7.0));
        assert_eq!(number(&record, 9), None);
    }

    #[test]
    fn sniffs_delimiter() {
        assert_eq!(sniff_delimiter(b"CODGEO;LIBGEO;P21_MEN\n01001;A;3"), b';');
        assert_eq!(sniff_delimiter(b"code,revenu\n01001,20000"), b',');
    }

    #[test]
    fn rounds_counts() {
        assert_eq!(count(1234.6), 1235);
        assert_eq!(count(-3.0), 0);
    }
}
