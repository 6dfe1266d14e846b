//! Tabular part of a session log: `Type,Label,Temp` records.
//!
//! Any line starting with `#` is skipped wherever it appears. Each remaining
//! data record gets an ordinal, its zero-based position among data records,
//! which is the chart's x value.

use crate::header::COMMENT_MARKER;
use serde::Serialize;

/// Columns every session file must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Type", "Label", "Temp"];

/// One parsed data record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub sensor_type: String,
    pub label: String,
    pub temp: f64,
    pub ordinal: usize,
}

#[derive(Debug)]
pub enum ParseError {
    /// A required column is absent from the header row.
    Schema {
        missing: String,
        available: Vec<String>,
    },
    /// No header, or a header with no usable data rows.
    EmptyData,
    /// The CSV reader itself failed (e.g. invalid UTF-8).
    Csv(csv::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Schema { missing, available } => write!(
                f,
                "missing required column {missing:?}; available columns: [{}]",
                available.join(", ")
            ),
            ParseError::EmptyData => write!(f, "session file contains no data rows"),
            ParseError::Csv(e) => write!(f, "CSV error: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for ParseError {
    fn from(e: csv::Error) -> Self {
        ParseError::Csv(e)
    }
}

struct ColumnIndex {
    sensor_type: usize,
    label: usize,
    temp: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, ParseError> {
        let available: Vec<String> = headers.iter().map(str::to_string).collect();
        let find = |name: &str| {
            available
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ParseError::Schema {
                    missing: name.to_string(),
                    available: available.clone(),
                })
        };
        let [type_col, label_col, temp_col] = REQUIRED_COLUMNS;
        Ok(Self {
            sensor_type: find(type_col)?,
            label: find(label_col)?,
            temp: find(temp_col)?,
        })
    }
}

/// Parse every data record in `content`.
///
/// Records with a non-numeric `Temp` or too few fields are dropped with a
/// warning; they still consume an ordinal so the x axis keeps its spacing.
pub fn parse_rows(content: &str) -> Result<Vec<SampleRow>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(COMMENT_MARKER as u8))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(ParseError::EmptyData);
    }
    let columns = ColumnIndex::resolve(&headers)?;

    let mut rows = Vec::new();
    for (ordinal, record) in reader.records().enumerate() {
        let record = record?;
        match row_from_record(&record, &columns, ordinal) {
            Some(row) => rows.push(row),
            None => tracing::warn!(
                ordinal,
                record = ?record,
                "skipping unreadable session row"
            ),
        }
    }

    if rows.is_empty() {
        return Err(ParseError::EmptyData);
    }
    tracing::debug!(rows = rows.len(), "parsed session rows");
    Ok(rows)
}

fn row_from_record(
    record: &csv::StringRecord,
    columns: &ColumnIndex,
    ordinal: usize,
) -> Option<SampleRow> {
    let temp = record.get(columns.temp)?.parse::<f64>().ok()?;
    Some(SampleRow {
        sensor_type: record.get(columns.sensor_type)?.to_string(),
        label: record.get(columns.label)?.to_string(),
        temp,
        ordinal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t: &str, l: &str, temp: f64, ordinal: usize) -> SampleRow {
        SampleRow {
            sensor_type: t.to_string(),
            label: l.to_string(),
            temp,
            ordinal,
        }
    }

    #[test]
    fn parses_rows_with_ordinals() {
        let rows = parse_rows("Type,Label,Temp\nCPU,Tctl,45\nGPU,edge,50.5\n").unwrap();
        assert_eq!(
            rows,
            vec![row("CPU", "Tctl", 45.0, 0), row("GPU", "edge", 50.5, 1)]
        );
    }

    #[test]
    fn comment_lines_anywhere_are_skipped() {
        let content = "\
# Delay:250
#another note
Type,Label,Temp
CPU,Tctl,40
#mid-file comment
CPU,Tctl,41
# Total: 3
CPU,Exit,42
";
        let rows = parse_rows(content).unwrap();
        assert_eq!(rows.len(), 3);
        let ordinals: Vec<_> = rows.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert_eq!(rows[2], row("CPU", "Exit", 42.0, 2));
    }

    #[test]
    fn n_data_lines_yield_n_rows() {
        let mut content = String::from("#a\n#b\nType,Label,Temp\n");
        for i in 0..25 {
            content.push_str(&format!("NVME,Composite,{i}\n"));
        }
        let rows = parse_rows(&content).unwrap();
        assert_eq!(rows.len(), 25);
        assert!(rows.iter().enumerate().all(|(i, r)| r.ordinal == i));
    }

    #[test]
    fn column_order_does_not_matter() {
        let rows = parse_rows("Temp,Type,Label\n33.5,CPU,Core 0\n").unwrap();
        assert_eq!(rows, vec![row("CPU", "Core 0", 33.5, 0)]);
    }

    #[test]
    fn missing_type_is_schema_error() {
        let err = parse_rows("Kind,Label,Temp\nCPU,Tctl,40\n").unwrap_err();
        match err {
            ParseError::Schema { missing, available } => {
                assert_eq!(missing, "Type");
                assert_eq!(available, vec!["Kind", "Label", "Temp"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn missing_type_without_rows_is_still_schema_error() {
        let err = parse_rows("Label,Temp\n").unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let err = parse_rows("type,Label,Temp\ncpu,x,1\n").unwrap_err();
        assert!(matches!(err, ParseError::Schema { ref missing, .. } if missing == "Type"));
    }

    #[test]
    fn header_only_is_empty_data() {
        let err = parse_rows("# Delay:250\nType,Label,Temp\n").unwrap_err();
        assert!(matches!(err, ParseError::EmptyData));
    }

    #[test]
    fn no_header_is_empty_data() {
        assert!(matches!(parse_rows(""), Err(ParseError::EmptyData)));
        assert!(matches!(
            parse_rows("# Delay:250\n"),
            Err(ParseError::EmptyData)
        ));
    }

    #[test]
    fn unreadable_temp_is_dropped_but_keeps_ordinal() {
        let rows = parse_rows("Type,Label,Temp\nCPU,a,40\nCPU,a,n/a\nCPU,a,42\n").unwrap();
        assert_eq!(rows, vec![row("CPU", "a", 40.0, 0), row("CPU", "a", 42.0, 2)]);
    }

    #[test]
    fn short_records_are_dropped() {
        let rows = parse_rows("Type,Label,Temp\nCPU,a\nCPU,a,41\n").unwrap();
        assert_eq!(rows, vec![row("CPU", "a", 41.0, 1)]);
    }

    #[test]
    fn all_rows_unreadable_is_empty_data() {
        let err = parse_rows("Type,Label,Temp\nCPU,a,hot\n").unwrap_err();
        assert!(matches!(err, ParseError::EmptyData));
    }

    #[test]
    fn schema_error_message_lists_columns() {
        let err = parse_rows("Label,Temp\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required column \"Type\"; available columns: [Label, Temp]"
        );
    }
}
