//! CSV reading and writing for tables, with encoding and delimiter
//! auto-detection.
//!
//! The first CSV column is read as the row index by default, so a file
//! written by [`write_table`] loads back into the same table.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{default_index, Table, MISSING_TOKENS};

/// How to read a CSV file into a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field delimiter (auto-detect if not specified)
    #[serde(default)]
    pub delimiter: Option<char>,

    /// Text encoding label (auto-detect if not specified)
    #[serde(default)]
    pub encoding: Option<String>,

    /// Read the first column as the row index
    #[serde(default = "default_index_column")]
    pub index_column: bool,
}

fn default_index_column() -> bool {
    true
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: None,
            index_column: default_index_column(),
        }
    }
}

/// A parsed table with the settings used to read it
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: Table,
    /// Detected or requested encoding
    pub encoding: String,
    /// Detected or requested delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding label.
///
/// Malformed sequences are replaced rather than rejected; an unknown label is
/// an error (see [`decode_detected`] for the lenient variant).
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let label = match encoding.to_lowercase().as_str() {
        "ascii" | "utf8" => "utf-8".to_string(),
        "latin1" | "latin-1" => "iso-8859-1".to_string(),
        other => other.to_string(),
    };
    let decoder =
        encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| CsvError::Encoding {
            encoding: encoding.to_string(),
            message: "unknown encoding label".to_string(),
        })?;
    let (text, _, had_errors) = decoder.decode(bytes);
    if had_errors {
        log::warn!("Some bytes could not be decoded as {} and were replaced", encoding);
    }
    Ok(text.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn delimiter_byte(delimiter: char) -> CsvResult<u8> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(CsvError::malformed(
            0,
            format!("delimiter '{}' is not an ASCII character", delimiter),
        ))
    }
}

/// Parse CSV text into a table with the polars CSV reader.
///
/// Types are inferred over the whole file. Integer columns are widened to
/// `Float64`, [`MISSING_TOKENS`] read as null, timestamps are parsed where
/// possible and extra fields on a line are dropped.
///
/// # Example
/// ```
/// use df_tools::parser::parse_table;
///
/// let csv = "time,a,b\n0,1.5,2\n1,,3";
/// let table = parse_table(csv, ',', true).unwrap();
///
/// assert_eq!(table.shape(), (2, 2));
/// assert_eq!(table.column_names(), vec!["a", "b"]);
/// ```
pub fn parse_table(content: &str, delimiter: char, index_column: bool) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let separator = delimiter_byte(delimiter)?;
    let null_values = NullValues::AllColumns(MISSING_TOKENS.iter().map(|t| (*t).into()).collect());

    let mut frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|parse| {
            parse
                .with_separator(separator)
                .with_null_values(Some(null_values.clone()))
                .with_try_parse_dates(true)
                .with_truncate_ragged_lines(true)
        })
        .into_reader_with_file_handle(Cursor::new(content.as_bytes().to_vec()))
        .finish()?;

    let index = if index_column && frame.width() > 0 {
        let name = frame.get_column_names()[0].to_string();
        frame
            .drop_in_place(&name)?
            .as_materialized_series()
            .clone()
    } else {
        default_index(frame.height())
    };

    log::debug!("Parsed {} rows x {} columns", index.len(), frame.width());
    Ok(Table::new(index, frame)?)
}

/// Decode bytes whose encoding was auto-detected.
///
/// chardet can name charsets that encoding_rs does not know; those fall back
/// to lossy UTF-8 instead of failing the read.
pub fn decode_detected(bytes: &[u8], detected: &str) -> (String, String) {
    match decode_content(bytes, detected) {
        Ok(text) => (text, detected.to_string()),
        Err(err) => {
            log::warn!("{}; falling back to lossy UTF-8", err);
            (
                String::from_utf8_lossy(bytes).into_owned(),
                "utf-8".to_string(),
            )
        }
    }
}

/// Parse CSV bytes, detecting whatever the options leave unspecified.
///
/// An explicitly requested encoding must be known; a detected one that is
/// not falls back to lossy UTF-8.
pub fn parse_bytes(bytes: &[u8], options: &CsvOptions) -> CsvResult<ParseResult> {
    let (content, encoding) = match &options.encoding {
        Some(requested) => (decode_content(bytes, requested)?, requested.clone()),
        None => decode_detected(bytes, &detect_encoding(bytes)),
    };
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(&content));

    let table = parse_table(&content, delimiter, options.index_column)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Read a CSV file into a table.
pub fn read_table<P: AsRef<Path>>(path: P, options: &CsvOptions) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, options)
}

/// Write a table as CSV with the polars CSV writer: an unnamed index column
/// followed by the data columns. Nulls are written as empty fields.
pub fn write_table<W: Write>(table: &Table, writer: W, delimiter: char) -> CsvResult<()> {
    let mut frame = table.data().clone();
    frame.insert_column(0, table.index().clone())?;

    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(delimiter_byte(delimiter)?)
        .finish(&mut frame)?;
    Ok(())
}

/// Write a table to a CSV file.
pub fn write_table_file<P: AsRef<Path>>(table: &Table, path: P, delimiter: char) -> CsvResult<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_table(table, file, delimiter)
}

/// Render a table as a CSV string.
pub fn table_to_string(table: &Table, delimiter: char) -> CsvResult<String> {
    let mut buf = Vec::new();
    write_table(table, &mut buf, delimiter)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{label_series, Label};
    use crate::transform::frame::idx0;

    #[test]
    fn test_simple_csv() {
        let csv = "t;a;b\n0;1;2\n1;3;4";
        let table = parse_table(csv, ';', true).unwrap();

        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.labels(), vec![Label::Number(0.0), Label::Number(1.0)]);
        assert_eq!(table.numeric_column("a").unwrap(), vec![1.0, 3.0]);
        assert_eq!(table.numeric_column("b").unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_without_index_column() {
        let csv = "a,b\n1,2\n3,4";
        let table = parse_table(csv, ',', false).unwrap();

        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.labels(), vec![Label::Number(0.0), Label::Number(1.0)]);
    }

    #[test]
    fn test_datetime_index() {
        let csv = "date,v\n2024-01-01 00:00:00,1\n2024-01-01 00:00:30,2";
        let table = parse_table(csv, ',', true).unwrap();
        assert!(matches!(table.label(1), Some(Label::Time(_))));
    }

    #[test]
    fn test_missing_and_text_values() {
        let csv = "i,a,b,c\n0,1,,NaN\n1,x,2";
        let table = parse_table(csv, ',', true).unwrap();

        assert_eq!(table.value(0, 1), Some(AnyValue::Null));
        assert_eq!(table.value(0, 2), Some(AnyValue::Null));
        assert_eq!(table.value(1, 0), Some(AnyValue::String("x")));
        // Short record is padded with nulls
        assert_eq!(table.value(1, 2), Some(AnyValue::Null));
        assert_eq!(table.numeric_column("b").unwrap()[1], 2.0);
        assert!(table.numeric_column("a").is_err());
    }

    #[test]
    fn test_quoted_values() {
        let csv = "i,name\n0,\"Hello, World\"";
        let table = parse_table(csv, ',', true).unwrap();
        assert_eq!(table.value(0, 0), Some(AnyValue::String("Hello, World")));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "i,a\n0,1,2,3";
        let table = parse_table(csv, ',', true).unwrap();
        assert_eq!(table.shape(), (1, 1));
    }

    #[test]
    fn test_all_missing_rows_kept() {
        let csv = "i,a,b\n0,1,2\n,,\n2,5,6\n";
        let table = parse_table(csv, ',', true).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.value(1, 0), Some(AnyValue::Null));
    }

    #[test]
    fn test_padding_rows_survive_round_trip() {
        let labels = vec![
            Label::from("0"),
            Label::from("1"),
            Label::from(""),
            Label::from("stats"),
        ];
        let frame = df!("a" => [Some(1.0), Some(2.0), None, None]).unwrap();
        let table = Table::new(label_series(&labels).unwrap(), frame).unwrap();

        let text = table_to_string(&table, ',').unwrap();
        let back = parse_table(&text, ',', true).unwrap();

        assert_eq!(back.shape(), (4, 1));
        assert_eq!(back.label(2), Some(Label::Text(String::new())));
        assert_eq!(back.label(3), Some(Label::Text("stats".into())));
        assert_eq!(back.value(2, 0), Some(AnyValue::Null));
    }

    #[test]
    fn test_subsecond_index_round_trip() {
        let labels = vec![
            Label::parse("2024-01-01 00:00:00.250"),
            Label::parse("2024-01-01 00:00:00.750"),
        ];
        let table = Table::from_numeric(vec![("a", vec![1.0, 2.0])])
            .unwrap()
            .with_index(labels.clone())
            .unwrap();

        let text = table_to_string(&table, ',').unwrap();
        let back = parse_table(&text, ',', true).unwrap();
        assert_eq!(back.labels(), labels);

        let shifted = idx0(&back).unwrap();
        assert_eq!(shifted.labels(), vec![Label::Number(0.0), Label::Number(0.5)]);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_table("", ',', true), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        assert!(parse_table("a§b\n1§2", '§', false).is_err());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "t;a;b\n0;1;2\n1;3;4";
        let result = parse_bytes(csv.as_bytes(), &CsvOptions::default()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.shape(), (2, 2));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            decode_content(b"abc", "klingon-8"),
            Err(CsvError::Encoding { .. })
        ));

        let options = CsvOptions {
            encoding: Some("klingon-8".into()),
            ..CsvOptions::default()
        };
        assert!(parse_bytes(b"i,a\n0,1", &options).is_err());
    }

    #[test]
    fn test_unknown_detected_encoding_falls_back() {
        let (text, encoding) = decode_detected(b"i,a\n0,1", "klingon-8");
        assert_eq!(text, "i,a\n0,1");
        assert_eq!(encoding, "utf-8");

        let (text, encoding) = decode_detected(&[0x53, 0xE9], "iso-8859-1");
        assert_eq!(text, "Sé");
        assert_eq!(encoding, "iso-8859-1");
    }

    #[test]
    fn test_write_then_read_keeps_table() {
        let frame = df!(
            "a" => [Some(1.5), None],
            "b" => ["x", "-2"]
        )
        .unwrap();
        let table = Table::new(
            label_series(&[Label::Number(0.0), Label::Number(10.0)]).unwrap(),
            frame,
        )
        .unwrap();

        let text = table_to_string(&table, ',').unwrap();
        assert!(text.lines().next().unwrap().ends_with("a,b"));
        assert_eq!(parse_table(&text, ',', true).unwrap(), table);
    }

    #[test]
    fn test_read_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        std::fs::write(&path, "t,a\n0,1\n1,2\n").unwrap();

        let result = read_table(&path, &CsvOptions::default()).unwrap();
        assert_eq!(result.table.numeric_column("a").unwrap(), vec![1.0, 2.0]);
    }
}
