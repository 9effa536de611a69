//! Parsing of comma separated feature vectors
//!
//! Every row is parsed on its own: a row is valid when it has exactly the expected number of
//! fields and every field is a finite floating point number.
use crate::error::{DatasetError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Parses a single comma separated line into a feature vector
///
/// Fields are trimmed before parsing. Errors refer to the line as line 1.
pub fn parse_vector(line: &str, n_features: usize) -> Result<Array1<f64>> {
    let values = parse_fields(line.split(','), n_features, 1)?;
    Ok(Array1::from(values))
}

fn parse_fields<'a>(
    fields: impl Iterator<Item = &'a str>,
    n_features: usize,
    line: u64,
) -> Result<Vec<f64>> {
    let fields = fields.map(str::trim).collect::<Vec<_>>();
    if fields.len() != n_features {
        return Err(DatasetError::FieldCount {
            line,
            expected: n_features,
            found: fields.len(),
        });
    }

    fields
        .into_iter()
        .enumerate()
        .map(|(column, field)| {
            let value = field.parse::<f64>().map_err(|source| DatasetError::Parse {
                line,
                column: column + 1,
                field: field.to_string(),
                source,
            })?;
            if !value.is_finite() {
                return Err(DatasetError::NonFinite {
                    line,
                    column: column + 1,
                    field: field.to_string(),
                });
            }
            Ok(value)
        })
        .collect()
}

/// A row of a text source together with its line number
#[derive(Clone, Debug)]
pub struct TextRow {
    line: u64,
    record: StringRecord,
}

impl TextRow {
    /// 1-based line of the row in its source
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The row rendered back as comma separated text
    pub fn raw(&self) -> String {
        self.record.iter().collect::<Vec<_>>().join(",")
    }
}

/// Rows of a delimited text file
///
/// The rows are read eagerly with the `csv` reader (no header, records may have any length).
/// Empty lines are skipped. Field counts are only checked when the rows are parsed, so a preview
/// of malformed input is still possible.
#[derive(Clone, Debug)]
pub struct TextSource {
    origin: String,
    rows: Vec<TextRow>,
}

impl TextSource {
    /// Reads all rows of the file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TextSource> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        TextSource::from_reader(file, path.display().to_string())
    }

    /// Reads all rows from `reader`, `origin` names the source in error messages
    pub fn from_reader<R: Read>(reader: R, origin: impl Into<String>) -> Result<TextSource> {
        let origin = origin.into();
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| DatasetError::Read {
                origin: origin.clone(),
                source,
            })?;
            let line = record
                .position()
                .map(|pos| pos.line())
                .unwrap_or(rows.len() as u64 + 1);
            rows.push(TextRow { line, record });
        }
        debug!(origin = %origin, rows = rows.len(), "read text source");

        Ok(TextSource { origin, rows })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn rows(&self) -> &[TextRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `n` rows as raw text
    pub fn preview(&self, n: usize) -> Vec<String> {
        self.rows.iter().take(n).map(TextRow::raw).collect()
    }

    /// Parses every row into a `(nrows, n_features)` matrix, failing on the first invalid row
    pub fn parse(&self, n_features: usize) -> Result<Array2<f64>> {
        let mut values = Vec::with_capacity(self.rows.len() * n_features);
        for row in &self.rows {
            values.extend(parse_fields(row.record.iter(), n_features, row.line)?);
        }

        Ok(Array2::from_shape_vec((self.rows.len(), n_features), values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::io::Write;

    #[test]
    fn parses_fields_in_order() {
        let vector = parse_vector("5.1,3.5,1.4,0.2", 4).unwrap();
        assert_abs_diff_eq!(vector, array![5.1, 3.5, 1.4, 0.2]);

        let vector = parse_vector(" 1e3 , -2.5,0 ,7", 4).unwrap();
        assert_abs_diff_eq!(vector, array![1000., -2.5, 0., 7.]);
    }

    #[test]
    fn rejects_wrong_field_count() {
        match parse_vector("5.1,3.5,1.4", 4) {
            Err(DatasetError::FieldCount {
                line: 1,
                expected: 4,
                found: 3,
            }) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(parse_vector("5.1,3.5,1.4,0.2,Iris-setosa", 4).is_err());
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let err = parse_vector("5.1,abc,1.4,0.2", 4).unwrap_err();
        match &err {
            DatasetError::Parse { column, field, .. } => {
                assert_eq!(*column, 2);
                assert_eq!(field, "abc");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.to_string(), "line 1, field 2: `abc` is not a number");
    }

    #[test]
    fn rejects_nan_and_infinite_fields() {
        let lines = [
            ("NaN,3.5,1.4,0.2", 1),
            ("5.1,inf,1.4,0.2", 2),
            ("5.1,3.5,-infinity,0.2", 3),
        ];
        for (line, expected) in lines.iter() {
            match parse_vector(line, 4) {
                Err(DatasetError::NonFinite { line: 1, column, .. }) => assert_eq!(column, *expected),
                other => panic!("unexpected result {:?}", other),
            }
        }

        let source = TextSource::from_reader("1,2\nNaN,1\n".as_bytes(), "inline").unwrap();
        match source.parse(2) {
            Err(DatasetError::NonFinite {
                line: 2,
                column: 1,
                field,
            }) => assert_eq!(field, "NaN"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn text_source_keeps_line_numbers() {
        let text = "1,2\n3,4\n\n5,x\n";
        let source = TextSource::from_reader(text.as_bytes(), "inline").unwrap();

        assert_eq!(source.len(), 3);
        assert_eq!(source.preview(2), vec!["1,2".to_string(), "3,4".to_string()]);
        assert_eq!(
            source.rows().iter().map(TextRow::line).collect::<Vec<_>>(),
            vec![1, 2, 4]
        );

        match source.parse(2) {
            Err(DatasetError::Parse { line: 4, .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn text_source_parses_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "5.1,3.5,1.4,0.2").unwrap();
        writeln!(file, "4.9,3.0,1.4,0.2").unwrap();
        writeln!(file, "6.3,3.3,6.0,2.5").unwrap();

        let source = TextSource::open(file.path()).unwrap();
        let records = source.parse(4).unwrap();
        assert_eq!(records.dim(), (3, 4));
        assert_abs_diff_eq!(records.row(2), array![6.3, 3.3, 6.0, 2.5]);
    }

    #[test]
    fn empty_source_parses_to_empty_matrix() {
        let source = TextSource::from_reader("".as_bytes(), "empty").unwrap();
        assert!(source.is_empty());
        assert_eq!(source.parse(4).unwrap().dim(), (0, 4));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TextSource::open(dir.path().join("missing.data"));
        assert!(matches!(result, Err(DatasetError::Io { .. })));
    }
}
