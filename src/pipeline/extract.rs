use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};

/// One unvalidated row as read from a source file. Field values are raw
/// strings keyed by column header; blank cells are kept as empty strings
/// until the cleaning stage decides what missing means.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// 1-based line number in the source file (the header is line 1)
    pub line: usize,
    pub fields: BTreeMap<String, String>,
}

impl RawRecord {
    /// Returns the trimmed value for a column, or None when the column is
    /// absent or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Lazy reader over one delimited source file. Iteration yields rows in
/// file order; re-opening the same file yields the identical sequence.
pub struct CsvSource {
    path: PathBuf,
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<File>,
    next_line: usize,
}

impl std::fmt::Debug for CsvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSource")
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("next_line", &self.next_line)
            .finish()
    }
}

impl CsvSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| EtlError::SourceRead {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| EtlError::SourceRead {
                path: path.clone(),
                message: format!("Failed to read CSV header: {}", e),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(EtlError::SourceRead {
                path,
                message: "Source has no column header".to_string(),
            });
        }

        Ok(Self {
            path,
            headers,
            records: reader.into_records(),
            next_line: 2,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for CsvSource {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            // A row that cannot be parsed as tabular data is fatal
            Err(e) => return Some(Err(EtlError::Csv(e))),
        };

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(self.next_line);
        self.next_line = line + 1;

        let fields = self
            .headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.to_string()))
            .collect();

        Some(Ok(RawRecord { line, fields }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_rows_keyed_by_header() {
        let file = write_csv("customer_id,name\nCUST-1, Asha \nCUST-2,Ravi\n");
        let source = CsvSource::open(file.path()).unwrap();
        let rows: Vec<RawRecord> = source.map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("customer_id"), Some("CUST-1"));
        // Values are trimmed on read
        assert_eq!(rows[0].get("name"), Some("Asha"));
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn blank_cells_read_as_missing() {
        let file = write_csv("customer_id,name,phone\n1,,98765\n");
        let mut source = CsvSource::open(file.path()).unwrap();
        let row = source.next().unwrap().unwrap();
        assert_eq!(row.get("name"), None);
        assert_eq!(row.get("missing_column"), None);
    }

    #[test]
    fn missing_file_is_a_source_read_error() {
        let err = CsvSource::open("no/such/file.csv").unwrap_err();
        assert!(matches!(err, EtlError::SourceRead { .. }));
    }

    #[test]
    fn rereading_the_same_file_yields_the_same_sequence() {
        let file = write_csv("id,name\n1,Asha\n2,Ravi\n3,Meena\n");

        let first: Vec<Vec<(String, String)>> = CsvSource::open(file.path())
            .unwrap()
            .map(|r| r.unwrap().fields.into_iter().collect())
            .collect();
        let second: Vec<Vec<(String, String)>> = CsvSource::open(file.path())
            .unwrap()
            .map(|r| r.unwrap().fields.into_iter().collect())
            .collect();

        assert_eq!(first, second);
    }
}
