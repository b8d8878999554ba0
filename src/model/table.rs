use std::io;

use csv::{ReaderBuilder, WriterBuilder};

use crate::model::error::CsvBucketError;

/// In-memory rows of a CSV object. The first line is always taken as the header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Every row must have as many fields as the header; ragged input is an
    /// error, never truncated or padded.
    pub fn parse_csv(bytes: &[u8]) -> Result<Table, CsvBucketError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        let headers = rdr
            .headers()
            .map_err(CsvBucketError::Parse)?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(CsvBucketError::Parse)?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Table { headers, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn write_csv<W: io::Write>(&self, out: W) -> Result<(), csv::Error> {
        let mut wtr = WriterBuilder::new().from_writer(out);

        if !self.headers.is_empty() {
            wtr.write_record(&self.headers)?;
        }
        for row in &self.rows {
            wtr.write_record(row)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let table = Table::parse_csv(b"campaign,opens\nspring,120\nsummer,98\n").unwrap();

        assert_eq!(table.headers, vec!["campaign", "opens"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.rows[1], vec!["summer", "98"]);
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let table = Table::parse_csv(b"subject,clicks\n\"Hello, world\",3\n").unwrap();

        assert_eq!(table.rows[0][0], "Hello, world");
    }

    #[test]
    fn test_parse_csv_ragged_rows() {
        let res = Table::parse_csv(b"a,b,c\n1,2,3\n4,5\n6,7,8\n");
        assert!(matches!(res, Err(CsvBucketError::Parse(_))));

        let res = Table::parse_csv(b"a,b\n1,2,3\n");
        assert!(matches!(res, Err(CsvBucketError::Parse(_))));
    }

    #[test]
    fn test_parse_csv_invalid_utf8() {
        let res = Table::parse_csv(b"a,b\n1,\xff\xfe\n");
        assert!(matches!(res, Err(CsvBucketError::Parse(_))));
    }

    #[test]
    fn test_parse_csv_empty() {
        let table = Table::parse_csv(b"").unwrap();

        assert!(table.headers.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_write_csv() {
        let table = Table::parse_csv(b"subject,clicks\n\"Hello, world\",3\n").unwrap();

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();

        assert_eq!(out, b"subject,clicks\n\"Hello, world\",3\n");
    }
}
