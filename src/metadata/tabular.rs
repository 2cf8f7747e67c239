use super::error::DataLoadError;
use super::source::RawRow;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;

struct Columns {
    key: Option<usize>,
    title: Option<usize>,
    year: usize,
    author: Option<usize>,
    booktitle: Option<usize>,
    journal: Option<usize>,
    abstract_text: usize,
    url: Option<usize>,
    doi: Option<usize>,
    publisher: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord, need_publisher: bool) -> Result<Self, DataLoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

        let columns = Columns {
            key: find("ID"),
            title: find("title"),
            year: find("year").ok_or(DataLoadError::MissingColumn("year"))?,
            author: find("author"),
            booktitle: find("booktitle"),
            journal: find("journal"),
            abstract_text: find("abstract").ok_or(DataLoadError::MissingColumn("abstract"))?,
            url: find("url"),
            doi: find("doi"),
            publisher: find("publisher"),
        };

        if need_publisher && columns.publisher.is_none() {
            return Err(DataLoadError::MissingColumn("publisher"));
        }
        Ok(columns)
    }

    fn row(&self, record: &StringRecord) -> RawRow {
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::to_string);
        RawRow {
            key: get(self.key),
            title: get(self.title),
            year: get(Some(self.year)),
            author: get(self.author),
            booktitle: get(self.booktitle),
            journal: get(self.journal),
            abstract_text: get(Some(self.abstract_text)),
            url: get(self.url),
            doi: get(self.doi),
            publisher: get(self.publisher),
        }
    }
}

/// Reads the tabular export (one paper per row, header line required).
pub(crate) fn read_rows<R: Read>(reader: R, need_publisher: bool) -> Result<Vec<RawRow>, DataLoadError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let columns = Columns::from_headers(reader.headers()?, need_publisher)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(columns.row(&record?));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_known_columns_in_any_order() {
        let data = "year,abstract,title,ID,url\n2019,\"Some, quoted abstract\",A Title,p19-1,https://x\n";
        let rows = read_rows(data.as_bytes(), false).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year.as_deref(), Some("2019"));
        assert_eq!(rows[0].abstract_text.as_deref(), Some("Some, quoted abstract"));
        assert_eq!(rows[0].key.as_deref(), Some("p19-1"));
        assert!(rows[0].author.is_none());
    }

    #[test]
    fn missing_abstract_column_is_rejected() {
        let err = read_rows("title,year\nA,2019\n".as_bytes(), false).err().unwrap();
        assert!(matches!(err, DataLoadError::MissingColumn("abstract")));
    }

    #[test]
    fn missing_year_column_is_rejected() {
        let err = read_rows("title,abstract\nA,x\n".as_bytes(), false).err().unwrap();
        assert!(matches!(err, DataLoadError::MissingColumn("year")));
    }

    #[test]
    fn publisher_required_when_filtering() {
        let err = read_rows("year,abstract\n2019,x\n".as_bytes(), true).err().unwrap();
        assert!(matches!(err, DataLoadError::MissingColumn("publisher")));
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let err = read_rows("year,abstract\n2019,x,extra\n".as_bytes(), false).err().unwrap();
        assert!(matches!(err, DataLoadError::Csv(_)));
    }
}
