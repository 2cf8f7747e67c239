//! In-memory metadata for the indexed papers.
//!
//! Built once at startup from the CSV or BibTeX export and never mutated. Hits from
//! the retrieval engine are joined back to records here, by surrogate id when the
//! engine carries one and by normalized abstract text otherwise.

mod tabular;
mod error;
mod source;

pub use error::DataLoadError;
pub use source::{CorpusFilter, LoadReport, ACL_PUBLISHERS};

use crate::bibtex::{self, BibEntry};
use crate::core::{normalize_text, PaperRecord, RecordId};
use indexmap::IndexMap;
use source::{build_record, RawRow, RowOutcome};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Join key between a retrieval hit and a metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Id(RecordId),
    Text(String),
    /// A retrieval hit: the id it carries, falling back to its text when the id
    /// is absent or unknown to this source.
    Hit { id: Option<RecordId>, text: String },
}

impl RecordKey {
    pub fn text(content: impl AsRef<str>) -> Self {
        RecordKey::Text(content.as_ref().to_string())
    }
}

#[derive(Debug, Default)]
pub struct MetadataIndex {
    records: IndexMap<RecordId, PaperRecord>,
    by_text: HashMap<String, RecordId>,
    by_year: BTreeMap<i64, Vec<RecordId>>,
}

impl MetadataIndex {
    /// Loads `path` (`.csv` or `.bib`), keeping only the rows `filter` admits.
    pub fn load(path: &Path, filter: &CorpusFilter) -> Result<(Self, LoadReport), DataLoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let rows = match extension.as_str() {
            "csv" => {
                let file = fs::File::open(path).map_err(|source| DataLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                tabular::read_rows(file, filter.requires_publisher())?
            }
            "bib" => {
                let src = fs::read_to_string(path).map_err(|source| DataLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let entries = bibtex::parse_bibliography(&src)
                    .map_err(|e| DataLoadError::Bibtex(e.to_string()))?;
                if filter.requires_publisher()
                    && !entries.iter().any(|entry| entry.get("publisher").is_some())
                {
                    return Err(DataLoadError::MissingColumn("publisher"));
                }
                entries.into_iter().map(row_from_bib).collect()
            }
            other => return Err(DataLoadError::UnsupportedFormat(other.to_string())),
        };

        Self::from_rows(rows, filter)
    }

    pub(crate) fn from_rows(
        rows: Vec<RawRow>,
        filter: &CorpusFilter,
    ) -> Result<(Self, LoadReport), DataLoadError> {
        let mut index = MetadataIndex::default();
        let mut report = LoadReport::default();

        for (i, raw) in rows.into_iter().enumerate() {
            match build_record(i + 1, raw, filter)? {
                RowOutcome::NoAbstract => report.skipped_no_abstract += 1,
                RowOutcome::Filtered => report.skipped_by_filter += 1,
                RowOutcome::Record(record) => index.insert(record, &mut report),
            }
        }

        Ok((index, report))
    }

    pub fn from_records(records: impl IntoIterator<Item = PaperRecord>) -> Self {
        let mut index = MetadataIndex::default();
        let mut report = LoadReport::default();
        for record in records {
            index.insert(record, &mut report);
        }
        index
    }

    fn insert(&mut self, record: PaperRecord, report: &mut LoadReport) {
        if self.records.contains_key(&record.id) {
            report.duplicates += 1;
            return;
        }

        let text_key = normalize_text(&record.abstract_text);
        if self.by_text.contains_key(&text_key) {
            // First-loaded record keeps the text key; the newcomer is reachable by id only.
            report.shared_abstracts += 1;
        } else {
            self.by_text.insert(text_key, record.id);
        }

        self.by_year.entry(record.year).or_default().push(record.id);
        self.records.insert(record.id, record);
        report.loaded += 1;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&PaperRecord> {
        self.records.get(&id)
    }

    /// Records in load order.
    pub fn records(&self) -> impl Iterator<Item = &PaperRecord> {
        self.records.values()
    }

    pub fn resolve(&self, key: &RecordKey) -> Option<&PaperRecord> {
        match key {
            RecordKey::Id(id) => self.records.get(id),
            RecordKey::Text(text) => self.resolve_text(text),
            RecordKey::Hit { id, text } => id
                .and_then(|id| self.records.get(&id))
                .or_else(|| self.resolve_text(text)),
        }
    }

    fn resolve_text(&self, text: &str) -> Option<&PaperRecord> {
        self.by_text
            .get(&normalize_text(text))
            .and_then(|id| self.records.get(id))
    }

    /// Resolves one key, dropping it if it is unknown or older than `min_year`.
    /// A `min_year` of zero or below disables the year filter.
    pub fn resolve_filtered(&self, key: &RecordKey, min_year: i64) -> Option<&PaperRecord> {
        self.resolve(key)
            .filter(|record| record.published_since(min_year))
    }

    /// Resolves `keys` in order. Unknown and filtered keys are omitted, so the
    /// result may be shorter than the input; duplicated keys resolve independently.
    pub fn resolve_many(&self, keys: &[RecordKey], min_year: i64) -> Vec<&PaperRecord> {
        self.resolve_tagged(keys.iter().map(|key| (key, ())), min_year)
            .into_iter()
            .map(|(record, _)| record)
            .collect()
    }

    /// `resolve_many` over keys that carry a value (a score, say) through the join.
    pub fn resolve_tagged<'k, T>(
        &self,
        keys: impl IntoIterator<Item = (&'k RecordKey, T)>,
        min_year: i64,
    ) -> Vec<(&PaperRecord, T)> {
        keys.into_iter()
            .filter_map(|(key, tag)| self.resolve_filtered(key, min_year).map(|r| (r, tag)))
            .collect()
    }

    pub fn year_range(&self) -> Option<(i64, i64)> {
        let first = self.by_year.keys().next()?;
        let last = self.by_year.keys().next_back()?;
        Some((*first, *last))
    }

    pub fn count_since(&self, min_year: i64) -> usize {
        self.by_year
            .range(min_year..)
            .map(|(_, ids)| ids.len())
            .sum()
    }

    /// Record counts per year, most recent first.
    pub fn year_histogram(&self) -> Vec<(i64, usize)> {
        self.by_year
            .iter()
            .rev()
            .map(|(year, ids)| (*year, ids.len()))
            .collect()
    }
}

fn row_from_bib(entry: BibEntry) -> RawRow {
    let field = |name: &str| entry.get(name).map(str::to_string);
    RawRow {
        key: Some(entry.key.clone()),
        title: field("title"),
        year: field("year"),
        author: field("author"),
        booktitle: field("booktitle"),
        journal: field("journal"),
        abstract_text: field("abstract"),
        url: field("url"),
        doi: field("doi"),
        publisher: field("publisher"),
    }
}
