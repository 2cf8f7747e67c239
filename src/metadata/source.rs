use super::error::DataLoadError;
use crate::core::{doi_url, PaperRecord};
use serde::{Deserialize, Serialize};

/// Publisher spellings used by the ACL Anthology export for ACL-published venues.
pub const ACL_PUBLISHERS: [&str; 4] = [
    "Association for Computational Linguistics",
    "The Association for Computational Linguistics",
    "ACL",
    "Association of Computational Linguistics",
];

/// Restricts the loaded corpus to the subset the retrieval index was built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusFilter {
    /// Keep only records published strictly after this year.
    pub after_year: Option<i64>,
    /// Keep only records from these publishers; empty keeps everything.
    pub publishers: Vec<String>,
}

impl Default for CorpusFilter {
    fn default() -> Self {
        CorpusFilter {
            after_year: Some(2010),
            publishers: ACL_PUBLISHERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl CorpusFilter {
    pub fn none() -> Self {
        CorpusFilter {
            after_year: None,
            publishers: Vec::new(),
        }
    }

    pub fn requires_publisher(&self) -> bool {
        !self.publishers.is_empty()
    }

    fn admits(&self, year: i64, publisher: Option<&str>) -> bool {
        if let Some(after) = self.after_year {
            if year <= after {
                return false;
            }
        }
        if self.publishers.is_empty() {
            return true;
        }
        publisher
            .map(|p| self.publishers.iter().any(|allowed| allowed == p.trim()))
            .unwrap_or(false)
    }
}

/// One row of the metadata source before validation.
#[derive(Debug, Default, Clone)]
pub(crate) struct RawRow {
    pub key: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub author: Option<String>,
    pub booktitle: Option<String>,
    pub journal: Option<String>,
    pub abstract_text: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
    pub publisher: Option<String>,
}

/// What happened to each row while the index was built.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_no_abstract: usize,
    pub skipped_by_filter: usize,
    pub duplicates: usize,
    pub shared_abstracts: usize,
}

pub(crate) enum RowOutcome {
    Record(PaperRecord),
    NoAbstract,
    Filtered,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_year(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i64>() {
        return Some(year);
    }
    // Spreadsheet exports sometimes write integral columns as "2015.0".
    raw.parse::<f64>()
        .ok()
        .filter(|y| y.fract() == 0.0 && y.is_finite())
        .map(|y| y as i64)
}

/// Validates one row and turns it into a record. `row` is 1-based for messages.
pub(crate) fn build_record(
    row: usize,
    raw: RawRow,
    filter: &CorpusFilter,
) -> Result<RowOutcome, DataLoadError> {
    let abstract_text = match non_empty(raw.abstract_text) {
        Some(text) => text,
        None => return Ok(RowOutcome::NoAbstract),
    };

    let year_raw = raw.year.unwrap_or_default();
    let year = parse_year(&year_raw).ok_or_else(|| DataLoadError::InvalidYear {
        row,
        value: year_raw.clone(),
    })?;

    let publisher = non_empty(raw.publisher);
    if !filter.admits(year, publisher.as_deref()) {
        return Ok(RowOutcome::Filtered);
    }

    let venue = non_empty(raw.booktitle)
        .or_else(|| non_empty(raw.journal))
        .unwrap_or_default();

    Ok(RowOutcome::Record(PaperRecord::new(
        non_empty(raw.key),
        non_empty(raw.title).unwrap_or_default(),
        year,
        non_empty(raw.author).unwrap_or_default(),
        venue,
        abstract_text,
        non_empty(raw.url).or_else(|| raw.doi.as_deref().and_then(doi_url)),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: &str, abstract_text: Option<&str>, publisher: Option<&str>) -> RawRow {
        RawRow {
            title: Some("Title".to_string()),
            year: Some(year.to_string()),
            abstract_text: abstract_text.map(str::to_string),
            publisher: publisher.map(str::to_string),
            journal: Some("TACL".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn rows_without_abstract_are_skipped() {
        let outcome = build_record(1, row("2015", Some("  "), None), &CorpusFilter::none()).unwrap();
        assert!(matches!(outcome, RowOutcome::NoAbstract));
    }

    #[test]
    fn bad_year_is_an_error() {
        let err = build_record(7, row("soon", Some("text"), None), &CorpusFilter::none())
            .err()
            .unwrap();
        assert!(matches!(err, DataLoadError::InvalidYear { row: 7, .. }));
    }

    #[test]
    fn float_years_are_accepted() {
        match build_record(1, row("2015.0", Some("text"), None), &CorpusFilter::none()).unwrap() {
            RowOutcome::Record(record) => {
                assert_eq!(record.year, 2015);
                assert_eq!(record.venue, "TACL");
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn doi_fills_in_a_missing_url() {
        let mut raw = row("2016", Some("text"), None);
        raw.doi = Some("10.18653/v1/W16-1001".to_string());
        match build_record(1, raw, &CorpusFilter::none()).unwrap() {
            RowOutcome::Record(record) => assert_eq!(
                record.url.as_deref(),
                Some("https://doi.org/10.18653/v1/W16-1001")
            ),
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn default_filter_matches_acl_subset() {
        let filter = CorpusFilter::default();
        let acl = Some("Association for Computational Linguistics");
        assert!(matches!(
            build_record(1, row("2010", Some("t"), acl), &filter).unwrap(),
            RowOutcome::Filtered
        ));
        assert!(matches!(
            build_record(1, row("2011", Some("t"), Some("Springer")), &filter).unwrap(),
            RowOutcome::Filtered
        ));
        assert!(matches!(
            build_record(1, row("2011", Some("t"), acl), &filter).unwrap(),
            RowOutcome::Record(_)
        ));
    }
}
