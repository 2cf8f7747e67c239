mod error;
pub use error::BibtexError;

use crate::core::clean_text;
use biblatex::{Bibliography, Chunk, Entry, Spanned};
use std::collections::BTreeMap;

/// A BibTeX entry flattened to plain strings, one value per field.
#[derive(Debug, Clone, PartialEq)]
pub struct BibEntry {
    pub entry_type: String,
    pub key: String,
    pub fields: BTreeMap<String, String>,
}

impl BibEntry {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    fn from_entry(entry: &Entry) -> Self {
        let fields = entry
            .fields
            .iter()
            .map(|(name, value)| (name.to_lowercase(), clean_text(&format_field_value(value))))
            .collect();

        BibEntry {
            entry_type: format!("{:?}", entry.entry_type).to_lowercase(),
            key: entry.key.clone(),
            fields,
        }
    }
}

/// Parses every entry of a bibliography, keeping source order.
pub fn parse_bibliography(src: &str) -> Result<Vec<BibEntry>, BibtexError> {
    let bibliography =
        Bibliography::parse(src).map_err(|e| BibtexError::ParseFailed(format!("{:?}", e)))?;

    let entries: Vec<BibEntry> = bibliography
        .into_iter()
        .map(|entry| BibEntry::from_entry(&entry))
        .collect();
    if entries.is_empty() {
        return Err(BibtexError::NoEntries);
    }
    Ok(entries)
}

/// A field value is a list of spanned chunks; join them into one string.
fn format_field_value(value: &[Spanned<Chunk>]) -> String {
    value
        .iter()
        .map(|spanned_chunk| match &spanned_chunk.v {
            Chunk::Normal(s) => s.clone(),
            Chunk::Verbatim(s) => s.clone(),
            Chunk::Math(s) => format!("${}$", s),
        })
        .collect::<Vec<String>>()
        .join("")
}
