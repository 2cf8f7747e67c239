use super::PrepareError;
use crate::bibtex::{parse_bibliography, BibEntry};
use std::io::Write;

/// Column order of the metadata table. `ENTRYTYPE` and `ID` come from the entry
/// itself, the rest are BibTeX fields.
pub const FIELDNAMES: [&str; 20] = [
    "ENTRYTYPE",
    "ID",
    "abstract",
    "address",
    "author",
    "booktitle",
    "doi",
    "editor",
    "isbn",
    "journal",
    "language",
    "month",
    "note",
    "number",
    "pages",
    "publisher",
    "title",
    "url",
    "volume",
    "year",
];

fn row(entry: &BibEntry) -> impl Iterator<Item = &str> {
    FIELDNAMES.iter().map(move |name| match *name {
        "ENTRYTYPE" => entry.entry_type.as_str(),
        "ID" => entry.key.as_str(),
        field => entry.get(field).unwrap_or(""),
    })
}

/// Converts BibTeX source into the CSV metadata table. Returns the number of rows.
pub fn bib_to_csv<W: Write>(bib_source: &str, out: W) -> Result<usize, PrepareError> {
    let entries = parse_bibliography(bib_source)?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(FIELDNAMES)?;
    for entry in &entries {
        writer.write_record(row(entry))?;
    }
    writer.flush().map_err(|source| PrepareError::Io {
        path: "<csv output>".into(),
        source,
    })?;
    Ok(entries.len())
}
