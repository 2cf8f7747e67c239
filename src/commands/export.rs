use crate::core::PaperRecord;
use crate::metadata::MetadataIndex;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct IndexDocument<'a> {
    document_id: String,
    content: &'a str,
    document_metadata: DocumentMetadata<'a>,
}

#[derive(Serialize)]
struct DocumentMetadata<'a> {
    record_id: String,
    title: &'a str,
    year: i64,
}

impl<'a> From<&'a PaperRecord> for IndexDocument<'a> {
    fn from(record: &'a PaperRecord) -> Self {
        let id = record.id.to_string();
        IndexDocument {
            document_id: id.clone(),
            content: &record.abstract_text,
            document_metadata: DocumentMetadata {
                record_id: id,
                title: &record.title,
                year: record.year,
            },
        }
    }
}

/// Writes one JSON document per record for the external index builder.
/// Returns the number of documents written.
pub fn write_documents<W: Write>(metadata: &MetadataIndex, mut out: W) -> Result<usize> {
    let mut written = 0;
    for record in metadata.records() {
        serde_json::to_writer(&mut out, &IndexDocument::from(record))?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

pub fn export(metadata: &MetadataIndex, output: Option<&Path>) -> Result<()> {
    let written = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let written = write_documents(metadata, BufWriter::new(file))?;
            crate::blog!("Exported", "{} documents to {}", written, path.display());
            written
        }
        None => write_documents(metadata, io::stdout().lock())?,
    };
    tracing::debug!(written, "export finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordId;

    fn record(title: &str, year: i64, abstract_text: &str) -> PaperRecord {
        PaperRecord::new(
            Some(title.to_lowercase()),
            title.to_string(),
            year,
            "A. Author".to_string(),
            "ACL".to_string(),
            abstract_text.to_string(),
            None,
        )
    }

    #[test]
    fn one_line_per_record_with_ids() {
        let index = MetadataIndex::from_records(vec![
            record("Alpha", 2015, "alpha abstract"),
            record("Beta", 2019, "beta abstract"),
        ]);
        let mut buf = Vec::new();
        let written = write_documents(&index, &mut buf).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let first = &lines[0];
        assert_eq!(first["content"], "alpha abstract");
        assert_eq!(first["document_metadata"]["title"], "Alpha");
        assert_eq!(first["document_metadata"]["year"], 2015);
        assert_eq!(first["document_id"], first["document_metadata"]["record_id"]);

        let id: RecordId = first["document_id"].as_str().unwrap().parse().unwrap();
        assert_eq!(id, RecordId::from_content("Alpha", 2015, "alpha abstract"));
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.jsonl");
        let index = MetadataIndex::from_records(vec![record("Gamma", 2021, "gamma abstract")]);

        export(&index, Some(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("gamma abstract"));
    }
}
