use crate::core::{truncate_chars, RankedPaper};
use crate::query::{QuerySettings, SearchContext};
use crate::retrieval::RetrievalClient;
use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use std::time::Instant;

pub const NO_RESULTS: &str = "No results";

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly table
    Table,
    /// Machine-readable JSON
    Json,
}

pub async fn search<C: RetrievalClient>(
    ctx: &SearchContext<C>,
    settings: &QuerySettings,
    format: OutputFormat,
) -> Result<()> {
    let started = Instant::now();
    let results = ctx.run(settings).await?;

    match format {
        OutputFormat::Table => {
            println!("{}", format_results_table(&results));
            if !results.is_empty() {
                crate::blog!(
                    "Found",
                    "{} result(s) in {:.2}s",
                    results.len(),
                    started.elapsed().as_secs_f64()
                );
            }
        }
        OutputFormat::Json => println!("{}", format_results_json(&results)?),
    }
    Ok(())
}

pub(crate) fn format_results_table(results: &[RankedPaper]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Authors").add_attribute(Attribute::Bold),
        Cell::new("Year").add_attribute(Attribute::Bold),
        Cell::new("Venue").add_attribute(Attribute::Bold),
        Cell::new("Score").add_attribute(Attribute::Bold),
    ]);

    for paper in results {
        let record = &paper.record;
        table.add_row(vec![
            Cell::new(paper.rank),
            Cell::new(truncate_chars(&record.title, 60)),
            Cell::new(truncate_chars(&record.short_authors(), 40)),
            Cell::new(record.year),
            Cell::new(truncate_chars(&record.venue, 40)),
            Cell::new(format!("{:.4}", paper.score)),
        ]);
    }

    table.to_string()
}

pub(crate) fn format_results_json(results: &[RankedPaper]) -> Result<String> {
    serde_json::to_string_pretty(results).context("Failed to serialize results to JSON")
}

/// Full view of one result, used by the REPL.
pub(crate) fn format_result_detail(paper: &RankedPaper) -> String {
    let record = &paper.record;
    let rule = "═".repeat(80);
    let mut out = format!(
        "{rule}\nRank: {}\nTitle: {}\nAuthors: {}\nYear: {}\n",
        paper.rank, record.title, record.authors, record.year
    );
    if !record.venue.is_empty() {
        out.push_str(&format!("Venue: {}\n", record.venue));
    }
    if let Some(url) = &record.url {
        out.push_str(&format!("URL: {}\n", url));
    }
    out.push_str(&format!(
        "Score: {:.4}\n\nAbstract:\n{}\n{rule}",
        paper.score, record.abstract_text
    ));
    out
}
