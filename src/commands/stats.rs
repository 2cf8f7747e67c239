use crate::metadata::MetadataIndex;
use std::fmt::{self, Write};

pub fn show_stats(metadata: &MetadataIndex, min_year: i64) -> anyhow::Result<()> {
    let mut out = String::new();
    render_stats(&mut out, metadata, min_year)?;
    print!("{}", out);
    Ok(())
}

fn render_stats(out: &mut impl Write, metadata: &MetadataIndex, min_year: i64) -> fmt::Result {
    writeln!(out, "\nCorpus Statistics:")?;
    writeln!(out, "  Total papers: {}", metadata.len())?;

    if let Some((min, max)) = metadata.year_range() {
        writeln!(out, "  Year range: {} - {}", min, max)?;
    }
    if min_year > 0 {
        writeln!(
            out,
            "  Since {}: {} paper(s)",
            min_year,
            metadata.count_since(min_year)
        )?;
    }

    let histogram = metadata.year_histogram();
    if !histogram.is_empty() {
        writeln!(out, "\n  Papers by year:")?;
        for (year, count) in histogram.iter().take(10) {
            writeln!(out, "    {}: {} paper(s)", year, count)?;
        }
    }
    Ok(())
}
