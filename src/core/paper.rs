use super::id::RecordId;
use super::text::truncate_chars;
use serde::{Deserialize, Serialize};
use termion::color;

/// Metadata for one paper, built once when the source is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: RecordId,
    pub key: Option<String>,
    pub title: String,
    pub year: i64,
    pub authors: String,
    pub venue: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: Option<String>,
}

impl PaperRecord {
    pub fn new(
        key: Option<String>,
        title: String,
        year: i64,
        authors: String,
        venue: String,
        abstract_text: String,
        url: Option<String>,
    ) -> Self {
        PaperRecord {
            id: RecordId::from_content(&title, year, &abstract_text),
            key,
            title,
            year,
            authors,
            venue,
            abstract_text,
            url,
        }
    }

    /// Year filter shared by every lookup path. A threshold of zero or below
    /// disables filtering.
    pub fn published_since(&self, min_year: i64) -> bool {
        min_year <= 0 || self.year >= min_year
    }

    /// Short author string: first author's last name plus "et al." for long lists.
    pub fn short_authors(&self) -> String {
        let names: Vec<&str> = self
            .authors
            .split(" and ")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        match names.len() {
            0 => String::new(),
            1 => names[0].to_string(),
            2 => format!("{} and {}", family_name(names[0]), family_name(names[1])),
            _ => format!("{} et al.", family_name(names[0])),
        }
    }

    /// One-line citation used by the REPL yank command.
    pub fn citation(&self) -> String {
        let mut line = format!("{} ({}). {}.", self.authors, self.year, self.title);
        if !self.venue.is_empty() {
            line.push_str(&format!(" {}.", self.venue));
        }
        if let Some(url) = &self.url {
            line.push_str(&format!(" {}", url));
        }
        line
    }

    /// Coloured `year | authors | title` line, with the title cut to fit `max_width`.
    pub fn display(&self, max_width: u16) -> String {
        let authors = self.short_authors();
        let mut display_string = format!(
            "{} {}|{} {} {}| ",
            self.year,
            color::Fg(color::Rgb(83, 110, 122)),
            color::Fg(color::Reset),
            authors,
            color::Fg(color::Rgb(83, 110, 122)),
        );
        let room = (max_width as usize).saturating_sub(4 + 2 + authors.chars().count() + 4);
        display_string.push_str(&format!(
            "{}{}",
            color::Fg(color::Reset),
            truncate_chars(&self.title, room.max(8)),
        ));
        display_string
    }
}

// "Last, First" or "First Last" both end up as "Last".
fn family_name(name: &str) -> &str {
    match name.split_once(',') {
        Some((last, _)) => last.trim(),
        None => name.rsplit(' ').next().unwrap_or(name),
    }
}

/// A resolved record in the order the retrieval engine ranked it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedPaper {
    pub rank: usize,
    pub score: f32,
    #[serde(flatten)]
    pub record: PaperRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(authors: &str) -> PaperRecord {
        PaperRecord::new(
            Some("doe-2020".to_string()),
            "A Study".to_string(),
            2020,
            authors.to_string(),
            "Proceedings of ACL".to_string(),
            "We study things.".to_string(),
            Some("https://aclanthology.org/2020.acl-main.1".to_string()),
        )
    }

    #[test]
    fn short_authors_follows_citation_conventions() {
        assert_eq!(record("Doe, Jane").short_authors(), "Doe, Jane");
        assert_eq!(record("Doe, Jane and Roe, Rick").short_authors(), "Doe and Roe");
        assert_eq!(
            record("Jane Doe and Rick Roe and Sam Poe").short_authors(),
            "Doe et al."
        );
        assert_eq!(record("").short_authors(), "");
    }

    #[test]
    fn zero_min_year_disables_filter() {
        let r = record("Doe, Jane");
        assert!(r.published_since(0));
        assert!(r.published_since(-5));
        assert!(r.published_since(2020));
        assert!(!r.published_since(2021));
    }

    #[test]
    fn citation_includes_venue_and_url() {
        let line = record("Doe, Jane").citation();
        assert_eq!(
            line,
            "Doe, Jane (2020). A Study. Proceedings of ACL. https://aclanthology.org/2020.acl-main.1"
        );
    }

    #[test]
    fn display_fits_long_titles_to_the_width() {
        let mut r = record("Doe, Jane and Roe, Rick");
        r.title = "A".repeat(200);
        let line = r.display(60);
        assert!(line.starts_with("2020 "));
        assert!(line.contains("Doe and Roe"));
        assert!(line.ends_with("..."));
        assert!(!line.contains(&"A".repeat(60)));
    }

    #[test]
    fn id_is_derived_from_content() {
        let a = record("Doe, Jane");
        let b = record("Someone Else");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn serializes_abstract_under_its_column_name() {
        let json = serde_json::to_value(record("Doe, Jane")).unwrap();
        assert_eq!(json["abstract"], "We study things.");
        assert!(json.get("abstract_text").is_none());
    }
}
