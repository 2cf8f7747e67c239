use regex::Regex;
use std::sync::OnceLock;

/// Canonical form used when abstract text has to serve as a join key.
///
/// Lowercases, drops control and zero-width characters and collapses runs of
/// whitespace. Matching on this form is best-effort: two abstracts that differ only
/// in encoding of the same glyph (e.g. a precomposed vs. combining accent) still
/// compare unequal.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !is_invisible(*c))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}')
}

/// Removes LaTeX markup left over from BibTeX fields and tidies whitespace.
pub fn clean_text(text: &str) -> String {
    text.replace("\\n", " ")
        .replace("\\t", " ")
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '\\'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical resolver link for a DOI, accepting bare DOIs as well as
/// `doi:` and `doi.org` forms.
pub fn doi_url(raw: &str) -> Option<String> {
    static DOI: OnceLock<Regex> = OnceLock::new();
    let re = DOI.get_or_init(|| {
        Regex::new(r"^\s*(?:doi:\s*|https?://(?:dx\.)?doi\.org/)?(10\.\d{4,9}/\S+?)\s*$")
            .expect("DOI pattern is valid")
    });
    re.captures(raw)
        .map(|caps| format!("https://doi.org/{}", &caps[1]))
}

/// Shortens `input` to at most `max_chars` characters, ending in "..." when cut.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let mut result: String = input.chars().take(max_chars - 3).collect();
    result.push_str("...");
    result
}
