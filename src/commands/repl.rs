use super::search::format_result_detail;
use crate::core::RankedPaper;
use crate::query::{QuerySettings, SearchContext};
use crate::retrieval::RetrievalClient;
use crate::ui::StatusUI;
use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::error;

const HELP: &str = "Commands:
  <query>       - Search for papers
  /k N          - Return at most N results
  /year Y       - Only show papers published in Y or later
  /year clear   - Clear the year filter
  /settings     - Show the current settings
  /detail N     - Show the full record for result N
  /open N       - Open result N in the browser
  /yank N       - Copy a citation for result N
  /help         - Show this help
  /quit         - Exit (also Ctrl+D or Ctrl+C)";

#[derive(Debug, PartialEq)]
enum Message {
    Query(String),
    SetK(usize),
    SetYear(i64),
    ClearYear,
    Settings,
    Detail(usize),
    Open(usize),
    Yank(usize),
    Help,
    Quit,
}

/// Turns one input line into a message. `Ok(None)` means there is nothing to do.
fn parse_line(line: &str) -> Result<Option<Message>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(Message::Query(line.to_string())));
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let message = match parts.as_slice() {
        ["/help"] => Message::Help,
        ["/quit"] | ["/exit"] => Message::Quit,
        ["/settings"] => Message::Settings,
        ["/k", n] => Message::SetK(parse_positive(n)?),
        ["/k", ..] => return Err("Usage: /k N".to_string()),
        ["/year", "clear"] => Message::ClearYear,
        ["/year", y] => match y.parse::<i64>() {
            Ok(year) if year >= 0 => Message::SetYear(year),
            _ => return Err(format!("Invalid year: {}", y)),
        },
        ["/year", ..] => return Err("Usage: /year Y  or  /year clear".to_string()),
        ["/detail", n] => Message::Detail(parse_positive(n)?),
        ["/open", n] => Message::Open(parse_positive(n)?),
        ["/yank", n] => Message::Yank(parse_positive(n)?),
        [cmd @ ("/detail" | "/open" | "/yank"), ..] => return Err(format!("Usage: {} N", cmd)),
        [cmd, ..] => {
            return Err(format!(
                "Unknown command: {}. Type /help for available commands.",
                cmd
            ))
        }
        [] => return Ok(None),
    };
    Ok(Some(message))
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid number: {} (must be a positive integer)", raw)),
    }
}

struct Session {
    k: usize,
    min_year: i64,
    last_results: Vec<RankedPaper>,
}

impl Session {
    fn settings_line(&self) -> String {
        let year = if self.min_year > 0 {
            self.min_year.to_string()
        } else {
            "any".to_string()
        };
        format!("k = {}, min year = {}", self.k, year)
    }

    fn result(&self, rank: usize) -> Result<&RankedPaper, String> {
        self.last_results.get(rank - 1).ok_or_else(|| {
            format!(
                "Rank {} out of range (last search had {} results)",
                rank,
                self.last_results.len()
            )
        })
    }
}

pub async fn repl<C: RetrievalClient>(ctx: &SearchContext<C>, k: usize, min_year: i64) -> Result<()> {
    println!("ACL Anthology search ({} papers)", ctx.metadata().len());
    println!("{}\n", HELP);

    let mut rl = DefaultEditor::new().context("Failed to create readline editor")?;
    let mut session = Session {
        k,
        min_year,
        last_results: Vec::new(),
    };

    loop {
        let line = match rl.readline("Search> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        };
        rl.add_history_entry(line.as_str()).ok();

        match parse_line(&line) {
            Ok(Some(Message::Quit)) => break,
            Ok(Some(message)) => update(ctx, &mut session, message).await,
            Ok(None) => {}
            Err(usage) => StatusUI::warning(&usage),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn format_result_lines(results: &[RankedPaper], width: u16) -> String {
    if results.is_empty() {
        return "No results".to_string();
    }
    results
        .iter()
        .map(|r| format!("{:>3}. {}", r.rank, r.record.display(width.saturating_sub(5))))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn update<C: RetrievalClient>(ctx: &SearchContext<C>, session: &mut Session, message: Message) {
    match message {
        Message::Query(text) => {
            let settings = match QuerySettings::new(text, session.k as i64, session.min_year) {
                Ok(settings) => settings,
                Err(e) => return StatusUI::warning(&e.to_string()),
            };
            match ctx.run(&settings).await {
                Ok(results) => {
                    let (width, _) = termion::terminal_size().unwrap_or((80, 24));
                    println!("{}", format_result_lines(&results, width));
                    session.last_results = results;
                }
                Err(e) => StatusUI::error(&e.to_string()),
            }
        }
        Message::SetK(k) => {
            session.k = k;
            StatusUI::info(&session.settings_line());
        }
        Message::SetYear(year) => {
            session.min_year = year;
            StatusUI::info(&session.settings_line());
        }
        Message::ClearYear => {
            session.min_year = 0;
            StatusUI::info(&session.settings_line());
        }
        Message::Settings => StatusUI::info(&session.settings_line()),
        Message::Help => println!("{}", HELP),
        Message::Detail(rank) => match session.result(rank) {
            Ok(paper) => println!("{}", format_result_detail(paper)),
            Err(e) => StatusUI::warning(&e),
        },
        Message::Open(rank) => match session.result(rank) {
            Ok(paper) => match &paper.record.url {
                Some(url) => match webbrowser::open(url) {
                    Ok(()) => StatusUI::success(&format!("Opened {}", url)),
                    Err(e) => StatusUI::error(&format!("Failed to open: {}", e)),
                },
                None => StatusUI::warning("No URL available"),
            },
            Err(e) => StatusUI::warning(&e),
        },
        Message::Yank(rank) => match session.result(rank) {
            Ok(paper) => match arboard::Clipboard::new()
                .and_then(|mut clipboard| clipboard.set_text(paper.record.citation()))
            {
                Ok(()) => StatusUI::success("Citation copied!"),
                Err(e) => StatusUI::error(&format!("Failed to copy: {}", e)),
            },
            Err(e) => StatusUI::warning(&e),
        },
        Message::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_queries() {
        assert_eq!(
            parse_line("  neural machine translation "),
            Ok(Some(Message::Query("neural machine translation".to_string())))
        );
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn settings_commands() {
        assert_eq!(parse_line("/k 10"), Ok(Some(Message::SetK(10))));
        assert_eq!(parse_line("/year 2018"), Ok(Some(Message::SetYear(2018))));
        assert_eq!(parse_line("/year clear"), Ok(Some(Message::ClearYear)));
        assert_eq!(parse_line("/settings"), Ok(Some(Message::Settings)));
        assert_eq!(parse_line("/quit"), Ok(Some(Message::Quit)));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(parse_line("/k 0").is_err());
        assert!(parse_line("/k -3").is_err());
        assert!(parse_line("/k").is_err());
        assert!(parse_line("/year soon").is_err());
        assert!(parse_line("/year -1").is_err());
        assert!(parse_line("/detail").is_err());
    }

    #[test]
    fn result_commands_take_a_rank() {
        assert_eq!(parse_line("/detail 2"), Ok(Some(Message::Detail(2))));
        assert_eq!(parse_line("/open 1"), Ok(Some(Message::Open(1))));
        assert_eq!(parse_line("/yank 3"), Ok(Some(Message::Yank(3))));
        assert!(parse_line("/open zero").is_err());
    }

    #[test]
    fn unknown_commands_point_to_help() {
        let err = parse_line("/frobnicate").unwrap_err();
        assert!(err.contains("/help"));
    }

    #[test]
    fn results_are_listed_one_per_line() {
        use crate::core::PaperRecord;
        let paper = |title: &str, year| RankedPaper {
            rank: 0,
            score: 1.0,
            record: PaperRecord::new(
                None,
                title.to_string(),
                year,
                "Doe, Jane and Roe, Rick".to_string(),
                "ACL".to_string(),
                format!("abstract of {}", title),
                None,
            ),
        };
        let mut results = vec![paper("Neural Parsing", 2019), paper("Tagging", 2021)];
        results[0].rank = 1;
        results[1].rank = 2;

        let listing = format_result_lines(&results, 80);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1. 2019"));
        assert!(lines[0].contains("Doe and Roe"));
        assert!(lines[0].contains("Neural Parsing"));
        assert!(lines[1].starts_with("  2. 2021"));
        assert_eq!(format_result_lines(&[], 80), "No results");
    }

    #[test]
    fn ranks_are_checked_against_last_results() {
        let session = Session {
            k: 5,
            min_year: 0,
            last_results: Vec::new(),
        };
        assert!(session.result(1).unwrap_err().contains("out of range"));
        assert_eq!(session.settings_line(), "k = 5, min year = any");
    }
}
