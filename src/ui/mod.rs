mod macros;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use termion::color;

pub struct StatusUI;

impl StatusUI {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "!";
    pub const INFO: &'static str = "·";

    pub fn spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{prefix:.blue.bold} {spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "]),
        );
        pb.set_prefix(format!("{:>12}", "Working"));
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    pub fn download_progress(message: &str, total_size: u64) -> ProgressBar {
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.blue.bold} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb.set_prefix(format!("{:>12}", "Downloading"));
        pb.set_message(message.to_string());
        pb
    }

    pub fn finish_spinner_success(pb: ProgressBar, message: &str) {
        pb.finish_and_clear();
        Self::success(message);
    }

    pub fn finish_spinner_error(pb: ProgressBar, message: &str) {
        pb.finish_and_clear();
        Self::error(message);
    }

    pub fn finish_progress_success(pb: ProgressBar, message: &str) {
        pb.finish_and_clear();
        Self::success(message);
    }

    pub fn success(message: &str) {
        println!("{}", status_line(color::Green, Self::SUCCESS, message));
    }

    pub fn info(message: &str) {
        println!("{}", status_line(color::Blue, Self::INFO, message));
    }

    pub fn warning(message: &str) {
        eprintln!("{}", status_line(color::Yellow, Self::WARNING, message));
    }

    pub fn error(message: &str) {
        eprintln!("{}", status_line(color::Red, "Error", message));
    }

    /// A progress line under a category label, as printed by `blog!`.
    pub fn labelled(category: &str, message: &str) {
        println!("{}", status_line(color::Green, category, message));
    }

    /// Like `labelled`, in warning colours on stderr. Printed by `blog_warning!`.
    pub fn labelled_warning(category: &str, message: &str) {
        eprintln!("{}", status_line(color::Yellow, category, message));
    }

    pub fn format_file_size(bytes: usize) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = bytes as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", bytes, UNITS[0])
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

fn status_line<C: color::Color>(colour: C, label: &str, message: &str) -> String {
    format!(
        "{}{:>12}{} {}",
        color::Fg(colour),
        label,
        color::Fg(color::Reset),
        message
    )
}
