pub mod config;
pub mod fees;
pub mod history;
pub mod patent;
pub mod registry;
pub mod renewal;
pub mod report;
pub mod session;

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Command;
use clap_complete::Shell;
use colored::Colorize;
use unicode_segmentation::UnicodeSegmentation;

/// Placeholder printed for a missing value, also used by the registry API.
pub const ABSENT: &str = "-";

/// Date format used for all printed and exported dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format date as `yyyy-mm-dd`, or the absent placeholder.
#[must_use]
pub fn date_or_absent(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| ABSENT.to_string(), |date| date.format(DATE_FORMAT).to_string())
}

/// Format an integer with a comma as the thousands separator.
///
/// ```rust
/// use patent_fees::format_thousands;
///
/// assert_eq!(format_thousands(0), "0");
/// assert_eq!(format_thousands(42_000), "42,000");
/// assert_eq!(format_thousands(1_100_000), "1,100,000");
/// ```
#[must_use]
pub fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            result.push(',');
        }
        result.push(digit);
    }
    result
}

/// Format an amount of money in Korean won, for example `95,000원`.
#[must_use]
pub fn format_won(amount: u32) -> String {
    format!("{}원", format_thousands(amount))
}

/// Shorten text to at most `max_length` characters, appending an ellipsis if anything was cut.
///
/// Counts grapheme clusters so that composed Hangul and accented letters are never split.
///
/// ```rust
/// use patent_fees::truncate_text;
///
/// assert_eq!(truncate_text("짧은 제목", 20), "짧은 제목");
/// assert_eq!(truncate_text("abcdef", 3), "abc...");
/// ```
#[must_use]
pub fn truncate_text(text: &str, max_length: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let truncated: String = graphemes.by_ref().take(max_length).collect();
    if graphemes.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}

/// Resolve the directory where reports are written.
///
/// If `path` is `None` or an empty string, the current working directory is used.
/// A leading `~/` is expanded to the home directory. A missing directory is created.
pub fn resolve_output_dir(path: Option<&str>) -> Result<PathBuf> {
    let output = path.unwrap_or_default().trim();
    let directory = if output.is_empty() {
        env::current_dir().context("Failed to get current working directory")?
    } else if let Some(relative) = output.strip_prefix("~/") {
        dirs::home_dir().context("Failed to get home directory")?.join(relative)
    } else {
        PathBuf::from(output)
    };
    if !directory.exists() {
        fs::create_dir_all(&directory)
            .with_context(|| format!("Failed to create output directory: {}", directory.display()))?;
    }
    if !directory.is_dir() {
        anyhow::bail!("Output path is not a directory: '{}'", directory.display());
    }
    dunce::canonicalize(&directory)
        .with_context(|| format!("Failed to resolve output directory: {}", directory.display()))
}

/// Mask all but the last four characters of a secret.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let visible: String = secret.chars().skip(count - 4).collect();
    format!("{}{visible}", "*".repeat(count - 4))
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

/// Print a shell completion script for the given shell to stdout.
pub fn generate_shell_completion(shell: Shell, mut command: Command, command_name: &str) {
    clap_complete::generate(shell, &mut command, command_name, &mut std::io::stdout());
}
