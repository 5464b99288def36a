use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use patent_fees::config::LOG_DIR;
use patent_fees::patent::CustomerNumber;
use patent_fees::report::ReportFiles;
use patent_fees::session::{PaymentLookup, QuerySession};

use crate::config::Config;
use crate::shell::RunStats;

/// Simple file logger for registry queries and exports with buffered writes
pub struct FileLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileLogger {
    /// Create a new file logger, writing to ~/logs/patent-fees/patent_fees_<timestamp>.log
    pub(crate) fn new() -> Result<Self> {
        let log_dir = LOG_DIR.as_deref().context("Failed to get home directory")?;

        if !log_dir.exists() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }

        let log_path = log_dir.join(format!(
            "patent_fees_{}.log",
            Local::now().format("%Y-%m-%d_%H-%M-%S")
        ));
        Self::with_path(log_path)
    }

    /// Create a file logger appending to the given file.
    pub(crate) fn with_path(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Log when starting the program
    pub(crate) fn log_init(&mut self, config: &Config) {
        let _ = writeln!(self.writer, "[{}] INIT", Self::timestamp());
        let _ = writeln!(self.writer, "  base_url: {}", config.base_url);
        let _ = writeln!(self.writer, "  api_key: {}", patent_fees::mask_secret(&config.api_key));
        if let Some(history_api_key) = &config.history_api_key {
            let _ = writeln!(self.writer, "  history_url: {}", config.history_url);
            let _ = writeln!(self.writer, "  history_api_key: {}", patent_fees::mask_secret(history_api_key));
        }
        let _ = writeln!(self.writer, "  output: \"{}\"", config.output_dir.display());
        if let Some(date) = config.evaluation_date {
            let _ = writeln!(self.writer, "  date: {date}");
        }
        if !config.customer_numbers.is_empty() {
            let numbers: Vec<&str> = config.customer_numbers.iter().map(CustomerNumber::as_str).collect();
            let _ = writeln!(self.writer, "  customers: {}", numbers.join(", "));
        }
        let _ = writeln!(self.writer, "  verbose: {}", config.verbose);
        let _ = self.writer.flush();
    }

    /// Log when starting a registry query
    pub(crate) fn log_query(&mut self, customer_number: &CustomerNumber, index: &str) {
        let _ = writeln!(
            self.writer,
            "[{}] QUERY   {} {}",
            Self::timestamp(),
            index,
            customer_number
        );
        let _ = self.writer.flush();
    }

    /// Log the patents found for a query
    pub(crate) fn log_result(&mut self, session: &QuerySession) {
        let _ = writeln!(
            self.writer,
            "[{}] RESULT  {} - \"{}\" | {} patents",
            Self::timestamp(),
            session.customer_number,
            session.applicant_name,
            session.len()
        );
        for (record, status) in &session.patents {
            let _ = writeln!(
                self.writer,
                "  {} | {} | {} | {}",
                record.registration_number_label(),
                status.year_label(),
                status.due_date_label(),
                status.status
            );
        }
        let _ = self.writer.flush();
    }

    /// Log a query that found no registered patents
    pub(crate) fn log_empty(&mut self, customer_number: &CustomerNumber) {
        let _ = writeln!(
            self.writer,
            "[{}] RESULT  {} | 0 patents",
            Self::timestamp(),
            customer_number
        );
        let _ = self.writer.flush();
    }

    /// Log the result of a payment history lookup
    pub(crate) fn log_payment(&mut self, lookup: &PaymentLookup) {
        let result = lookup.last_payment.as_ref().map_or_else(
            || "no payments".to_string(),
            |payment| {
                format!(
                    "{} | {} | {}",
                    payment.year_label(),
                    payment.paid_on_label(),
                    payment.amount_label()
                )
            },
        );
        let _ = writeln!(
            self.writer,
            "[{}] HISTORY {} | {}",
            Self::timestamp(),
            lookup.registration_number,
            result
        );
        let _ = self.writer.flush();
    }

    /// Log when a query or export fails
    pub(crate) fn log_failure(&mut self, operation: &str, subject: &str, error: &anyhow::Error) {
        let _ = writeln!(
            self.writer,
            "[{}] FAILED  {} {} | {:#}",
            Self::timestamp(),
            operation.to_uppercase(),
            subject,
            error
        );
        let _ = self.writer.flush();
    }

    /// Log written report files
    pub(crate) fn log_export(&mut self, files: &ReportFiles) {
        let _ = writeln!(
            self.writer,
            "[{}] EXPORT  \"{}\" \"{}\"",
            Self::timestamp(),
            files.csv.display(),
            files.xlsx.display()
        );
        let _ = self.writer.flush();
    }

    /// Log final statistics
    pub(crate) fn log_end(&mut self, stats: &RunStats) {
        let _ = writeln!(self.writer, "[{}] STATISTICS", Self::timestamp());
        let _ = writeln!(self.writer, "  Queries:  {}", stats.queries);
        let _ = writeln!(self.writer, "  Empty:    {}", stats.empty);
        let _ = writeln!(self.writer, "  Failed:   {}", stats.failed);
        let _ = writeln!(self.writer, "  Patents:  {}", stats.patents);
        let _ = writeln!(self.writer, "  Exports:  {}", stats.exports);
        let _ = writeln!(self.writer, "  Payment lookups: {}", stats.payment_lookups);
        let _ = writeln!(self.writer, "[{}] END", Self::timestamp());
        let _ = self.writer.flush();
    }
}
