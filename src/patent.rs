//! Patent records returned by the registry and customer number validation.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;

use crate::ABSENT;

/// Number of digits in a patent office customer number.
pub const CUSTOMER_NUMBER_LENGTH: usize = 12;

/// Maximum number of title characters shown in listings and reports.
pub const TITLE_MAX_LENGTH: usize = 20;

/// A validated 12-digit patent office customer number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerNumber(String);

impl CustomerNumber {
    /// Validate user input as a customer number.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// ```rust
    /// use patent_fees::patent::CustomerNumber;
    ///
    /// assert!(CustomerNumber::parse(" 120140558200 ").is_some());
    /// assert!(CustomerNumber::parse("12014055820").is_none());
    /// assert!(CustomerNumber::parse("12014055820X").is_none());
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        (input.len() == CUSTOMER_NUMBER_LENGTH && input.chars().all(|c| c.is_ascii_digit()))
            .then(|| Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CustomerNumber {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow!("Customer number must be {CUSTOMER_NUMBER_LENGTH} digits: '{s}'"))
    }
}

/// A patent registration number used for register lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationNumber(String);

impl RegistrationNumber {
    /// Validate user input as a registration number.
    ///
    /// Hyphens between digit groups are removed.
    ///
    /// ```rust
    /// use patent_fees::patent::RegistrationNumber;
    ///
    /// let number = RegistrationNumber::parse("10-2123456-0000").expect("valid number");
    /// assert_eq!(number.as_str(), "1021234560000");
    /// assert!(RegistrationNumber::parse("-").is_none());
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let digits: String = input.trim().chars().filter(|c| *c != '-').collect();
        (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(Self(digits))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split comma-separated batch input into valid customer numbers and rejected entries.
///
/// Empty entries, such as a trailing comma, are ignored.
#[must_use]
pub fn parse_customer_numbers(input: &str) -> (Vec<CustomerNumber>, Vec<String>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for entry in input.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        match CustomerNumber::parse(entry) {
            Some(number) => valid.push(number),
            None => invalid.push(entry.to_string()),
        }
    }
    (valid, invalid)
}

/// One registered patent from a registry search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatentRecord {
    pub application_number: String,
    /// `None` when the application has not been registered.
    pub registration_number: Option<String>,
    pub applicant_name: String,
    pub registration_date: Option<NaiveDate>,
    pub title: String,
    /// Passed through as text since the registry does not guarantee a number.
    pub claim_count: String,
    pub expiration_date: Option<NaiveDate>,
}

impl PatentRecord {
    /// Whether the patent has a registration number.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.registration_number.is_some()
    }

    /// Registration number, or the absent placeholder.
    #[must_use]
    pub fn registration_number_label(&self) -> &str {
        self.registration_number.as_deref().unwrap_or(ABSENT)
    }

    /// Invention title shortened for listings.
    #[must_use]
    pub fn short_title(&self) -> String {
        crate::truncate_text(&self.title, TITLE_MAX_LENGTH)
    }
}
