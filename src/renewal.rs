//! Renewal fee status calculation.
//!
//! The payment year is derived from the number of days since registration divided by 365,
//! not from calendar anniversaries, so it slowly drifts from the true anniversary over a long
//! patent term. The due date of the current payment year is the registration date moved forward
//! by whole calendar years. Relative to the due date the timeline splits into four windows:
//!
//! | Days until due date | Status             |
//! |---------------------|--------------------|
//! | > 0                 | valid              |
//! | 0 ..= -180          | grace period       |
//! | -181 ..= -540       | restoration period |
//! | < -540              | expired            |

use std::fmt;

use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate};

use crate::fees::{MAX_PAYMENT_YEAR, fee_for};
use crate::{ABSENT, DATE_FORMAT};

/// Length of the late payment window after the due date.
pub const GRACE_PERIOD_DAYS: u64 = 180;

/// End of the restoration window, counted from the due date.
pub const RESTORATION_PERIOD_END_DAYS: u64 = 540;

const DAYS_PER_YEAR: i64 = 365;

/// Payment state of a patent on the evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeStatus {
    /// The current year's fee is not due yet.
    Valid,
    /// Past the due date, late payment still possible.
    GracePeriod,
    /// Past the grace period, the right can still be restored.
    RestorationPeriod,
    /// The right has lapsed.
    Expired,
    /// No registration date to calculate from.
    Absent,
}

impl FeeStatus {
    /// Classify by the signed number of days from the evaluation date to the due date.
    #[must_use]
    pub const fn classify(days_until_due: i64) -> Self {
        if days_until_due > 0 {
            Self::Valid
        } else if days_until_due >= -(GRACE_PERIOD_DAYS as i64) {
            Self::GracePeriod
        } else if days_until_due >= -(RESTORATION_PERIOD_END_DAYS as i64) {
            Self::RestorationPeriod
        } else {
            Self::Expired
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Valid => "유효",
            Self::GracePeriod => "추납기간",
            Self::RestorationPeriod => "회복기간",
            Self::Expired => "만료",
            Self::Absent => ABSENT,
        }
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Payment year shown for a patent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearLabel {
    Year(u32),
    /// Past the last payment year.
    Expired,
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}년차"),
            Self::Expired => write!(f, "{}", FeeStatus::Expired.label()),
        }
    }
}

/// The installment that follows the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextYearPreview {
    Due { year: u32, fee: u32, due_date: NaiveDate },
    /// The current year is the last one.
    Expired,
}

impl fmt::Display for NextYearPreview {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Due { year, fee, due_date } => write!(
                f,
                "{year}년차 {} ({} 마감)",
                crate::format_won(*fee),
                due_date.format(DATE_FORMAT)
            ),
            Self::Expired => write!(f, "{}", FeeStatus::Expired.label()),
        }
    }
}

/// A late payment window relative to the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// The evaluation date is on or before the last day of the window.
    pub in_progress: bool,
}

impl PeriodWindow {
    /// Grace period: from the day after the due date to 180 days after it.
    ///
    /// # Errors
    /// Returns an error if the window end is out of the supported date range.
    pub fn grace(due_date: NaiveDate, today: NaiveDate) -> Result<Self> {
        Self::after_due_date(due_date, 1, GRACE_PERIOD_DAYS, today)
    }

    /// Restoration period: from 181 to 540 days after the due date.
    ///
    /// # Errors
    /// Returns an error if the window end is out of the supported date range.
    pub fn restoration(due_date: NaiveDate, today: NaiveDate) -> Result<Self> {
        Self::after_due_date(due_date, GRACE_PERIOD_DAYS + 1, RESTORATION_PERIOD_END_DAYS, today)
    }

    fn after_due_date(due_date: NaiveDate, first_day: u64, last_day: u64, today: NaiveDate) -> Result<Self> {
        let start = add_days(due_date, first_day)?;
        let end = add_days(due_date, last_day)?;
        Ok(Self {
            start,
            end,
            in_progress: today <= end,
        })
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.in_progress {
            write!(f, "진행중 ({} 마감)", self.end.format(DATE_FORMAT))
        } else {
            write!(f, "{} ~ {}", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
        }
    }
}

/// Renewal fee status of one patent on a given date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalStatus {
    pub due_date: Option<NaiveDate>,
    pub year: Option<YearLabel>,
    /// Fee in won.
    pub fee: Option<u32>,
    pub status: FeeStatus,
    pub next_year: Option<NextYearPreview>,
    /// Only set while in the grace period.
    pub grace_period: Option<PeriodWindow>,
    /// Only set while in the restoration period.
    pub restoration_period: Option<PeriodWindow>,
}

impl RenewalStatus {
    /// Status with every field missing.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            due_date: None,
            year: None,
            fee: None,
            status: FeeStatus::Absent,
            next_year: None,
            grace_period: None,
            restoration_period: None,
        }
    }

    /// Status for a patent past its last payment year.
    #[must_use]
    pub const fn expired() -> Self {
        Self {
            due_date: None,
            year: Some(YearLabel::Expired),
            fee: None,
            status: FeeStatus::Expired,
            next_year: Some(NextYearPreview::Expired),
            grace_period: None,
            restoration_period: None,
        }
    }

    #[must_use]
    pub fn due_date_label(&self) -> String {
        crate::date_or_absent(self.due_date)
    }

    #[must_use]
    pub fn year_label(&self) -> String {
        display_or_absent(self.year.as_ref())
    }

    #[must_use]
    pub fn fee_label(&self) -> String {
        self.fee.map_or_else(|| ABSENT.to_string(), crate::format_won)
    }

    #[must_use]
    pub fn next_year_label(&self) -> String {
        display_or_absent(self.next_year.as_ref())
    }

    #[must_use]
    pub fn grace_period_label(&self) -> String {
        display_or_absent(self.grace_period.as_ref())
    }

    #[must_use]
    pub fn restoration_period_label(&self) -> String {
        display_or_absent(self.restoration_period.as_ref())
    }
}

/// Calculate the renewal status, falling back to an all-absent status on failure.
///
/// Errors are printed and otherwise ignored so that one bad date does not stop a whole listing.
#[must_use]
pub fn compute(registration_date: Option<NaiveDate>, today: NaiveDate) -> RenewalStatus {
    try_compute(registration_date, today).unwrap_or_else(|error| {
        crate::print_error!("Failed to calculate renewal fee status: {error:#}");
        RenewalStatus::absent()
    })
}

/// Calculate the renewal status of a patent registered on `registration_date`.
///
/// # Errors
/// Returns an error if a due date does not exist in the calendar,
/// which happens for registrations on February 29th when the target year is not a leap year.
pub fn try_compute(registration_date: Option<NaiveDate>, today: NaiveDate) -> Result<RenewalStatus> {
    let Some(registration_date) = registration_date else {
        return Ok(RenewalStatus::absent());
    };

    let year = payment_year(registration_date, today);
    if year > MAX_PAYMENT_YEAR {
        return Ok(RenewalStatus::expired());
    }

    let due_date = add_years(registration_date, year - 1)?;
    let fee = fee_for(year).unwrap_or(0);
    let status = FeeStatus::classify((due_date - today).num_days());
    let next_year = next_year_preview(year, due_date)?;

    let grace_period = match status {
        FeeStatus::GracePeriod => Some(PeriodWindow::grace(due_date, today)?),
        _ => None,
    };
    let restoration_period = match status {
        FeeStatus::RestorationPeriod => Some(PeriodWindow::restoration(due_date, today)?),
        _ => None,
    };

    Ok(RenewalStatus {
        due_date: Some(due_date),
        year: Some(YearLabel::Year(year)),
        fee: Some(fee),
        status,
        next_year: Some(next_year),
        grace_period,
        restoration_period,
    })
}

/// Payment year on `today`: whole 365-day periods since registration, plus one.
///
/// Capped at [`MAX_PAYMENT_YEAR`], so a patent past its term stays in the last year
/// and lapses through the grace and restoration windows of that year.
/// A registration date in the future counts as the first year.
#[must_use]
pub fn payment_year(registration_date: NaiveDate, today: NaiveDate) -> u32 {
    let elapsed_days = (today - registration_date).num_days().max(0);
    let elapsed_years = u32::try_from(elapsed_days / DAYS_PER_YEAR).unwrap_or(u32::MAX);
    elapsed_years.saturating_add(1).min(MAX_PAYMENT_YEAR)
}

fn next_year_preview(year: u32, due_date: NaiveDate) -> Result<NextYearPreview> {
    if year >= MAX_PAYMENT_YEAR {
        return Ok(NextYearPreview::Expired);
    }
    let next_year = year + 1;
    Ok(NextYearPreview::Due {
        year: next_year,
        fee: fee_for(next_year).unwrap_or(0),
        due_date: add_years(due_date, 1)?,
    })
}

/// Move a date forward by whole calendar years keeping the month and day.
fn add_years(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    let target_year = i32::try_from(years)
        .ok()
        .and_then(|years| date.year().checked_add(years))
        .with_context(|| format!("Year overflow adding {years} years to {date}"))?;
    NaiveDate::from_ymd_opt(target_year, date.month(), date.day()).with_context(|| {
        format!(
            "Due date {target_year}-{:02}-{:02} does not exist (registered {date})",
            date.month(),
            date.day()
        )
    })
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .with_context(|| format!("Date overflow adding {days} days to {date}"))
}

fn display_or_absent<T: fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| ABSENT.to_string(), ToString::to_string)
}


#[cfg(test)]
mod test_payment_year {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn registered_today_is_first_year() {
        let today = date(2025, 6, 15);
        assert_eq!(payment_year(today, today), 1);
    }

    #[test]
    fn whole_365_day_periods() {
        let today = date(2025, 6, 15);
        for k in 0..20 {
            let registered = today - Days::new(365 * k);
            assert_eq!(payment_year(registered, today), k as u32 + 1, "k = {k}");
        }
    }

    #[test]
    fn one_day_short_of_a_period() {
        let today = date(2025, 6, 15);
        assert_eq!(payment_year(today - Days::new(364), today), 1);
        assert_eq!(payment_year(today - Days::new(729), today), 2);
    }

    #[test]
    fn ignores_leap_days() {
        // One day before the calendar anniversary, but 365 days have passed because of the leap day.
        assert_eq!(payment_year(date(2023, 3, 2), date(2024, 3, 1)), 2);
    }

    #[test]
    fn future_registration_is_first_year() {
        assert_eq!(payment_year(date(2026, 1, 1), date(2025, 6, 15)), 1);
    }

    #[test]
    fn capped_at_last_payment_year() {
        let today = date(2025, 6, 15);
        assert_eq!(payment_year(today - Days::new(365 * 19), today), 20);
        assert_eq!(payment_year(today - Days::new(365 * 20), today), 20);
        assert_eq!(payment_year(date(1990, 1, 1), today), 20);
    }
}
