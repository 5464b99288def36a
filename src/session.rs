//! Query orchestration and the result of the most recent query.

use anyhow::Result;
use chrono::NaiveDate;

use crate::ABSENT;
use crate::history::LastPayment;
use crate::patent::{CustomerNumber, PatentRecord, RegistrationNumber};
use crate::registry::PatentRegistry;
use crate::renewal::{self, RenewalStatus, YearLabel};

/// Applicant shown when the registry did not return a name.
pub const UNKNOWN_APPLICANT: &str = "정보 없음";

/// Registered patents of one customer with their renewal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySession {
    pub customer_number: CustomerNumber,
    pub applicant_name: String,
    /// Evaluation date the statuses were calculated for.
    pub evaluated_on: NaiveDate,
    pub patents: Vec<(PatentRecord, RenewalStatus)>,
}

/// Result of querying one customer.
#[derive(Debug)]
pub enum QueryOutcome {
    /// At least one registered patent was found.
    Found(QuerySession),
    /// The registry answered without any registered patents.
    Empty,
    /// The registry could not be queried or the response was invalid.
    Failed(anyhow::Error),
}

impl QuerySession {
    /// Calculate the renewal status of each record on the given date.
    #[must_use]
    pub fn new(customer_number: CustomerNumber, records: Vec<PatentRecord>, today: NaiveDate) -> Self {
        let applicant_name = records
            .first()
            .map(|record| record.applicant_name.as_str())
            .filter(|name| !name.is_empty() && *name != ABSENT)
            .unwrap_or(UNKNOWN_APPLICANT)
            .to_string();

        let patents = records
            .into_iter()
            .map(|record| {
                let status = renewal::compute(record.registration_date, today);
                (record, status)
            })
            .collect();

        Self {
            customer_number,
            applicant_name,
            evaluated_on: today,
            patents,
        }
    }

    /// Patent with the given registration number.
    #[must_use]
    pub fn find(&self, registration_number: &RegistrationNumber) -> Option<&(PatentRecord, RenewalStatus)> {
        self.patents.iter().find(|(record, _)| {
            record
                .registration_number
                .as_deref()
                .and_then(RegistrationNumber::parse)
                .is_some_and(|number| number == *registration_number)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patents.is_empty()
    }
}

/// Search a customer's patents and calculate the renewal status for the registered ones.
///
/// Applications without a registration number are dropped.
pub async fn run_query<R: PatentRegistry>(
    registry: &R,
    customer_number: &CustomerNumber,
    today: NaiveDate,
) -> QueryOutcome {
    let records = match registry.search_patents(customer_number).await {
        Ok(records) => records,
        Err(error) => return QueryOutcome::Failed(error),
    };

    let registered: Vec<PatentRecord> = records.into_iter().filter(PatentRecord::is_registered).collect();
    if registered.is_empty() {
        QueryOutcome::Empty
    } else {
        QueryOutcome::Found(QuerySession::new(customer_number.clone(), registered, today))
    }
}

/// Latest recorded payment of a patent next to its current payment year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLookup {
    pub registration_number: RegistrationNumber,
    /// `None` when the register has no payments for the patent.
    pub last_payment: Option<LastPayment>,
    /// Payment year from the most recent query, if the patent was part of it.
    pub current_year: Option<u32>,
}

impl PaymentLookup {
    /// Whether the current payment year has already been paid.
    ///
    /// `None` when either the current year or the paid year is unknown.
    #[must_use]
    pub fn current_year_paid(&self) -> Option<bool> {
        self.last_payment.as_ref()?.covers(self.current_year?)
    }
}

/// Look up the latest recorded payment of a patent.
///
/// The current payment year is taken from `session` when it contains the patent.
///
/// # Errors
/// Returns an error if the register history could not be queried or the response was invalid.
pub async fn lookup_payment<R: PatentRegistry>(
    registry: &R,
    registration_number: &RegistrationNumber,
    session: Option<&QuerySession>,
) -> Result<PaymentLookup> {
    let last_payment = registry.last_payment(registration_number).await?;
    let current_year = session
        .and_then(|session| session.find(registration_number))
        .and_then(|(_, status)| match status.year {
            Some(YearLabel::Year(year)) => Some(year),
            _ => None,
        });
    Ok(PaymentLookup {
        registration_number: registration_number.clone(),
        last_payment,
        current_year,
    })
}

#[cfg(test)]
#[path = "fake_registry.rs"]
pub(crate) mod fake_registry;

#[cfg(test)]
pub(crate) mod test_utils {
    use chrono::NaiveDate;

    use crate::patent::{CustomerNumber, PatentRecord};

    pub fn customer(number: &str) -> CustomerNumber {
        CustomerNumber::parse(number).expect("valid customer number")
    }

    pub fn patent(registration_number: Option<&str>, registration_date: Option<NaiveDate>) -> PatentRecord {
        PatentRecord {
            application_number: "1020190012345".to_string(),
            registration_number: registration_number.map(str::to_string),
            applicant_name: "주식회사 한빛전자".to_string(),
            registration_date,
            title: "배터리 팩의 열 관리 장치 및 그 제어 방법, 그리고 이를 포함하는 전기 자동차".to_string(),
            claim_count: "15".to_string(),
            expiration_date: NaiveDate::from_ymd_opt(2039, 1, 31),
        }
    }
}

#[cfg(test)]
mod test_run_query {
    use super::fake_registry::FakeRegistry;
    use super::test_utils::{customer, patent};
    use super::*;

    use crate::renewal::FeeStatus;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[tokio::test]
    async fn found_registered_patents() {
        let registry = FakeRegistry::default().with_patents(
            "120140558200",
            vec![
                patent(Some("1021234560000"), Some(date(2022, 6, 16))),
                patent(None, None),
                patent(Some("1029876540000"), None),
            ],
        );

        let outcome = run_query(&registry, &customer("120140558200"), date(2025, 6, 15)).await;

        let QueryOutcome::Found(session) = outcome else {
            panic!("expected patents to be found");
        };
        assert_eq!(session.customer_number.as_str(), "120140558200");
        assert_eq!(session.applicant_name, "주식회사 한빛전자");
        assert_eq!(session.evaluated_on, date(2025, 6, 15));
        assert_eq!(session.len(), 2);
        assert_eq!(session.patents[0].1.status, FeeStatus::Valid);
        assert_eq!(session.patents[1].1, RenewalStatus::absent());
    }

    #[tokio::test]
    async fn only_unregistered_applications_is_empty() {
        let registry =
            FakeRegistry::default().with_patents("120140558200", vec![patent(None, Some(date(2024, 1, 1)))]);
        let outcome = run_query(&registry, &customer("120140558200"), date(2025, 6, 15)).await;
        assert!(matches!(outcome, QueryOutcome::Empty));
    }

    #[tokio::test]
    async fn no_results_is_empty() {
        let registry = FakeRegistry::default().with_patents("120140558200", Vec::new());
        let outcome = run_query(&registry, &customer("120140558200"), date(2025, 6, 15)).await;
        assert!(matches!(outcome, QueryOutcome::Empty));
    }

    #[tokio::test]
    async fn registry_error_is_failure() {
        let registry = FakeRegistry::default();
        let outcome = run_query(&registry, &customer("999999999999"), date(2025, 6, 15)).await;
        let QueryOutcome::Failed(error) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.to_string(), "Connection refused");
        assert_eq!(*registry.calls.borrow(), ["999999999999"]);
    }

    #[test]
    fn unknown_applicant_name() {
        let mut record = patent(Some("1021234560000"), None);
        record.applicant_name = ABSENT.to_string();
        let session = QuerySession::new(customer("120140558200"), vec![record], date(2025, 6, 15));
        assert_eq!(session.applicant_name, UNKNOWN_APPLICANT);
    }

    #[test]
    fn session_is_recomputed_for_each_date() {
        let records = vec![patent(Some("1021234560000"), Some(date(2024, 3, 7)))];
        let before = QuerySession::new(customer("120140558200"), records.clone(), date(2025, 1, 1));
        let after = QuerySession::new(customer("120140558200"), records, date(2025, 6, 15));
        assert_eq!(before.patents[0].1.status, FeeStatus::RestorationPeriod);
        assert_eq!(after.patents[0].1.status, FeeStatus::GracePeriod);
    }
}
