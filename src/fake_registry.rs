//! In-memory registry for unit tests of both the library and the binary.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{Result, anyhow};

use super::{CustomerNumber, LastPayment, PatentRecord, PatentRegistry, RegistrationNumber};

/// Registry answering from fixed maps, failing for unknown numbers.
#[derive(Default)]
pub struct FakeRegistry {
    patents: HashMap<String, Vec<PatentRecord>>,
    payments: HashMap<String, Option<LastPayment>>,
    /// Customer and registration numbers in the order they were requested.
    pub calls: RefCell<Vec<String>>,
}

impl FakeRegistry {
    pub fn with_patents(mut self, customer_number: &str, records: Vec<PatentRecord>) -> Self {
        self.patents.insert(customer_number.to_string(), records);
        self
    }

    pub fn with_payment(mut self, registration_number: &str, payment: Option<LastPayment>) -> Self {
        self.payments.insert(registration_number.to_string(), payment);
        self
    }
}

impl PatentRegistry for FakeRegistry {
    async fn search_patents(&self, customer_number: &CustomerNumber) -> Result<Vec<PatentRecord>> {
        self.calls.borrow_mut().push(customer_number.to_string());
        self.patents
            .get(customer_number.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("Connection refused"))
    }

    async fn last_payment(&self, registration_number: &RegistrationNumber) -> Result<Option<LastPayment>> {
        self.calls.borrow_mut().push(registration_number.to_string());
        self.payments
            .get(registration_number.as_str())
            .copied()
            .ok_or_else(|| anyhow!("Connection refused"))
    }
}
