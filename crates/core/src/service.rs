// Lookup service: read-only queries against a billing dataset

use crate::dataset::BillingDataset;
use crate::types::{ContractRecord, CustomerRecord, Lookup, LookupMiss};

/// Answers customer tier and contract SLA queries.
///
/// The dataset is fixed at construction, so a single instance can be shared
/// across tasks behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct LookupService {
    dataset: BillingDataset,
}

impl LookupService {
    pub fn new(dataset: BillingDataset) -> Self {
        Self { dataset }
    }

    /// Service backed by the built-in seed data
    pub fn seeded() -> Self {
        Self::new(BillingDataset::seed())
    }

    /// Find a customer by exact, case-sensitive email
    pub fn get_tier(&self, email: &str) -> Lookup<&CustomerRecord> {
        match self.dataset.customers.get(email) {
            Some(record) => Lookup::Found(record),
            None => Lookup::NotFound(LookupMiss::CustomerNotFound),
        }
    }

    /// Find the contract for an exact, case-sensitive customer id
    pub fn get_sla(&self, customer_id: &str) -> Lookup<&ContractRecord> {
        match self.dataset.contracts.get(customer_id) {
            Some(record) => Lookup::Found(record),
            None => Lookup::NotFound(LookupMiss::ContractNotFound),
        }
    }

    pub fn dataset(&self) -> &BillingDataset {
        &self.dataset
    }
}

impl Default for LookupService {
    fn default() -> Self {
        Self::seeded()
    }
}
