// Billing dataset: the two read-only mappings behind the lookup service

use crate::types::{ContractRecord, CustomerId, CustomerRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Errors raised while loading a dataset file
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dataset: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Customers keyed by email and contracts keyed by customer id.
///
/// No referential integrity is enforced between the two maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDataset {
    #[serde(default)]
    pub customers: HashMap<String, CustomerRecord>,

    #[serde(default)]
    pub contracts: HashMap<String, ContractRecord>,
}

impl BillingDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in demo CRM
    pub fn seed() -> Self {
        Self::new()
            .with_customer(
                "alice@acme.com",
                CustomerRecord::new("CUST_001", "Enterprise", "Active"),
            )
            .with_customer(
                "bob@giant-corp.com",
                CustomerRecord::new("CUST_002", "Free", "Suspended"),
            )
            .with_contract("CUST_001", ContractRecord::new("99.99%", "Platinum"))
            .with_contract("CUST_002", ContractRecord::new("None", "Community"))
    }

    pub fn with_customer(mut self, email: impl Into<String>, record: CustomerRecord) -> Self {
        self.customers.insert(email.into(), record);
        self
    }

    pub fn with_contract(mut self, customer_id: impl Into<String>, record: ContractRecord) -> Self {
        self.contracts.insert(customer_id.into(), record);
        self
    }

    /// Parse a dataset from TOML.
    ///
    /// ```toml
    /// [customers."alice@acme.com"]
    /// id = "CUST_001"
    /// tier = "Enterprise"
    /// status = "Active"
    ///
    /// [contracts.CUST_001]
    /// sla = "99.99%"
    /// support = "Platinum"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, DatasetError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a dataset file from disk
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_toml_str(&content)?;

        tracing::info!(
            "Loaded dataset from {}: {} customers, {} contracts",
            path.display(),
            dataset.customers.len(),
            dataset.contracts.len()
        );
        let unlinked = dataset.customers_without_contract();
        if !unlinked.is_empty() {
            tracing::debug!("Customers without a contract: {:?}", unlinked);
        }

        Ok(dataset)
    }

    /// Load from `path` when given, otherwise fall back to the seed data
    pub fn load_or_seed(path: Option<&Path>) -> Result<Self, DatasetError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::info!("No dataset file configured, using built-in seed data");
                Ok(Self::seed())
            }
        }
    }

    /// Customer ids that have no entry in the contract map, sorted
    pub fn customers_without_contract(&self) -> Vec<CustomerId> {
        let mut ids: Vec<CustomerId> = self
            .customers
            .values()
            .filter(|c| !self.contracts.contains_key(c.id.as_str()))
            .map(|c| c.id.clone())
            .collect();
        ids.sort();
        ids
    }
}
