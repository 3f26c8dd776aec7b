use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Unique identifier for a customer (e.g. `CUST_001`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A customer as known to the CRM, keyed by email address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    /// Subscription level, e.g. "Enterprise" or "Free"
    pub tier: String,
    /// Account state, e.g. "Active" or "Suspended"
    pub status: String,
}

impl CustomerRecord {
    pub fn new(id: impl Into<String>, tier: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(id),
            tier: tier.into(),
            status: status.into(),
        }
    }
}

/// A support contract, keyed by customer id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Guaranteed uptime, e.g. "99.99%", or "None"
    pub sla: String,
    pub support: String,
}

impl ContractRecord {
    pub fn new(sla: impl Into<String>, support: impl Into<String>) -> Self {
        Self {
            sla: sla.into(),
            support: support.into(),
        }
    }
}

/// Why a lookup came back empty.
///
/// A miss is an ordinary outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupMiss {
    CustomerNotFound,
    ContractNotFound,
}

impl LookupMiss {
    pub fn message(&self) -> &'static str {
        match self {
            LookupMiss::CustomerNotFound => "Customer not found",
            LookupMiss::ContractNotFound => "No active contract found",
        }
    }
}

impl std::fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a read against the billing dataset.
///
/// Serializes as the bare record on a hit and as `{"error": "<message>"}` on a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound(LookupMiss),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(record) => Some(record),
            Lookup::NotFound(_) => None,
        }
    }

    pub fn miss(&self) -> Option<LookupMiss> {
        match self {
            Lookup::Found(_) => None,
            Lookup::NotFound(miss) => Some(*miss),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(record) => Lookup::Found(f(record)),
            Lookup::NotFound(miss) => Lookup::NotFound(miss),
        }
    }
}

impl<T: Clone> Lookup<&T> {
    pub fn cloned(self) -> Lookup<T> {
        self.map(T::clone)
    }
}

impl<T: Serialize> Serialize for Lookup<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Lookup::Found(record) => record.serialize(serializer),
            Lookup::NotFound(miss) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", miss.message())?;
                map.end()
            }
        }
    }
}
