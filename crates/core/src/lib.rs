// Core types and lookup logic for the billing lookup server

pub mod types;
pub mod dataset;
pub mod service;

pub use dataset::{BillingDataset, DatasetError};
pub use service::LookupService;
pub use types::*;
