pub mod lookup;
mod registry;

pub use lookup::{GetContractSlaTool, GetCustomerTierTool, GET_CONTRACT_SLA, GET_CUSTOMER_TIER};
pub use registry::{
    json_schema_object, json_schema_string, parse_arguments, InvalidArguments, Tool,
    ToolRegistry,
};

use billing_core::LookupService;
use std::sync::Arc;

/// Registry holding both lookup tools over one shared service
pub fn lookup_registry(service: Arc<LookupService>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GetCustomerTierTool::new(service.clone())));
    registry.register(Arc::new(GetContractSlaTool::new(service)));
    registry
}
