// Lookup tools for customer tiers and contract SLAs

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_object, json_schema_string, parse_arguments, Tool};
use anyhow::Result;
use billing_core::LookupService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const GET_CUSTOMER_TIER: &str = "get-customer-tier";
pub const GET_CONTRACT_SLA: &str = "get-contract-sla";

/// Render a lookup result the way both tools report it: a heading line
/// followed by the result as two-space indented JSON.
fn render(heading: &str, data: &impl Serialize) -> Result<CallToolResult> {
    let json = serde_json::to_string_pretty(data)?;
    Ok(CallToolResult::text(format!("{}:\n{}", heading, json)))
}

/// Tool to get a customer's subscription tier and status
pub struct GetCustomerTierTool {
    service: Arc<LookupService>,
}

impl GetCustomerTierTool {
    pub fn new(service: Arc<LookupService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct GetCustomerTierArgs {
    email: String,
}

#[async_trait::async_trait]
impl Tool for GetCustomerTierTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_CUSTOMER_TIER.to_string(),
            description: "Retrieve the subscription tier and status for a customer using their \
                          email address."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "email": json_schema_string(
                        "The customer's email address (e.g., 'alice@acme.com')"
                    )
                }),
                vec!["email"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetCustomerTierArgs = parse_arguments(GET_CUSTOMER_TIER, arguments)?;

        let data = self.service.get_tier(&args.email);
        tracing::debug!(email = %args.email, found = data.is_found(), "Customer tier lookup");

        render("Customer Data Retrieved", &data)
    }
}

/// Tool to get the SLA and support level of a customer's contract
pub struct GetContractSlaTool {
    service: Arc<LookupService>,
}

impl GetContractSlaTool {
    pub fn new(service: Arc<LookupService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct GetContractSlaArgs {
    customer_id: String,
}

#[async_trait::async_trait]
impl Tool for GetContractSlaTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_CONTRACT_SLA.to_string(),
            description: "Get the guaranteed uptime SLA and support level for a specific \
                          customer ID."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "customer_id": json_schema_string(
                        "The unique ID of the customer (e.g., 'CUST_001')"
                    )
                }),
                vec!["customer_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetContractSlaArgs = parse_arguments(GET_CONTRACT_SLA, arguments)?;

        let data = self.service.get_sla(&args.customer_id);
        tracing::debug!(
            customer_id = %args.customer_id,
            found = data.is_found(),
            "Contract SLA lookup"
        );

        render("Contract Details", &data)
    }
}
