//! Extraction of totals from a calculation result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{Ref, ResultHandle};

/// Total impact of one category, with the category ref so callers can
/// feed it back into contribution analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactEntry {
    pub name: String,
    pub category: Ref,
    pub amount: f64,
    pub unit: String,
}

/// One inventory line: a flow total crossing the system boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowEntry {
    pub name: String,
    pub flow: Ref,
    pub amount: f64,
    pub is_input: bool,
}

/// Reads totals off a result handle. No sorting is applied; entries
/// come back in server order and callers sort as needed.
pub struct ResultsAnalyzer {
    client: Arc<IpcClient>,
}

impl ResultsAnalyzer {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self { client }
    }

    pub async fn get_total_impacts(
        &self,
        result: &ResultHandle,
    ) -> Result<Vec<ImpactEntry>, OlcaError> {
        let values = self.client.total_impacts(result).await?;
        Ok(values
            .into_iter()
            .map(|v| ImpactEntry {
                name: v.impact_category.name.clone(),
                unit: v.impact_category.ref_unit.clone().unwrap_or_default(),
                category: v.impact_category,
                amount: v.amount,
            })
            .collect())
    }

    /// Full life-cycle inventory of the result.
    pub async fn get_inventory(
        &self,
        result: &ResultHandle,
    ) -> Result<Vec<FlowEntry>, OlcaError> {
        let values = self.client.total_flows(result).await?;
        Ok(values
            .into_iter()
            .map(|v| FlowEntry {
                name: v.envi_flow.flow.name.clone(),
                flow: v.envi_flow.flow,
                amount: v.amount,
                is_input: v.envi_flow.is_input,
            })
            .collect())
    }
}
