//! Construction and submission of flows, exchanges, and processes.

use std::sync::Arc;

use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{
    Exchange, Flow, FlowProperty, FlowPropertyFactor, FlowType, ModelType, Process, ProcessType,
    Ref, RefType, UnitGroup,
};

/// The canonical mass property and its kg unit, resolved once per
/// session. Safe to recompute idempotently if raced.
#[derive(Clone, Debug)]
struct MassUnits {
    mass: Ref,
    kg: Ref,
}

/// Builds well-formed entities with the default mass/kg quantity and
/// submits them to the store.
pub struct DataBuilder {
    client: Arc<IpcClient>,
    units: OnceCell<MassUnits>,
}

impl DataBuilder {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self {
            client,
            units: OnceCell::new(),
        }
    }

    async fn mass_units(&self) -> Result<&MassUnits, OlcaError> {
        self.units
            .get_or_try_init(|| async {
                let mass: FlowProperty = self
                    .client
                    .get_by_name(ModelType::FlowProperty, "Mass")
                    .await?
                    .ok_or_else(|| OlcaError::NotFound("Mass flow property".to_string()))?;
                let group: UnitGroup = self
                    .client
                    .get(ModelType::UnitGroup, &mass.unit_group.id)
                    .await?
                    .ok_or_else(|| OlcaError::NotFound("Mass unit group".to_string()))?;
                let unit = group
                    .units
                    .iter()
                    .find(|u| u.name == "kg")
                    .or_else(|| group.units.first())
                    .ok_or_else(|| OlcaError::NotFound("kg unit".to_string()))?;
                Ok(MassUnits {
                    mass: Ref::new(RefType::FlowProperty, mass.id, mass.name),
                    kg: Ref::new(RefType::Unit, unit.id.clone(), unit.name.clone()),
                })
            })
            .await
    }

    /// Creates a product flow carrying a single reference Mass
    /// property with conversion factor 1.0, submits it, and returns
    /// the assigned reference.
    pub async fn create_product_flow(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Ref, OlcaError> {
        let units = self.mass_units().await?;
        let flow = Flow {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            flow_type: FlowType::ProductFlow,
            flow_properties: vec![FlowPropertyFactor {
                flow_property: units.mass.clone(),
                conversion_factor: 1.0,
                is_ref_flow_property: true,
            }],
        };
        let reference = self.client.put(ModelType::Flow, &flow).await?;
        tracing::info!(name, "created product flow");
        Ok(reference)
    }

    /// Builds an exchange row against the cached mass/kg quantity. No
    /// remote call beyond the one-time unit lookup, and no validation
    /// of the amount's sign: the server may reject it.
    pub async fn create_exchange(
        &self,
        flow: &Ref,
        amount: f64,
        is_input: bool,
        is_quantitative_reference: bool,
        provider: Option<Ref>,
    ) -> Result<Exchange, OlcaError> {
        let units = self.mass_units().await?;
        Ok(Exchange {
            internal_id: 0,
            flow: flow.clone(),
            amount,
            unit: units.kg.clone(),
            flow_property: units.mass.clone(),
            is_input,
            is_quantitative_reference,
            default_provider: provider,
        })
    }

    /// Creates a unit process. Exchanges get 1-based internal ids in
    /// list order; the quantitative-reference count is not enforced
    /// locally (the server validates on use).
    pub async fn create_process(
        &self,
        name: &str,
        description: &str,
        mut exchanges: Vec<Exchange>,
    ) -> Result<Ref, OlcaError> {
        for (i, exchange) in exchanges.iter_mut().enumerate() {
            exchange.internal_id = (i + 1) as i32;
        }
        let qref_count = exchanges
            .iter()
            .filter(|e| e.is_quantitative_reference)
            .count();
        if qref_count != 1 {
            tracing::warn!(
                process = name,
                qref_count,
                "process should have exactly one quantitative reference"
            );
        }

        let last_internal_id = exchanges.len() as i32;
        let process = Process {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            process_type: ProcessType::UnitProcess,
            exchanges,
            last_internal_id,
        };
        let reference = self.client.put(ModelType::Process, &process).await?;
        tracing::info!(name, "created process");
        Ok(reference)
    }
}
