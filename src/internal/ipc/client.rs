//! Typed wrappers over the raw IPC transport.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::error::OlcaError;
use super::protocol::{HttpTransport, IpcTransport};
use super::schema::{
    CalculationSetup, EnviFlowValue, ImpactValue, LinkingConfig, ModelType, Ref, ResultHandle,
    ResultState, TechFlow, TechFlowValue,
};

/// How often the result state is polled while a calculation runs.
const STATE_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

/// Client for the openLCA IPC endpoint.
///
/// All calls are sequential request/response; there is no local retry
/// and no caching. Cloneable handles share one transport.
pub struct IpcClient {
    transport: Arc<dyn IpcTransport>,
}

impl IpcClient {
    /// Connects over HTTP to the given endpoint URL.
    pub fn connect(endpoint: &str) -> Self {
        Self {
            transport: Arc::new(HttpTransport::new(endpoint)),
        }
    }

    /// Builds a client over a caller-supplied transport (tests use
    /// scripted stubs here).
    pub fn with_transport(transport: Arc<dyn IpcTransport>) -> Self {
        Self { transport }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, OlcaError> {
        let result = self.transport.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Fetches all descriptor references of one entity class.
    pub async fn get_descriptors(&self, model: ModelType) -> Result<Vec<Ref>, OlcaError> {
        let result: Option<Vec<Ref>> = self
            .call("data/get/descriptors", json!({ "@type": model.as_str() }))
            .await?;
        Ok(result.unwrap_or_default())
    }

    /// Fetches one entity by id. `None` when the store has no entity
    /// with that id.
    pub async fn get<T: DeserializeOwned>(
        &self,
        model: ModelType,
        id: &str,
    ) -> Result<Option<T>, OlcaError> {
        self.call("data/get", json!({ "@type": model.as_str(), "@id": id }))
            .await
    }

    /// Fetches one entity by exact name.
    pub async fn get_by_name<T: DeserializeOwned>(
        &self,
        model: ModelType,
        name: &str,
    ) -> Result<Option<T>, OlcaError> {
        self.call("data/get", json!({ "@type": model.as_str(), "name": name }))
            .await
    }

    /// Submits an entity; the server answers with its reference.
    pub async fn put(
        &self,
        model: ModelType,
        entity: &impl Serialize,
    ) -> Result<Ref, OlcaError> {
        let mut payload = serde_json::to_value(entity)?;
        if let Some(map) = payload.as_object_mut() {
            map.insert("@type".to_string(), Value::String(model.as_str().to_string()));
        }
        self.call("data/put", payload).await
    }

    /// Lists the provider relations of a product flow. Order is
    /// whatever the store returns; it is not stable across calls.
    pub async fn get_providers(&self, flow: &Ref) -> Result<Vec<TechFlow>, OlcaError> {
        let result: Option<Vec<TechFlow>> = self
            .call("data/get/providers", json!({ "@id": flow.id }))
            .await?;
        Ok(result.unwrap_or_default())
    }

    /// Asks the server to auto-link a process into a product system.
    pub async fn create_product_system(
        &self,
        process: &Ref,
        config: &LinkingConfig,
    ) -> Result<Ref, OlcaError> {
        self.call(
            "data/create/product-system",
            json!({ "process": process, "config": config }),
        )
        .await
    }

    /// Schedules a calculation and returns its result handle. The
    /// caller is responsible for [`IpcClient::dispose`].
    pub async fn calculate(&self, setup: &CalculationSetup) -> Result<ResultHandle, OlcaError> {
        self.call("result/calculate", serde_json::to_value(setup)?)
            .await
    }

    /// Creates a simulator handle for stochastic draws. Randomness is
    /// applied server-side from the configured distributions.
    pub async fn simulate(&self, setup: &CalculationSetup) -> Result<ResultHandle, OlcaError> {
        self.call("result/simulate", serde_json::to_value(setup)?)
            .await
    }

    /// Advances a simulator by one stochastic draw.
    pub async fn simulate_next(&self, result: &ResultHandle) -> Result<(), OlcaError> {
        let _: Value = self
            .call("result/simulate/next", json!({ "@id": result.id }))
            .await?;
        Ok(())
    }

    pub async fn state(&self, result: &ResultHandle) -> Result<ResultState, OlcaError> {
        self.call("result/state", json!({ "@id": result.id })).await
    }

    /// Polls the result state until the server reports it ready. A
    /// server-side error state surfaces as [`OlcaError::Remote`].
    pub async fn wait_until_ready(&self, result: &ResultHandle) -> Result<(), OlcaError> {
        loop {
            let state = self.state(result).await?;
            if let Some(message) = state.error {
                return Err(OlcaError::Remote { code: 0, message });
            }
            if state.is_ready {
                return Ok(());
            }
            tokio::time::sleep(STATE_POLL_INTERVAL).await;
        }
    }

    /// Total impact per category, in server order.
    pub async fn total_impacts(&self, result: &ResultHandle) -> Result<Vec<ImpactValue>, OlcaError> {
        let values: Option<Vec<ImpactValue>> = self
            .call("result/total-impacts", json!({ "@id": result.id }))
            .await?;
        Ok(values.unwrap_or_default())
    }

    /// Total inventory flows, in server order.
    pub async fn total_flows(&self, result: &ResultHandle) -> Result<Vec<EnviFlowValue>, OlcaError> {
        let values: Option<Vec<EnviFlowValue>> = self
            .call("result/total-flows", json!({ "@id": result.id }))
            .await?;
        Ok(values.unwrap_or_default())
    }

    /// Per-provider contributions to one impact category. Requires a
    /// result calculated with contribution retention.
    pub async fn direct_impacts_of(
        &self,
        result: &ResultHandle,
        category: &Ref,
    ) -> Result<Vec<TechFlowValue>, OlcaError> {
        let values: Option<Vec<TechFlowValue>> = self
            .call(
                "result/direct-impacts-of",
                json!({ "@id": result.id, "impactCategory": category }),
            )
            .await?;
        Ok(values.unwrap_or_default())
    }

    /// Per-flow contributions to one impact category.
    pub async fn flow_impacts_of(
        &self,
        result: &ResultHandle,
        category: &Ref,
    ) -> Result<Vec<EnviFlowValue>, OlcaError> {
        let values: Option<Vec<EnviFlowValue>> = self
            .call(
                "result/flow-impacts-of",
                json!({ "@id": result.id, "impactCategory": category }),
            )
            .await?;
        Ok(values.unwrap_or_default())
    }

    /// Releases a server-side result. Failing to call this leaks
    /// server memory; the library never reclaims handles on its own.
    pub async fn dispose(&self, result: &ResultHandle) -> Result<(), OlcaError> {
        let _: Value = self
            .call("result/dispose", json!({ "@id": result.id }))
            .await?;
        Ok(())
    }
}
