//! Scenario analysis over a single redefined parameter.

use std::sync::Arc;

use serde::Serialize;

use crate::internal::calculations::CalculationManager;
use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{CalculationType, ParameterRedef, Ref};
use crate::internal::results::{ImpactEntry, ResultsAnalyzer};

/// Totals for one parameter value. Results come back in the same
/// order the values were given.
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioResult {
    pub value: f64,
    pub impacts: Vec<ImpactEntry>,
}

pub struct ScenarioManager {
    client: Arc<IpcClient>,
    calculations: CalculationManager,
    results: ResultsAnalyzer,
}

impl ScenarioManager {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self {
            calculations: CalculationManager::new(client.clone()),
            results: ResultsAnalyzer::new(client.clone()),
            client,
        }
    }

    /// Re-runs a simple calculation once per value, overriding the
    /// named global parameter each time. Every result handle is
    /// released before the next run starts. An unknown parameter name
    /// surfaces as the server's error on the first run; callers that
    /// want to skip bad values catch per call instead of relying on a
    /// retry here.
    pub async fn run_scenario_analysis(
        &self,
        system: &Ref,
        impact_method: &Ref,
        amount: f64,
        parameter_name: &str,
        values: &[f64],
    ) -> Result<Vec<ScenarioResult>, OlcaError> {
        let mut scenarios = Vec::with_capacity(values.len());
        for &value in values {
            let redef = ParameterRedef {
                name: parameter_name.to_string(),
                value,
                context: None,
            };
            let result = self
                .calculations
                .run(
                    CalculationType::SimpleCalculation,
                    system,
                    Some(impact_method),
                    amount,
                    vec![redef],
                )
                .await?;
            let impacts = self.results.get_total_impacts(&result).await;
            let dispose = self.client.dispose(&result).await;
            let impacts = impacts?;
            dispose?;
            tracing::debug!(parameter = parameter_name, value, "scenario run done");
            scenarios.push(ScenarioResult { value, impacts });
        }
        Ok(scenarios)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::internal::ipc::protocol::IpcTransport;
    use crate::internal::ipc::schema::RefType;

    /// Returns a single impact total equal to twice the redefined
    /// parameter value, and records every disposed handle.
    struct ScenarioStub {
        current_value: Mutex<f64>,
        disposed: Mutex<Vec<String>>,
        next_id: Mutex<u32>,
        fail_on_value: Option<f64>,
    }

    #[async_trait]
    impl IpcTransport for ScenarioStub {
        async fn call(&self, method: &str, params: Value) -> Result<Value, OlcaError> {
            match method {
                "result/calculate" => {
                    let value = params["parameterRedefs"][0]["value"].as_f64().unwrap();
                    if self.fail_on_value == Some(value) {
                        return Err(OlcaError::Remote {
                            code: 500,
                            message: "parameter not found".to_string(),
                        });
                    }
                    *self.current_value.lock().unwrap() = value;
                    let mut id = self.next_id.lock().unwrap();
                    *id += 1;
                    Ok(json!({ "@id": format!("r-{}", *id) }))
                }
                "result/state" => Ok(json!({ "isReady": true })),
                "result/total-impacts" => {
                    let value = *self.current_value.lock().unwrap();
                    Ok(json!([{
                        "impactCategory": { "@id": "c1", "name": "GWP", "refUnit": "kg CO2-eq" },
                        "amount": value * 2.0,
                    }]))
                }
                "result/dispose" => {
                    let id = params["@id"].as_str().unwrap().to_string();
                    self.disposed.lock().unwrap().push(id);
                    Ok(Value::Null)
                }
                other => panic!("unexpected method {other}"),
            }
        }
    }

    fn manager(fail_on_value: Option<f64>) -> (ScenarioManager, Arc<ScenarioStub>) {
        let stub = Arc::new(ScenarioStub {
            current_value: Mutex::new(0.0),
            disposed: Mutex::new(vec![]),
            next_id: Mutex::new(0),
            fail_on_value,
        });
        let client = Arc::new(IpcClient::with_transport(stub.clone()));
        (ScenarioManager::new(client), stub)
    }

    #[tokio::test]
    async fn preserves_value_order_and_disposes_each_run() {
        let (manager, stub) = manager(None);
        let system = Ref::with_id(RefType::ProductSystem, "s1");
        let method = Ref::with_id(RefType::ImpactMethod, "m1");

        let scenarios = manager
            .run_scenario_analysis(&system, &method, 1.0, "share_recycled", &[0.1, 0.5, 0.9])
            .await
            .unwrap();

        let values: Vec<f64> = scenarios.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.1, 0.5, 0.9]);
        assert_eq!(scenarios[1].impacts[0].amount, 1.0);
        assert_eq!(stub.disposed.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_parameter_fails_fast() {
        let (manager, stub) = manager(Some(0.5));
        let system = Ref::with_id(RefType::ProductSystem, "s1");
        let method = Ref::with_id(RefType::ImpactMethod, "m1");

        let err = manager
            .run_scenario_analysis(&system, &method, 1.0, "missing", &[0.1, 0.5, 0.9])
            .await
            .unwrap_err();

        assert!(matches!(err, OlcaError::Remote { .. }));
        // only the first run got far enough to need disposal
        assert_eq!(stub.disposed.lock().unwrap().len(), 1);
    }
}
