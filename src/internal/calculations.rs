//! Calculation requests against a product system + impact method pair.

use std::sync::Arc;

use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{CalculationSetup, CalculationType, Ref, ResultHandle};

/// Issues blocking calculation requests. Remote failures propagate
/// immediately; there is no local retry.
pub struct CalculationManager {
    client: Arc<IpcClient>,
}

impl CalculationManager {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self { client }
    }

    /// Basic LCIA run. The returned handle must be disposed by the
    /// caller once read.
    pub async fn simple_calculation(
        &self,
        system: &Ref,
        impact_method: Option<&Ref>,
        amount: f64,
    ) -> Result<ResultHandle, OlcaError> {
        self.run(CalculationType::SimpleCalculation, system, impact_method, amount, vec![])
            .await
    }

    /// LCIA run flagged to retain per-process contribution data on the
    /// server. Costs more server memory; dispose promptly.
    pub async fn contribution_analysis(
        &self,
        system: &Ref,
        impact_method: &Ref,
        amount: f64,
    ) -> Result<ResultHandle, OlcaError> {
        self.run(
            CalculationType::ContributionAnalysis,
            system,
            Some(impact_method),
            amount,
            vec![],
        )
        .await
    }

    pub(crate) async fn run(
        &self,
        calculation_type: CalculationType,
        system: &Ref,
        impact_method: Option<&Ref>,
        amount: f64,
        parameter_redefs: Vec<crate::internal::ipc::schema::ParameterRedef>,
    ) -> Result<ResultHandle, OlcaError> {
        let setup = CalculationSetup {
            calculation_type,
            target: system.clone(),
            impact_method: impact_method.cloned(),
            amount,
            parameter_redefs,
        };
        let result = self.client.calculate(&setup).await?;
        self.client.wait_until_ready(&result).await?;
        tracing::info!(system = %system.name, "calculation complete");
        Ok(result)
    }
}
