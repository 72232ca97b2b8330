//! Facade bundling the IPC client with the higher-level managers.

use std::sync::Arc;

use crate::internal::calculations::CalculationManager;
use crate::internal::contributions::ContributionAnalyzer;
use crate::internal::data::DataBuilder;
use crate::internal::export::ExportManager;
use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::schema::{FlowProperty, ModelType};
use crate::internal::parameters::ScenarioManager;
use crate::internal::results::ResultsAnalyzer;
use crate::internal::search::SearchUtils;
use crate::internal::systems::SystemBuilder;
use crate::internal::uncertainty::UncertaintyAnalyzer;

/// One session against an openLCA IPC endpoint. All managers share the
/// same underlying transport.
pub struct OlcaClient {
    endpoint: String,
    pub ipc: Arc<IpcClient>,
    pub search: SearchUtils,
    pub data: DataBuilder,
    pub systems: SystemBuilder,
    pub calculations: CalculationManager,
    pub results: ResultsAnalyzer,
    pub contributions: ContributionAnalyzer,
    pub uncertainty: UncertaintyAnalyzer,
    pub scenarios: ScenarioManager,
    pub export: ExportManager,
}

impl OlcaClient {
    pub fn connect(endpoint: &str) -> Self {
        Self::with_ipc(endpoint, Arc::new(IpcClient::connect(endpoint)))
    }

    pub fn with_ipc(endpoint: &str, ipc: Arc<IpcClient>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            search: SearchUtils::new(ipc.clone()),
            data: DataBuilder::new(ipc.clone()),
            systems: SystemBuilder::new(ipc.clone()),
            calculations: CalculationManager::new(ipc.clone()),
            results: ResultsAnalyzer::new(ipc.clone()),
            contributions: ContributionAnalyzer::new(ipc.clone()),
            uncertainty: UncertaintyAnalyzer::new(ipc.clone()),
            scenarios: ScenarioManager::new(ipc.clone()),
            export: ExportManager::new(),
            ipc,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Probes the endpoint with a harmless lookup. Any transport or
    /// remote failure reads as "not reachable".
    pub async fn test_connection(&self) -> bool {
        self.ipc
            .get_by_name::<FlowProperty>(ModelType::FlowProperty, "Mass")
            .await
            .is_ok()
    }
}
