//! Product system assembly.

use std::sync::Arc;

use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{LinkingConfig, Ref};

/// Wraps process references into auto-linked product systems.
pub struct SystemBuilder {
    client: Arc<IpcClient>,
}

impl SystemBuilder {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self { client }
    }

    /// Asks the server to link the process's exchanges into a full
    /// system graph, preferring default providers. Unresolved provider
    /// links surface as the server's error.
    pub async fn create_product_system(&self, process: &Ref) -> Result<Ref, OlcaError> {
        let system = self
            .client
            .create_product_system(process, &LinkingConfig::default())
            .await?;
        tracing::info!(system = %system.name, "created product system");
        Ok(system)
    }
}
