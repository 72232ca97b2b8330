//! Keyword search over the remote store's descriptor lists.

use std::sync::Arc;

use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{Flow, FlowType, ImpactMethod, ModelType, Ref};

/// Matches found by [`SearchUtils::find`]. `omitted` counts candidates
/// that matched the keywords after `max_results` was reached.
#[derive(Clone, Debug, Default)]
pub struct SearchOutcome {
    pub matches: Vec<Ref>,
    pub omitted: usize,
}

/// Case-insensitive multi-keyword lookup of flows, processes, and
/// impact methods.
pub struct SearchUtils {
    client: Arc<IpcClient>,
}

impl SearchUtils {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self { client }
    }

    /// Searches descriptor names of one entity class. A candidate
    /// matches iff every keyword is a case-folded substring of its
    /// name, so keyword order never changes the match set. Nothing
    /// matching is an empty outcome, not an error.
    ///
    /// With a `flow_type` filter, each candidate within the result
    /// window costs an extra fetch of the full flow; candidates past
    /// the window are counted by keyword match only.
    pub async fn find(
        &self,
        keywords: &[String],
        model: ModelType,
        max_results: usize,
        flow_type: Option<FlowType>,
    ) -> Result<SearchOutcome, OlcaError> {
        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let mut outcome = SearchOutcome::default();

        for candidate in self.client.get_descriptors(model).await? {
            let name = candidate.name.to_lowercase();
            if !needles.iter().all(|k| name.contains(k.as_str())) {
                continue;
            }
            if outcome.matches.len() >= max_results {
                outcome.omitted += 1;
                continue;
            }
            if let Some(wanted) = flow_type {
                let full: Option<Flow> = self.client.get(ModelType::Flow, &candidate.id).await?;
                match full {
                    Some(flow) if flow.flow_type == wanted => {}
                    _ => continue,
                }
            }
            outcome.matches.push(candidate);
        }

        Ok(outcome)
    }

    pub async fn find_flows(
        &self,
        keywords: &[String],
        max_results: usize,
        flow_type: Option<FlowType>,
    ) -> Result<SearchOutcome, OlcaError> {
        self.find(keywords, ModelType::Flow, max_results, flow_type).await
    }

    /// First flow matching the keywords, if any.
    pub async fn find_flow(
        &self,
        keywords: &[String],
        flow_type: Option<FlowType>,
    ) -> Result<Option<Ref>, OlcaError> {
        let outcome = self.find_flows(keywords, 1, flow_type).await?;
        Ok(outcome.matches.into_iter().next())
    }

    pub async fn find_processes(
        &self,
        keywords: &[String],
        max_results: usize,
    ) -> Result<SearchOutcome, OlcaError> {
        self.find(keywords, ModelType::Process, max_results, None).await
    }

    pub async fn find_process(&self, keywords: &[String]) -> Result<Option<Ref>, OlcaError> {
        let outcome = self.find_processes(keywords, 1).await?;
        Ok(outcome.matches.into_iter().next())
    }

    pub async fn find_product_system(&self, keywords: &[String]) -> Result<Option<Ref>, OlcaError> {
        let outcome = self
            .find(keywords, ModelType::ProductSystem, 1, None)
            .await?;
        Ok(outcome.matches.into_iter().next())
    }

    /// Finds the first impact method matching the keywords and loads
    /// its full record, including the impact category refs.
    pub async fn find_impact_method(
        &self,
        keywords: &[String],
    ) -> Result<Option<ImpactMethod>, OlcaError> {
        let outcome = self.find(keywords, ModelType::ImpactMethod, 1, None).await?;
        match outcome.matches.into_iter().next() {
            Some(descriptor) => {
                self.client.get(ModelType::ImpactMethod, &descriptor.id).await
            }
            None => Ok(None),
        }
    }

    /// All provider processes of a flow, in server order.
    pub async fn find_providers(&self, flow: &Ref) -> Result<Vec<Ref>, OlcaError> {
        let relations = self.client.get_providers(flow).await?;
        Ok(relations
            .iter()
            .filter_map(|t| t.provider().cloned())
            .collect())
    }

    /// The first provider the store lists for a flow. The order is not
    /// stable across calls; callers wanting reproducible linking must
    /// pin providers by id.
    pub async fn find_best_provider(&self, flow: &Ref) -> Result<Option<Ref>, OlcaError> {
        let providers = self.find_providers(flow).await?;
        Ok(providers.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::internal::ipc::protocol::IpcTransport;

    struct DescriptorStub {
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl IpcTransport for DescriptorStub {
        async fn call(&self, method: &str, _params: Value) -> Result<Value, OlcaError> {
            assert_eq!(method, "data/get/descriptors");
            let refs: Vec<Value> = self
                .names
                .iter()
                .enumerate()
                .map(|(i, n)| json!({ "@id": format!("id-{i}"), "name": n }))
                .collect();
            Ok(Value::Array(refs))
        }
    }

    fn search_over(names: Vec<&'static str>) -> SearchUtils {
        SearchUtils::new(Arc::new(IpcClient::with_transport(Arc::new(
            DescriptorStub { names },
        ))))
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn all_keywords_must_match_case_insensitively() {
        let search = search_over(vec![
            "Polyethylene terephthalate, granulate, bottle grade",
            "Polyethylene, low density",
            "Steel, hot rolled",
        ]);
        let outcome = search
            .find(&kw(&["POLYETHYLENE", "terephthalate"]), ModelType::Flow, 10, None)
            .await
            .unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.matches[0].name.contains("bottle grade"));
    }

    #[tokio::test]
    async fn keyword_order_does_not_change_match_set() {
        let search = search_over(vec![
            "steel, hot rolled, coil",
            "steel, cold rolled",
            "aluminium, hot rolled",
        ]);
        let a = search
            .find(&kw(&["hot", "steel"]), ModelType::Flow, 10, None)
            .await
            .unwrap();
        let b = search
            .find(&kw(&["steel", "hot"]), ModelType::Flow, 10, None)
            .await
            .unwrap();
        let ids = |o: &SearchOutcome| o.matches.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.matches.len(), 1);
    }

    #[tokio::test]
    async fn max_results_truncates_but_counts_the_rest() {
        let search = search_over(vec!["water a", "water b", "water c", "water d", "air"]);
        let outcome = search
            .find(&kw(&["water"]), ModelType::Flow, 2, None)
            .await
            .unwrap();
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.omitted, 2);
    }

    #[tokio::test]
    async fn no_match_is_empty_not_error() {
        let search = search_over(vec!["steel", "aluminium"]);
        let outcome = search
            .find(&kw(&["unobtainium"]), ModelType::Flow, 10, None)
            .await
            .unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.omitted, 0);
    }
}
