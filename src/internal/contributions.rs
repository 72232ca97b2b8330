//! Ranking of per-process and per-flow contributions to an impact
//! category.

use std::sync::Arc;

use serde::Serialize;

use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{Ref, ResultHandle};

/// One ranked contributor. `share` is the fraction of the category
/// total in 0..1 (0 for every item when the total is zero).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Contributor {
    pub name: String,
    pub amount: f64,
    pub share: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Ref>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContributionKind {
    Process,
    Flow,
}

/// Top contributors for one category of a multi-category summary.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryContributions {
    pub category: Ref,
    pub contributors: Vec<Contributor>,
}

pub struct ContributionAnalyzer {
    client: Arc<IpcClient>,
}

impl ContributionAnalyzer {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self { client }
    }

    /// Top contributors to one impact category, descending by share,
    /// ties kept in server order. Items with `share < min_share` are
    /// dropped before truncation to `n`. The result must have been
    /// calculated with contribution retention.
    pub async fn get_top_contributors(
        &self,
        result: &ResultHandle,
        category: &Ref,
        kind: ContributionKind,
        n: usize,
        min_share: f64,
    ) -> Result<Vec<Contributor>, OlcaError> {
        let raw: Vec<(String, f64, Option<Ref>)> = match kind {
            ContributionKind::Process => self
                .client
                .direct_impacts_of(result, category)
                .await?
                .into_iter()
                .map(|v| {
                    let provider = v.tech_flow.provider().cloned();
                    let name = provider
                        .as_ref()
                        .map(|p| p.name.clone())
                        .unwrap_or_default();
                    (name, v.amount, provider)
                })
                .collect(),
            ContributionKind::Flow => self
                .client
                .flow_impacts_of(result, category)
                .await?
                .into_iter()
                .map(|v| (v.envi_flow.flow.name.clone(), v.amount, Some(v.envi_flow.flow)))
                .collect(),
        };
        Ok(rank_contributors(raw, n, min_share))
    }

    /// Process contribution breakdown across several impact
    /// categories. With `categories = None`, every category in the
    /// result's totals is covered, in server order. No share filter is
    /// applied here; the caller sees the full top `n`.
    pub async fn get_contribution_summary(
        &self,
        result: &ResultHandle,
        categories: Option<Vec<Ref>>,
        n: usize,
    ) -> Result<Vec<CategoryContributions>, OlcaError> {
        let categories = match categories {
            Some(categories) => categories,
            None => self
                .client
                .total_impacts(result)
                .await?
                .into_iter()
                .map(|v| v.impact_category)
                .collect(),
        };
        let mut summary = Vec::with_capacity(categories.len());
        for category in categories {
            let contributors = self
                .get_top_contributors(result, &category, ContributionKind::Process, n, 0.0)
                .await?;
            summary.push(CategoryContributions {
                category,
                contributors,
            });
        }
        Ok(summary)
    }
}

/// Pure ranking step: share = amount / sum(amounts), zero-total maps
/// every share to 0; stable descending sort; filter; truncate.
pub(crate) fn rank_contributors(
    items: Vec<(String, f64, Option<Ref>)>,
    n: usize,
    min_share: f64,
) -> Vec<Contributor> {
    let total: f64 = items.iter().map(|(_, amount, _)| amount).sum();
    let mut contributors: Vec<Contributor> = items
        .into_iter()
        .map(|(name, amount, item)| Contributor {
            name,
            amount,
            share: if total == 0.0 { 0.0 } else { amount / total },
            item,
        })
        .filter(|c| c.share >= min_share)
        .collect();
    // sort_by is stable, so equal shares keep server order
    contributors.sort_by(|a, b| b.share.total_cmp(&a.share));
    contributors.truncate(n);
    contributors
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::internal::ipc::protocol::IpcTransport;
    use crate::internal::ipc::schema::RefType;

    fn items(amounts: &[(&str, f64)]) -> Vec<(String, f64, Option<Ref>)> {
        amounts
            .iter()
            .map(|(name, amount)| (name.to_string(), *amount, None))
            .collect()
    }

    #[test]
    fn shares_sum_to_one_over_the_full_set() {
        let ranked = rank_contributors(items(&[("a", 2.0), ("b", 3.0), ("c", 5.0)]), 10, 0.0);
        let sum: f64 = ranked.iter().map(|c| c.share).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(ranked[0].name, "c");
        assert_eq!(ranked[0].share, 0.5);
    }

    #[test]
    fn unfiltered_output_is_a_sorted_permutation() {
        let input = items(&[("a", 1.0), ("b", 4.0), ("c", 2.0), ("d", 3.0)]);
        let ranked = rank_contributors(input, 4, 0.0);
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "c", "a"]);
        assert!(ranked.windows(2).all(|w| w[0].share >= w[1].share));
    }

    #[test]
    fn zero_total_defines_all_shares_as_zero() {
        let ranked = rank_contributors(items(&[("a", 1.0), ("b", -1.0)]), 10, 0.0);
        assert!(ranked.iter().all(|c| c.share == 0.0));
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn min_share_filters_before_truncation() {
        let ranked = rank_contributors(
            items(&[("a", 90.0), ("b", 8.0), ("c", 1.0), ("d", 1.0)]),
            10,
            0.05,
        );
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn equal_shares_keep_input_order() {
        let ranked = rank_contributors(
            items(&[("first", 1.0), ("second", 1.0), ("third", 2.0)]),
            10,
            0.0,
        );
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn truncates_to_n() {
        let ranked = rank_contributors(items(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]), 2, 0.0);
        assert_eq!(ranked.len(), 2);
    }

    /// Two categories in the totals, each with its own provider
    /// breakdown.
    struct SummaryStub;

    #[async_trait]
    impl IpcTransport for SummaryStub {
        async fn call(&self, method: &str, params: Value) -> Result<Value, OlcaError> {
            match method {
                "result/total-impacts" => Ok(json!([
                    { "impactCategory": { "@id": "c1", "name": "Climate change" }, "amount": 10.0 },
                    { "impactCategory": { "@id": "c2", "name": "Acidification" }, "amount": 2.0 },
                ])),
                "result/direct-impacts-of" => {
                    match params["impactCategory"]["@id"].as_str().unwrap() {
                        "c1" => Ok(json!([
                            {
                                "techFlow": { "provider": { "@id": "p1", "name": "steel production" } },
                                "amount": 8.0,
                            },
                            {
                                "techFlow": { "provider": { "@id": "p2", "name": "electricity mix" } },
                                "amount": 2.0,
                            },
                        ])),
                        "c2" => Ok(json!([
                            {
                                "techFlow": { "provider": { "@id": "p2", "name": "electricity mix" } },
                                "amount": 2.0,
                            },
                        ])),
                        other => panic!("unexpected category {other}"),
                    }
                }
                other => panic!("unexpected method {other}"),
            }
        }
    }

    #[tokio::test]
    async fn summary_covers_every_category_in_server_order() {
        let analyzer =
            ContributionAnalyzer::new(Arc::new(IpcClient::with_transport(Arc::new(SummaryStub))));
        let result = ResultHandle {
            id: "r1".to_string(),
        };

        let summary = analyzer
            .get_contribution_summary(&result, None, 10)
            .await
            .unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].category.name, "Climate change");
        assert_eq!(summary[0].contributors[0].name, "steel production");
        assert!((summary[0].contributors[0].share - 0.8).abs() < 1e-12);
        assert_eq!(summary[1].category.name, "Acidification");
        assert_eq!(summary[1].contributors.len(), 1);
        assert_eq!(summary[1].contributors[0].share, 1.0);
    }

    #[tokio::test]
    async fn summary_honors_an_explicit_category_list() {
        let analyzer =
            ContributionAnalyzer::new(Arc::new(IpcClient::with_transport(Arc::new(SummaryStub))));
        let result = ResultHandle {
            id: "r1".to_string(),
        };
        let wanted = vec![Ref::with_id(RefType::ImpactCategory, "c2")];

        let summary = analyzer
            .get_contribution_summary(&result, Some(wanted), 10)
            .await
            .unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].category.id, "c2");
        assert_eq!(summary[0].contributors[0].name, "electricity mix");
    }
}
