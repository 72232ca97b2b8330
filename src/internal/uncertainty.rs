//! Monte Carlo uncertainty analysis.
//!
//! The server draws from its configured parameter distributions; this
//! module only orchestrates draws and summarizes the sampled totals.

use std::sync::Arc;

use serde::Serialize;

use crate::internal::ipc::client::IpcClient;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{CalculationSetup, CalculationType, Ref};

/// Distribution summary of one impact category across all draws.
/// `std` is the sample standard deviation (N-1 denominator) and `cv`
/// is `std / mean`, which is NaN or infinite when the mean is zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UncertaintyStats {
    pub mean: f64,
    pub std: f64,
    pub percentile_5: f64,
    pub percentile_95: f64,
    pub cv: f64,
    pub values: Vec<f64>,
}

/// Stats for one category, in the order categories first appeared.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryUncertainty {
    pub name: String,
    #[serde(flatten)]
    pub stats: UncertaintyStats,
}

/// Side-by-side uncertainty figures for one impact category present
/// in both systems' results. `difference` is system 2 minus system 1;
/// `percent_difference` is relative to the magnitude of system 1's
/// mean (0 when that mean is zero).
#[derive(Clone, Debug, Serialize)]
pub struct ImpactComparison {
    pub name: String,
    pub system1_mean: f64,
    pub system1_std: f64,
    pub system1_ci_95: (f64, f64),
    pub system2_mean: f64,
    pub system2_std: f64,
    pub system2_ci_95: (f64, f64),
    pub difference: f64,
    pub percent_difference: f64,
}

pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

pub struct UncertaintyAnalyzer {
    client: Arc<IpcClient>,
}

impl UncertaintyAnalyzer {
    pub fn new(client: Arc<IpcClient>) -> Self {
        Self { client }
    }

    /// Runs `iterations` stochastic draws against one simulator handle
    /// and summarizes each impact category's sampled totals.
    ///
    /// Memory stays bounded: only scalar sequences accumulate locally,
    /// and the simulator is disposed on every exit path. A failure in
    /// any draw fails the whole run; a truncated sample has no
    /// statistical value.
    pub async fn run_monte_carlo(
        &self,
        system: &Ref,
        impact_method: &Ref,
        amount: f64,
        iterations: usize,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<CategoryUncertainty>, OlcaError> {
        if iterations == 0 {
            return Err(OlcaError::InvalidArgument(
                "iterations must be at least 1".to_string(),
            ));
        }
        let setup = CalculationSetup {
            calculation_type: CalculationType::MonteCarloSimulation,
            target: system.clone(),
            impact_method: Some(impact_method.clone()),
            amount,
            parameter_redefs: vec![],
        };
        let simulator = self.client.simulate(&setup).await?;
        let outcome = self.collect_draws(&simulator, iterations, progress).await;
        let dispose = self.client.dispose(&simulator).await;
        let samples = outcome?;
        dispose?;

        Ok(samples
            .into_iter()
            .map(|(name, values)| CategoryUncertainty {
                name,
                stats: compute_stats(values),
            })
            .collect())
    }

    /// Runs the simulation for both systems and pairs categories up by
    /// name, in the first system's order. Categories present in only
    /// one result are skipped.
    pub async fn compare_with_uncertainty(
        &self,
        system1: &Ref,
        system2: &Ref,
        impact_method: &Ref,
        amount: f64,
        iterations: usize,
    ) -> Result<Vec<ImpactComparison>, OlcaError> {
        let first = self
            .run_monte_carlo(system1, impact_method, amount, iterations, None)
            .await?;
        let second = self
            .run_monte_carlo(system2, impact_method, amount, iterations, None)
            .await?;

        let mut comparisons = Vec::new();
        for CategoryUncertainty { name, stats } in first {
            if let Some(other) = second.iter().find(|c| c.name == name) {
                comparisons.push(compare_categories(name, &stats, &other.stats));
            }
        }
        Ok(comparisons)
    }

    async fn collect_draws(
        &self,
        simulator: &crate::internal::ipc::schema::ResultHandle,
        iterations: usize,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<(String, Vec<f64>)>, OlcaError> {
        let mut samples: Vec<(String, Vec<f64>)> = Vec::new();
        for i in 1..=iterations {
            self.client.simulate_next(simulator).await?;
            self.client.wait_until_ready(simulator).await?;
            for value in self.client.total_impacts(simulator).await? {
                let name = value.impact_category.name;
                match samples.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, series)) => series.push(value.amount),
                    None => samples.push((name, vec![value.amount])),
                }
            }
            if let Some(report) = progress {
                report(i, iterations);
            }
            tracing::debug!(draw = i, total = iterations, "monte carlo draw done");
        }
        Ok(samples)
    }
}

pub(crate) fn compute_stats(values: Vec<f64>) -> UncertaintyStats {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let std = sample_std(&values, mean);
    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);
    let percentile_5 = percentile(&sorted, 5.0);
    let percentile_95 = percentile(&sorted, 95.0);
    UncertaintyStats {
        mean,
        std,
        percentile_5,
        percentile_95,
        cv: std / mean,
        values,
    }
}

pub(crate) fn compare_categories(
    name: String,
    first: &UncertaintyStats,
    second: &UncertaintyStats,
) -> ImpactComparison {
    let difference = second.mean - first.mean;
    ImpactComparison {
        name,
        system1_mean: first.mean,
        system1_std: first.std,
        system1_ci_95: (first.percentile_5, first.percentile_95),
        system2_mean: second.mean,
        system2_std: second.std,
        system2_ci_95: (second.percentile_5, second.percentile_95),
        difference,
        percent_difference: if first.mean == 0.0 {
            0.0
        } else {
            difference / first.mean.abs() * 100.0
        },
    }
}

/// Sample standard deviation (N-1 denominator); 0 for a single draw.
fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Percentile by linear interpolation over an already-sorted slice.
/// NaN for an empty slice, like the mean of no draws.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::internal::ipc::protocol::IpcTransport;
    use crate::internal::ipc::schema::RefType;

    #[test]
    fn constant_draws_have_zero_spread() {
        let stats = compute_stats(vec![5.0; 20]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.percentile_5, 5.0);
        assert_eq!(stats.percentile_95, 5.0);
        assert_eq!(stats.cv, 0.0);
    }

    #[test]
    fn one_through_five_matches_sample_statistics() {
        let stats = compute_stats(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stats.mean, 3.0);
        assert!((stats.std - 1.5811388300841898).abs() < 1e-12);
        // rank = 0.05 * 4 = 0.2 -> between 1 and 2
        assert!((stats.percentile_5 - 1.2).abs() < 1e-12);
        assert!((stats.percentile_95 - 4.8).abs() < 1e-12);
        assert!((stats.cv - stats.std / 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_draws_yield_nan_stats_without_panicking() {
        let stats = compute_stats(vec![]);
        assert!(stats.mean.is_nan());
        assert_eq!(stats.std, 0.0);
        assert!(stats.percentile_5.is_nan());
        assert!(stats.percentile_95.is_nan());
        assert!(stats.values.is_empty());
    }

    #[test]
    fn zero_mean_yields_non_finite_cv() {
        let stats = compute_stats(vec![-1.0, 1.0]);
        assert_eq!(stats.mean, 0.0);
        assert!(!stats.cv.is_finite());
    }

    #[test]
    fn comparison_reports_difference_relative_to_the_first_system() {
        let first = compute_stats(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let second = compute_stats(vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        let comparison = compare_categories("Climate change".to_string(), &first, &second);

        assert_eq!(comparison.system1_mean, 3.0);
        assert_eq!(comparison.system2_mean, 6.0);
        assert_eq!(comparison.difference, 3.0);
        assert!((comparison.percent_difference - 100.0).abs() < 1e-12);
        assert_eq!(comparison.system1_ci_95, (first.percentile_5, first.percentile_95));
    }

    #[test]
    fn comparison_against_a_zero_mean_has_zero_percent_difference() {
        let first = compute_stats(vec![-1.0, 1.0]);
        let second = compute_stats(vec![2.0, 2.0]);
        let comparison = compare_categories("Acidification".to_string(), &first, &second);

        assert_eq!(comparison.difference, 2.0);
        assert_eq!(comparison.percent_difference, 0.0);
    }

    /// Scripted simulator: each draw returns the next value from the
    /// sequence; draws past `fail_after` error out.
    struct SimulatorStub {
        draws: Mutex<Vec<f64>>,
        fail_after: Option<usize>,
        calls: AtomicUsize,
        disposed: AtomicUsize,
    }

    #[async_trait]
    impl IpcTransport for SimulatorStub {
        async fn call(&self, method: &str, _params: Value) -> Result<Value, OlcaError> {
            match method {
                "result/simulate" => Ok(json!({ "@id": "sim-1" })),
                "result/simulate/next" => {
                    let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if self.fail_after.is_some_and(|limit| n > limit) {
                        return Err(OlcaError::Remote {
                            code: 500,
                            message: "draw failed".to_string(),
                        });
                    }
                    Ok(Value::Null)
                }
                "result/state" => Ok(json!({ "@id": "sim-1", "isReady": true })),
                "result/total-impacts" => {
                    let value = self.draws.lock().unwrap().remove(0);
                    Ok(json!([{
                        "impactCategory": { "@id": "c1", "name": "Climate change" },
                        "amount": value,
                    }]))
                }
                "result/dispose" => {
                    self.disposed.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                }
                other => panic!("unexpected method {other}"),
            }
        }
    }

    fn analyzer(stub: Arc<SimulatorStub>) -> UncertaintyAnalyzer {
        UncertaintyAnalyzer::new(Arc::new(IpcClient::with_transport(stub)))
    }

    #[tokio::test]
    async fn collects_one_series_per_category_and_disposes_once() {
        let stub = Arc::new(SimulatorStub {
            draws: Mutex::new(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            fail_after: None,
            calls: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
        });
        let system = Ref::with_id(RefType::ProductSystem, "s1");
        let method = Ref::with_id(RefType::ImpactMethod, "m1");
        let progress = Mutex::new(Vec::new());
        let report = |i: usize, total: usize| progress.lock().unwrap().push((i, total));

        let stats = analyzer(stub.clone())
            .run_monte_carlo(&system, &method, 1.0, 5, Some(&report))
            .await
            .unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "Climate change");
        assert_eq!(stats[0].stats.mean, 3.0);
        assert_eq!(stats[0].stats.values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stub.disposed.load(Ordering::SeqCst), 1);
        assert_eq!(progress.lock().unwrap().len(), 5);
        assert_eq!(*progress.lock().unwrap().last().unwrap(), (5, 5));
    }

    #[tokio::test]
    async fn failed_draw_fails_the_run_but_still_disposes() {
        let stub = Arc::new(SimulatorStub {
            draws: Mutex::new(vec![1.0, 2.0]),
            fail_after: Some(2),
            calls: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
        });
        let system = Ref::with_id(RefType::ProductSystem, "s1");
        let method = Ref::with_id(RefType::ImpactMethod, "m1");

        let err = analyzer(stub.clone())
            .run_monte_carlo(&system, &method, 1.0, 10, None)
            .await
            .unwrap_err();

        assert!(matches!(err, OlcaError::Remote { .. }));
        assert_eq!(stub.disposed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn comparing_two_systems_runs_two_simulations() {
        let stub = Arc::new(SimulatorStub {
            draws: Mutex::new(vec![1.0, 2.0, 3.0, 4.0]),
            fail_after: None,
            calls: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
        });
        let system1 = Ref::with_id(RefType::ProductSystem, "s1");
        let system2 = Ref::with_id(RefType::ProductSystem, "s2");
        let method = Ref::with_id(RefType::ImpactMethod, "m1");

        let comparisons = analyzer(stub.clone())
            .compare_with_uncertainty(&system1, &system2, &method, 1.0, 2)
            .await
            .unwrap();

        assert_eq!(comparisons.len(), 1);
        assert_eq!(comparisons[0].name, "Climate change");
        assert_eq!(comparisons[0].system1_mean, 1.5);
        assert_eq!(comparisons[0].system2_mean, 3.5);
        assert_eq!(comparisons[0].difference, 2.0);
        assert_eq!(stub.disposed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_iterations_is_rejected() {
        let stub = Arc::new(SimulatorStub {
            draws: Mutex::new(vec![]),
            fail_after: None,
            calls: AtomicUsize::new(0),
            disposed: AtomicUsize::new(0),
        });
        let system = Ref::with_id(RefType::ProductSystem, "s1");
        let method = Ref::with_id(RefType::ImpactMethod, "m1");
        let err = analyzer(stub)
            .run_monte_carlo(&system, &method, 1.0, 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OlcaError::InvalidArgument(_)));
    }
}
