//! Tool implementations. Every handler converts failures into a
//! `{success: false, error}` payload at this boundary.

use rmcp::{handler::server::wrapper::Parameters, model::*, schemars, tool, tool_router};
use serde_json::{Value, json};

use crate::internal::contributions::ContributionKind;
use crate::internal::export::ImpactRow;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{FlowType, ImpactMethod, ModelType, Ref, RefType};
use crate::internal::mcp::server::OlcaMcpServer;

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchFlowsParams {
    /// Keywords that must all match the flow name, case-insensitively.
    pub keywords: Vec<String>,
    /// Maximum number of results (default 10).
    pub max_results: Option<usize>,
    /// Optional filter: PRODUCT_FLOW, ELEMENTARY_FLOW or WASTE_FLOW.
    pub flow_type: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchProcessesParams {
    pub keywords: Vec<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchImpactMethodsParams {
    pub keywords: Vec<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FindProvidersParams {
    /// Flow id; takes precedence over flow_name.
    pub flow_id: Option<String>,
    /// Flow name to search for when the id is unknown.
    pub flow_name: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateProductFlowParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ExchangeSpec {
    /// Flow id, or a name fragment resolved via search.
    pub flow_id: String,
    pub amount: f64,
    pub is_input: bool,
    pub is_quantitative_reference: Option<bool>,
    pub provider_id: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateProcessParams {
    pub name: String,
    pub description: Option<String>,
    pub exchanges: Vec<ExchangeSpec>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateProductSystemParams {
    pub process_id: Option<String>,
    pub process_name: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CalculateImpactsParams {
    pub system_id: Option<String>,
    pub system_name: Option<String>,
    pub method_id: Option<String>,
    pub method_keywords: Option<Vec<String>>,
    /// Reference amount (default 1.0).
    pub amount: Option<f64>,
    /// Retain per-process contribution data for analyze_contributions.
    pub with_contributions: Option<bool>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInventoryResultsParams {
    pub result_id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AnalyzeContributionsParams {
    pub result_id: String,
    pub impact_category_id: String,
    /// Number of top contributors to return (default 10).
    pub n: Option<usize>,
    /// Minimum contribution share in 0..1 (default 0.01).
    pub min_share: Option<f64>,
    /// Contributor kind: process (default) or flow.
    pub kind: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct RunMonteCarloParams {
    pub system_id: String,
    pub method_id: String,
    /// Number of stochastic draws (default 100).
    pub iterations: Option<usize>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ExportResultsParams {
    /// Impact rows to write, each with name, amount and unit.
    pub data: Vec<ImpactRow>,
    pub filename: String,
    /// Export format: csv (default) or json.
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct DisposeResultParams {
    pub result_id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct TestConnectionParams {}

fn reply(payload: Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(payload.to_string())])
}

fn fail(error: impl std::fmt::Display) -> CallToolResult {
    reply(json!({ "success": false, "error": error.to_string() }))
}

fn parse_flow_type(s: &str) -> Option<FlowType> {
    match s {
        "PRODUCT_FLOW" => Some(FlowType::ProductFlow),
        "ELEMENTARY_FLOW" => Some(FlowType::ElementaryFlow),
        "WASTE_FLOW" => Some(FlowType::WasteFlow),
        _ => None,
    }
}

fn refs_json(refs: &[Ref]) -> Vec<Value> {
    refs.iter()
        .map(|r| json!({ "id": r.id, "name": r.name }))
        .collect()
}

// `vis = "pub"` because the generated router fn is called from
// `server.rs`, outside this module.
#[tool_router(router = build_tool_router, vis = "pub")]
impl OlcaMcpServer {
    #[tool(
        description = "Test the connection to the openLCA IPC server. Use this first to verify openLCA is running and accessible."
    )]
    pub async fn test_connection(
        &self,
        Parameters(_params): Parameters<TestConnectionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.test_connection_impl().await)
    }

    #[tool(
        description = "Search for material flows in the openLCA database. Keywords are case-insensitive and all must match, e.g. ['steel', 'hot', 'rolled'] finds 'Steel, hot rolled, coil'."
    )]
    pub async fn search_flows(
        &self,
        Parameters(params): Parameters<SearchFlowsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.search_flows_impl(params).await)
    }

    #[tool(
        description = "Search for processes in the openLCA database by case-insensitive keywords (all must match)."
    )]
    pub async fn search_processes(
        &self,
        Parameters(params): Parameters<SearchProcessesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.search_processes_impl(params).await)
    }

    #[tool(
        description = "Find an impact assessment method (LCIA method) by keywords. Returns the method with its impact category ids."
    )]
    pub async fn search_impact_methods(
        &self,
        Parameters(params): Parameters<SearchImpactMethodsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.search_impact_methods_impl(params).await)
    }

    #[tool(
        description = "List the processes that can provide a product flow. Identify the flow by flow_id or flow_name."
    )]
    pub async fn find_providers(
        &self,
        Parameters(params): Parameters<FindProvidersParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.find_providers_impl(params).await)
    }

    #[tool(
        description = "Create a new product flow with the standard Mass property and kg unit."
    )]
    pub async fn create_product_flow(
        &self,
        Parameters(params): Parameters<CreateProductFlowParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.create_product_flow_impl(params).await)
    }

    #[tool(
        description = "Create a unit process from a list of exchanges. Each exchange references a flow by id or name fragment; mark exactly one output as the quantitative reference."
    )]
    pub async fn create_process(
        &self,
        Parameters(params): Parameters<CreateProcessParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.create_process_impl(params).await)
    }

    #[tool(
        description = "Build a product system from a process by auto-linking its providers. Identify the process by process_id or process_name."
    )]
    pub async fn create_product_system(
        &self,
        Parameters(params): Parameters<CreateProductSystemParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.create_product_system_impl(params).await)
    }

    #[tool(
        description = "Calculate environmental impacts for a product system and return all category totals. IMPORTANT: dispose the returned result_id with dispose_result when done."
    )]
    pub async fn calculate_impacts(
        &self,
        Parameters(params): Parameters<CalculateImpactsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.calculate_impacts_impl(params).await)
    }

    #[tool(
        description = "Get the full life cycle inventory of a calculated result: every flow crossing the system boundary with its amount."
    )]
    pub async fn get_inventory_results(
        &self,
        Parameters(params): Parameters<GetInventoryResultsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.get_inventory_results_impl(params).await)
    }

    #[tool(
        description = "Find the processes or flows contributing most to one impact category. Requires a result calculated with with_contributions=true."
    )]
    pub async fn analyze_contributions(
        &self,
        Parameters(params): Parameters<AnalyzeContributionsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.analyze_contributions_impl(params).await)
    }

    #[tool(
        description = "Run Monte Carlo uncertainty analysis and return mean, std, CV and percentiles per impact category. Can be slow for large systems."
    )]
    pub async fn run_monte_carlo(
        &self,
        Parameters(params): Parameters<RunMonteCarloParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.run_monte_carlo_impl(params).await)
    }

    #[tool(description = "Export impact rows to a CSV or JSON file.")]
    pub async fn export_results(
        &self,
        Parameters(params): Parameters<ExportResultsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.export_results_impl(params).await)
    }

    #[tool(
        description = "Dispose of a calculation result to free server memory. Always call this after finishing with a result_id."
    )]
    pub async fn dispose_result(
        &self,
        Parameters(params): Parameters<DisposeResultParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.dispose_result_impl(params).await)
    }
}

impl OlcaMcpServer {
    pub async fn test_connection_impl(&self) -> CallToolResult {
        let connected = self.client.test_connection().await;
        reply(json!({
            "success": true,
            "connected": connected,
            "endpoint": self.client.endpoint(),
        }))
    }

    pub async fn search_flows_impl(&self, params: SearchFlowsParams) -> CallToolResult {
        let flow_type = match params.flow_type.as_deref() {
            Some(s) => match parse_flow_type(s) {
                Some(t) => Some(t),
                None => return fail(format!("Unknown flow type: {s}")),
            },
            None => None,
        };
        let max_results = params.max_results.unwrap_or(10);
        match self
            .client
            .search
            .find_flows(&params.keywords, max_results, flow_type)
            .await
        {
            Ok(outcome) => reply(json!({
                "success": true,
                "count": outcome.matches.len(),
                "omitted": outcome.omitted,
                "flows": refs_json(&outcome.matches),
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn search_processes_impl(&self, params: SearchProcessesParams) -> CallToolResult {
        let max_results = params.max_results.unwrap_or(10);
        match self
            .client
            .search
            .find_processes(&params.keywords, max_results)
            .await
        {
            Ok(outcome) => reply(json!({
                "success": true,
                "count": outcome.matches.len(),
                "omitted": outcome.omitted,
                "processes": refs_json(&outcome.matches),
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn search_impact_methods_impl(
        &self,
        params: SearchImpactMethodsParams,
    ) -> CallToolResult {
        match self.client.search.find_impact_method(&params.keywords).await {
            Ok(Some(method)) => reply(json!({
                "success": true,
                "method": {
                    "id": method.id,
                    "name": method.name,
                    "categories": method
                        .impact_categories
                        .iter()
                        .map(|c| json!({ "id": c.id, "name": c.name, "unit": c.ref_unit }))
                        .collect::<Vec<_>>(),
                },
            })),
            Ok(None) => fail(format!(
                "Impact method not found with keywords: {}",
                params.keywords.join(", ")
            )),
            Err(e) => fail(e),
        }
    }

    pub async fn find_providers_impl(&self, params: FindProvidersParams) -> CallToolResult {
        let flow = if let Some(id) = params.flow_id {
            Ref::with_id(RefType::Flow, id)
        } else if let Some(name) = params.flow_name {
            match self.client.search.find_flow(&[name.clone()], None).await {
                Ok(Some(flow)) => flow,
                Ok(None) => return fail(format!("Flow not found: {name}")),
                Err(e) => return fail(e),
            }
        } else {
            return fail("Either flow_id or flow_name must be provided");
        };
        match self.client.search.find_providers(&flow).await {
            Ok(providers) => reply(json!({
                "success": true,
                "count": providers.len(),
                "providers": refs_json(&providers),
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn create_product_flow_impl(
        &self,
        params: CreateProductFlowParams,
    ) -> CallToolResult {
        let description = params.description.unwrap_or_default();
        match self
            .client
            .data
            .create_product_flow(&params.name, &description)
            .await
        {
            Ok(flow) => reply(json!({
                "success": true,
                "flow": { "id": flow.id, "name": flow.name },
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn create_process_impl(&self, params: CreateProcessParams) -> CallToolResult {
        let mut exchanges = Vec::with_capacity(params.exchanges.len());
        for spec in &params.exchanges {
            // Resolve by name search first; fall back to treating the
            // value as a literal id.
            let flow = match self
                .client
                .search
                .find_flow(std::slice::from_ref(&spec.flow_id), None)
                .await
            {
                Ok(Some(flow)) => flow,
                Ok(None) => Ref::with_id(RefType::Flow, spec.flow_id.clone()),
                Err(e) => return fail(e),
            };
            let provider = spec
                .provider_id
                .clone()
                .map(|id| Ref::with_id(RefType::Process, id));
            let exchange = match self
                .client
                .data
                .create_exchange(
                    &flow,
                    spec.amount,
                    spec.is_input,
                    spec.is_quantitative_reference.unwrap_or(false),
                    provider,
                )
                .await
            {
                Ok(exchange) => exchange,
                Err(e) => return fail(e),
            };
            exchanges.push(exchange);
        }

        let description = params.description.unwrap_or_default();
        match self
            .client
            .data
            .create_process(&params.name, &description, exchanges)
            .await
        {
            Ok(process) => reply(json!({
                "success": true,
                "process": { "id": process.id, "name": process.name },
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn create_product_system_impl(
        &self,
        params: CreateProductSystemParams,
    ) -> CallToolResult {
        let process = if let Some(id) = params.process_id {
            Ref::with_id(RefType::Process, id)
        } else if let Some(name) = params.process_name {
            match self.client.search.find_process(&[name.clone()]).await {
                Ok(Some(process)) => process,
                Ok(None) => return fail(format!("Process not found: {name}")),
                Err(e) => return fail(e),
            }
        } else {
            return fail("Either process_id or process_name must be provided");
        };
        match self.client.systems.create_product_system(&process).await {
            Ok(system) => reply(json!({
                "success": true,
                "product_system": { "id": system.id, "name": system.name },
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn calculate_impacts_impl(&self, params: CalculateImpactsParams) -> CallToolResult {
        let system = if let Some(id) = params.system_id {
            Ref::with_id(RefType::ProductSystem, id)
        } else if let Some(name) = params.system_name {
            match self.client.search.find_product_system(&[name.clone()]).await {
                Ok(Some(system)) => system,
                Ok(None) => return fail(format!("Product system not found: {name}")),
                Err(e) => return fail(e),
            }
        } else {
            return fail("Either system_id or system_name must be provided");
        };

        let method = if let Some(id) = params.method_id {
            match self
                .client
                .ipc
                .get::<ImpactMethod>(ModelType::ImpactMethod, &id)
                .await
            {
                Ok(Some(method)) => method.to_ref(),
                Ok(None) => return fail("Impact method not found"),
                Err(e) => return fail(e),
            }
        } else if let Some(keywords) = params.method_keywords {
            match self.client.search.find_impact_method(&keywords).await {
                Ok(Some(method)) => method.to_ref(),
                Ok(None) => return fail("Impact method not found"),
                Err(e) => return fail(e),
            }
        } else {
            return fail("Either method_id or method_keywords must be provided");
        };

        let amount = params.amount.unwrap_or(1.0);
        let result = if params.with_contributions.unwrap_or(false) {
            self.client
                .calculations
                .contribution_analysis(&system, &method, amount)
                .await
        } else {
            self.client
                .calculations
                .simple_calculation(&system, Some(&method), amount)
                .await
        };
        let result = match result {
            Ok(result) => result,
            Err(e) => return fail(e),
        };

        let impacts = match self.client.results.get_total_impacts(&result).await {
            Ok(impacts) => impacts,
            Err(e) => {
                // The handle exists even though reading failed; release
                // it instead of leaking.
                if let Err(dispose_err) = self.client.ipc.dispose(&result).await {
                    tracing::warn!(error = %dispose_err, "failed to dispose result");
                }
                return fail(e);
            }
        };

        let result_id = self.results.insert(result, Some(method));
        reply(json!({
            "success": true,
            "result_id": result_id,
            "impacts": impacts
                .iter()
                .map(|i| json!({
                    "name": i.name,
                    "amount": i.amount,
                    "unit": i.unit,
                    "category_id": i.category.id,
                }))
                .collect::<Vec<_>>(),
            "message": "IMPORTANT: Call dispose_result when done with this result_id",
        }))
    }

    pub async fn get_inventory_results_impl(
        &self,
        params: GetInventoryResultsParams,
    ) -> CallToolResult {
        let stored = match self.results.get(&params.result_id) {
            Some(stored) => stored,
            None => return fail(OlcaError::HandleNotFound(params.result_id)),
        };
        match self.client.results.get_inventory(&stored.handle).await {
            Ok(flows) => reply(json!({
                "success": true,
                "count": flows.len(),
                "flows": flows
                    .iter()
                    .map(|f| json!({
                        "name": f.name,
                        "amount": f.amount,
                        "is_input": f.is_input,
                        "flow_id": f.flow.id,
                    }))
                    .collect::<Vec<_>>(),
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn analyze_contributions_impl(
        &self,
        params: AnalyzeContributionsParams,
    ) -> CallToolResult {
        let stored = match self.results.get(&params.result_id) {
            Some(stored) => stored,
            None => return fail(OlcaError::HandleNotFound(params.result_id)),
        };
        let kind = match params.kind.as_deref() {
            None | Some("process") => ContributionKind::Process,
            Some("flow") => ContributionKind::Flow,
            Some(other) => return fail(format!("Unknown contribution kind: {other}")),
        };
        let category = Ref::with_id(RefType::ImpactCategory, params.impact_category_id.clone());
        let n = params.n.unwrap_or(10);
        let min_share = params.min_share.unwrap_or(0.01);
        match self
            .client
            .contributions
            .get_top_contributors(&stored.handle, &category, kind, n, min_share)
            .await
        {
            Ok(contributors) => reply(json!({
                "success": true,
                "impact_category_id": params.impact_category_id,
                "method": stored.method.map(|m| m.name),
                "contributors": contributors
                    .iter()
                    .map(|c| json!({
                        "name": c.name,
                        "amount": c.amount,
                        "share": c.share,
                    }))
                    .collect::<Vec<_>>(),
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn run_monte_carlo_impl(&self, params: RunMonteCarloParams) -> CallToolResult {
        let system = Ref::with_id(RefType::ProductSystem, params.system_id);
        let method = Ref::with_id(RefType::ImpactMethod, params.method_id);
        let iterations = params.iterations.unwrap_or(100);
        match self
            .client
            .uncertainty
            .run_monte_carlo(&system, &method, 1.0, iterations, None)
            .await
        {
            Ok(categories) => reply(json!({
                "success": true,
                "iterations": iterations,
                "categories": categories
                    .iter()
                    .map(|c| json!({
                        "name": c.name,
                        "mean": c.stats.mean,
                        "std": c.stats.std,
                        "cv": c.stats.cv,
                        "percentile_5": c.stats.percentile_5,
                        "percentile_95": c.stats.percentile_95,
                    }))
                    .collect::<Vec<_>>(),
            })),
            Err(e) => fail(e),
        }
    }

    pub async fn export_results_impl(&self, params: ExportResultsParams) -> CallToolResult {
        let path = std::path::Path::new(&params.filename);
        let written = match params.format.as_deref().unwrap_or("csv") {
            "csv" => self.client.export.export_impacts_to_csv(&params.data, path),
            "json" => self.client.export.export_impacts_to_json(&params.data, path),
            other => return fail(format!("Unsupported export format: {other}")),
        };
        if written {
            reply(json!({
                "success": true,
                "path": params.filename,
                "rows": params.data.len(),
            }))
        } else {
            fail(format!("Export to {} failed; see server log", params.filename))
        }
    }

    pub async fn dispose_result_impl(&self, params: DisposeResultParams) -> CallToolResult {
        let stored = match self.results.get(&params.result_id) {
            Some(stored) => stored,
            None => return fail(OlcaError::HandleNotFound(params.result_id)),
        };
        // Drop the local entry only once the server has released the
        // handle; a failed dispose stays retryable.
        match self.client.ipc.dispose(&stored.handle).await {
            Ok(()) => {
                self.results.take(&params.result_id);
                reply(json!({
                    "success": true,
                    "message": format!("Result {} disposed successfully", params.result_id),
                }))
            }
            Err(e) => fail(e),
        }
    }
}
