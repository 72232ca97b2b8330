//! Domain entity types exchanged with the openLCA store.
//!
//! Entities are owned and persisted by the desktop application; these
//! types are transient references and submission payloads, serialized
//! with the store's camelCase + `@type`/`@id` naming.

use serde::{Deserialize, Serialize};

/// A lightweight reference to a stored entity. Equality and hashing
/// consider only the id; names are display metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<RefType>,
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Unit symbol attached to impact category refs.
    #[serde(rename = "refUnit", default, skip_serializing_if = "Option::is_none")]
    pub ref_unit: Option<String>,
}

impl Ref {
    pub fn new(ref_type: RefType, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ref_type: Some(ref_type),
            id: id.into(),
            name: name.into(),
            ref_unit: None,
        }
    }

    /// A reference carrying only an id, for lookups by identifier.
    pub fn with_id(ref_type: RefType, id: impl Into<String>) -> Self {
        Self::new(ref_type, id, "")
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Ref {}

impl std::hash::Hash for Ref {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Type tag carried in `@type` of a [`Ref`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefType {
    Flow,
    FlowProperty,
    ImpactCategory,
    ImpactMethod,
    Process,
    ProductSystem,
    Unit,
    UnitGroup,
}

/// Entity classes addressable in bulk descriptor fetches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModelType {
    Flow,
    FlowProperty,
    ImpactCategory,
    ImpactMethod,
    Process,
    ProductSystem,
    UnitGroup,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Flow => "Flow",
            ModelType::FlowProperty => "FlowProperty",
            ModelType::ImpactCategory => "ImpactCategory",
            ModelType::ImpactMethod => "ImpactMethod",
            ModelType::Process => "Process",
            ModelType::ProductSystem => "ProductSystem",
            ModelType::UnitGroup => "UnitGroup",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowType {
    ElementaryFlow,
    ProductFlow,
    WasteFlow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessType {
    LciResult,
    UnitProcess,
}

/// A flow submitted to the store. The server treats the client-side
/// uuid as the persistent id.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub flow_type: FlowType,
    #[serde(default)]
    pub flow_properties: Vec<FlowPropertyFactor>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPropertyFactor {
    pub flow_property: Ref,
    pub conversion_factor: f64,
    pub is_ref_flow_property: bool,
}

/// Full flow property record, fetched once to resolve the canonical
/// Mass property and its unit group.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowProperty {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub unit_group: Ref,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitGroup {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub units: Vec<Unit>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One input or output row of a process.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(default)]
    pub internal_id: i32,
    pub flow: Ref,
    pub amount: f64,
    pub unit: Ref,
    pub flow_property: Ref,
    pub is_input: bool,
    pub is_quantitative_reference: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub process_type: ProcessType,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub last_internal_id: i32,
}

/// Impact method with its category list, used to present category ids
/// to callers after a keyword search.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMethod {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub impact_categories: Vec<Ref>,
}

impl ImpactMethod {
    pub fn to_ref(&self) -> Ref {
        Ref::new(RefType::ImpactMethod, self.id.clone(), self.name.clone())
    }
}

/// Linking configuration for product system creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkingConfig {
    pub prefer_unit_processes: bool,
    pub provider_linking: String,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            prefer_unit_processes: false,
            provider_linking: "PREFER_DEFAULTS".to_string(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationType {
    SimpleCalculation,
    ContributionAnalysis,
    MonteCarloSimulation,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRedef {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Ref>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationSetup {
    pub calculation_type: CalculationType,
    pub target: Ref,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_method: Option<Ref>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_redefs: Vec<ParameterRedef>,
}

/// Opaque handle to a server-side result. Holding it consumes server
/// memory; every handle must eventually be disposed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultHandle {
    #[serde(rename = "@id")]
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResultState {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "isReady", default)]
    pub is_ready: bool,
    #[serde(rename = "isScheduled", default)]
    pub is_scheduled: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// A provider relation: the process supplying a product flow.
///
/// Older servers report the process under `process` instead of
/// `provider`; [`TechFlow::provider`] is the single accessor that
/// resolves the difference at the parse boundary.
#[derive(Clone, Debug, Deserialize)]
pub struct TechFlow {
    #[serde(default)]
    provider: Option<Ref>,
    #[serde(default)]
    process: Option<Ref>,
    #[serde(default)]
    pub flow: Option<Ref>,
}

impl TechFlow {
    pub fn provider(&self) -> Option<&Ref> {
        self.provider.as_ref().or(self.process.as_ref())
    }
}

/// Total impact of one category. Some server versions report the
/// figure as `value` instead of `amount`.
#[derive(Clone, Debug, Deserialize)]
pub struct ImpactValue {
    #[serde(rename = "impactCategory")]
    pub impact_category: Ref,
    #[serde(rename = "amount", alias = "value", default)]
    pub amount: f64,
}

/// Per-provider contribution to one impact category.
#[derive(Clone, Debug, Deserialize)]
pub struct TechFlowValue {
    #[serde(rename = "techFlow")]
    pub tech_flow: TechFlow,
    #[serde(rename = "amount", alias = "value", default)]
    pub amount: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EnviFlow {
    pub flow: Ref,
    #[serde(rename = "isInput", default)]
    pub is_input: bool,
}

/// Per-flow inventory or contribution figure.
#[derive(Clone, Debug, Deserialize)]
pub struct EnviFlowValue {
    #[serde(rename = "enviFlow")]
    pub envi_flow: EnviFlow,
    #[serde(rename = "amount", alias = "value", default)]
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_equality_ignores_name() {
        let a = Ref::new(RefType::Flow, "f-1", "Steel");
        let b = Ref::new(RefType::Flow, "f-1", "steel, hot rolled");
        let c = Ref::new(RefType::Flow, "f-2", "Steel");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn impact_value_accepts_value_alias() {
        let v: ImpactValue = serde_json::from_value(serde_json::json!({
            "impactCategory": { "@id": "c1", "name": "GWP", "refUnit": "kg CO2-eq" },
            "value": 4.2,
        }))
        .unwrap();
        assert_eq!(v.amount, 4.2);
        assert_eq!(v.impact_category.ref_unit.as_deref(), Some("kg CO2-eq"));
    }

    #[test]
    fn tech_flow_provider_falls_back_to_process() {
        let t: TechFlow = serde_json::from_value(serde_json::json!({
            "process": { "@id": "p1", "name": "steel production" },
        }))
        .unwrap();
        assert_eq!(t.provider().unwrap().id, "p1");
    }

    #[test]
    fn setup_serializes_screaming_snake_type() {
        let setup = CalculationSetup {
            calculation_type: CalculationType::ContributionAnalysis,
            target: Ref::with_id(RefType::ProductSystem, "s1"),
            impact_method: None,
            amount: 1.0,
            parameter_redefs: vec![],
        };
        let json = serde_json::to_value(&setup).unwrap();
        assert_eq!(json["calculationType"], "CONTRIBUTION_ANALYSIS");
        assert!(json.get("impactMethod").is_none());
    }
}
