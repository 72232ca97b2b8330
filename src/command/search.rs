//! This module implements the `search` command: keyword lookup of
//! flows, processes, or impact methods in the connected database.

use clap::Parser;

use crate::internal::client::OlcaClient;
use crate::internal::config::Config;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::FlowType;

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Keywords; all must match, case-insensitively
    #[clap(required = true)]
    pub keywords: Vec<String>,

    /// What to search for
    #[clap(long, default_value = "flow", value_parser = ["flow", "process", "method"])]
    pub model: String,

    /// Maximum number of results
    #[clap(long, default_value_t = 10)]
    pub max_results: usize,

    /// Filter flows by type (product, elementary, waste)
    #[clap(long, required = false)]
    pub flow_type: Option<String>,
}

pub async fn execute(args: SearchArgs) {
    match search(args).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e}");
        }
    }
}

async fn search(args: SearchArgs) -> Result<(), OlcaError> {
    let client = OlcaClient::connect(&Config::from_env().endpoint());

    match args.model.as_str() {
        "flow" => {
            let flow_type = match args.flow_type.as_deref() {
                Some("product") => Some(FlowType::ProductFlow),
                Some("elementary") => Some(FlowType::ElementaryFlow),
                Some("waste") => Some(FlowType::WasteFlow),
                Some(other) => {
                    return Err(OlcaError::InvalidArgument(format!(
                        "unknown flow type: {other}"
                    )));
                }
                None => None,
            };
            let outcome = client
                .search
                .find_flows(&args.keywords, args.max_results, flow_type)
                .await?;
            for flow in &outcome.matches {
                println!("{}  {}", flow.id, flow.name);
            }
            if outcome.omitted > 0 {
                println!("... and {} more (raise --max-results)", outcome.omitted);
            }
        }
        "process" => {
            let outcome = client
                .search
                .find_processes(&args.keywords, args.max_results)
                .await?;
            for process in &outcome.matches {
                println!("{}  {}", process.id, process.name);
            }
            if outcome.omitted > 0 {
                println!("... and {} more (raise --max-results)", outcome.omitted);
            }
        }
        "method" => match client.search.find_impact_method(&args.keywords).await? {
            Some(method) => {
                println!("{}  {}", method.id, method.name);
                for category in &method.impact_categories {
                    println!("  {}  {}", category.id, category.name);
                }
            }
            None => println!("no impact method matched"),
        },
        // unreachable: clap restricts the value set
        other => {
            return Err(OlcaError::InvalidArgument(format!("unknown model: {other}")));
        }
    }
    Ok(())
}
