//! This module implements the `calculate` command: run an LCIA
//! calculation for a product system and print (or export) the totals.

use std::path::PathBuf;

use clap::Parser;

use crate::internal::client::OlcaClient;
use crate::internal::config::Config;
use crate::internal::export::ImpactRow;
use crate::internal::ipc::error::OlcaError;
use crate::internal::ipc::schema::{Ref, RefType};

#[derive(Parser, Debug, Clone)]
pub struct CalculateArgs {
    /// Product system id
    #[clap(long)]
    pub system: String,

    /// Keywords identifying the impact method
    #[clap(long, required = true, num_args = 1..)]
    pub method: Vec<String>,

    /// Reference amount
    #[clap(long, default_value_t = 1.0)]
    pub amount: f64,

    /// Write the totals to a CSV file instead of stdout only
    #[clap(long, required = false)]
    pub csv: Option<PathBuf>,
}

pub async fn execute(args: CalculateArgs) {
    match calculate(args).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e}");
        }
    }
}

async fn calculate(args: CalculateArgs) -> Result<(), OlcaError> {
    let client = OlcaClient::connect(&Config::from_env().endpoint());

    let method = client
        .search
        .find_impact_method(&args.method)
        .await?
        .ok_or_else(|| OlcaError::NotFound(format!("impact method '{}'", args.method.join(" "))))?;

    let system = Ref::with_id(RefType::ProductSystem, args.system.clone());
    let result = client
        .calculations
        .simple_calculation(&system, Some(&method.to_ref()), args.amount)
        .await?;

    let impacts = client.results.get_total_impacts(&result).await;
    let dispose = client.ipc.dispose(&result).await;
    let impacts = impacts?;
    dispose?;

    for impact in &impacts {
        println!("{:<50} {:>14.6e} {}", impact.name, impact.amount, impact.unit);
    }

    if let Some(path) = args.csv {
        let rows: Vec<ImpactRow> = impacts
            .iter()
            .map(|i| ImpactRow {
                name: i.name.clone(),
                amount: i.amount,
                unit: i.unit.clone(),
            })
            .collect();
        if !client.export.export_impacts_to_csv(&rows, &path) {
            return Err(OlcaError::InvalidArgument(format!(
                "could not write {}",
                path.display()
            )));
        }
        println!("wrote {}", path.display());
    }
    Ok(())
}
