//! File export of impact totals.

use std::path::Path;

use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::internal::ipc::error::OlcaError;
use crate::internal::uncertainty::ImpactComparison;

/// A flat export row. The MCP layer builds these from arbitrary tool
/// payloads, so it deserializes and carries a JSON schema too.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ImpactRow {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Writes impact rows to disk. Both writers report failure as `false`
/// instead of an error so batch export loops keep going; the cause is
/// logged.
pub struct ExportManager;

impl ExportManager {
    pub fn new() -> Self {
        Self
    }

    /// CSV with a header row and one `name,amount,unit` row per
    /// impact. Amounts use exponent notation so magnitudes survive a
    /// spreadsheet round trip.
    pub fn export_impacts_to_csv(&self, impacts: &[ImpactRow], path: &Path) -> bool {
        match self.write_csv(impacts, path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), rows = impacts.len(), "wrote csv export");
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "csv export failed");
                false
            }
        }
    }

    /// JSON array of impact objects, pretty-printed.
    pub fn export_impacts_to_json(&self, impacts: &[ImpactRow], path: &Path) -> bool {
        match self.write_json(impacts, path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), rows = impacts.len(), "wrote json export");
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "json export failed");
                false
            }
        }
    }

    /// CSV comparison table: one row per impact category with both
    /// system means, the absolute difference, and the relative
    /// difference in percent.
    pub fn export_comparison_to_csv(
        &self,
        comparisons: &[ImpactComparison],
        path: &Path,
    ) -> bool {
        match self.write_comparison_csv(comparisons, path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), rows = comparisons.len(), "wrote comparison export");
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "comparison export failed");
                false
            }
        }
    }

    fn write_csv(&self, impacts: &[ImpactRow], path: &Path) -> Result<(), OlcaError> {
        let mut writer = csv::Writer::from_path(path).map_err(io_of_csv)?;
        writer
            .write_record(["name", "amount", "unit"])
            .map_err(io_of_csv)?;
        for row in impacts {
            writer
                .write_record([row.name.as_str(), &format!("{:e}", row.amount), &row.unit])
                .map_err(io_of_csv)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_comparison_csv(
        &self,
        comparisons: &[ImpactComparison],
        path: &Path,
    ) -> Result<(), OlcaError> {
        let mut writer = csv::Writer::from_path(path).map_err(io_of_csv)?;
        writer
            .write_record([
                "Impact Category",
                "System 1",
                "System 2",
                "Difference",
                "% Difference",
            ])
            .map_err(io_of_csv)?;
        for row in comparisons {
            writer
                .write_record([
                    row.name.as_str(),
                    &format!("{:.4e}", row.system1_mean),
                    &format!("{:.4e}", row.system2_mean),
                    &format!("{:.4e}", row.difference),
                    &format!("{:.2}%", row.percent_difference),
                ])
                .map_err(io_of_csv)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(&self, impacts: &[ImpactRow], path: &Path) -> Result<(), OlcaError> {
        let json = serde_json::to_string_pretty(impacts)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Default for ExportManager {
    fn default() -> Self {
        Self::new()
    }
}

fn io_of_csv(e: csv::Error) -> OlcaError {
    OlcaError::Io(std::io::Error::other(e))
}
