use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::model::Metric;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Transaction table (.csv, .json, .parquet) to open at start-up.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// GeoJSON file with planning-area boundaries.
    #[arg(long)]
    pub boundaries: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Initial metric: price, area or unit-price.
    #[arg(long)]
    pub metric: Option<Metric>,
}

impl Args {
    /// Read the config file (if any) and apply command-line overrides.
    pub fn into_config(self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(path) = self.data {
            config.data_path = Some(path);
        }
        if let Some(path) = self.boundaries {
            config.boundaries_path = Some(path);
        }
        if let Some(metric) = self.metric {
            config.default_metric = metric;
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Configuration file
// ---------------------------------------------------------------------------

/// Dataset headers for every field the dashboard reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub planning_area: String,
    pub property_type: String,
    pub region: String,
    pub price: String,
    pub area: String,
    pub unit_price: String,
    pub sale_date: String,
    pub tenure: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            planning_area: "Planning Area".to_string(),
            property_type: "Property Type".to_string(),
            region: "Region".to_string(),
            price: "Transacted Price ($)".to_string(),
            area: "Area (SQM)".to_string(),
            unit_price: "Unit Price ($ PSM)".to_string(),
            sale_date: "Sale Date".to_string(),
            tenure: "Tenure Remaining".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: Option<PathBuf>,
    pub boundaries_path: Option<PathBuf>,
    pub columns: ColumnNames,
    /// chrono formats tried in order; month-only formats mean the 1st.
    pub sale_date_formats: Vec<String>,
    /// GeoJSON feature property holding the planning-area name.
    pub boundary_name_property: String,
    pub default_metric: Metric,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            boundaries_path: None,
            columns: ColumnNames::default(),
            sale_date_formats: vec!["%b-%y".to_string(), "%Y-%m-%d".to_string()],
            boundary_name_property: "planning_area".to_string(),
            default_metric: Metric::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }
}
