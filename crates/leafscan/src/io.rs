//! JSON configuration and report helpers for leaf analysis.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::params::LeafAnalyzerParams;
use crate::pipeline::LeafAnalyzer;
use crate::result::AnalysisResult;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    pub image_path: String,
    /// Real area of the reference square, e.g. in cm².
    pub reference_area: f64,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub annotated_path: Option<String>,
    #[serde(default)]
    pub params: LeafAnalyzerParams,
}

impl AnalyzeConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the report path.
    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("leafscan_report.json"))
    }

    pub fn build_analyzer(&self) -> Result<LeafAnalyzer, ParamsError> {
        LeafAnalyzer::new(self.params.clone())
    }
}

/// What the CLI writes after a run: the inputs plus the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub image_path: String,
    pub reference_area: f64,
    #[serde(default)]
    pub params: LeafAnalyzerParams,
    pub result: AnalysisResult,
}

impl AnalysisReport {
    pub fn new(config: &AnalyzeConfig, result: AnalysisResult) -> Self {
        Self {
            image_path: config.image_path.clone(),
            reference_area: config.reference_area,
            params: config.params.clone(),
            result,
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
