use std::path::PathBuf;

use serde::Serialize;

use crate::data::model::{InputMeasure, ScoreColumn};

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Fixed location of the input file, relative to the working directory.
pub const DATA_PATH: &str = "data.xlsx";

/// A labeled choice of efficiency score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOption {
    pub label: String,
    pub column: ScoreColumn,
}

impl ModelOption {
    /// First word of the label, e.g. `SFA`, used in chart titles and legends.
    pub fn short_name(&self) -> &str {
        self.label.split(' ').next().unwrap_or(&self.label)
    }
}

/// A labeled choice of scatter x-axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisOption {
    pub label: String,
    pub measure: InputMeasure,
}

/// Everything the dashboard needs besides the data itself.
///
/// The label → column mappings are data: the model labels name estimation
/// methods, the columns name what the input file actually holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub title: String,
    pub ranking_len: usize,
    pub models: Vec<ModelOption>,
    pub x_axes: Vec<AxisOption>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let model = |label: &str, column| ModelOption {
            label: label.to_string(),
            column,
        };
        let axis = |label: &str, measure| AxisOption {
            label: label.to_string(),
            measure,
        };
        Self {
            data_path: PathBuf::from(DATA_PATH),
            title: "Public management project: provincial efficiency and carbon emission analysis"
                .to_string(),
            ranking_len: 5,
            models: vec![
                model("SFA (stochastic frontier / DEA reference)", ScoreColumn::Dea),
                model("BANN (Bayesian neural network)", ScoreColumn::Bann),
            ],
            x_axes: vec![
                axis("Capital input (Capital)", InputMeasure::Capital),
                axis("Labor input (Labor)", InputMeasure::Labor),
                axis("Energy input (Energy)", InputMeasure::Energy),
                axis("Finance input (Finance)", InputMeasure::Finance),
            ],
        }
    }
}

impl DashboardConfig {
    /// Model option by index, falling back to the first.
    pub fn model(&self, idx: usize) -> Option<&ModelOption> {
        self.models.get(idx).or_else(|| self.models.first())
    }

    /// X-axis option by index, falling back to the first.
    pub fn x_axis(&self, idx: usize) -> Option<&AxisOption> {
        self.x_axes.get(idx).or_else(|| self.x_axes.first())
    }

    /// Model option bound to a score column, for trend legends.
    pub fn model_for(&self, column: ScoreColumn) -> Option<&ModelOption> {
        self.models.iter().find(|m| m.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mapping_keeps_file_columns() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.data_path, PathBuf::from("data.xlsx"));
        assert_eq!(cfg.ranking_len, 5);
        assert_eq!(cfg.model(0).map(|m| m.column), Some(ScoreColumn::Dea));
        assert_eq!(cfg.model(1).map(|m| m.column), Some(ScoreColumn::Bann));
        assert_eq!(cfg.model(0).map(ModelOption::short_name), Some("SFA"));
        assert_eq!(cfg.x_axes.len(), 4);
    }

    #[test]
    fn out_of_range_index_falls_back_to_first() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.x_axis(9).map(|a| a.measure), Some(InputMeasure::Capital));
    }

    #[test]
    fn score_columns_serialize_as_column_names() {
        let cfg = DashboardConfig::default();
        let json = serde_json::to_value(&cfg.models).unwrap();
        assert_eq!(json[0]["column"], "DEA_Score");
        assert_eq!(json[1]["column"], "BANN_Score");
    }
}
