use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const YEAR: &str = "Year";
pub const PROVINCE: &str = "Province";
pub const CARBON_EMISSION: &str = "Carbon_Emission";

/// Columns every input file must provide, in display order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    YEAR,
    PROVINCE,
    "Capital",
    "Labor",
    "Energy",
    "Finance",
    CARBON_EMISSION,
    "DEA_Score",
    "BANN_Score",
];

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as the reader produced it
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common spreadsheet / Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Text is parsed, so CSV-style numbers work too.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view of the cell. Spreadsheet readers hand back whole numbers
    /// as floats, so `2020.0` is accepted while `2020.5` is not.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Selectable columns
// ---------------------------------------------------------------------------

/// Which precomputed efficiency score drives colour and ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScoreColumn {
    #[serde(rename = "DEA_Score")]
    Dea,
    #[serde(rename = "BANN_Score")]
    Bann,
}

impl ScoreColumn {
    pub fn column_name(self) -> &'static str {
        match self {
            ScoreColumn::Dea => "DEA_Score",
            ScoreColumn::Bann => "BANN_Score",
        }
    }

    pub fn value(self, obs: &Observation) -> f64 {
        match self {
            ScoreColumn::Dea => obs.dea_score,
            ScoreColumn::Bann => obs.bann_score,
        }
    }
}

/// Input measure plotted on the scatter x-axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InputMeasure {
    Capital,
    Labor,
    Energy,
    Finance,
}

impl InputMeasure {
    pub fn column_name(self) -> &'static str {
        match self {
            InputMeasure::Capital => "Capital",
            InputMeasure::Labor => "Labor",
            InputMeasure::Energy => "Energy",
            InputMeasure::Finance => "Finance",
        }
    }

    pub fn value(self, obs: &Observation) -> f64 {
        match self {
            InputMeasure::Capital => obs.capital,
            InputMeasure::Labor => obs.labor,
            InputMeasure::Energy => obs.energy,
            InputMeasure::Finance => obs.finance,
        }
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the panel
// ---------------------------------------------------------------------------

/// One (Province, Year) row. Missing numeric cells are stored as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub province: String,
    pub year: i32,
    pub capital: f64,
    pub labor: f64,
    pub energy: f64,
    pub finance: f64,
    pub carbon_emission: f64,
    pub dea_score: f64,
    pub bann_score: f64,
    /// Any columns beyond the required ones, kept for raw-table inspection.
    pub extra: BTreeMap<String, CellValue>,
}

impl Observation {
    /// Cell text for a column, used by the raw data table.
    pub fn cell_text(&self, column: &str) -> String {
        fn num(v: f64) -> String {
            if v.is_nan() {
                "NaN".to_string()
            } else {
                format!("{v:.4}")
            }
        }
        match column {
            YEAR => self.year.to_string(),
            PROVINCE => self.province.clone(),
            "Capital" => num(self.capital),
            "Labor" => num(self.labor),
            "Energy" => num(self.energy),
            "Finance" => num(self.finance),
            CARBON_EMISSION => num(self.carbon_emission),
            "DEA_Score" => num(self.dea_score),
            "BANN_Score" => num(self.bann_score),
            other => self
                .extra
                .get(other)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Panel – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed panel with pre-computed selector domains.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// All rows, in file order.
    pub observations: Vec<Observation>,
    /// Column names in file order (required and extra).
    pub columns: Vec<String>,
    /// Sorted distinct years.
    pub years: Vec<i32>,
    /// Distinct provinces in order of first appearance.
    pub provinces: Vec<String>,
}

impl Panel {
    /// Build selector domains from the loaded rows.
    pub fn from_observations(columns: Vec<String>, observations: Vec<Observation>) -> Self {
        let years: BTreeSet<i32> = observations.iter().map(|o| o.year).collect();

        let mut seen = BTreeSet::new();
        let mut provinces = Vec::new();
        for obs in &observations {
            if seen.insert(obs.province.as_str()) {
                provinces.push(obs.province.clone());
            }
        }

        Panel {
            observations,
            columns,
            years: years.into_iter().collect(),
            provinces,
        }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Most recent year present, the default year selection.
    pub fn latest_year(&self) -> Option<i32> {
        self.years.last().copied()
    }
}
