use crate::color::ContinuousColorScale;
use crate::config::DashboardConfig;
use crate::data::filter::{province_subset, top_ranked, year_subset, RankEntry};
use crate::data::model::{Observation, Panel, ScoreColumn};
use crate::state::Selection;

// ---------------------------------------------------------------------------
// View artifacts
// ---------------------------------------------------------------------------
//
// Everything the UI draws is computed here from (panel, selection, config)
// with no egui types involved, so each frame is a pure function of its inputs.

/// Largest marker radius in points, given to the biggest emitter of the year.
pub const MAX_MARKER_RADIUS: f32 = 10.0;
pub const MIN_MARKER_RADIUS: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub province: String,
    pub x: f64,
    pub y: f64,
    pub radius: f32,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterView {
    pub title: String,
    pub x_label: String,
    /// Source column of the x values, shown on hover.
    pub x_column: String,
    pub score_label: String,
    pub points: Vec<ScatterPoint>,
    pub scale: ContinuousColorScale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingView {
    pub column: ScoreColumn,
    pub entries: Vec<RankEntry>,
}

/// The year-level panels: either both charts, or a warning in their place.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossSection {
    Missing { warning: String },
    Ready { scatter: ScatterView, ranking: RankingView },
}

/// Affine map between the score axis (left) and the emission axis (right).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryAxis {
    pub primary: (f64, f64),
    pub secondary: (f64, f64),
}

impl SecondaryAxis {
    /// Left axis covers `[0, 1]` and every score; right axis covers zero and
    /// every emission value.
    pub fn fit(
        scores: impl IntoIterator<Item = f64>,
        emissions: impl IntoIterator<Item = f64>,
    ) -> Self {
        fn span(values: impl IntoIterator<Item = f64>, lo: f64, hi: f64) -> (f64, f64) {
            values
                .into_iter()
                .filter(|v| v.is_finite())
                .fold((lo, hi), |(lo, hi), v| (lo.min(v), hi.max(v)))
        }
        let primary = span(scores, 0.0, 1.0);
        let (lo, hi) = span(emissions, 0.0, 0.0);
        let secondary = if hi - lo > f64::EPSILON { (lo, hi) } else { (lo, lo + 1.0) };
        Self { primary, secondary }
    }

    /// Emission value → drawing coordinate.
    pub fn to_primary(&self, value: f64) -> f64 {
        let (p0, p1) = self.primary;
        let (s0, s1) = self.secondary;
        p0 + (value - s0) * (p1 - p0) / (s1 - s0)
    }

    /// Drawing coordinate → emission value, for right-hand tick labels.
    pub fn to_secondary(&self, coord: f64) -> f64 {
        let (p0, p1) = self.primary;
        let (s0, s1) = self.secondary;
        s0 + (coord - p0) * (s1 - s0) / (p1 - p0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub title: String,
    pub bann_label: String,
    pub dea_label: String,
    pub bann: Vec<[f64; 2]>,
    pub dea: Vec<[f64; 2]>,
    /// `(year, emission)` in emission units; map through `axis` to draw.
    pub emission: Vec<[f64; 2]>,
    pub axis: SecondaryAxis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView<'a> {
    pub heading: String,
    pub cross_section: CrossSection,
    /// Year subset for the raw data table.
    pub year_rows: Vec<&'a Observation>,
    pub trend: Option<TrendView>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Marker radius with area proportional to `value / max`.
pub fn marker_radius(value: f64, max: f64) -> f32 {
    if !(value.is_finite() && max.is_finite()) || value <= 0.0 || max <= 0.0 {
        return MIN_MARKER_RADIUS;
    }
    (MAX_MARKER_RADIUS * (value / max).sqrt() as f32).max(MIN_MARKER_RADIUS)
}

pub fn scatter_view(rows: &[&Observation], selection: &Selection, config: &DashboardConfig) -> ScatterView {
    let model = config.model(selection.model);
    let axis = config.x_axis(selection.x_axis);
    let score = model.map(|m| m.column).unwrap_or(ScoreColumn::Dea);

    let max_emission = rows
        .iter()
        .map(|o| o.carbon_emission)
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);

    let points: Vec<ScatterPoint> = rows
        .iter()
        .filter_map(|o| {
            let x = axis?.measure.value(o);
            let y = o.carbon_emission;
            (x.is_finite() && y.is_finite()).then(|| ScatterPoint {
                province: o.province.clone(),
                x,
                y,
                radius: marker_radius(y, max_emission),
                score: score.value(o),
            })
        })
        .collect();

    let x_label = axis.map(|a| a.label.clone()).unwrap_or_default();
    let short = model.map(|m| m.short_name()).unwrap_or_default();

    ScatterView {
        title: format!("{x_label} vs carbon emission (color = {short} efficiency)"),
        x_label,
        x_column: axis.map(|a| a.measure.column_name().to_string()).unwrap_or_default(),
        score_label: score.column_name().to_string(),
        scale: ContinuousColorScale::from_values(points.iter().map(|p| p.score)),
        points,
    }
}

pub fn ranking_view(rows: &[&Observation], selection: &Selection, config: &DashboardConfig) -> RankingView {
    let column = config
        .model(selection.model)
        .map(|m| m.column)
        .unwrap_or(ScoreColumn::Dea);
    RankingView {
        column,
        entries: top_ranked(rows, column, config.ranking_len),
    }
}

pub fn trend_view(panel: &Panel, province: &str, config: &DashboardConfig) -> TrendView {
    let rows = province_subset(panel, province);

    fn series(rows: &[&Observation], f: impl Fn(&Observation) -> f64) -> Vec<[f64; 2]> {
        rows.iter()
            .map(|&o| [o.year as f64, f(o)])
            .filter(|[_, v]| v.is_finite())
            .collect()
    }
    let bann = series(&rows, |o| o.bann_score);
    let dea = series(&rows, |o| o.dea_score);
    let emission = series(&rows, |o| o.carbon_emission);

    let axis = SecondaryAxis::fit(
        bann.iter().chain(&dea).map(|p| p[1]),
        emission.iter().map(|p| p[1]),
    );

    let label = |column: ScoreColumn| {
        let name = config
            .model_for(column)
            .map(|m| m.short_name().to_string())
            .unwrap_or_else(|| column.column_name().to_string());
        format!("{name} efficiency")
    };

    let span = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => format!(" ({}-{})", first.year, last.year),
        _ => String::new(),
    };

    TrendView {
        title: format!("{province}: efficiency and emission over time{span}"),
        bann_label: label(ScoreColumn::Bann),
        dea_label: label(ScoreColumn::Dea),
        bann,
        dea,
        emission,
        axis,
    }
}

/// Build every view for the current selection.
pub fn build_view<'a>(panel: &'a Panel, selection: &Selection, config: &DashboardConfig) -> DashboardView<'a> {
    let year_rows = selection
        .year
        .map(|y| year_subset(panel, y))
        .unwrap_or_default();

    let heading = match selection.year {
        Some(y) => format!("{y}: input-output efficiency distribution"),
        None => "Input-output efficiency distribution".to_string(),
    };

    let cross_section = if year_rows.is_empty() {
        let warning = match selection.year {
            Some(y) => format!("No data for {y}."),
            None => "The loaded file has no observations.".to_string(),
        };
        CrossSection::Missing { warning }
    } else {
        CrossSection::Ready {
            scatter: scatter_view(&year_rows, selection, config),
            ranking: ranking_view(&year_rows, selection, config),
        }
    };

    let trend = selection
        .province
        .as_deref()
        .map(|p| trend_view(panel, p, config));

    DashboardView {
        heading,
        cross_section,
        year_rows,
        trend,
    }
}
