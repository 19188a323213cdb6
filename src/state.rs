use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::filter::year_subset;
use crate::data::model::Panel;
use crate::error::LoadError;
use crate::view::{build_view, DashboardView};

// ---------------------------------------------------------------------------
// Selector values
// ---------------------------------------------------------------------------

/// Current value of every user control.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub year: Option<i32>,
    /// Index into [`DashboardConfig::models`].
    pub model: usize,
    /// Index into [`DashboardConfig::x_axes`].
    pub x_axis: usize,
    pub province: Option<String>,
}

impl Selection {
    /// Latest year, first model and axis, first province.
    pub fn initial(panel: &Panel) -> Self {
        Self {
            year: panel.latest_year(),
            model: 0,
            x_axis: 0,
            province: panel.provinces.first().cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded panel (None when loading failed).
    pub panel: Option<Arc<Panel>>,

    pub selection: Selection,

    /// Fatal load error shown instead of the dashboard.
    pub status_message: Option<String>,
}

impl AppState {
    /// State for the outcome of the one-time load.
    pub fn new(config: DashboardConfig, loaded: anyhow::Result<Arc<Panel>>) -> Self {
        let mut state = Self {
            config,
            panel: None,
            selection: Selection::default(),
            status_message: None,
        };
        match loaded {
            Ok(panel) => state.set_panel(panel),
            Err(e) => {
                log::error!("Failed to load data: {e:#}");
                state.status_message = Some(load_failure_message(&e));
            }
        }
        state
    }

    /// Ingest the loaded panel and reset the selectors to their defaults.
    pub fn set_panel(&mut self, panel: Arc<Panel>) {
        if panel.is_empty() {
            log::warn!("Input file contains no observations");
        }
        self.selection = Selection::initial(&panel);
        self.panel = Some(panel);
        self.status_message = None;
    }

    pub fn set_year(&mut self, year: i32) {
        log::debug!("Year selected: {year}");
        if let Some(panel) = &self.panel {
            if year_subset(panel, year).is_empty() {
                log::warn!("No observations for {year}");
            }
        }
        self.selection.year = Some(year);
    }

    pub fn set_model(&mut self, idx: usize) {
        log::debug!("Model selected: {idx}");
        self.selection.model = idx;
    }

    pub fn set_x_axis(&mut self, idx: usize) {
        log::debug!("X axis selected: {idx}");
        self.selection.x_axis = idx;
    }

    pub fn set_province(&mut self, province: String) {
        log::debug!("Province selected: {province}");
        self.selection.province = Some(province);
    }

    /// Views for the current selection; `None` when nothing is loaded.
    pub fn view(&self) -> Option<DashboardView<'_>> {
        self.panel
            .as_deref()
            .map(|panel| build_view(panel, &self.selection, &self.config))
    }
}

/// User-facing text for a failed load.
pub fn load_failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<LoadError>() {
        Some(LoadError::NotFound(path)) => format!(
            "Cannot find '{}'. Run the data merge script first.",
            path.display()
        ),
        _ => format!("Error: {err:#}"),
    }
}
