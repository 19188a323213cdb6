use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Observation;
use crate::state::AppState;
use crate::ui::plot;
use crate::view::{CrossSection, RankingView};

const WARNING_COLOR: Color32 = Color32::from_rgb(0xe0, 0xa0, 0x20);

// ---------------------------------------------------------------------------
// Left side panel – selector widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let panel = match &state.panel {
        Some(p) => p.clone(),
        None => {
            ui.label("No data loaded.");
            return;
        }
    };

    // ---- Year: slider over the distinct years ----
    ui.strong("Select year");
    let years = &panel.years;
    if let Some(last) = years.len().checked_sub(1) {
        let current = state
            .selection
            .year
            .and_then(|y| years.iter().position(|&v| v == y))
            .unwrap_or(last);
        let mut idx = current;
        ui.add(
            egui::Slider::new(&mut idx, 0..=last)
                .show_value(true)
                .custom_formatter(|v, _| {
                    years
                        .get(v.round() as usize)
                        .map(|y| y.to_string())
                        .unwrap_or_default()
                })
                .custom_parser(|s| {
                    let year: i32 = s.trim().parse().ok()?;
                    years.iter().position(|&v| v == year).map(|i| i as f64)
                }),
        );
        if idx != current {
            if let Some(&year) = years.get(idx) {
                state.set_year(year);
            }
        }
    } else {
        ui.label("No years available.");
    }
    ui.separator();

    // ---- Model: which score column drives colour and ranking ----
    ui.strong("Select evaluation model");
    let labels: Vec<String> = state.config.models.iter().map(|m| m.label.clone()).collect();
    let mut model = state.selection.model;
    for (i, label) in labels.iter().enumerate() {
        ui.radio_value(&mut model, i, label);
    }
    if model != state.selection.model {
        state.set_model(model);
    }
    ui.separator();

    // ---- X axis: which input measure ----
    ui.strong("Select x-axis input");
    let labels: Vec<String> = state.config.x_axes.iter().map(|a| a.label.clone()).collect();
    let mut axis = state.selection.x_axis;
    egui::ComboBox::from_id_salt("x_axis")
        .selected_text(labels.get(axis).cloned().unwrap_or_default())
        .show_ui(ui, |ui: &mut Ui| {
            for (i, label) in labels.iter().enumerate() {
                ui.selectable_value(&mut axis, i, label);
            }
        });
    if axis != state.selection.x_axis {
        state.set_x_axis(axis);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the title and load status.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading(&state.config.title);
        ui.separator();

        if let Some(panel) = &state.panel {
            let in_year = match state.selection.year {
                Some(y) => panel.observations.iter().filter(|o| o.year == y).count(),
                None => 0,
            };
            ui.label(format!(
                "{} observations loaded from {}, {} in selected year",
                panel.len(),
                state.config.data_path.display(),
                in_year
            ));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the dashboard body, or the load error in its place.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if let Some(msg) = &state.status_message {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new(msg).color(Color32::RED).heading());
        });
        return;
    }

    let mut picked_province = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let (Some(view), Some(panel)) = (state.view(), state.panel.as_deref()) else {
                return;
            };

            // ---- Year cross-section: scatter (3/4) + ranking (1/4) ----
            ui.horizontal_top(|ui: &mut Ui| {
                let width = ui.available_width();
                ui.vertical(|ui: &mut Ui| {
                    ui.set_width(width * 0.72);
                    ui.heading(&view.heading);
                    match &view.cross_section {
                        CrossSection::Ready { scatter, .. } => plot::scatter_plot(ui, scatter),
                        CrossSection::Missing { warning } => {
                            ui.colored_label(WARNING_COLOR, warning);
                        }
                    }
                });
                ui.vertical(|ui: &mut Ui| {
                    ui.heading(format!("Efficiency ranking Top {}", state.config.ranking_len));
                    if let CrossSection::Ready { ranking, .. } = &view.cross_section {
                        ranking_table(ui, ranking);
                    }
                });
            });

            egui::CollapsingHeader::new("Detailed data for the selected year")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    raw_table(ui, &panel.columns, &view.year_rows);
                });

            ui.separator();
            ui.heading("Single-province historical trend");

            let current = state.selection.province.clone().unwrap_or_default();
            let mut chosen = current.clone();
            egui::ComboBox::from_label("Select a province to analyse")
                .selected_text(&current)
                .show_ui(ui, |ui: &mut Ui| {
                    for province in &panel.provinces {
                        ui.selectable_value(&mut chosen, province.clone(), province);
                    }
                });
            if chosen != current {
                picked_province = Some(chosen);
            }

            if let Some(trend) = &view.trend {
                plot::trend_plot(ui, trend);
            }
        });

    // Applied after drawing; the next frame shows the new province.
    if let Some(province) = picked_province {
        state.set_province(province);
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Province + score table for the top-ranked rows.
pub fn ranking_table(ui: &mut Ui, ranking: &RankingView) {
    ui.push_id("ranking_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(90.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("Province");
                });
                header.col(|ui: &mut Ui| {
                    ui.strong(ranking.column.column_name());
                });
            })
            .body(|mut body| {
                for entry in &ranking.entries {
                    body.row(18.0, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.label(&entry.province);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format!("{:.4}", entry.score));
                        });
                    });
                }
            });
    });
}

/// Every column of the given rows, in file column order.
pub fn raw_table(ui: &mut Ui, columns: &[String], rows: &[&Observation]) {
    ui.push_id("raw_table", |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(true)
                .max_scroll_height(320.0)
                .columns(Column::auto().at_least(70.0), columns.len())
                .header(20.0, |mut header| {
                    for col in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(col);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let obs = rows[row.index()];
                        for col in columns {
                            row.col(|ui: &mut Ui| {
                                ui.label(obs.cell_text(col));
                            });
                        }
                    });
                });
        });
    });
}
