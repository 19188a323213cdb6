use eframe::egui::{self, Color32, RichText, Sense, Ui};
use egui_plot::{
    AxisHints, Bar, BarChart, GridMark, HPlacement, Legend, Line, LineStyle, MarkerShape, Plot,
    PlotPoints, Points,
};

use crate::color::ContinuousColorScale;
use crate::view::{ScatterView, TrendView};

const PLOT_HEIGHT: f32 = 380.0;

const BANN_COLOR: Color32 = Color32::from_rgb(0x31, 0x68, 0x8e);
const DEA_COLOR: Color32 = Color32::from_rgb(0x35, 0xb7, 0x79);
const EMISSION_COLOR: Color32 = Color32::from_rgba_premultiplied(0x14, 0x00, 0x19, 77);

/// Tick labels for a year axis: whole numbers only.
fn year_ticks(mark: GridMark, _range: &std::ops::RangeInclusive<f64>) -> String {
    if mark.value.fract() == 0.0 {
        format!("{:.0}", mark.value)
    } else {
        String::new()
    }
}

// ---------------------------------------------------------------------------
// Cross-sectional scatter
// ---------------------------------------------------------------------------

/// Bubble chart: x = input measure, y = emission, size = emission,
/// colour = efficiency score, hover = province.
pub fn scatter_plot(ui: &mut Ui, view: &ScatterView) {
    ui.strong(&view.title);

    Plot::new("scatter_plot")
        .height(PLOT_HEIGHT)
        .x_axis_label(view.x_label.as_str())
        .y_axis_label("Carbon_Emission")
        .label_formatter(|name, value| {
            if name.is_empty() {
                String::new()
            } else {
                format!(
                    "{name}\n{} = {:.3}\nCarbon_Emission = {:.3}",
                    view.x_column, value.x, value.y
                )
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for p in &view.points {
                let points = Points::new(vec![[p.x, p.y]])
                    .name(&p.province)
                    .shape(MarkerShape::Circle)
                    .filled(true)
                    .radius(p.radius)
                    .color(view.scale.color_for(p.score));
                plot_ui.points(points);
            }
        });

    color_bar(ui, &view.scale, &view.score_label);
}

/// Horizontal gradient legend for a continuous colour scale.
pub fn color_bar(ui: &mut Ui, scale: &ContinuousColorScale, label: &str) {
    const SEGMENTS: usize = 64;

    let width = ui.available_width().min(360.0);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, 12.0), Sense::hover());
    let painter = ui.painter_at(rect);
    let step = rect.width() / SEGMENTS as f32;

    for (i, (_, color)) in scale.legend_entries(SEGMENTS).into_iter().enumerate() {
        let left = rect.left() + i as f32 * step;
        let seg = egui::Rect::from_min_max(
            egui::pos2(left, rect.top()),
            egui::pos2(left + step + 0.5, rect.bottom()),
        );
        painter.rect_filled(seg, 0.0, color);
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{:.3}", scale.min));
        ui.label(RichText::new(label).weak());
        ui.label(format!("{:.3}", scale.max));
    });
}

// ---------------------------------------------------------------------------
// Per-province trend
// ---------------------------------------------------------------------------

/// Two score lines on the left axis, emission bars on the right axis.
pub fn trend_plot(ui: &mut Ui, view: &TrendView) {
    ui.strong(&view.title);

    let axis = view.axis;
    let base = axis.to_primary(0.0);

    let bars: Vec<Bar> = view
        .emission
        .iter()
        .map(|&[year, value]| {
            Bar::new(year, axis.to_primary(value) - base)
                .base_offset(base)
                .width(0.6)
                .fill(EMISSION_COLOR)
        })
        .collect();

    let y_axes = vec![
        AxisHints::new_y().label("Efficiency (0-1)"),
        AxisHints::new_y()
            .label("Carbon emission (normalized)")
            .placement(HPlacement::Right)
            .formatter(move |mark, _range| format!("{:.1}", axis.to_secondary(mark.value))),
    ];

    Plot::new("trend_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Year")
        .x_axis_formatter(year_ticks)
        .custom_y_axes(y_axes)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name("Carbon emission")
                    .color(EMISSION_COLOR)
                    .element_formatter(Box::new(move |bar: &Bar, _chart: &BarChart| {
                        let value = axis.to_secondary(bar.base_offset.unwrap_or(0.0) + bar.value);
                        format!("{:.0}: {value:.2}", bar.argument)
                    })),
            );

            plot_ui.line(
                Line::new(PlotPoints::from(view.bann.clone()))
                    .name(&view.bann_label)
                    .color(BANN_COLOR)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(view.bann.clone())
                    .name(&view.bann_label)
                    .color(BANN_COLOR)
                    .radius(3.0),
            );

            plot_ui.line(
                Line::new(PlotPoints::from(view.dea.clone()))
                    .name(&view.dea_label)
                    .color(DEA_COLOR)
                    .style(LineStyle::dotted_dense())
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(view.dea.clone())
                    .name(&view.dea_label)
                    .color(DEA_COLOR)
                    .radius(3.0),
            );
        });
}
