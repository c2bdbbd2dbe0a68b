use std::ops::RangeInclusive;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Plot};

use crate::color::ColorMap;
use crate::data::model::Metric;
use crate::state::AppState;

const BAR_FILL: Color32 = Color32::from_rgb(0xff, 0xa5, 0x00);

/// Tick label for categorical x axes: only integer positions carry a label.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let i = mark.value.round();
        if (mark.value - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        labels.get(i as usize).cloned().unwrap_or_default()
    }
}

fn metric_formatter(metric: Metric) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        if mark.value < 0.0 {
            String::new()
        } else {
            metric.format_axis(mark.value)
        }
    }
}

// ---------------------------------------------------------------------------
// Bar chart: mean of the metric per tenure category
// ---------------------------------------------------------------------------

pub fn tenure_bar_chart(ui: &mut Ui, state: &AppState) {
    let metric = state.views.metric;
    let mut rows = state.views.bars.clone();
    rows.sort_by_key(|b| b.category);

    ui.strong(format!("Average {metric} by tenure"));

    let labels: Vec<String> = rows.iter().map(|b| b.category.to_string()).collect();
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, b)| {
            Bar::new(i as f64, b.metric_value)
                .name(format!(
                    "{}\n{}\n{} sales",
                    b.category,
                    metric.format_value(b.metric_value),
                    b.count
                ))
                .fill(BAR_FILL)
        })
        .collect();

    Plot::new("tenure_bars")
        .height(ui.available_height())
        .x_axis_label("Tenure remaining when sold")
        .y_axis_label(format!("Average {metric}"))
        .x_axis_formatter(category_formatter(labels))
        .y_axis_formatter(metric_formatter(metric))
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .width(0.8)
                    .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone())),
            );
        });
}

// ---------------------------------------------------------------------------
// Stacked bar chart: metric per region, one layer per property type
// ---------------------------------------------------------------------------

pub fn stacked_bar_chart(ui: &mut Ui, state: &AppState) {
    let views = &state.views;
    let metric = views.metric;
    let colors = ColorMap::new(&views.stack_keys);

    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("Stacked Bar Chart of {metric} by Type"));
        for (key, color) in colors.legend_entries() {
            ui.colored_label(color, format!("■ {key}"));
        }
    });

    let labels: Vec<String> = views.stacked.rows.iter().map(|r| r.region.clone()).collect();
    let charts: Vec<BarChart> = views
        .layers()
        .into_iter()
        .map(|layer| {
            let color = colors.color_for(&layer.key);
            let bars = layer
                .segments
                .iter()
                .enumerate()
                .filter(|(_, seg)| seg[1] > seg[0])
                .map(|(i, seg)| {
                    let value = seg[1] - seg[0];
                    Bar::new(i as f64, value)
                        .base_offset(seg[0])
                        .name(format!(
                            "{} – {}\n{}",
                            labels[i],
                            layer.key,
                            metric.format_value(value)
                        ))
                        .fill(color)
                })
                .collect();
            BarChart::new(bars)
                .name(&layer.key)
                .color(color)
                .width(0.8)
                .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| bar.name.clone()))
        })
        .collect();

    Plot::new("stacked_bars")
        .height(ui.available_height())
        .x_axis_label("Region")
        .y_axis_label(metric.label())
        .x_axis_formatter(category_formatter(labels))
        .y_axis_formatter(metric_formatter(metric))
        .include_y(0.0)
        .include_y(views.stacked.y_max(metric))
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}
