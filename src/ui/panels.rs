use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{DateRange, Dimension};
use crate::data::model::Metric;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let tenures: Vec<String> = dataset.tenures.iter().map(|t| t.to_string()).collect();
    let types: Vec<String> = dataset.property_types.iter().cloned().collect();
    let locations: Vec<String> = dataset.planning_areas.iter().cloned().collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Metric selector ----
            ui.strong("Metric");
            let current = state.filters.metric;
            egui::ComboBox::from_id_salt("metric")
                .selected_text(current.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for metric in Metric::ALL {
                        if ui.selectable_label(current == metric, metric.label()).clicked() {
                            state.set_metric(metric);
                        }
                    }
                });
            ui.separator();

            date_range_widget(ui, state);
            ui.separator();

            // ---- Per-dimension selection lists (collapsible) ----
            selection_list(ui, state, "Tenure", Dimension::Tenure, &tenures);
            selection_list(ui, state, "Property Type", Dimension::PropertyType, &types);
            selection_list(ui, state, "Planning Area", Dimension::Location, &locations);
        });
}

fn selection_list(ui: &mut Ui, state: &mut AppState, title: &str, dim: Dimension, values: &[String]) {
    let n_total = values.len();
    let n_selected = state.filters.selected_count(dim, n_total);
    let header_text = format!("{title}  ({n_selected}/{n_total})");

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(dim != Dimension::Location)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("All").clicked() {
                state.select_all(dim);
            }

            for val in values {
                let mut checked = state.filters.is_selected(dim, val);
                if ui.checkbox(&mut checked, val.as_str()).changed() {
                    state.toggle_filter_value(dim, val);
                }
            }
        });
}

/// Brushed range shown as two date pickers; editing them writes the same
/// range the brush does.
fn date_range_widget(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Sale date");

    let Some((first, last)) = state.date_extent() else {
        ui.label("No dated transactions.");
        return;
    };

    let Some(range) = state.filters.date_range else {
        ui.label(format!("All dates ({first} – {last})"));
        if ui.small_button("Set range").clicked() {
            state.set_date_range(state.full_date_range());
        }
        return;
    };

    let mut start = range.start;
    let mut end = range.end;
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("after");
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("range_start"))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("before");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("range_end"))
            .changed();
    });
    if changed {
        state.set_date_range(Some(DateRange::new(start, end)));
    }
    if start > end {
        ui.label(RichText::new("Start is after end: nothing matches.").color(Color32::YELLOW));
    }
    if ui.small_button("Clear").clicked() {
        state.clear_brush();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_dataset_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open boundaries…").clicked() {
                open_boundaries_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if state.dataset.is_some() {
            ui.label(format!(
                "{} transactions loaded, {} visible",
                state.total_count(),
                state.views.visible
            ));
            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_dataset_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open transaction data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_dataset(&path);
    }
}

pub fn open_boundaries_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open planning-area boundaries")
        .add_filter("GeoJSON", &["geojson", "json"])
        .pick_file();

    if let Some(path) = file {
        state.open_boundaries(&path);
    }
}
