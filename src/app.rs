use eframe::egui::{self, Ui};

use crate::state::AppState;
use crate::ui::timeline::TimelineView;
use crate::ui::{charts, map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RealtyLensApp {
    pub state: AppState,
    timeline: TimelineView,
}

impl RealtyLensApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            timeline: TimelineView::default(),
        }
    }
}

impl Default for RealtyLensApp {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl eframe::App for RealtyLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        if self.state.dataset.is_none() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a dataset to explore transactions  (File → Open dataset…)");
                });
            });
            return;
        }

        // ---- Bottom panel: timeline with brush ----
        egui::TopBottomPanel::bottom("timeline_panel")
            .default_height(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                self.timeline.show(ui, &mut self.state);
            });

        // ---- Central panel: map | bar chart over stacked chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let state = &self.state;
            ui.columns(2, |cols| {
                map::choropleth(&mut cols[0], state);

                let right = &mut cols[1];
                let width = right.available_width();
                let half = right.available_height() / 2.0;
                right.allocate_ui(egui::vec2(width, half), |ui: &mut Ui| {
                    charts::tenure_bar_chart(ui, state);
                });
                right.allocate_ui(egui::vec2(width, right.available_height()), |ui: &mut Ui| {
                    charts::stacked_bar_chart(ui, state);
                });
            });
        });
    }
}
