use eframe::egui::{Color32, PointerButton, Stroke, Ui};
use egui_plot::{GridMark, Line, Plot, PlotPoints, Polygon};

use crate::data::model::{axis_to_date, date_to_axis};
use crate::state::AppState;

const AREA_FILL: Color32 = Color32::from_rgb(0xcc, 0xcc, 0xcc);
const BRUSH_STROKE: Color32 = Color32::from_rgb(0x46, 0x82, 0xb4);

/// Timeline view with an x-brush.
///
/// The brush being dragged lives here; only a finished drag is written to
/// the shared filters.
#[derive(Debug, Default)]
pub struct TimelineView {
    /// `[anchor, current]` of an in-progress drag, in axis units.
    drag: Option<[f64; 2]>,
}

fn brush_polygon(x0: f64, x1: f64, top: f64) -> Polygon<'static> {
    let points = vec![[x0, 0.0], [x1, 0.0], [x1, top], [x0, top]];
    Polygon::new(PlotPoints::new(points))
        .fill_color(Color32::from_rgba_unmultiplied(0x46, 0x82, 0xb4, 60))
        .stroke(Stroke::new(1.0, BRUSH_STROKE))
}

impl TimelineView {
    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        ui.strong("Count of property sold over time");

        let series = &state.views.timeline;
        let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
            self.drag = None;
            ui.label("No dated transactions match the current filters.");
            return;
        };
        let (x_min, x_max) = (date_to_axis(first.date), date_to_axis(last.date));
        let top = series.max_count().max(1) as f64;

        let area: PlotPoints = series
            .points
            .iter()
            .map(|p| [date_to_axis(p.date), p.count as f64])
            .collect();
        let committed = state
            .filters
            .date_range
            .map(|r| [date_to_axis(r.start), date_to_axis(r.end)]);
        let shown = self.drag.or(committed);

        let response = Plot::new("timeline")
            .height(ui.available_height())
            .x_axis_label("Time")
            .y_axis_label("Count")
            .x_axis_formatter(|mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
                axis_to_date(mark.value)
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_default()
            })
            .include_y(0.0)
            .include_x(x_min)
            .include_x(x_max)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(area).color(AREA_FILL).fill(0.0_f32).name("sales"));
                if let Some([a, b]) = shown {
                    plot_ui.polygon(brush_polygon(a, b, top));
                }
                plot_ui.pointer_coordinate()
            });

        let pointer_x = response.inner.map(|p| p.x.clamp(x_min, x_max));
        let r = &response.response;
        let finished = self.track(
            r.drag_started_by(PointerButton::Primary),
            r.dragged_by(PointerButton::Primary),
            r.drag_stopped(),
            pointer_x,
        );

        if let Some([a, b]) = finished {
            state.brush(a, b);
        } else if r.clicked() {
            state.clear_brush();
        }
    }

    /// Advance the drag with this frame's pointer events; returns the brush
    /// `[anchor, release]` once the drag ends.
    fn track(&mut self, started: bool, dragging: bool, stopped: bool, x: Option<f64>) -> Option<[f64; 2]> {
        if started {
            self.drag = x.map(|x| [x, x]);
        } else if dragging {
            if let (Some(drag), Some(x)) = (self.drag.as_mut(), x) {
                drag[1] = x;
            }
        }
        if stopped {
            self.drag.take()
        } else {
            None
        }
    }
}
