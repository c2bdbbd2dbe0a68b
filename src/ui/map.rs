use eframe::egui::{self, Color32, Mesh, Pos2, Rect, Sense, Shape, Stroke, Ui};

use crate::color::{LogScale, HIGHLIGHT, NEUTRAL};
use crate::data::model::Metric;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// World ↔ screen transform
// ---------------------------------------------------------------------------

/// Fits projected map bounds into a screen rect with a uniform scale,
/// north up.
#[derive(Debug, Clone, Copy)]
pub struct MapFrame {
    /// World coordinate drawn at `offset`: min x, max y.
    origin: [f64; 2],
    scale: f64,
    offset: Pos2,
}

impl MapFrame {
    pub fn fit(lo: [f64; 2], hi: [f64; 2], rect: Rect) -> Self {
        let w = (hi[0] - lo[0]).max(1e-9);
        let h = (hi[1] - lo[1]).max(1e-9);
        let scale = (rect.width() as f64 / w).min(rect.height() as f64 / h) * 0.95;
        let used = egui::vec2((w * scale) as f32, (h * scale) as f32);
        MapFrame {
            origin: [lo[0], hi[1]],
            scale,
            offset: rect.center() - used / 2.0,
        }
    }

    pub fn to_screen(&self, p: [f64; 2]) -> Pos2 {
        Pos2::new(
            self.offset.x + ((p[0] - self.origin[0]) * self.scale) as f32,
            self.offset.y + ((self.origin[1] - p[1]) * self.scale) as f32,
        )
    }

    pub fn to_world(&self, pos: Pos2) -> [f64; 2] {
        [
            self.origin[0] + (pos.x - self.offset.x) as f64 / self.scale,
            self.origin[1] - (pos.y - self.offset.y) as f64 / self.scale,
        ]
    }
}

// ---------------------------------------------------------------------------
// Choropleth
// ---------------------------------------------------------------------------

fn scale_caption(metric: Metric, scale: Option<&LogScale>) -> String {
    match scale {
        Some(s) => {
            let (lo, hi) = s.domain();
            format!(
                "log scale {} – {}",
                metric.format_value(lo),
                metric.format_value(hi)
            )
        }
        None => "no values for the current filters".to_string(),
    }
}

/// Planning areas filled by the selected metric.
pub fn choropleth(ui: &mut Ui, state: &AppState) {
    let views = &state.views;
    let metric = views.metric;

    let Some(boundaries) = &state.boundaries else {
        ui.strong(format!("Map – {metric}"));
        ui.label("Open a boundary file (File → Open boundaries…) to draw the map.");
        return;
    };
    let Some((lo, hi)) = boundaries.bounds() else {
        ui.strong(format!("Map – {metric}"));
        ui.label("The boundary file has no polygons.");
        return;
    };

    let scale = LogScale::from_values(views.districts.iter().map(|d| d.value(metric)));
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(format!("Map – {metric}"));
        ui.weak(scale_caption(metric, scale.as_ref()));
    });

    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let frame = MapFrame::fit(lo, hi, response.rect);

    let hovered = response
        .hover_pos()
        .and_then(|pos| boundaries.hit(frame.to_world(pos)));

    for district in &boundaries.districts {
        let value = views.district(&district.name).map_or(0.0, |d| d.value(metric));
        let fill = if hovered.is_some_and(|h| std::ptr::eq(h, district)) {
            HIGHLIGHT
        } else {
            scale.map_or(NEUTRAL, |s| s.color(value))
        };

        for (rings, triangles) in district.polygons.iter().zip(&district.triangles) {
            let Some(outer) = rings.first() else {
                continue;
            };
            let points: Vec<Pos2> = outer.iter().map(|&p| frame.to_screen(p)).collect();

            let mut mesh = Mesh::default();
            for &p in &points {
                mesh.colored_vertex(p, fill);
            }
            for &[a, b, c] in triangles {
                mesh.add_triangle(a as u32, b as u32, c as u32);
            }
            painter.add(Shape::mesh(mesh));
            painter.add(Shape::closed_line(points, Stroke::new(1.0, Color32::WHITE)));

            // holes are outlined only; the fill covers them
            for hole in rings.iter().skip(1) {
                let hole_points: Vec<Pos2> = hole.iter().map(|&p| frame.to_screen(p)).collect();
                painter.add(Shape::closed_line(hole_points, Stroke::new(1.0, Color32::WHITE)));
            }
        }
    }

    if let Some(district) = hovered {
        let text = match views.district(&district.name) {
            Some(agg) => format!(
                "Planning Area: {}\nRegion: {}\n{}: {}\n{} sales",
                district.name,
                agg.region,
                metric,
                metric.format_value(agg.value(metric)),
                agg.count
            ),
            None => format!("Planning Area: {}\n{metric}: N/A", district.name),
        };
        response.on_hover_text(text);
    }
}
