use std::f32::consts::TAU;

use eframe::egui::{self, Pos2, RichText, Sense, Shape, Stroke, Ui};

use crate::color::generate_palette;
use crate::state::AppState;
use crate::ui::panels::no_data;

const DIAMETER: f32 = 220.0;
const HOLE_RATIO: f32 = 0.3;

/// Donut chart of the `aware_ans` answers in the current view.
pub fn awareness_chart(ui: &mut Ui, state: &AppState) {
    if state.view.is_empty() {
        no_data(ui, "The awareness chart cannot be drawn: no incidents match the filters.");
        return;
    }
    let has_column = state.table.as_ref().is_some_and(|t| t.has_awareness());
    if !has_column {
        no_data(ui, "The 'aware_ans' column is not present in this dataset.");
        return;
    }
    if state.awareness.is_empty() {
        no_data(ui, "No awareness answers for the selected filters.");
        return;
    }

    let total: usize = state.awareness.iter().map(|(_, n)| n).sum();
    let colors = generate_palette(state.awareness.len());

    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) =
            ui.allocate_painter(egui::vec2(DIAMETER, DIAMETER), Sense::hover());
        let center = response.rect.center();
        let radius = DIAMETER / 2.0 - 4.0;

        // Start at twelve o'clock, clockwise.
        let mut start = -TAU / 4.0;
        for ((_, count), color) in state.awareness.iter().zip(&colors) {
            let sweep = TAU * (*count as f32 / total as f32);
            for tri in slice_triangles(center, radius, start, sweep) {
                painter.add(Shape::convex_polygon(tri.to_vec(), *color, Stroke::NONE));
            }
            start += sweep;
        }
        painter.circle_filled(center, radius * HOLE_RATIO, ui.visuals().panel_fill);

        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new("Public 'aware' status").strong());
            for ((label, count), color) in state.awareness.iter().zip(&colors) {
                let pct = 100.0 * *count as f32 / total as f32;
                ui.label(RichText::new(format!("■ {label}: {count} ({pct:.1}%)")).color(*color));
            }
        });
    });
}

/// Fan of triangles approximating one slice; every piece is convex.
fn slice_triangles(center: Pos2, radius: f32, start: f32, sweep: f32) -> Vec<[Pos2; 3]> {
    let steps = ((sweep / TAU) * 96.0).ceil().max(1.0) as usize;
    let at = |angle: f32| center + radius * egui::vec2(angle.cos(), angle.sin());
    (0..steps)
        .map(|i| {
            let a0 = start + sweep * i as f32 / steps as f32;
            let a1 = start + sweep * (i + 1) as f32 / steps as f32;
            [center, at(a0), at(a1)]
        })
        .collect()
}
