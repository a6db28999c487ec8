use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::state::AppState;
use crate::ui::panels::no_data;

// ---------------------------------------------------------------------------
// Map – incident positions coloured by pollution type
// ---------------------------------------------------------------------------

/// Scatter of longitude/latitude, one series per pollution type so the
/// legend doubles as a colour key.
pub fn incident_map(ui: &mut Ui, state: &AppState) {
    if state.view.is_empty() {
        no_data(ui, "The map cannot be drawn: no incidents match the filters.");
        return;
    }

    let mut by_type: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for rec in state.view.records() {
        by_type
            .entry(rec.pollution_type.as_str())
            .or_default()
            .push([rec.longitude, rec.latitude]);
    }

    Plot::new("incident_map")
        .legend(Legend::default())
        .height(400.0)
        .data_aspect(1.0)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-90.0)
        .include_y(90.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (ptype, coords) in by_type {
                let points = Points::new(PlotPoints::from(coords))
                    .name(ptype)
                    .color(state.color_map.color_for(ptype))
                    .radius(3.5);
                plot_ui.points(points);
            }
        });
}

// ---------------------------------------------------------------------------
// Bar chart – top pollution types
// ---------------------------------------------------------------------------

pub fn pollution_bar_chart(ui: &mut Ui, state: &AppState) {
    let Some(ranking) = &state.ranking else {
        return;
    };
    if ranking.is_fallback() {
        ui.label(
            RichText::new("No incidents match the filters. Showing all countries and pollution types.")
                .color(Color32::from_rgb(0xE0, 0xA0, 0x20)),
        );
    }
    if ranking.entries.is_empty() {
        no_data(ui, "No pollution types to show for this selection.");
        return;
    }

    let labels: Vec<String> = ranking.entries.iter().map(|(l, _)| l.clone()).collect();
    let bars: Vec<Bar> = ranking
        .entries
        .iter()
        .enumerate()
        .map(|(i, (label, count))| {
            Bar::new(i as f64, *count as f64)
                .name(label)
                .fill(state.color_map.color_for(label))
        })
        .collect();

    ui.label(RichText::new(ranking.title()).strong());
    Plot::new("pollution_bar")
        .height(400.0)
        .x_axis_label("Pollution type")
        .y_axis_label("Incidents")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Incidents"));
        });
}

// ---------------------------------------------------------------------------
// Line chart – incidents per month
// ---------------------------------------------------------------------------

/// Months are plotted as `year * 12 + month0` so the axis stays integral.
fn month_index(month: NaiveDate) -> f64 {
    (month.year() * 12 + month.month0() as i32) as f64
}

fn month_label(idx: f64) -> String {
    let idx = idx as i32;
    format!("{}-{:02}", idx.div_euclid(12), idx.rem_euclid(12) + 1)
}

pub fn trend_chart(ui: &mut Ui, state: &AppState) {
    if state.view.is_empty() {
        no_data(ui, "The time trend cannot be drawn: no incidents match the filters.");
        return;
    }
    if state.trend.is_empty() {
        no_data(ui, "No valid incident dates for the selected filters.");
        return;
    }

    let coords: Vec<[f64; 2]> = state
        .trend
        .iter()
        .map(|(month, count)| [month_index(*month), *count as f64])
        .collect();

    Plot::new("monthly_trend")
        .height(260.0)
        .x_axis_label("Month")
        .y_axis_label("Incidents")
        .include_y(0.0)
        .x_axis_formatter(|mark, _range| {
            if mark.value.fract().abs() > 1e-6 {
                String::new()
            } else {
                month_label(mark.value)
            }
        })
        .label_formatter(|_name, point| {
            format!("{}: {} incidents", month_label(point.x.round()), point.y)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(coords.clone()))
                    .name("Incidents per month")
                    .width(2.0),
            );
            plot_ui.points(Points::new(PlotPoints::from(coords)).radius(4.0));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_axis_round_trips() {
        let m = NaiveDate::from_ymd_opt(2021, 12, 1).unwrap();
        assert_eq!(month_label(month_index(m)), "2021-12");
        let jan = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        assert_eq!(month_index(jan) - month_index(m), 1.0);
    }
}
