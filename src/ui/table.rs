use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};
use marine_dashboard::data::export::{format_incident_date, EXPORT_COLUMNS};

use crate::state::AppState;
use crate::ui::panels::no_data;

/// Tabular listing of the filtered incidents, same columns as the export.
pub fn incident_table(ui: &mut Ui, state: &AppState) {
    let records = state.view.records();
    if records.is_empty() {
        no_data(ui, "The table cannot be shown: no incidents match the filters.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(state.config.display.table_height)
        .columns(Column::auto().at_least(70.0), EXPORT_COLUMNS.len() - 1)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for name in EXPORT_COLUMNS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, records.len(), |mut row| {
                let rec = &records[row.index()];
                row.col(|ui| {
                    ui.label(rec.country.as_deref().unwrap_or(""));
                });
                row.col(|ui| {
                    let date = rec.incident_date.as_ref().map(format_incident_date);
                    ui.label(date.as_deref().unwrap_or("unknown"));
                });
                row.col(|ui| {
                    ui.label(rec.pollution_type.as_str());
                });
                row.col(|ui| {
                    ui.label(rec.material.as_deref().unwrap_or(""));
                });
                row.col(|ui| {
                    ui.label(format!("{:.4}", rec.latitude));
                });
                row.col(|ui| {
                    ui.label(format!("{:.4}", rec.longitude));
                });
            });
        });
}
