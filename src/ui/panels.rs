use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;
use marine_dashboard::data::export::DEFAULT_EXPORT_NAME;

use crate::state::AppState;
use crate::ui::{pie, plot, table};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    // Clone what we need so we can mutate state inside the widgets.
    let Some(options) = state.options.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    // ---- Country ----
    ui.strong("Country");
    let current = state.filters.country.clone();
    egui::ComboBox::from_id_salt("country")
        .selected_text(current.as_deref().unwrap_or("All countries"))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), "All countries").clicked() {
                state.set_country(None);
            }
            for country in &options.countries {
                let selected = current.as_deref() == Some(country.as_str());
                if ui.selectable_label(selected, country.as_str()).clicked() {
                    state.set_country(Some(country.clone()));
                }
            }
        });
    ui.add_space(6.0);

    // ---- Pollution type ----
    ui.strong("Pollution type");
    let current = state.filters.pollution_type.clone();
    egui::ComboBox::from_id_salt("pollution_type")
        .selected_text(current.as_deref().unwrap_or("All pollution types"))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(current.is_none(), "All pollution types")
                .clicked()
            {
                state.set_pollution_type(None);
            }
            for ptype in &options.pollution_types {
                let selected = current.as_deref() == Some(ptype.as_str());
                let text = RichText::new(ptype).color(state.color_map.color_for(ptype));
                if ui.selectable_label(selected, text).clicked() {
                    state.set_pollution_type(Some(ptype.clone()));
                }
            }
        });
    ui.add_space(6.0);

    // ---- Date range ----
    let mut enabled = state.date_filter_enabled;
    let mut from = state.date_from;
    let mut to = state.date_to;
    let mut changed = ui.checkbox(&mut enabled, "Date range").changed();
    ui.add_enabled_ui(enabled, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            ui.label("From");
            changed |= ui
                .add(DatePickerButton::new(&mut from).id_salt("date_from"))
                .changed();
        });
        ui.horizontal(|ui: &mut Ui| {
            ui.label("To");
            changed |= ui
                .add(DatePickerButton::new(&mut to).id_salt("date_to"))
                .changed();
        });
        ui.label(
            RichText::new(format!("Data spans {} – {}", options.min_date, options.max_date))
                .small()
                .weak(),
        );
    });
    if changed {
        state.set_dates(enabled, from, to);
    }

    ui.separator();
    if ui.button("Reset filters").clicked() {
        state.set_country(None);
        state.set_pollution_type(None);
        state.set_dates(true, options.min_date, options.max_date);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            let can_export = state.table.is_some() && !state.view.is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} incidents loaded, {} shown",
                table.len(),
                state.view.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – the dashboard
// ---------------------------------------------------------------------------

/// Render every chart for the current view, or the load error.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if let Some(err) = &state.load_error {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(
                RichText::new(format!("Cannot load incident data.\n\n{err}"))
                    .heading()
                    .color(Color32::RED),
            );
        });
        return;
    }
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view incidents  (File → Open…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Marine Pollution Dashboard");
            ui.label("Interactive view of reported marine pollution incidents.");
            ui.add_space(8.0);

            metrics(ui, state);
            ui.separator();

            ui.columns(2, |cols: &mut [Ui]| {
                section(&mut cols[0], "Incident Locations");
                plot::incident_map(&mut cols[0], state);
                section(&mut cols[1], "Most Common Pollution Types");
                plot::pollution_bar_chart(&mut cols[1], state);
            });
            ui.separator();

            section(ui, "Incidents Over Time");
            plot::trend_chart(ui, state);
            ui.separator();

            section(ui, "Public Awareness");
            pie::awareness_chart(ui, state);
            ui.separator();

            section(ui, "Incident Details");
            table::incident_table(ui, state);
            if !state.view.is_empty() && ui.button("⬇ Download filtered data (.csv)").clicked() {
                export_file_dialog(state);
            }
        });
}

fn metrics(ui: &mut Ui, state: &AppState) {
    let s = state.summary;
    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total incidents", s.incidents);
        metric(&mut cols[1], "Distinct countries", s.countries);
        metric(&mut cols[2], "Distinct pollution types", s.pollution_types);
    });
}

fn metric(ui: &mut Ui, label: &str, value: usize) {
    ui.group(|ui: &mut Ui| {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(RichText::new(label).weak());
            ui.label(RichText::new(value.to_string()).size(28.0).strong());
        });
    });
}

fn section(ui: &mut Ui, title: &str) {
    ui.add_space(4.0);
    ui.strong(RichText::new(title).size(18.0));
}

/// Shown in place of a chart that has nothing to draw.
pub fn no_data(ui: &mut Ui, msg: &str) {
    ui.label(RichText::new(msg).italics().weak());
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open incident data")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq"],
        )
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.status_message = None;
        state.open(path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered incidents")
        .set_file_name(DEFAULT_EXPORT_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
