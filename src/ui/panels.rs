use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use super::color32;
use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Left side panel – treatment toggles and statistics
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut ViewerState) {
    ui.heading(&state.model.legend_title);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });

    // Clone what we need so we can mutate state inside the loop.
    let entries: Vec<(String, String, Color32)> = state
        .model
        .groups
        .iter()
        .map(|g| (g.code.clone(), g.label.clone(), color32(g.color)))
        .collect();

    for (code, label, color) in &entries {
        let mut checked = state.is_visible(code);
        let text = RichText::new(format!("{code}: {label}")).color(*color);
        if ui.checkbox(&mut checked, text).changed() {
            state.toggle_group(code);
        }
    }

    ui.separator();
    ui.strong("Statistics");
    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        stats_table(ui, state);
    });
}

fn stats_table(ui: &mut Ui, state: &ViewerState) {
    let fmt = |v: f64| if v.is_nan() { "NaN".to_string() } else { format!("{v:.3}") };

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .columns(Column::auto().at_least(48.0), 4)
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong(&state.group_column);
            });
            for name in crate::data::stats::STAT_COLUMNS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for s in &state.stats {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(s.group.to_string());
                    });
                    for v in [s.mean, s.median, s.std] {
                        row.col(|ui| {
                            ui.label(fmt(v));
                        });
                    }
                    row.col(|ui| {
                        ui.label(s.replicates.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut ViewerState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} specimens, {} of {} treatments shown",
            state.specimens,
            state.visible.len(),
            state.model.groups.len()
        ));

        ui.separator();

        if ui
            .selectable_label(state.show_points, "Show points")
            .clicked()
        {
            state.show_points = !state.show_points;
        }
    });
}
