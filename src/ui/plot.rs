use eframe::egui::{Align2, Color32, RichText, Stroke, Ui};
use egui_plot::{BoxElem, BoxPlot, BoxSpread, Legend, Plot, PlotPoint, PlotPoints, Points, Text};

use super::color32;
use crate::plot::AnnotationAnchor;
use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Box plot (central panel)
// ---------------------------------------------------------------------------

/// Render the interactive box plot: centred points, `n=` labels at the
/// dataset-wide maximum.
pub fn box_plot(ui: &mut Ui, state: &ViewerState) {
    let model = &state.model;
    if model.groups.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No treatment groups to plot");
        });
        return;
    }

    let codes: Vec<String> = model.groups.iter().map(|g| g.code.clone()).collect();

    Plot::new("ct_box_plot")
        .legend(Legend::default())
        .x_axis_label(model.x_label.clone())
        .y_axis_label(model.y_label.clone())
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            codes.get(i as usize).cloned().unwrap_or_default()
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for g in state.visible_groups() {
                let color = color32(g.color);

                if let Some(s) = g.summary {
                    let spread =
                        BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker);
                    let elem = BoxElem::new(g.position, spread)
                        .name(&g.label)
                        .box_width(0.8)
                        .whisker_width(0.4)
                        .fill(color)
                        .stroke(Stroke::new(1.5, Color32::BLACK));
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&g.label).color(color));
                }

                if state.show_points {
                    let points: PlotPoints = g.values.iter().map(|&y| [g.position, y]).collect();
                    plot_ui.points(
                        Points::new(points)
                            .color(Color32::GRAY)
                            .radius(3.0)
                            .name(format!("{} specimens", g.code)),
                    );
                }
            }

            for ann in model.annotations(AnnotationAnchor::GlobalMax) {
                let shown = state
                    .visible_groups()
                    .any(|g| (g.position - ann.x).abs() < f64::EPSILON);
                if !shown {
                    continue;
                }
                let text = RichText::new(ann.text).color(Color32::BLACK).size(12.0);
                plot_ui.text(
                    Text::new(PlotPoint::new(ann.x, ann.y), text).anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}
