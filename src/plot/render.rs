use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

use super::swarm::{swarm_offsets, SwarmGeometry};
use super::{AnnotationAnchor, ChartModel};
use crate::color::{Rgb8, GREY};
use crate::config::ChartConfig;

const FONT: &str = "sans-serif";
/// Box width in category widths.
const BOX_WIDTH: f64 = 0.8;

/// How points are laid over the boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPlacement {
    /// Spread sideways so markers do not overlap.
    Swarm,
    /// All on the category centre line.
    Centred,
}

/// The knobs that separate the static figure from the interactive one.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub points: PointPlacement,
    pub anchor: AnnotationAnchor,
    pub legend: bool,
    /// Vertical lift of `n=` labels, in points.
    pub label_lift_pt: f64,
}

impl ChartStyle {
    pub fn static_figure() -> Self {
        Self {
            points: PointPlacement::Swarm,
            anchor: AnnotationAnchor::ThirdQuartile,
            legend: true,
            label_lift_pt: 0.0,
        }
    }

    pub fn interactive() -> Self {
        Self {
            points: PointPlacement::Centred,
            anchor: AnnotationAnchor::GlobalMax,
            legend: false,
            label_lift_pt: 10.0,
        }
    }
}

/// A hoverable region of the drawn chart, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    /// Left, top, right, bottom.
    pub bounds: [i32; 4],
    pub text: String,
}

/// The interactive chart as SVG plus the regions its page reacts to.
#[derive(Debug, Clone)]
pub struct SvgChart {
    pub svg: String,
    pub hotspots: Vec<Hotspot>,
}

fn rgb(c: Rgb8) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

/// Draw the full chart onto any plotters surface.
///
/// `scale` converts typographic points to surface pixels (dpi / 72).
/// Returns the pixel regions of every box and point, boxes first.
pub fn draw_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    model: &ChartModel,
    style: &ChartStyle,
    scale: f64,
) -> Result<Vec<Hotspot>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let pt = |v: f64| v * scale;
    let px = |v: f64| pt(v).round().max(1.0) as u32;

    root.fill(&WHITE)?;

    let n = model.groups.len().max(1);
    let (y_lo, y_hi) = model.value_range();

    let mut chart = ChartBuilder::on(root)
        .caption(&model.title, (FONT, pt(25.0)))
        .margin(px(12.0))
        .x_label_area_size(px(60.0))
        .y_label_area_size(px(80.0))
        .build_cartesian_2d(-0.5..n as f64 - 0.5, y_lo..y_hi)?;

    let codes: Vec<String> = model.groups.iter().map(|g| g.code.clone()).collect();
    let x_label = |x: &f64| {
        let i = x.round();
        if (x - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        codes.get(i as usize).cloned().unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_desc(model.x_label.as_str())
        .y_desc(model.y_label.as_str())
        .axis_desc_style((FONT, pt(25.0)))
        .label_style((FONT, pt(15.0)))
        .x_label_formatter(&x_label)
        .draw()?;

    // -- boxes --
    let half = BOX_WIDTH / 2.0;
    let line = BLACK.stroke_width(px(1.5));
    let boxed: Vec<_> = model
        .groups
        .iter()
        .filter_map(|g| g.summary.map(|s| (g, s)))
        .collect();

    chart.draw_series(boxed.iter().map(|(g, s)| {
        Rectangle::new(
            [(g.position - half, s.q1), (g.position + half, s.q3)],
            rgb(g.color).filled(),
        )
    }))?;
    chart.draw_series(boxed.iter().map(|(g, s)| {
        Rectangle::new([(g.position - half, s.q1), (g.position + half, s.q3)], line)
    }))?;

    let mut strokes: Vec<Vec<(f64, f64)>> = Vec::new();
    for (g, s) in &boxed {
        let x = g.position;
        let cap = half / 2.0;
        strokes.push(vec![(x - half, s.median), (x + half, s.median)]);
        strokes.push(vec![(x, s.q1), (x, s.lower_whisker)]);
        strokes.push(vec![(x, s.q3), (x, s.upper_whisker)]);
        strokes.push(vec![(x - cap, s.lower_whisker), (x + cap, s.lower_whisker)]);
        strokes.push(vec![(x - cap, s.upper_whisker), (x + cap, s.upper_whisker)]);
    }
    chart.draw_series(strokes.into_iter().map(|p| PathElement::new(p, line)))?;

    let mut hotspots: Vec<Hotspot> = boxed
        .iter()
        .map(|(g, s)| {
            let (l, t) = chart.backend_coord(&(g.position - half, s.upper_whisker));
            let (r, b) = chart.backend_coord(&(g.position + half, s.lower_whisker));
            Hotspot {
                bounds: [l, t, r, b],
                text: format!(
                    "{}\nn={}\nmedian {:.2}\nQ1 {:.2}  Q3 {:.2}\nwhiskers {:.2} to {:.2}",
                    g.label,
                    g.replicates,
                    s.median,
                    s.q1,
                    s.q3,
                    s.lower_whisker,
                    s.upper_whisker
                ),
            }
        })
        .collect();

    // -- points --
    let (plot_w, plot_h) = chart.plotting_area().dim_in_pixel();
    let marker = pt(6.0);
    let geom = SwarmGeometry {
        px_per_value: plot_h as f64 / (y_hi - y_lo),
        px_per_category: plot_w as f64 / n as f64,
        marker_px: marker,
        max_offset: half,
    };
    let grey = rgb(GREY).filled();
    let radius = px(3.0);

    let mut points: Vec<(f64, f64)> = Vec::new();
    for g in &model.groups {
        let offsets = match style.points {
            PointPlacement::Swarm => swarm_offsets(&g.values, &geom),
            PointPlacement::Centred => vec![0.0; g.values.len()],
        };
        for (&y, dx) in g.values.iter().zip(offsets) {
            let p = (g.position + dx, y);
            let (cx, cy) = chart.backend_coord(&p);
            let reach = radius as i32 + 2;
            hotspots.push(Hotspot {
                bounds: [cx - reach, cy - reach, cx + reach, cy + reach],
                text: format!("{}: {y:.2}\n{}\nn={}", g.code, g.label, g.replicates),
            });
            points.push(p);
        }
    }
    chart.draw_series(points.into_iter().map(|p| Circle::new(p, radius, grey)))?;

    // -- n= labels --
    let label_style = (FONT, pt(12.0))
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let lift = -(pt(style.label_lift_pt).round() as i32);
    chart.draw_series(model.annotations(style.anchor).into_iter().map(|a| {
        EmptyElement::at((a.x, a.y)) + Text::new(a.text, (0, lift), label_style.clone())
    }))?;

    // -- legend --
    if style.legend && !model.legend.is_empty() {
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())?
            .label(model.legend_title.as_str())
            .legend(|(x, y)| EmptyElement::at((x, y)));
        for entry in &model.legend {
            let color = rgb(entry.color).filled();
            let r = px(5.0);
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())?
                .label(entry.label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), r, color));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, pt(12.0)))
            .draw()?;
    }

    root.present()?;
    Ok(hotspots)
}

/// Render the static figure to a PNG at the configured size and DPI.
pub fn write_png(model: &ChartModel, chart: &ChartConfig, path: &Path) -> Result<()> {
    let (w, h) = chart.pixel_size();
    let scale = chart.dpi as f64 / 72.0;
    let mut buffer = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
        draw_chart(&root, model, &ChartStyle::static_figure(), scale)
            .context("drawing static chart")?;
    }

    let image = image::RgbImage::from_raw(w, h, buffer).context("chart buffer has wrong size")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {} ({w}x{h} px at {} dpi)", path.display(), chart.dpi);
    Ok(())
}

/// Render the interactive variant as an SVG document, one point per
/// pixel at screen resolution.
pub fn render_svg(model: &ChartModel, chart: &ChartConfig) -> Result<SvgChart> {
    let size = (
        (chart.width_in * 72.0).round() as u32,
        (chart.height_in * 72.0).round() as u32,
    );
    let mut svg = String::new();
    let hotspots = {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_chart(&root, model, &ChartStyle::interactive(), 1.0)
            .context("drawing interactive chart")?
    };
    Ok(SvgChart { svg, hotspots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::remove_sentinel_rows;
    use crate::data::fixtures::sample;
    use crate::data::stats::group_statistics;

    fn fixture_model(chart: &ChartConfig) -> ChartModel {
        let cleaned = remove_sentinel_rows(&sample(), "Specimen_ID", "blank")
            .unwrap()
            .dataset;
        let stats = group_statistics(&cleaned, "Treat", "CT1").unwrap();
        ChartModel::build(&cleaned, &stats, "Treat", "CT1", chart).unwrap()
    }

    #[test]
    fn svg_has_labels_and_one_circle_per_row() {
        let chart = ChartConfig::default();
        let rendered = render_svg(&fixture_model(&chart), &chart).unwrap();

        assert!(rendered.svg.contains("<svg"));
        assert!(rendered.svg.contains("n=2"));
        assert!(rendered.svg.contains("n=1"));
        assert_eq!(rendered.svg.matches("<circle").count(), 3);
    }

    #[test]
    fn hotspots_cover_boxes_then_points() {
        let chart = ChartConfig::default();
        let rendered = render_svg(&fixture_model(&chart), &chart).unwrap();

        assert_eq!(rendered.hotspots.len(), 2 + 3);
        assert!(rendered.hotspots[0].text.starts_with("Control\nn=2"));
        assert!(rendered.hotspots[2].text.starts_with("C: 30.10"));
        let (w, h) = (
            (chart.width_in * 72.0) as i32,
            (chart.height_in * 72.0) as i32,
        );
        for spot in &rendered.hotspots {
            let [l, t, r, b] = spot.bounds;
            assert!(l < r && t <= b, "{spot:?}");
            assert!(l >= -8 && r <= w + 8 && t >= -8 && b <= h + 8, "{spot:?}");
        }
    }

    #[test]
    fn png_matches_configured_pixel_size() {
        let chart = ChartConfig {
            dpi: 20,
            ..ChartConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");

        write_png(&fixture_model(&chart), &chart, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), chart.pixel_size());
    }
}
