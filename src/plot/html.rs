use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde::Serialize;

use super::render::{Hotspot, SvgChart};
use super::{AnnotationAnchor, Annotation, ChartModel};
use crate::data::stats::{BoxSummary, GroupStats, STAT_COLUMNS};

/// Data behind the interactive chart, embedded in the page as JSON.
#[derive(Serialize)]
struct ChartPayload<'a> {
    title: &'a str,
    x_label: &'a str,
    y_label: &'a str,
    groups: Vec<GroupPayload<'a>>,
    annotations: Vec<Annotation>,
    hotspots: &'a [Hotspot],
}

#[derive(Serialize)]
struct GroupPayload<'a> {
    code: &'a str,
    label: &'a str,
    replicates: usize,
    summary: Option<BoxSummary>,
    values: &'a [f64],
}

/// Hover handling: the innermost hotspot under the cursor drives the
/// tooltip. Hotspots are in SVG user units, so the page may scale the chart.
const HOVER_SCRIPT: &str = r#"(function () {
  var data = JSON.parse(document.getElementById("chart-data").textContent);
  var svg = document.querySelector(".chart svg");
  var tip = document.getElementById("tooltip");
  if (!svg || !tip) return;
  svg.addEventListener("mousemove", function (ev) {
    var pt = svg.createSVGPoint();
    pt.x = ev.clientX;
    pt.y = ev.clientY;
    var p = pt.matrixTransform(svg.getScreenCTM().inverse());
    var best = null, bestArea = Infinity;
    data.hotspots.forEach(function (h) {
      var b = h.bounds;
      if (p.x >= b[0] && p.x <= b[2] && p.y >= b[1] && p.y <= b[3]) {
        var area = (b[2] - b[0]) * (b[3] - b[1]);
        if (area < bestArea) { best = h; bestArea = area; }
      }
    });
    if (!best) { tip.style.display = "none"; return; }
    tip.textContent = best.text;
    tip.style.left = (ev.pageX + 14) + "px";
    tip.style.top = (ev.pageY + 14) + "px";
    tip.style.display = "block";
  });
  svg.addEventListener("mouseleave", function () { tip.style.display = "none"; });
})();"#;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn number_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v:.3}")
    }
}

/// Assemble a standalone HTML page: the chart SVG with hover tooltips,
/// the statistics table and the plotted data as JSON.
pub fn build_document(
    model: &ChartModel,
    stats: &[GroupStats],
    group_column: &str,
    chart: &SvgChart,
) -> Result<String> {
    let payload = ChartPayload {
        title: &model.title,
        x_label: &model.x_label,
        y_label: &model.y_label,
        groups: model
            .groups
            .iter()
            .map(|g| GroupPayload {
                code: &g.code,
                label: &g.label,
                replicates: g.replicates,
                summary: g.summary,
                values: &g.values,
            })
            .collect(),
        annotations: model.annotations(AnnotationAnchor::GlobalMax),
        hotspots: &chart.hotspots,
    };
    // "</" would close the script element early
    let json = serde_json::to_string(&payload)?.replace("</", "<\\/");

    let mut rows = String::new();
    for s in stats {
        let code = s.group.to_string();
        let label = model
            .groups
            .iter()
            .find(|g| g.code == code)
            .map(|g| g.label.as_str())
            .unwrap_or(code.as_str());
        writeln!(
            rows,
            "<tr title=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(label),
            escape(&code),
            number_cell(s.mean),
            number_cell(s.median),
            number_cell(s.std),
            s.replicates
        )?;
    }

    let mut header = format!("<th>{}</th>", escape(group_column));
    for name in STAT_COLUMNS {
        write!(header, "<th>{name}</th>")?;
    }

    let title = escape(&model.title);
    let svg = &chart.svg;
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
.chart svg {{ max-width: 100%; height: auto; }}
table {{ border-collapse: collapse; margin-top: 1.5em; }}
th, td {{ border: 1px solid #ccc; padding: 0.3em 0.8em; text-align: right; }}
tr:hover {{ background: #e0f3db; }}
#tooltip {{ position: absolute; display: none; white-space: pre; pointer-events: none;
  background: #fff; border: 1px solid #888; padding: 0.3em 0.5em; font-size: 0.85em; }}
</style>
</head>
<body>
<div class="chart">
{svg}
</div>
<div id="tooltip"></div>
<table>
<thead><tr>{header}</tr></thead>
<tbody>
{rows}</tbody>
</table>
<script type="application/json" id="chart-data">{json}</script>
<script>
{HOVER_SCRIPT}
</script>
</body>
</html>
"#
    ))
}

/// Write the page and optionally hand it to the system browser.
pub fn write_html(document: &str, path: &Path, auto_open: bool) -> Result<()> {
    std::fs::write(path, document).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {}", path.display());

    if auto_open {
        if let Err(e) = open_in_browser(path) {
            log::warn!("Could not open {} in a browser: {e:#}", path.display());
        }
    }
    Ok(())
}

fn open_in_browser(path: &Path) -> Result<()> {
    let path = path.canonicalize()?;
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(&path).spawn().context("launching browser")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::data::clean::remove_sentinel_rows;
    use crate::data::fixtures::sample;
    use crate::data::stats::group_statistics;

    #[test]
    fn document_embeds_svg_table_and_data() {
        let cleaned = remove_sentinel_rows(&sample(), "Specimen_ID", "blank")
            .unwrap()
            .dataset;
        let stats = group_statistics(&cleaned, "Treat", "CT1").unwrap();
        let chart = ChartConfig {
            title: "CT <test> & co".into(),
            ..ChartConfig::default()
        };
        let model = ChartModel::build(&cleaned, &stats, "Treat", "CT1", &chart).unwrap();

        let rendered = SvgChart {
            svg: "<svg></svg>".into(),
            hotspots: vec![Hotspot {
                bounds: [10, 20, 16, 26],
                text: "C: 30.10\nControl\nn=2".into(),
            }],
        };
        let doc = build_document(&model, &stats, "Treat", &rendered).unwrap();

        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>CT &lt;test&gt; &amp; co</title>"));
        assert!(doc.contains("<svg></svg>"));
        assert!(doc.contains("<th>Treat</th><th>Mean</th>"));
        assert!(doc.contains("<td>30.550</td>"));
        assert!(doc.contains("\"text\":\"n=2\""));
        assert!(!doc.contains("</test>"));
        assert!(doc.contains("\"bounds\":[10,20,16,26]"));
        assert!(doc.contains("<div id=\"tooltip\">"));
        assert!(doc.contains("getElementById(\"chart-data\")"));
        assert!(doc.contains("addEventListener(\"mousemove\""));
    }

    #[test]
    fn nan_cells_are_blank() {
        assert_eq!(number_cell(f64::NAN), "");
        assert_eq!(number_cell(0.6364), "0.636");
    }

    #[test]
    fn writes_without_opening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.html");
        write_html("<html></html>", &path, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }
}
