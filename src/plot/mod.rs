/// Presentation layer: a renderer-neutral chart model plus the static,
/// HTML and native renderers built on it.
///
/// The static and interactive variants deliberately differ in two ways:
/// points are swarmed vs. drawn on the category centre, and `n=` labels
/// sit above each group's Q3 vs. above the dataset-wide maximum.
pub mod html;
pub mod render;
pub mod swarm;

use anyhow::Result;
use serde::Serialize;

use crate::color::{ColorMap, Rgb8};
use crate::config::ChartConfig;
use crate::data::model::Dataset;
use crate::data::stats::{group_values, BoxSummary, GroupStats};

/// One box on the chart.
#[derive(Debug, Clone)]
pub struct GroupSeries {
    pub code: String,
    pub label: String,
    /// Category centre on the x axis (0, 1, 2, ...).
    pub position: f64,
    pub values: Vec<f64>,
    pub summary: Option<BoxSummary>,
    pub replicates: usize,
    pub color: Rgb8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb8,
}

/// Where the `n=<count>` label of each group goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationAnchor {
    /// Above the group's third quartile, nudged right of the box centre.
    ThirdQuartile,
    /// Above the largest value of the whole dataset, on the box centre.
    GlobalMax,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Everything a renderer needs, with order and colours resolved.
#[derive(Debug, Clone)]
pub struct ChartModel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: String,
    pub groups: Vec<GroupSeries>,
    pub legend: Vec<LegendEntry>,
}

/// Horizontal nudge of static `n=` labels, in category widths.
const Q3_LABEL_SHIFT: f64 = 0.25;

impl ChartModel {
    /// Lay out the cleaned data in the configured treatment order.
    ///
    /// Without an explicit order the statistics table's order is used.
    /// Treatments present in only one of order/statistics are left out.
    pub fn build(
        cleaned: &Dataset,
        stats: &[GroupStats],
        group_column: &str,
        value_column: &str,
        chart: &ChartConfig,
    ) -> Result<Self> {
        let order: Vec<String> = match &chart.treatment_order {
            Some(order) => order.clone(),
            None => stats.iter().map(|s| s.group.to_string()).collect(),
        };
        let colors = ColorMap::new(&order);

        let mut values_by_group = group_values(cleaned, group_column, value_column)?;

        let mut groups = Vec::with_capacity(order.len());
        for code in &order {
            let Some(stat) = stats.iter().find(|s| s.group.to_string() == *code) else {
                log::warn!("Treatment '{code}' has no data, leaving it out of the chart");
                continue;
            };
            let values = values_by_group
                .remove(&stat.group)
                .map(|(values, _)| values)
                .unwrap_or_default();

            groups.push(GroupSeries {
                code: code.clone(),
                label: chart.display_name(code).to_string(),
                position: groups.len() as f64,
                summary: BoxSummary::from_values(&values),
                values,
                replicates: stat.replicates,
                color: colors.color_for(code),
            });
        }
        for stat in stats {
            let code = stat.group.to_string();
            if !order.contains(&code) {
                log::warn!("Treatment '{code}' is not in the treatment order and is not plotted");
            }
        }

        let legend = chart
            .display_names
            .iter()
            .map(|d| LegendEntry {
                label: format!("{}: {}", d.code, d.name),
                color: colors.color_for(&d.code),
            })
            .collect();

        Ok(ChartModel {
            title: chart.title.clone(),
            x_label: chart.x_label.clone(),
            y_label: chart.y_label.clone(),
            legend_title: chart.legend_title.clone(),
            groups,
            legend,
        })
    }

    /// Largest plotted value, if any.
    pub fn global_max(&self) -> Option<f64> {
        self.groups
            .iter()
            .flat_map(|g| g.values.iter().copied())
            .reduce(f64::max)
    }

    /// `n=<count>` labels for every plotted group.
    pub fn annotations(&self, anchor: AnnotationAnchor) -> Vec<Annotation> {
        let global_max = self.global_max();
        self.groups
            .iter()
            .filter_map(|g| {
                let (x, y) = match anchor {
                    AnnotationAnchor::ThirdQuartile => {
                        (g.position + Q3_LABEL_SHIFT, g.summary?.q3)
                    }
                    AnnotationAnchor::GlobalMax => (g.position, global_max?),
                };
                Some(Annotation {
                    x,
                    y,
                    text: format!("n={}", g.replicates),
                })
            })
            .collect()
    }

    /// Y extent of the data with headroom for the labels.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self.groups.iter().flat_map(|g| g.values.iter()) {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 1.0);
        }
        let span = if hi > lo { hi - lo } else { 1.0 };
        (lo - 0.05 * span, hi + 0.12 * span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::remove_sentinel_rows;
    use crate::data::fixtures::sample;
    use crate::data::stats::group_statistics;

    fn model(order: Option<Vec<String>>) -> ChartModel {
        let cleaned = remove_sentinel_rows(&sample(), "Specimen_ID", "blank")
            .unwrap()
            .dataset;
        let stats = group_statistics(&cleaned, "Treat", "CT1").unwrap();
        let chart = ChartConfig {
            treatment_order: order,
            ..ChartConfig::default()
        };
        ChartModel::build(&cleaned, &stats, "Treat", "CT1", &chart).unwrap()
    }

    #[test]
    fn follows_statistics_order_by_default() {
        let m = model(None);
        let codes: Vec<&str> = m.groups.iter().map(|g| g.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "H"]);
        assert_eq!(m.groups[0].label, "Control");
        assert_eq!(m.groups[1].position, 1.0);
    }

    #[test]
    fn explicit_order_wins_and_skips_unknown_codes() {
        let m = model(Some(vec!["H".into(), "HT".into(), "C".into()]));
        let codes: Vec<&str> = m.groups.iter().map(|g| g.code.as_str()).collect();
        assert_eq!(codes, vec!["H", "C"]);
        assert_eq!(m.groups[1].position, 1.0);
        assert_eq!(m.groups[1].replicates, 2);
    }

    #[test]
    fn static_labels_sit_on_q3_shifted_right() {
        let m = model(None);
        let ann = m.annotations(AnnotationAnchor::ThirdQuartile);
        assert_eq!(ann.len(), 2);
        assert_eq!(ann[0].text, "n=2");
        assert!((ann[0].x - 0.25).abs() < 1e-12);
        assert!((ann[0].y - 30.775).abs() < 1e-9);
        assert_eq!(ann[1].y, 28.5);
    }

    #[test]
    fn interactive_labels_share_the_global_max() {
        let m = model(None);
        let ann = m.annotations(AnnotationAnchor::GlobalMax);
        assert!(ann.iter().all(|a| a.y == 31.0));
        assert_eq!(ann[1].x, 1.0);
        assert_eq!(ann[1].text, "n=1");
    }

    #[test]
    fn legend_lists_every_display_name() {
        let m = model(None);
        assert_eq!(m.legend.len(), 8);
        assert_eq!(m.legend[0].label, "C: Control");
        assert_eq!(m.legend[0].color, m.groups[0].color);
        assert_eq!(m.legend[7].color, crate::color::GREY);
    }

    #[test]
    fn value_range_pads_the_data() {
        let (lo, hi) = model(None).value_range();
        assert!(lo < 28.5 && hi > 31.0);
    }
}
