use std::collections::BTreeSet;

use crate::data::stats::GroupStats;
use crate::plot::{ChartModel, GroupSeries};

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// Everything the interactive viewer shows, independent of rendering.
pub struct ViewerState {
    pub model: ChartModel,

    pub stats: Vec<GroupStats>,

    /// Header of the statistics table's first column.
    pub group_column: String,

    /// Treatment codes currently drawn.
    pub visible: BTreeSet<String>,

    /// Whether raw points are drawn over the boxes.
    pub show_points: bool,

    /// Number of specimens left after cleaning.
    pub specimens: usize,
}

impl ViewerState {
    /// Start with every treatment visible.
    pub fn new(model: ChartModel, stats: Vec<GroupStats>, group_column: &str, specimens: usize) -> Self {
        let visible = model.groups.iter().map(|g| g.code.clone()).collect();
        Self {
            model,
            stats,
            group_column: group_column.to_string(),
            visible,
            show_points: true,
            specimens,
        }
    }

    pub fn is_visible(&self, code: &str) -> bool {
        self.visible.contains(code)
    }

    /// Groups to draw, in chart order.
    pub fn visible_groups(&self) -> impl Iterator<Item = &GroupSeries> {
        self.model
            .groups
            .iter()
            .filter(|g| self.visible.contains(&g.code))
    }

    /// Toggle a single treatment.
    pub fn toggle_group(&mut self, code: &str) {
        if !self.visible.remove(code) {
            self.visible.insert(code.to_string());
        }
    }

    /// Show every treatment.
    pub fn select_all(&mut self) {
        self.visible = self.model.groups.iter().map(|g| g.code.clone()).collect();
    }

    /// Hide every treatment.
    pub fn select_none(&mut self) {
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::data::clean::remove_sentinel_rows;
    use crate::data::fixtures::sample;
    use crate::data::stats::group_statistics;

    fn state() -> ViewerState {
        let cleaned = remove_sentinel_rows(&sample(), "Specimen_ID", "blank")
            .unwrap()
            .dataset;
        let stats = group_statistics(&cleaned, "Treat", "CT1").unwrap();
        let model =
            ChartModel::build(&cleaned, &stats, "Treat", "CT1", &ChartConfig::default()).unwrap();
        ViewerState::new(model, stats, "Treat", cleaned.len())
    }

    #[test]
    fn everything_visible_at_start() {
        let s = state();
        assert_eq!(s.visible_groups().count(), 2);
        assert_eq!(s.specimens, 3);
    }

    #[test]
    fn toggling_hides_and_restores() {
        let mut s = state();
        s.toggle_group("C");
        assert!(!s.is_visible("C"));
        let codes: Vec<&str> = s.visible_groups().map(|g| g.code.as_str()).collect();
        assert_eq!(codes, vec!["H"]);
        s.toggle_group("C");
        assert!(s.is_visible("C"));
    }

    #[test]
    fn select_none_then_all() {
        let mut s = state();
        s.select_none();
        assert_eq!(s.visible_groups().count(), 0);
        s.select_all();
        assert_eq!(s.visible_groups().count(), 2);
    }
}
