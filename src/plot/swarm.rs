//! Categorical "beeswarm" layout: spread points sideways just enough that
//! markers of equal size do not overlap.

/// Pixel geometry of one category on the target surface.
#[derive(Debug, Clone, Copy)]
pub struct SwarmGeometry {
    /// Pixels per unit on the value axis.
    pub px_per_value: f64,
    /// Pixels per category width.
    pub px_per_category: f64,
    /// Marker diameter in pixels.
    pub marker_px: f64,
    /// Largest allowed offset, in category widths.
    pub max_offset: f64,
}

/// Horizontal offset (in category widths) for each value, same order as
/// `values`.
///
/// Points are placed from lowest to highest value; each goes to the
/// candidate position closest to the centre that clears every marker
/// already placed. Offsets wider than `max_offset` are clamped, which
/// brings back some overlap in very dense groups.
pub fn swarm_offsets(values: &[f64], geom: &SwarmGeometry) -> Vec<f64> {
    let d = geom.marker_px;
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    // (x_px, y_px) of placed markers
    let mut placed: Vec<(f64, f64)> = Vec::with_capacity(values.len());
    let mut offsets = vec![0.0; values.len()];

    for idx in order {
        let y = values[idx] * geom.px_per_value;
        let neighbours: Vec<(f64, f64)> = placed
            .iter()
            .copied()
            .filter(|&(_, py)| (py - y).abs() < d)
            .collect();

        let mut candidates = vec![0.0];
        for &(px, py) in &neighbours {
            let dx = (d * d - (py - y).powi(2)).sqrt();
            candidates.push(px - dx);
            candidates.push(px + dx);
        }
        candidates.sort_by(|a: &f64, b: &f64| a.abs().total_cmp(&b.abs()).then(a.total_cmp(b)));

        let clear = |x: f64| {
            neighbours
                .iter()
                .all(|&(px, py)| (px - x).powi(2) + (py - y).powi(2) >= d * d - 1e-6)
        };
        let x = candidates.into_iter().find(|&x| clear(x)).unwrap_or(0.0);

        placed.push((x, y));
        let limit = geom.max_offset;
        offsets[idx] = (x / geom.px_per_category).clamp(-limit, limit);
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> SwarmGeometry {
        SwarmGeometry {
            px_per_value: 10.0,
            px_per_category: 100.0,
            marker_px: 6.0,
            max_offset: 0.4,
        }
    }

    #[test]
    fn well_separated_points_stay_centred() {
        let offsets = swarm_offsets(&[1.0, 2.0, 3.0], &geom());
        assert_eq!(offsets, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn ties_are_spread_without_overlap() {
        let g = geom();
        let offsets = swarm_offsets(&[5.0, 5.0, 5.0], &g);
        let mut px: Vec<f64> = offsets.iter().map(|o| o * g.px_per_category).collect();
        px.sort_by(f64::total_cmp);
        assert!((px[0] + 6.0).abs() < 1e-9);
        assert!(px[1].abs() < 1e-9);
        assert!((px[2] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn offsets_are_clamped() {
        let g = SwarmGeometry {
            max_offset: 0.05,
            ..geom()
        };
        let offsets = swarm_offsets(&[0.0; 9], &g);
        assert!(offsets.iter().all(|o| o.abs() <= 0.05));
    }

    #[test]
    fn keeps_input_order() {
        let offsets = swarm_offsets(&[9.0, 1.0], &geom());
        assert_eq!(offsets.len(), 2);
    }
}
