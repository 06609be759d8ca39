use std::collections::BTreeMap;

use palette::{Mix, Srgb};

/// Colour type shared by every renderer.
pub type Rgb8 = Srgb<u8>;

/// Neutral colour for scatter points and unmapped treatments.
pub const GREY: Rgb8 = Srgb::new(128, 128, 128);

/// ColorBrewer "GnBu" stops, light green to dark blue.
const GNBU: [u32; 9] = [
    0xf7fcf0, 0xe0f3db, 0xccebc5, 0xa8ddb5, 0x7bccc4, 0x4eb3d3, 0x2b8cbe, 0x0868ac, 0x084081,
];

fn stop(hex: u32) -> Srgb<f32> {
    Srgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8).into_format()
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Sample the GnBu ramp at `t` in `[0, 1]`.
pub fn gnbu_at(t: f32) -> Rgb8 {
    let scaled = t.clamp(0.0, 1.0) * (GNBU.len() - 1) as f32;
    let k = (scaled.floor() as usize).min(GNBU.len() - 2);
    stop(GNBU[k]).mix(stop(GNBU[k + 1]), scaled - k as f32).into_format()
}

/// `n` colours of increasing depth. Both ends of the ramp are skipped so
/// the first box is not near-white.
pub fn sequential_palette(n: usize) -> Vec<Rgb8> {
    (0..n)
        .map(|i| gnbu_at((i + 1) as f32 / (n + 1) as f32))
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: treatment → colour
// ---------------------------------------------------------------------------

/// Maps treatment codes to palette colours in plotting order.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Rgb8>,
    default_color: Rgb8,
}

impl ColorMap {
    /// One palette colour per treatment, assigned in the given order.
    pub fn new(order: &[String]) -> Self {
        let mapping = order
            .iter()
            .cloned()
            .zip(sequential_palette(order.len()))
            .collect();

        ColorMap {
            mapping,
            default_color: GREY,
        }
    }

    /// Look up the colour for a treatment code.
    pub fn color_for(&self, code: &str) -> Rgb8 {
        self.mapping
            .get(code)
            .copied()
            .unwrap_or(self.default_color)
    }
}
