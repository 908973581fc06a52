use serde::{Deserialize, Serialize};

pub type Rgb = (u8, u8, u8);

pub const OFF: Rgb = (0, 0, 0);
pub const RED: Rgb = (255, 0, 0);
pub const GREEN: Rgb = (0, 255, 0);
pub const LOW_WHITE: Rgb = (240, 240, 240);

/// One color per fixture, in strip order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureColorFrame {
    colors: Vec<Rgb>,
}

impl FixtureColorFrame {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    pub fn uniform(fixture_count: usize, color: Rgb) -> Self {
        Self::new(vec![color; fixture_count])
    }

    pub fn off(fixture_count: usize) -> Self {
        Self::uniform(fixture_count, OFF)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn is_uniform(&self, color: Rgb) -> bool {
        self.colors.iter().all(|c| *c == color)
    }

    pub fn blend(&self, other: &FixtureColorFrame, alpha: f64) -> FixtureColorFrame {
        FixtureColorFrame::new(blend(&self.colors, &other.colors, alpha))
    }

    /// Packed R, G, B bytes per fixture.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|&(r, g, b)| [r, g, b])
            .collect()
    }
}

impl From<Vec<Rgb>> for FixtureColorFrame {
    fn from(colors: Vec<Rgb>) -> Self {
        Self::new(colors)
    }
}

/// Per-channel linear interpolation from `a` to `b`.
///
/// `alpha` is clamped to `[0, 1]` and channels are rounded to the nearest
/// integer. Extra fixtures on the longer side are dropped.
pub fn blend(a: &[Rgb], b: &[Rgb], alpha: f64) -> Vec<Rgb> {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 * (1.0 - alpha) + y as f64 * alpha).round() as u8;

    a.iter()
        .zip(b)
        .map(|(&(r1, g1, b1), &(r2, g2, b2))| (mix(r1, r2), mix(g1, g2), mix(b1, b2)))
        .collect()
}
