//! Scripted color timelines keyed to literal track timestamps.

use super::color::{blend, Rgb, GREEN, OFF, RED};

/// A full-strip color pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Oscillating red/green dissolve, alternating per fixture.
    Dissolve,
    /// Red on the left half of the strip, right half dark.
    RedLeft,
    /// Green on the right half of the strip, left half dark.
    GreenRight,
}

impl Pattern {
    pub fn render(self, fixture_count: usize, t: f64) -> Vec<Rgb> {
        match self {
            Pattern::Dissolve => dissolve(fixture_count, t),
            Pattern::RedLeft => split(fixture_count, RED, OFF),
            Pattern::GreenRight => split(fixture_count, OFF, GREEN),
        }
    }
}

/// What a timeline entry draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Hold(Pattern),
    /// Linear blend from one pattern to another, starting at the segment start.
    Blend {
        from: Pattern,
        to: Pattern,
        seconds: f64,
    },
}

/// Ordered `[start, end)` entries. Positions past the last entry are
/// reported as `None` so the caller can apply its terminal behavior.
#[derive(Debug, Clone)]
pub struct Timeline {
    entries: Vec<(f64, f64, Segment)>,
}

impl Timeline {
    pub fn new(entries: Vec<(f64, f64, Segment)>) -> Self {
        Self { entries }
    }

    /// Build from breakpoints: each segment runs until the next one starts,
    /// the last one ends at `end`.
    pub fn from_breakpoints(start: f64, breakpoints: &[(f64, Segment)], end: f64) -> Self {
        let mut entries = Vec::with_capacity(breakpoints.len());
        let mut from = start;
        let mut pending: Option<Segment> = None;

        for &(at, segment) in breakpoints {
            if let Some(previous) = pending.take() {
                entries.push((from, at, previous));
            }
            from = at;
            pending = Some(segment);
        }
        if let Some(last) = pending {
            entries.push((from, end, last));
        }

        Self { entries }
    }

    /// Where the scripted part ends.
    pub fn end(&self) -> f64 {
        self.entries.last().map_or(0.0, |(_, end, _)| *end)
    }

    pub fn segment_at(&self, position: f64) -> Option<(f64, Segment)> {
        self.entries
            .iter()
            .find(|(start, end, _)| position >= *start && position < *end)
            .map(|(start, _, segment)| (*start, *segment))
    }

    /// Colors at `position`, with `t` as the dissolve phase input.
    pub fn render(&self, fixture_count: usize, position: f64, t: f64) -> Option<Vec<Rgb>> {
        let (start, segment) = self.segment_at(position)?;
        let colors = match segment {
            Segment::Hold(pattern) => pattern.render(fixture_count, t),
            Segment::Blend { from, to, seconds } => {
                let alpha = if seconds > 0.0 {
                    (position - start) / seconds
                } else {
                    1.0
                };
                blend(
                    &from.render(fixture_count, t),
                    &to.render(fixture_count, t),
                    alpha,
                )
            }
        };
        Some(colors)
    }
}

/// `x = (sin(t) + 1) / 2`; even fixtures `(255x, 255(1-x), 0)`, odd ones
/// swapped. Channels are truncated.
pub fn dissolve(fixture_count: usize, t: f64) -> Vec<Rgb> {
    let x = (t.sin() + 1.0) / 2.0;
    let hi = (255.0 * x) as u8;
    let lo = (255.0 * (1.0 - x)) as u8;

    (0..fixture_count)
        .map(|i| if i % 2 == 0 { (hi, lo, 0) } else { (lo, hi, 0) })
        .collect()
}

/// `left` on the first half of the strip, `right` on the rest.
pub fn split(fixture_count: usize, left: Rgb, right: Rgb) -> Vec<Rgb> {
    let midpoint = fixture_count / 2;
    (0..fixture_count)
        .map(|i| if i < midpoint { left } else { right })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dissolve_phase_zero() {
        let colors = dissolve(4, 0.0);
        assert_eq!(colors, vec![(127, 127, 0); 4]);
    }

    #[test]
    fn test_dissolve_alternates() {
        let t = std::f64::consts::FRAC_PI_2;
        let colors = dissolve(3, t);
        assert_eq!(colors, vec![(255, 0, 0), (0, 255, 0), (255, 0, 0)]);
    }

    #[test]
    fn test_split_halves() {
        assert_eq!(split(4, RED, OFF), vec![RED, RED, OFF, OFF]);
        assert_eq!(split(5, OFF, GREEN), vec![OFF, OFF, GREEN, GREEN, GREEN]);
    }

    #[test]
    fn test_from_breakpoints_is_half_open() {
        let timeline = Timeline::from_breakpoints(
            0.0,
            &[
                (0.0, Segment::Hold(Pattern::Dissolve)),
                (2.0, Segment::Hold(Pattern::RedLeft)),
                (3.0, Segment::Hold(Pattern::GreenRight)),
            ],
            4.0,
        );

        assert_eq!(timeline.end(), 4.0);
        assert_eq!(timeline.segment_at(1.999).unwrap().1, Segment::Hold(Pattern::Dissolve));
        assert_eq!(timeline.segment_at(2.0).unwrap().1, Segment::Hold(Pattern::RedLeft));
        assert_eq!(timeline.segment_at(3.0).unwrap(), (3.0, Segment::Hold(Pattern::GreenRight)));
        assert!(timeline.segment_at(4.0).is_none());
    }

    #[test]
    fn test_blend_segment_progress() {
        let timeline = Timeline::new(vec![(
            10.0,
            12.0,
            Segment::Blend {
                from: Pattern::RedLeft,
                to: Pattern::GreenRight,
                seconds: 2.0,
            },
        )]);

        let start = timeline.render(2, 10.0, 0.0).unwrap();
        assert_eq!(start, vec![RED, OFF]);

        let halfway = timeline.render(2, 11.0, 0.0).unwrap();
        assert_eq!(halfway, vec![(128, 0, 0), (0, 128, 0)]);
    }
}
