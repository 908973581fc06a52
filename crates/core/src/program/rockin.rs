//! Red/green patterns for the rockin cue.

use serde::{Deserialize, Serialize};

use super::color::{Rgb, GREEN, OFF, RED};

/// Time-quantized alternation: `step = floor(t * rate) mod 2`, fixture `i`
/// is red when `(i + step)` is even.
pub fn stepped_alternation(fixture_count: usize, elapsed: f64, steps_per_second: f64) -> Vec<Rgb> {
    let step = ((elapsed.max(0.0) * steps_per_second).floor() as u64 % 2) as usize;
    (0..fixture_count)
        .map(|i| if (i + step) % 2 == 0 { RED } else { GREEN })
        .collect()
}

/// Beat-driven variants, advanced once per beat of the cue's beat table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RockinPattern {
    /// Whole strip alternates red/green, flipping each beat.
    #[default]
    Alternate,
    /// A pair of lights walks outward from the middle; every fourth beat
    /// floods green.
    Mirror,
    /// A three-light chaser bouncing between the ends, with half-strip
    /// red/green splashes on the first two beats of every eight.
    Chaser,
}

impl RockinPattern {
    pub fn render(self, fixture_count: usize, beat: usize) -> Vec<Rgb> {
        match self {
            RockinPattern::Alternate => alternate(fixture_count, beat),
            RockinPattern::Mirror => mirror(fixture_count, beat),
            RockinPattern::Chaser => chaser(fixture_count, beat),
        }
    }
}

fn alternate(n: usize, beat: usize) -> Vec<Rgb> {
    let phase = beat % 2;
    (0..n)
        .map(|i| if i % 2 == phase { RED } else { GREEN })
        .collect()
}

fn mirror(n: usize, beat: usize) -> Vec<Rgb> {
    if beat % 4 == 3 {
        return vec![GREEN; n];
    }

    let mut colors = vec![OFF; n];
    let half = n / 2;
    if half == 0 {
        return colors;
    }

    let step = beat % half;
    let color = if step % 2 == 0 { RED } else { GREEN };
    // left side counts down from the middle, right side counts up
    let left = half - 1 - step;
    let right = (half + step).min(n - 1);
    colors[left] = color;
    colors[right] = color;
    colors
}

fn chaser(n: usize, beat: usize) -> Vec<Rgb> {
    const SEGMENT: usize = 3;
    const STEPS: usize = 6;

    let mut colors = vec![OFF; n];
    if n == 0 {
        return colors;
    }

    let half = n / 2;
    match beat % 8 {
        0 => {
            colors[..half].fill(RED);
            colors[half..].fill(GREEN);
            return colors;
        }
        1 => {
            colors[..half].fill(GREEN);
            colors[half..].fill(RED);
            return colors;
        }
        _ => {}
    }

    let s = (beat % STEPS) as i64;
    let n_i = n as i64;
    let (head, direction) = if beat % 2 == 0 {
        (s * SEGMENT as i64, 1)
    } else {
        (n_i - 1 - s * SEGMENT as i64, -1)
    };

    for j in 0..SEGMENT as i64 {
        let idx = (head + direction * j).rem_euclid(n_i) as usize;
        colors[idx] = if j % 2 == 0 { RED } else { GREEN };
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepped_alternation_flips_twice_a_second() {
        assert_eq!(stepped_alternation(3, 0.0, 2.0), vec![RED, GREEN, RED]);
        assert_eq!(stepped_alternation(3, 0.49, 2.0), vec![RED, GREEN, RED]);
        assert_eq!(stepped_alternation(3, 0.5, 2.0), vec![GREEN, RED, GREEN]);
        assert_eq!(stepped_alternation(3, 1.0, 2.0), vec![RED, GREEN, RED]);
    }

    #[test]
    fn test_alternate_flips_each_beat() {
        assert_eq!(RockinPattern::Alternate.render(4, 0), vec![RED, GREEN, RED, GREEN]);
        assert_eq!(RockinPattern::Alternate.render(4, 1), vec![GREEN, RED, GREEN, RED]);
    }

    #[test]
    fn test_mirror_walks_outward() {
        let first = RockinPattern::Mirror.render(8, 0);
        assert_eq!(first, vec![OFF, OFF, OFF, RED, RED, OFF, OFF, OFF]);

        let second = RockinPattern::Mirror.render(8, 1);
        assert_eq!(second, vec![OFF, OFF, GREEN, OFF, OFF, GREEN, OFF, OFF]);

        assert_eq!(RockinPattern::Mirror.render(8, 3), vec![GREEN; 8]);
    }

    #[test]
    fn test_chaser_splashes_and_bounces() {
        let n = 10;
        let splash = RockinPattern::Chaser.render(n, 0);
        assert_eq!(&splash[..5], &[RED; 5]);
        assert_eq!(&splash[5..], &[GREEN; 5]);

        let forward = RockinPattern::Chaser.render(n, 2);
        assert_eq!(&forward[6..9], &[RED, GREEN, RED]);
        assert_eq!(forward.iter().filter(|c| **c != OFF).count(), 3);

        let backward = RockinPattern::Chaser.render(n, 3);
        assert_eq!(&backward[..1], &[RED]);
        assert_eq!(backward[n - 1], GREEN);
        assert_eq!(backward[n - 2], RED);
    }

    #[test]
    fn test_patterns_handle_tiny_strips() {
        for pattern in [RockinPattern::Alternate, RockinPattern::Mirror, RockinPattern::Chaser] {
            assert!(pattern.render(0, 5).is_empty());
            assert_eq!(pattern.render(1, 5).len(), 1);
        }
    }
}
