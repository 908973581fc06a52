/// Ascending beat timestamps in seconds for one track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatTable {
    beats: Vec<f64>,
    tempo_bpm: Option<f64>,
}

impl BeatTable {
    /// Builds a table, dropping non-finite entries and sorting the rest.
    pub fn new(mut beats: Vec<f64>, tempo_bpm: Option<f64>) -> Self {
        beats.retain(|b| b.is_finite());
        beats.sort_by(|a, b| a.total_cmp(b));
        Self {
            beats,
            tempo_bpm: tempo_bpm.filter(|bpm| *bpm > 0.0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn beats(&self) -> &[f64] {
        &self.beats
    }

    pub fn tempo_bpm(&self) -> Option<f64> {
        self.tempo_bpm
    }

    /// Index of the last beat at or before `position`, `None` before the
    /// first beat.
    pub fn cursor_at(&self, position: f64) -> Option<usize> {
        self.beats
            .partition_point(|beat| *beat <= position)
            .checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_before_first_beat() {
        let table = BeatTable::new(vec![0.5, 1.0, 1.5], None);
        assert_eq!(table.cursor_at(0.0), None);
        assert_eq!(table.cursor_at(0.499), None);
    }

    #[test]
    fn test_cursor_is_inclusive() {
        let table = BeatTable::new(vec![0.5, 1.0, 1.5], Some(120.0));
        assert_eq!(table.cursor_at(0.5), Some(0));
        assert_eq!(table.cursor_at(1.2), Some(1));
        assert_eq!(table.cursor_at(1.5), Some(2));
        assert_eq!(table.cursor_at(900.0), Some(2));
        assert_eq!(table.tempo_bpm(), Some(120.0));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let table = BeatTable::new(vec![2.0, f64::NAN, 1.0, 3.0], Some(0.0));
        assert_eq!(table.beats(), &[1.0, 2.0, 3.0]);
        assert_eq!(table.tempo_bpm(), None);
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(BeatTable::empty().cursor_at(10.0), None);
    }
}
