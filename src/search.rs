// src/search.rs
//
// Coarse-to-fine search for the commit closest to the snapshot. Each round
// samples the current window every `step` commits, narrows the window around
// the lowest `total_lines` values seen so far and halves the step. This
// assumes the divergence is roughly unimodal around the true origin; the
// answer is the best sample over the whole run, which is only an estimate of
// the global minimum when that assumption fails (merges, reverts).

use crate::checkout::CheckoutOperation;
use crate::error::{MatchError, Result};
use crate::metrics_cache::CommitMetricsCache;
use crate::model::{BestMatch, CommitMetrics, SearchWindow, Sequence};
use crate::report::best_match;
use tracing::{debug, info};

/// The lowest values seen, at most `capacity` of them, in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinWindow {
    capacity: usize,
    entries: Vec<(Sequence, u64)>,
}

impl MinWindow {
    pub fn new(capacity: usize) -> Self {
        MinWindow {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Buffer of the lowest `total_lines` among `samples`, offered in sequence order
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a CommitMetrics>, capacity: usize) -> Self {
        let mut window = MinWindow::new(capacity);
        for sample in samples {
            window.offer(sample.sequence(), sample.total_lines());
        }
        window
    }

    /// Append while there is room; once full, replace the first entry holding
    /// the largest value if `value` is smaller than it
    pub fn offer(&mut self, sequence: Sequence, value: u64) {
        if self.entries.len() < self.capacity {
            self.entries.push((sequence, value));
            return;
        }

        let largest = self
            .entries
            .iter()
            .enumerate()
            .fold(None, |found: Option<(usize, u64)>, (i, &(_, v))| match found {
                Some((_, max)) if max >= v => found,
                _ => Some((i, v)),
            });

        if let Some((i, max)) = largest {
            if value < max {
                self.entries.remove(i);
                self.entries.push((sequence, value));
            }
        }
    }

    pub fn entries(&self) -> &[(Sequence, u64)] {
        &self.entries
    }

    /// Span of the buffered sequences, widened by one sampled sequence on each
    /// side unless it already reaches the first or last sampled one.
    ///
    /// `sampled` must be ascending and contain every buffered sequence.
    pub fn bounds(&self, sampled: &[Sequence]) -> Option<(Sequence, Sequence)> {
        let low = self.entries.iter().map(|&(s, _)| s).min()?;
        let high = self.entries.iter().map(|&(s, _)| s).max()?;

        let left = match sampled.binary_search(&low) {
            Ok(pos) if pos > 0 => sampled[pos - 1],
            _ => low,
        };
        let right = match sampled.binary_search(&high) {
            Ok(pos) if pos + 1 < sampled.len() => sampled[pos + 1],
            _ => high,
        };

        Some((left, right))
    }
}

/// Run the range search from an initial stride of `step` with a minimal-values
/// buffer of `capacity` entries, and return the best sample of the run
pub fn find_upstream_commit<C: CheckoutOperation>(
    cache: &mut CommitMetricsCache<C>,
    step: usize,
    capacity: usize,
) -> Result<BestMatch> {
    if step == 0 {
        return Err(MatchError::input("step must be at least 1"));
    }
    if capacity == 0 {
        return Err(MatchError::input("window must hold at least 1 entry"));
    }

    let mut window = SearchWindow {
        left: 0,
        right: cache.len() - 1,
        step,
    };

    while window.step >= 1 {
        cache.compute_range(&window)?;

        let buffer = MinWindow::from_samples(cache.samples(), capacity);
        debug!("Minimal values: {:?}", buffer.entries());

        let (left, right) = buffer
            .bounds(&cache.sampled())
            .ok_or_else(|| MatchError::input("no commits were sampled"))?;
        let best = best_match(cache.samples()).ok_or_else(|| MatchError::input("no commits were sampled"))?;

        info!(
            "Step: {}, left: {}, right: {}, min. seq: {}, min. value: {}.",
            window.step, left, right, best.sequence, best.total_lines
        );

        window = SearchWindow {
            left,
            right,
            step: window.step / 2,
        };
    }

    best_match(cache.samples()).ok_or_else(|| MatchError::input("no commits were sampled"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::Workspace;
    use crate::config::CompareOptions;
    use crate::testing::{records, LineCountCheckout};
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    const UNIMODAL: [u64; 7] = [50, 40, 30, 10, 25, 45, 60];

    fn search(values: &[u64], step: usize, capacity: usize) -> (BestMatch, Vec<String>, Vec<Sequence>) {
        let snapshot = TempDir::new().unwrap();
        let checkout = LineCountCheckout::new(values.to_vec());
        let calls = checkout.calls();
        let mut cache = CommitMetricsCache::new(
            records(values.len()),
            snapshot.path(),
            CompareOptions::default(),
            Workspace::temporary().unwrap(),
            checkout,
        )
        .unwrap();

        let best = find_upstream_commit(&mut cache, step, capacity).unwrap();
        let calls = calls.borrow().clone();
        (best, calls, cache.sampled())
    }

    #[test]
    fn buffer_fills_then_replaces_the_first_largest() {
        let mut window = MinWindow::new(3);
        window.offer(0, 50);
        window.offer(1, 40);
        window.offer(2, 50);
        assert_eq!(window.entries(), &[(0, 50), (1, 40), (2, 50)]);

        window.offer(3, 10);
        assert_eq!(window.entries(), &[(1, 40), (2, 50), (3, 10)]);

        window.offer(4, 60);
        assert_eq!(window.entries(), &[(1, 40), (2, 50), (3, 10)]);
    }

    #[test]
    fn bounds_extend_one_sampled_index_outward() {
        let mut window = MinWindow::new(2);
        window.offer(4, 1);
        window.offer(6, 2);

        assert_eq!(window.bounds(&[0, 2, 4, 6, 8, 10]), Some((2, 8)));
        assert_eq!(window.bounds(&[4, 6]), Some((4, 6)));
        assert_eq!(window.bounds(&[0, 4, 6]), Some((0, 6)));
    }

    #[test]
    fn bounds_of_a_partly_filled_buffer() {
        let mut window = MinWindow::new(3);
        assert_eq!(window.bounds(&[]), None);

        window.offer(5, 9);
        assert_eq!(window.bounds(&[5]), Some((5, 5)));
        assert_eq!(window.bounds(&[1, 5, 9]), Some((1, 9)));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    #[case(6)]
    #[case(100)]
    fn converges_on_a_unimodal_history(#[case] step: usize) {
        let (best, _, _) = search(&UNIMODAL, step, 3);

        assert_eq!(best.sequence, 3);
        assert_eq!(best.id, "c3");
        assert_eq!(best.total_lines, 10);
    }

    #[test]
    fn single_commit_is_the_match() {
        let (best, calls, sampled) = search(&[42], 8, 3);

        assert_eq!(best.sequence, 0);
        assert_eq!(best.total_lines, 42);
        assert_eq!(calls, vec!["c0"]);
        assert_eq!(sampled, vec![0]);
    }

    #[test]
    fn coarse_step_samples_fewer_commits() {
        let values: Vec<u64> = (0..64u64).map(|i| if i <= 40 { 200 - 5 * i } else { 5 * i - 200 }).collect();

        let (best, calls, _) = search(&values, 16, 3);

        assert_eq!(best.sequence, 40);
        assert!(calls.len() < values.len(), "sampled {} of {}", calls.len(), values.len());
    }

    #[test]
    fn ties_go_to_the_earliest_sequence() {
        let (best, _, _) = search(&[9, 3, 7, 3, 9], 1, 3);

        assert_eq!(best.sequence, 1);
    }

    #[test]
    fn zero_step_is_rejected() {
        let snapshot = TempDir::new().unwrap();
        let mut cache = CommitMetricsCache::new(
            records(2),
            snapshot.path(),
            CompareOptions::default(),
            Workspace::temporary().unwrap(),
            LineCountCheckout::new(vec![1, 2]),
        )
        .unwrap();

        assert!(matches!(find_upstream_commit(&mut cache, 0, 3), Err(MatchError::Input(_))));
        assert!(cache.sampled().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn finds_the_minimum_of_any_strictly_unimodal_history(
            len in 1usize..24,
            min_at in 0usize..24,
            step in 1usize..32,
        ) {
            let min_at = min_at % len;
            let values: Vec<u64> = (0..len)
                .map(|i| 10 + 3 * (i as i64 - min_at as i64).unsigned_abs())
                .collect();

            let (best, calls, _) = search(&values, step, 3);

            prop_assert_eq!(best.sequence, min_at);
            let mut unique = calls.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), calls.len());
        }
    }
}
