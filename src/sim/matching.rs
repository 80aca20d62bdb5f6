//! Run detection, match enumeration and initial pattern repair
//!
//! These are pure functions over per-index match slots. A `None` slot is a
//! hole (a destroyed token) and never belongs to a run.

use rand::Rng;

use super::token::Color;
use crate::error::ChainError;

/// Match color of one chain position
pub type Slot = Option<Color>;

/// Result of enumerating every match a chain will produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchScan {
    /// Run start indices, in resolution order. Each index is valid against
    /// the chain as it looks after all earlier entries were removed.
    pub starts: Vec<usize>,
    /// The iteration cap stopped the scan while runs remained
    pub limit_reached: bool,
}

/// Maximal same-color span (inclusive) containing `index`
pub fn find_maximal_run(slots: &[Slot], index: usize) -> Option<(usize, usize)> {
    let color = (*slots.get(index)?)?;

    let mut left = index;
    while left > 0 && slots[left - 1] == Some(color) {
        left -= 1;
    }

    let mut right = index;
    while right + 1 < slots.len() && slots[right + 1] == Some(color) {
        right += 1;
    }

    Some((left, right))
}

/// First maximal run of at least `min_run` tokens, scanning from index 0
pub fn first_run(slots: &[Slot], min_run: usize) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < slots.len() {
        match find_maximal_run(slots, i) {
            Some((left, right)) => {
                if right - left + 1 >= min_run {
                    return Some((left, right));
                }
                i = right + 1;
            }
            None => i += 1,
        }
    }
    None
}

/// Number of distinct qualifying runs currently present
pub fn count_runs(slots: &[Slot], min_run: usize) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < slots.len() {
        match find_maximal_run(slots, i) {
            Some((left, right)) => {
                if right - left + 1 >= min_run {
                    count += 1;
                }
                i = right + 1;
            }
            None => i += 1,
        }
    }
    count
}

/// Enumerate every match the chain will resolve, including cascades.
///
/// Works on a scratch copy: after each find the run is removed and the scan
/// restarts from index 0, since removal shifts indices and may join new
/// neighbors. Nothing is removed from the real chain.
pub fn scan_all_matches(slots: &[Slot], min_run: usize, max_iterations: u32) -> MatchScan {
    let mut scratch = slots.to_vec();
    let mut scan = MatchScan::default();
    let mut iterations = 0u32;

    while let Some((left, right)) = first_run(&scratch, min_run) {
        if iterations >= max_iterations {
            scan.limit_reached = true;
            break;
        }
        iterations += 1;
        scan.starts.push(left);
        scratch.drain(left..=right);
    }

    scan
}

/// Break up every qualifying run in a literal stage pattern.
///
/// Repeatedly recolors one token inside the first run found, choosing a
/// palette color that differs from the run and (when possible) from both
/// neighbors. Returns the number of tokens recolored.
pub fn repair_pattern<R: Rng + ?Sized>(
    colors: &mut [Color],
    palette: &[Color],
    min_run: usize,
    max_attempts: u32,
    rng: &mut R,
) -> Result<u32, ChainError> {
    let mut fixes = 0u32;

    loop {
        let slots: Vec<Slot> = colors.iter().copied().map(Some).collect();
        let Some((left, _right)) = first_run(&slots, min_run) else {
            return Ok(fixes);
        };

        let exhausted = || ChainError::PatternRepairExhausted {
            attempts: fixes,
            residual: count_runs(&slots, min_run),
        };
        if fixes >= max_attempts {
            return Err(exhausted());
        }

        // Middle of the first `min_run` window
        let target = left + min_run / 2;
        let current = colors[target];
        let prev = target.checked_sub(1).map(|i| colors[i]);
        let next = colors.get(target + 1).copied();

        let mut candidates: Vec<Color> = palette
            .iter()
            .copied()
            .filter(|&c| c != current && Some(c) != prev && Some(c) != next)
            .collect();
        if candidates.is_empty() {
            candidates = palette.iter().copied().filter(|&c| c != current).collect();
        }
        if candidates.is_empty() {
            return Err(exhausted());
        }

        let replacement = candidates[rng.random_range(0..candidates.len())];
        log::debug!(
            "Repaired pattern at index {}: {} -> {}",
            target,
            current,
            replacement
        );
        colors[target] = replacement;
        fixes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Color::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn slots(colors: &[Color]) -> Vec<Slot> {
        colors.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_find_maximal_run_expands_both_ways() {
        let s = slots(&[Red, Blue, Blue, Blue, Blue, Green]);
        assert_eq!(find_maximal_run(&s, 3), Some((1, 4)));
        assert_eq!(find_maximal_run(&s, 0), Some((0, 0)));
        assert_eq!(find_maximal_run(&s, 5), Some((5, 5)));
        assert_eq!(find_maximal_run(&s, 6), None);
    }

    #[test]
    fn test_holes_break_runs() {
        let s = vec![Some(Red), Some(Red), None, Some(Red)];
        assert_eq!(find_maximal_run(&s, 0), Some((0, 1)));
        assert_eq!(find_maximal_run(&s, 2), None);
        assert_eq!(first_run(&s, 3), None);
    }

    #[test]
    fn test_scan_no_matches() {
        let s = slots(&[Red, Red, Blue, Green, Green, Red]);
        assert_eq!(scan_all_matches(&s, 3, 50), MatchScan::default());
    }

    #[test]
    fn test_scan_single_match() {
        let s = slots(&[Red, Red, Red, Blue, Green]);
        let scan = scan_all_matches(&s, 3, 50);
        assert_eq!(scan.starts, vec![0]);
        assert!(!scan.limit_reached);
    }

    #[test]
    fn test_scan_follows_cascade() {
        // Removing the greens joins the two blue pairs
        let s = slots(&[Red, Blue, Blue, Green, Green, Green, Blue, Yellow]);
        let scan = scan_all_matches(&s, 3, 50);
        assert_eq!(scan.starts, vec![3, 1]);
    }

    #[test]
    fn test_scan_independent_matches_in_order() {
        let s = slots(&[Red, Red, Red, Blue, Green, Green, Green, Blue]);
        let scan = scan_all_matches(&s, 3, 50);
        // After the reds go, the greens start at index 1
        assert_eq!(scan.starts, vec![0, 1]);
    }

    #[test]
    fn test_scan_iteration_limit() {
        let s = slots(&[Red, Red, Red, Blue, Blue, Blue, Green, Green, Green]);
        let scan = scan_all_matches(&s, 3, 2);
        assert_eq!(scan.starts, vec![0, 0]);
        assert!(scan.limit_reached);
    }

    #[test]
    fn test_count_runs() {
        let s = slots(&[Red, Red, Red, Red, Blue, Green, Green, Green]);
        assert_eq!(count_runs(&s, 3), 2);
        assert_eq!(count_runs(&s, 4), 1);
    }

    #[test]
    fn test_repair_breaks_runs() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut colors = vec![Red, Red, Red, Red, Red, Blue, Blue, Blue];
        let fixes = repair_pattern(&mut colors, &Color::ALL, 3, 20, &mut rng).unwrap();
        assert!(fixes >= 2);
        assert_eq!(count_runs(&slots(&colors), 3), 0);
        assert_eq!(colors.len(), 8);
    }

    #[test]
    fn test_repair_exhausted() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut colors = vec![Red; 12];
        let err = repair_pattern(&mut colors, &Color::ALL, 3, 1, &mut rng).unwrap_err();
        assert!(matches!(err, ChainError::PatternRepairExhausted { attempts: 1, residual } if residual >= 1));

        // A single-color palette can never repair
        let mut colors = vec![Red; 3];
        assert!(repair_pattern(&mut colors, &[Red], 3, 20, &mut rng).is_err());
    }

    fn arb_color() -> impl Strategy<Value = Color> {
        prop::sample::select(Color::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_maximal_run_is_unique_and_maximal(
            colors in prop::collection::vec(prop::sample::select(vec![Red, Blue]), 1..40),
            pick in any::<prop::sample::Index>(),
        ) {
            let s = slots(&colors);
            let index = pick.index(s.len());
            let (left, right) = find_maximal_run(&s, index).unwrap();

            prop_assert!(left <= index && index <= right);
            prop_assert!(s[left..=right].iter().all(|&c| c == s[index]));
            if left > 0 {
                prop_assert_ne!(s[left - 1], s[index]);
            }
            if right + 1 < s.len() {
                prop_assert_ne!(s[right + 1], s[index]);
            }
        }

        #[test]
        fn prop_repaired_pattern_scans_empty_and_repair_is_idempotent(
            colors in prop::collection::vec(arb_color(), 0..40),
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut colors = colors;
            repair_pattern(&mut colors, &Color::ALL, 3, 1000, &mut rng).unwrap();
            prop_assert!(scan_all_matches(&slots(&colors), 3, 50).starts.is_empty());

            let before = colors.clone();
            let fixes = repair_pattern(&mut colors, &Color::ALL, 3, 1000, &mut rng).unwrap();
            prop_assert_eq!(fixes, 0);
            prop_assert_eq!(colors, before);
        }
    }
}
