//! Weighted prize selection.
//!
//! [`select_prize`] is a pure function of the prize list and an injected
//! [`RandomSource`]. Production uses [`ThreadRandom`]; tests inject
//! [`SeededRandom`] or [`ScriptedRandom`] to force outcomes.

use std::fmt;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::PrizeDefinition;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// Returns a value uniformly distributed in `[0, 1)`.
    fn next_unit(&self) -> f64;
}

/// Thread-local OS-seeded generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic generator for reproducible simulations.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Creates a generator from a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random::<f64>(),
            Err(poisoned) => poisoned.into_inner().random::<f64>(),
        }
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
#[derive(Debug)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: Mutex<usize>,
}

impl ScriptedRandom {
    /// Creates a source replaying `values`. Values are clamped into
    /// `[0, 1)`; an empty script always yields `0.0`.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self {
            values,
            cursor: Mutex::new(0),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&self) -> f64 {
        let mut cursor = match self.cursor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self
            .values
            .get(*cursor % self.values.len())
            .copied()
            .unwrap_or(0.0);
        *cursor = cursor.wrapping_add(1);
        value
    }
}

/// Maps a unit draw onto `0..len`. `len` must be non-zero.
fn unit_index(unit: f64, len: usize) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let index = (unit * len as f64) as usize;
    index.min(len.saturating_sub(1))
}

/// Draws one prize definition.
///
/// Walks the list accumulating weights and returns the first entry whose
/// running sum exceeds `r ~ U[0, total)`. Zero-weight entries are never
/// drawn. If the weights sum to zero or less, picks uniformly. If float
/// error leaves `r` unconsumed, returns the last entry with a positive
/// weight. Returns `None` only for an empty list.
#[must_use]
pub fn select_prize<'a>(
    prizes: &'a [PrizeDefinition],
    random: &dyn RandomSource,
) -> Option<&'a PrizeDefinition> {
    let last = prizes.last()?;
    let total: f64 = prizes.iter().map(|p| p.probability().max(0.0)).sum();

    if total.is_nan() || total <= 0.0 {
        return prizes.get(unit_index(random.next_unit(), prizes.len()));
    }

    let r = random.next_unit() * total;
    let mut cumulative = 0.0;
    for prize in prizes {
        cumulative += prize.probability().max(0.0);
        if r < cumulative {
            return Some(prize);
        }
    }
    prizes
        .iter()
        .rev()
        .find(|p| p.probability() > 0.0)
        .or(Some(last))
}

/// Picks the wheel position to display for `selected`.
///
/// Chooses uniformly among all definitions that describe the same logical
/// prize. Purely cosmetic: the authoritative result is the prize itself.
#[must_use]
pub fn visual_segment_index(
    prizes: &[PrizeDefinition],
    selected: &PrizeDefinition,
    random: &dyn RandomSource,
) -> Option<usize> {
    let matching: Vec<usize> = prizes
        .iter()
        .enumerate()
        .filter(|(_, p)| p.same_prize(selected))
        .map(|(i, _)| i)
        .collect();
    if matching.is_empty() {
        return None;
    }
    matching
        .get(unit_index(random.next_unit(), matching.len()))
        .copied()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn message(label: &str, probability: f64) -> PrizeDefinition {
        PrizeDefinition::Message {
            label: label.to_string(),
            probability,
            message: None,
        }
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(select_prize(&[], &ThreadRandom).is_none());
    }

    #[test]
    fn draw_walks_cumulative_weights() {
        let prizes = [message("A", 0.7), message("B", 0.3)];
        let random = ScriptedRandom::new(vec![0.0, 0.6, 0.75, 0.99]);
        let labels: Vec<&str> = (0..4)
            .filter_map(|_| select_prize(&prizes, &random))
            .map(PrizeDefinition::label)
            .collect();
        assert_eq!(labels, ["A", "A", "B", "B"]);
    }

    #[test]
    fn zero_total_falls_back_to_uniform() {
        let prizes = [message("A", 0.0), message("B", 0.0), message("C", 0.0)];
        let random = ScriptedRandom::new(vec![0.0, 0.5, 0.99]);
        let labels: Vec<&str> = (0..3)
            .filter_map(|_| select_prize(&prizes, &random))
            .map(PrizeDefinition::label)
            .collect();
        assert_eq!(labels, ["A", "B", "C"]);
    }

    #[test]
    fn converges_to_configured_weights() {
        let prizes = [message("A", 0.7), message("B", 0.3)];
        let random = SeededRandom::new(7);
        let draws = 100_000;
        let hits_a = (0..draws)
            .filter_map(|_| select_prize(&prizes, &random))
            .filter(|p| p.label() == "A")
            .count();
        #[allow(clippy::cast_precision_loss)]
        let freq_a = hits_a as f64 / f64::from(draws);
        assert!((freq_a - 0.7).abs() < 0.01, "observed {freq_a}");
    }

    #[test]
    fn visual_segment_matches_logical_prize() {
        let prizes = [
            message("Jackpot", 0.1),
            message("Try again", 0.4),
            message("Jackpot", 0.1),
            message("Try again", 0.4),
        ];
        let random = ScriptedRandom::new(vec![0.0, 0.9]);
        let Some(selected) = prizes.get(2) else {
            panic!("missing prize");
        };
        assert_eq!(visual_segment_index(&prizes, selected, &random), Some(0));
        assert_eq!(visual_segment_index(&prizes, selected, &random), Some(2));
    }

    proptest! {
        #[test]
        fn never_draws_zero_weight_entries(
            weights in proptest::collection::vec(0.0f64..=1.0, 1..8),
            unit in 0.0f64..1.0,
        ) {
            let mut prizes: Vec<PrizeDefinition> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| message(&format!("p{i}"), *w))
                .collect();
            prizes.push(message("zero", 0.0));
            let total: f64 = weights.iter().sum();
            let random = ScriptedRandom::new(vec![unit]);
            let selected = select_prize(&prizes, &random);
            prop_assert!(selected.is_some());
            if total > 0.0 {
                prop_assert_ne!(selected.map(PrizeDefinition::label), Some("zero"));
            }
        }
    }
}
