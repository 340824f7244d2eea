//! Rank classification and per-rank sampling weights.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::engine::config::RankConfig;
use crate::engine::types::Rank;

pub type RankWeightTable = [f64; 5];

pub fn rank_of(score: u8, config: &RankConfig) -> Rank {
    if score >= config.mastered_min {
        Rank::Mastered
    } else if score >= config.mastering_min {
        Rank::Mastering
    } else if score >= config.practicing_min {
        Rank::Practicing
    } else if score >= config.learning_min {
        Rank::Learning
    } else {
        Rank::New
    }
}

/// Normalised weights over the ranks that actually have candidates. Absent
/// ranks get 0 and the remaining weights keep their ratios. If every present
/// rank has a zero base weight the present ranks share the mass uniformly.
pub fn effective_weights(present: &[bool; 5], config: &RankConfig) -> RankWeightTable {
    let mut weights = [0.0; 5];
    for rank in Rank::ALL {
        if present[rank.index()] {
            weights[rank.index()] = config.base_weight(rank);
        }
    }

    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w /= total;
        }
        return weights;
    }

    let count = present.iter().filter(|p| **p).count();
    if count == 0 {
        return weights;
    }
    for rank in Rank::ALL {
        if present[rank.index()] {
            weights[rank.index()] = 1.0 / count as f64;
        }
    }
    weights
}

/// Draws a rank proportionally to `weights`; `None` when all weights are zero.
pub fn sample_rank<R: Rng + ?Sized>(weights: &RankWeightTable, rng: &mut R) -> Option<Rank> {
    let dist = WeightedIndex::new(weights.iter().copied()).ok()?;
    Some(Rank::ALL[dist.sample(rng)])
}
