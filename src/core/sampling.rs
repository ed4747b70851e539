/// Weighted candidate selection.

use rand::distributions::{WeightedError, WeightedIndex};
use rand::prelude::Distribution;
use rand::Rng;

use crate::core::markov::MarkovError;

/// Pick an index with probability proportional to its weight.
///
/// Equivalent to drawing `v` uniformly in `[0, sum)` and subtracting weights
/// in order until the remainder goes negative. Zero weights are never chosen.
pub fn choose<R: Rng + ?Sized>(weights: &[u32], rng: &mut R) -> Result<usize, MarkovError> {
    // u64 so that summing large counts cannot overflow
    let dist = WeightedIndex::<u64>::new(weights.iter().map(|&w| u64::from(w)))
        .map_err(|e| match e {
            WeightedError::NoItem | WeightedError::AllWeightsZero => {
                MarkovError::EmptyCandidateSet
            }
            other => MarkovError::InvalidWeights(other),
        })?;
    Ok(dist.sample(rng))
}
