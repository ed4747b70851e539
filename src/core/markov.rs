/// Markov model — order-n gram counts with exact and wildcard lookup.

use rand::distributions::WeightedError;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::schema::token::{KEY_DELIMITER, WILDCARD};

#[derive(Debug, Error)]
pub enum MarkovError {
    #[error("tuple {tuple:?} has {actual} tokens, expected {expected}")]
    InvalidArity {
        expected: usize,
        actual: usize,
        tuple: Vec<String>,
    },
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("weighted choice over an empty candidate set")]
    EmptyCandidateSet,
    #[error("no data for generation (model is empty)")]
    NoData,
    #[error("generation failed after {0} attempts")]
    GenerationFailed(u32),
    #[error("order must be at least 1, got {0}")]
    InvalidOrder(usize),
    #[error("order mismatch: expected {expected}, got {actual}")]
    OrderMismatch { expected: usize, actual: usize },
    #[error("token {0:?} contains the key delimiter or is the wildcard")]
    MalformedToken(String),
    #[error("stored key {0:?} does not have order + 1 segments")]
    MalformedKey(String),
    #[error("stored key {0:?} has a zero count")]
    ZeroCount(String),
    #[error("invalid candidate weights: {0}")]
    InvalidWeights(WeightedError),
}

/// Order used when none (or zero) is given.
pub const DEFAULT_ORDER: usize = 2;

/// Join tokens into a gram key.
pub fn encode_key<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut key = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            key.push(KEY_DELIMITER);
        }
        key.push_str(token.as_ref());
    }
    key
}

/// Split a gram key back into its tokens.
pub fn split_key(key: &str) -> Vec<&str> {
    key.split(KEY_DELIMITER).collect()
}

#[derive(Debug, Clone)]
struct Gram {
    key: String,
    count: u32,
}

/// Gram counts for a fixed-order chain.
///
/// Keys are `order + 1` encoded tokens joined by `:`; the first `order`
/// tokens are the context, the last one the continuation.
///
/// Besides the key → count map the model keeps every key in first-seen
/// order and an index from each leading prefix (1..=order tokens) to the
/// grams that start with it. Both are updated by `increment` as soon as a
/// new key appears, so `find` never misses a freshly learned gram.
#[derive(Debug, Clone)]
pub struct MarkovModel {
    order: usize,
    grams: Vec<Gram>,
    slots: FxHashMap<String, usize>,
    prefixes: FxHashMap<String, Vec<usize>>,
}

impl Default for MarkovModel {
    fn default() -> Self {
        Self::with_order_or_default(DEFAULT_ORDER)
    }
}

impl MarkovModel {
    /// Create an empty model. `order` must be at least 1.
    pub fn new(order: usize) -> Result<Self, MarkovError> {
        if order == 0 {
            return Err(MarkovError::InvalidOrder(order));
        }
        Ok(Self::with_order_or_default(order))
    }

    /// Create an empty model, falling back to order 2 when `order` is 0.
    pub fn with_order_or_default(order: usize) -> Self {
        let order = if order == 0 { DEFAULT_ORDER } else { order };
        Self {
            order,
            grams: Vec::new(),
            slots: FxHashMap::default(),
            prefixes: FxHashMap::default(),
        }
    }

    /// Rebuild a model from a persisted key → count map.
    pub fn from_counts<I>(order: usize, counts: I) -> Result<Self, MarkovError>
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let mut model = Self::new(order)?;
        let mut entries: Vec<(String, u32)> = counts.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, count) in entries {
            let segments = split_key(&key);
            if segments.len() != order + 1 || !segments.iter().all(|t| is_storable(t)) {
                return Err(MarkovError::MalformedKey(key));
            }
            if count == 0 {
                return Err(MarkovError::ZeroCount(key));
            }
            model.add(key, count);
        }
        Ok(model)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of distinct grams.
    pub fn len(&self) -> usize {
        self.grams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grams.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.grams.iter().map(|g| u64::from(g.count)).sum()
    }

    /// Record one more occurrence of `tuple` and return its new count.
    ///
    /// The model is left untouched on error.
    pub fn increment<S: AsRef<str>>(&mut self, tuple: &[S]) -> Result<u32, MarkovError> {
        self.check_arity(tuple)?;
        if let Some(bad) = tuple.iter().map(|t| t.as_ref()).find(|t| !is_storable(t)) {
            return Err(MarkovError::MalformedToken(bad.to_string()));
        }
        Ok(self.add(encode_key(tuple), 1))
    }

    /// Exact count lookup for a full tuple.
    pub fn get<S: AsRef<str>>(&self, tuple: &[S]) -> Result<u32, MarkovError> {
        self.check_arity(tuple)?;
        self.get_key(&encode_key(tuple))
    }

    /// Exact count lookup for an encoded key.
    pub fn get_key(&self, key: &str) -> Result<u32, MarkovError> {
        self.slots
            .get(key)
            .map(|&slot| self.grams[slot].count)
            .ok_or_else(|| MarkovError::KeyNotFound(key.to_string()))
    }

    pub fn contains<S: AsRef<str>>(&self, tuple: &[S]) -> bool {
        tuple.len() == self.order + 1 && self.slots.contains_key(&encode_key(tuple))
    }

    /// Every stored key matching `partial` position by position.
    ///
    /// `partial` may be shorter than `order + 1`; missing positions are
    /// wildcards, and any position holding [`WILDCARD`] matches anything.
    /// A concrete token containing the key delimiter is rejected.
    /// An empty or all-wildcard query returns every key. Keys come back in
    /// first-seen order.
    pub fn find<S: AsRef<str>>(&self, partial: &[S]) -> Result<Vec<&str>, MarkovError> {
        Ok(self
            .matching(partial)?
            .into_iter()
            .map(|slot| self.grams[slot].key.as_str())
            .collect())
    }

    /// Like [`find`](Self::find) but also returns each key's count.
    pub fn find_counts<S: AsRef<str>>(
        &self,
        partial: &[S],
    ) -> Result<Vec<(&str, u32)>, MarkovError> {
        Ok(self
            .matching(partial)?
            .into_iter()
            .map(|slot| {
                let gram = &self.grams[slot];
                (gram.key.as_str(), gram.count)
            })
            .collect())
    }

    /// Whether any stored key starts with `prefix`. Wildcards are not
    /// interpreted here.
    pub fn has_prefix<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        match prefix.len() {
            0 => !self.is_empty(),
            n if n <= self.order => self.prefixes.contains_key(&encode_key(prefix)),
            n if n == self.order + 1 => self.slots.contains_key(&encode_key(prefix)),
            _ => false,
        }
    }

    /// Deep copy of the key → count map.
    pub fn counts(&self) -> FxHashMap<String, u32> {
        self.grams
            .iter()
            .map(|g| (g.key.clone(), g.count))
            .collect()
    }

    /// Add every count of `other` into this model.
    pub fn merge(&mut self, other: &MarkovModel) -> Result<(), MarkovError> {
        if self.order != other.order {
            return Err(MarkovError::OrderMismatch {
                expected: self.order,
                actual: other.order,
            });
        }
        for gram in &other.grams {
            self.add(gram.key.clone(), gram.count);
        }
        Ok(())
    }

    fn check_arity<S: AsRef<str>>(&self, tuple: &[S]) -> Result<(), MarkovError> {
        if tuple.len() != self.order + 1 {
            return Err(MarkovError::InvalidArity {
                expected: self.order + 1,
                actual: tuple.len(),
                tuple: tuple.iter().map(|t| t.as_ref().to_string()).collect(),
            });
        }
        Ok(())
    }

    /// Insert or bump a key already known to be well-formed.
    fn add(&mut self, key: String, count: u32) -> u32 {
        if let Some(&slot) = self.slots.get(&key) {
            let gram = &mut self.grams[slot];
            gram.count = gram.count.saturating_add(count);
            return gram.count;
        }

        let slot = self.grams.len();
        let mut offset = 0;
        for _ in 0..self.order {
            let Some(pos) = key[offset..].find(KEY_DELIMITER) else {
                break;
            };
            let end = offset + pos;
            self.prefixes.entry(key[..end].to_string()).or_default().push(slot);
            offset = end + 1;
        }
        self.slots.insert(key.clone(), slot);
        self.grams.push(Gram { key, count });
        count
    }

    fn matching<S: AsRef<str>>(&self, partial: &[S]) -> Result<Vec<usize>, MarkovError> {
        let width = self.order + 1;
        if partial.len() > width {
            return Err(MarkovError::InvalidArity {
                expected: width,
                actual: partial.len(),
                tuple: partial.iter().map(|t| t.as_ref().to_string()).collect(),
            });
        }

        let query: Vec<&str> = partial.iter().map(|t| t.as_ref()).collect();
        if let Some(bad) = query.iter().find(|t| **t != WILDCARD && !is_storable(t)) {
            return Err(MarkovError::MalformedToken(bad.to_string()));
        }
        let fixed = query.iter().take_while(|t| **t != WILDCARD).count();
        let tail_is_open = query[fixed..].iter().all(|t| *t == WILDCARD);

        // Narrow by the longest concrete prefix, then filter the rest.
        let candidates: Vec<usize> = match fixed {
            0 => (0..self.grams.len()).collect(),
            n if n == width => self.slots.get(&encode_key(&query)).copied().into_iter().collect(),
            _ => self
                .prefixes
                .get(&encode_key(&query[..fixed]))
                .cloned()
                .unwrap_or_default(),
        };

        if tail_is_open {
            return Ok(candidates);
        }

        Ok(candidates
            .into_iter()
            .filter(|&slot| {
                split_key(&self.grams[slot].key)
                    .iter()
                    .zip(&query)
                    .all(|(have, want)| *want == WILDCARD || have == want)
            })
            .collect())
    }
}

fn is_storable(token: &str) -> bool {
    token != WILDCARD && !token.contains(KEY_DELIMITER)
}
