/// Learner — turns lyric text into gram counts.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

use crate::core::codec;
use crate::core::markov::{MarkovError, MarkovModel};
use crate::schema::token::{BEGIN, END};
use crate::tokenizer::{TokenizeError, Tokenizer};

#[derive(Debug, Error)]
pub enum LearnError {
    #[error("tokenization failed for line {line:?}: {source}")]
    Tokenization {
        line: String,
        #[source]
        source: TokenizeError,
    },
    #[error("markov error: {0}")]
    Markov(#[from] MarkovError),
}

/// Counters reported after learning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearnStats {
    /// Corpus entries (lyrics) consumed.
    pub entries: usize,
    /// Non-empty lines.
    pub lines: usize,
    /// Word tokens, sentinels excluded.
    pub tokens: usize,
    /// Grams counted (windows slid, not distinct keys).
    pub grams: usize,
}

impl LearnStats {
    fn absorb(&mut self, other: LearnStats) {
        self.entries += other.entries;
        self.lines += other.lines;
        self.tokens += other.tokens;
        self.grams += other.grams;
    }
}

/// Build the flattened, escaped token stream for one lyric:
/// `BEGIN`, then each non-empty line's tokens followed by `END`.
///
/// Every line is tokenized before anything is returned, so a failure on any
/// line leaves nothing half-learned.
pub fn token_stream<T: Tokenizer + ?Sized>(
    tokenizer: &T,
    text: &str,
) -> Result<(Vec<String>, usize), LearnError> {
    let mut stream = vec![BEGIN.to_string()];
    let mut lines = 0;

    for line in text.trim().lines() {
        let tokens = tokenizer
            .tokenize(line)
            .map_err(|source| LearnError::Tokenization {
                line: line.to_string(),
                source,
            })?;
        if tokens.is_empty() {
            continue;
        }
        lines += 1;
        stream.extend(tokens.iter().map(|t| codec::encode(t)));
        stream.push(END.to_string());
    }

    Ok((stream, lines))
}

/// Slide an `order + 1` window over `stream` and count every gram.
fn count_stream(model: &mut MarkovModel, stream: &[String]) -> Result<usize, MarkovError> {
    let width = model.order() + 1;
    let mut grams = 0;
    for window in stream.windows(width) {
        model.increment(window)?;
        grams += 1;
    }
    Ok(grams)
}

fn learn_into<T: Tokenizer + ?Sized>(
    model: &mut MarkovModel,
    tokenizer: &T,
    text: &str,
) -> Result<LearnStats, LearnError> {
    let (stream, lines) = token_stream(tokenizer, text)?;
    let grams = count_stream(model, &stream)?;
    let stats = LearnStats {
        entries: 1,
        lines,
        tokens: stream.len() - 1 - lines,
        grams,
    };
    debug!(
        lines = stats.lines,
        tokens = stats.tokens,
        grams = stats.grams,
        "learned corpus entry"
    );
    Ok(stats)
}

/// Feeds corpus entries through a tokenizer into a [`MarkovModel`].
pub struct Learner<T> {
    model: MarkovModel,
    tokenizer: T,
}

impl<T: Tokenizer> Learner<T> {
    /// Start from an empty model. An order of 0 falls back to 2.
    pub fn new(order: usize, tokenizer: T) -> Self {
        Self::with_model(MarkovModel::with_order_or_default(order), tokenizer)
    }

    /// Continue learning into an existing model.
    pub fn with_model(model: MarkovModel, tokenizer: T) -> Self {
        Self { model, tokenizer }
    }

    pub fn model(&self) -> &MarkovModel {
        &self.model
    }

    pub fn into_model(self) -> MarkovModel {
        self.model
    }

    /// Learn one lyric.
    pub fn learn(&mut self, text: &str) -> Result<LearnStats, LearnError> {
        learn_into(&mut self.model, &self.tokenizer, text)
    }
}

impl<T: Tokenizer + Sync> Learner<T> {
    /// Learn many lyrics in parallel on the rayon thread pool.
    pub fn learn_batch<S: AsRef<str> + Sync>(
        &mut self,
        texts: &[S],
    ) -> Result<LearnStats, LearnError> {
        self.learn_batch_with_progress(texts, |_| {})
    }

    /// Like [`learn_batch`](Self::learn_batch), calling `on_entry(done)` each
    /// time an entry finishes.
    ///
    /// Every worker folds entries into its own shard and shards are reduced
    /// pairwise. The result is merged into the model only when all entries
    /// succeeded, so any failure leaves the model as it was.
    pub fn learn_batch_with_progress<S, F>(
        &mut self,
        texts: &[S],
        on_entry: F,
    ) -> Result<LearnStats, LearnError>
    where
        S: AsRef<str> + Sync,
        F: Fn(usize) + Sync,
    {
        let order = self.model.order();
        let tokenizer = &self.tokenizer;
        let done = AtomicUsize::new(0);
        let empty = || (MarkovModel::with_order_or_default(order), LearnStats::default());

        let (shard, total) = texts
            .par_iter()
            .try_fold(empty, |(mut shard, mut stats), text| -> Result<_, LearnError> {
                stats.absorb(learn_into(&mut shard, tokenizer, text.as_ref())?);
                on_entry(done.fetch_add(1, Ordering::Relaxed) + 1);
                Ok((shard, stats))
            })
            .try_reduce(empty, |(mut left, mut stats), (right, more)| -> Result<_, LearnError> {
                left.merge(&right)?;
                stats.absorb(more);
                Ok((left, stats))
            })?;

        self.model.merge(&shard)?;
        debug!(
            entries = total.entries,
            threads = rayon::current_num_threads(),
            distinct = self.model.len(),
            "batch learned"
        );
        Ok(total)
    }
}
