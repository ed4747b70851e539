/// Lyric generator — walks a trained [`MarkovModel`] to produce new lines.

use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::codec;
use crate::core::markov::{split_key, MarkovError, MarkovModel};
use crate::core::sampling::choose;
use crate::schema::token::{is_sentinel, strip_tag, BEGIN, END, SPACE, WILDCARD};

/// Tunables for line generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Placed between decoded words. Use `""` for MeCab-tokenized Japanese.
    pub separator: String,
    /// Seed-and-walk attempts per line before giving up.
    pub max_line_attempts: u32,
    /// Optional cap; a line growing past this many tokens counts as a dead
    /// end. Walks that loop with no way out are caught without it.
    pub max_line_tokens: Option<usize>,
    /// Strip `#tag` part-of-speech suffixes when rendering. Only set this for
    /// models learned from a tagging tokenizer.
    pub strip_pos_tags: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            separator: " ".to_string(),
            max_line_attempts: 64,
            max_line_tokens: None,
            strip_pos_tags: false,
        }
    }
}

/// Outcome of one seed-and-walk attempt.
enum Attempt {
    Line(Vec<String>),
    DeadEnd,
}

/// Generates lyric lines from a read-only model.
///
/// All randomness comes from the caller's RNG, so a seeded
/// `StdRng` reproduces the same lyric.
pub struct Generator<'a> {
    model: &'a MarkovModel,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(model: &'a MarkovModel) -> Self {
        Self::with_config(model, GeneratorConfig::default())
    }

    pub fn with_config(model: &'a MarkovModel, config: GeneratorConfig) -> Self {
        Self { model, config }
    }

    /// Generate `line_count` lines joined by `\n`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        line_count: usize,
        rng: &mut R,
    ) -> Result<String, MarkovError> {
        let lines = self.generate_lines(line_count, rng)?;
        Ok(lines
            .iter()
            .map(|tokens| self.render_line(tokens))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Generate `line_count` lines of raw model tokens.
    ///
    /// Each line after the first is seeded with the trailing `order` tokens
    /// of everything generated so far, including the previous line's `END`,
    /// so lines follow one another the way they did in the corpus.
    pub fn generate_lines<R: Rng + ?Sized>(
        &self,
        line_count: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<String>>, MarkovError> {
        if !self.model.has_prefix(&[BEGIN]) {
            return Err(MarkovError::NoData);
        }

        let order = self.model.order();
        let mut history: Vec<String> = vec![BEGIN.to_string()];
        let mut lines = Vec::with_capacity(line_count);

        for i in 0..line_count {
            let context = if i == 0 {
                None
            } else {
                Some(&history[history.len().saturating_sub(order)..])
            };
            let tokens = self.walk_line(context, rng)?;

            history.extend(tokens.iter().cloned());
            history.push(END.to_string());
            if history.len() > order {
                history.drain(..history.len() - order);
            }
            lines.push(tokens);
        }

        Ok(lines)
    }

    /// Generate one line, returning only the new tokens (no `END`, and none
    /// of `context`).
    ///
    /// A context of at least `order` tokens is used as-is. A shorter one (or
    /// `[BEGIN]` when absent) is extended by weighted sampling; an unknown
    /// context is dropped in favour of `[BEGIN]`. When the walk reaches a
    /// context with no recorded continuation the line is thrown away and
    /// restarted from `BEGIN`, up to `max_line_attempts` times.
    pub fn generate_line<R: Rng + ?Sized>(
        &self,
        context: Option<&[String]>,
        rng: &mut R,
    ) -> Result<Vec<String>, MarkovError> {
        if !self.model.has_prefix(&[BEGIN]) {
            return Err(MarkovError::NoData);
        }
        self.walk_line(context, rng)
    }

    /// Decode a line of model tokens into display text.
    ///
    /// Sentinels are dropped, escapes reversed, and space tokens turned back
    /// into spaces. Part-of-speech suffixes go only when `strip_pos_tags` is set.
    pub fn render_line<S: AsRef<str>>(&self, tokens: &[S]) -> String {
        tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !is_sentinel(t))
            .map(|t| {
                if t == SPACE {
                    " ".to_string()
                } else if self.config.strip_pos_tags {
                    codec::decode(strip_tag(t))
                } else {
                    codec::decode(t)
                }
            })
            .collect::<Vec<_>>()
            .join(&self.config.separator)
    }

    fn walk_line<R: Rng + ?Sized>(
        &self,
        context: Option<&[String]>,
        rng: &mut R,
    ) -> Result<Vec<String>, MarkovError> {
        let mut start = context.filter(|c| !c.is_empty()).map(<[String]>::to_vec);
        for attempt in 0..self.config.max_line_attempts {
            match self.attempt_line(start.take(), rng)? {
                Attempt::Line(tokens) => return Ok(tokens),
                Attempt::DeadEnd => {
                    debug!(attempt, "dead end, restarting line from BEGIN");
                }
            }
        }

        Err(MarkovError::GenerationFailed(self.config.max_line_attempts))
    }

    fn attempt_line<R: Rng + ?Sized>(
        &self,
        start: Option<Vec<String>>,
        rng: &mut R,
    ) -> Result<Attempt, MarkovError> {
        let order = self.model.order();
        let Some((mut window, mut emitted)) = self.seed(start, rng)? else {
            return Ok(Attempt::DeadEnd);
        };

        // A very short line can finish while seeding.
        if let Some(end) = emitted.iter().position(|t| t == END) {
            emitted.truncate(end);
            return Ok(Attempt::Line(emitted));
        }

        // Windows reached while every step had a single continuation. Seeing
        // one twice means the walk cycles forever without reaching END.
        let mut forced: FxHashSet<Vec<String>> = FxHashSet::default();

        loop {
            if self.config.max_line_tokens.is_some_and(|cap| emitted.len() > cap) {
                return Ok(Attempt::DeadEnd);
            }

            let mut query: Vec<&str> = window[window.len() - order..]
                .iter()
                .map(String::as_str)
                .collect();
            query.push(WILDCARD);

            let candidates = self.model.find_counts(&query)?;
            if candidates.is_empty() {
                return Ok(Attempt::DeadEnd);
            }
            if candidates.len() == 1 {
                if !forced.insert(window.clone()) {
                    debug!(window = ?window, "line loops without reaching END");
                    return Ok(Attempt::DeadEnd);
                }
            } else {
                forced.clear();
            }
            let next = pick(&candidates, order, rng)?;

            if next == END {
                return Ok(Attempt::Line(emitted));
            }
            window.push(next.clone());
            if window.len() > order {
                window.remove(0);
            }
            emitted.push(next);
        }
    }

    /// Build an `order`-token window to walk from. Returns the window and
    /// the tokens sampled to fill it.
    fn seed<R: Rng + ?Sized>(
        &self,
        start: Option<Vec<String>>,
        rng: &mut R,
    ) -> Result<Option<(Vec<String>, Vec<String>)>, MarkovError> {
        let order = self.model.order();

        let (mut window, mut supplied) = match start {
            Some(ctx) if ctx.len() >= order => {
                let tail = ctx[ctx.len() - order..].to_vec();
                return Ok(Some((tail, Vec::new())));
            }
            Some(ctx) => (ctx, true),
            None => (vec![BEGIN.to_string()], false),
        };
        let mut emitted = Vec::new();

        while window.len() < order {
            let candidates = self.model.find_counts(&window)?;
            if candidates.is_empty() {
                if supplied {
                    warn!(context = ?window, "context unknown to the model, seeding from BEGIN");
                    window = vec![BEGIN.to_string()];
                    emitted.clear();
                    supplied = false;
                    continue;
                }
                return Ok(None);
            }

            let next = pick(&candidates, window.len(), rng)?;
            window.push(next.clone());
            emitted.push(next);
        }

        Ok(Some((window, emitted)))
    }
}

/// Weighted choice among `(key, count)` candidates, returning the token at
/// `position` of the chosen key.
fn pick<R: Rng + ?Sized>(
    candidates: &[(&str, u32)],
    position: usize,
    rng: &mut R,
) -> Result<String, MarkovError> {
    let weights: Vec<u32> = candidates.iter().map(|(_, count)| *count).collect();
    let (key, _) = candidates[choose(&weights, rng)?];
    split_key(key)
        .get(position)
        .map(|t| t.to_string())
        .ok_or_else(|| MarkovError::MalformedKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model_from_stream(order: usize, stream: &[&str]) -> MarkovModel {
        let mut model = MarkovModel::new(order).unwrap();
        for window in stream.windows(order + 1) {
            model.increment(window).unwrap();
        }
        model
    }

    #[test]
    fn single_path_is_reproduced() {
        let model = model_from_stream(2, &["BEGIN", "犬", "が", "吠える", "END"]);
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(1);

        let line = generator.generate_line(None, &mut rng).unwrap();
        assert_eq!(line, vec!["犬", "が", "吠える"]);
        assert_eq!(generator.generate(1, &mut rng).unwrap(), "犬 が 吠える");
    }

    #[test]
    fn long_context_is_used_directly() {
        let model = model_from_stream(1, &["BEGIN", "a", "b", "c", "END"]);
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(5);

        let context = vec!["x".to_string(), "b".to_string()];
        let line = generator.generate_line(Some(&context), &mut rng).unwrap();
        assert_eq!(line, vec!["c"]);
    }

    #[test]
    fn short_context_is_extended() {
        let model = model_from_stream(2, &["BEGIN", "a", "b", "c", "END"]);
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(5);

        let context = vec!["a".to_string()];
        let line = generator.generate_line(Some(&context), &mut rng).unwrap();
        assert_eq!(line, vec!["b", "c"]);
    }

    #[test]
    fn unknown_context_falls_back_to_begin() {
        let model = model_from_stream(2, &["BEGIN", "a", "b", "c", "END"]);
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(5);

        let context = vec!["zzz".to_string()];
        let line = generator.generate_line(Some(&context), &mut rng).unwrap();
        assert_eq!(line, vec!["a", "b", "c"]);
    }

    #[test]
    fn dead_end_restarts_from_begin() {
        // "q r" leads nowhere; the fresh start from BEGIN must still finish.
        let mut model = model_from_stream(2, &["BEGIN", "a", "b", "END"]);
        model.increment(&["q", "r", "s"]).unwrap();
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(9);

        let context = vec!["q".to_string(), "r".to_string()];
        let line = generator.generate_line(Some(&context), &mut rng).unwrap();
        assert_eq!(line, vec!["a", "b"]);
    }

    #[test]
    fn exhausted_attempts_fail() {
        // BEGIN leads into a context that never continues.
        let mut model = MarkovModel::new(2).unwrap();
        model.increment(&["BEGIN", "a", "b"]).unwrap();
        let config = GeneratorConfig {
            max_line_attempts: 3,
            ..GeneratorConfig::default()
        };
        let generator = Generator::with_config(&model, config);
        let mut rng = StdRng::seed_from_u64(2);

        assert!(matches!(
            generator.generate_line(None, &mut rng),
            Err(MarkovError::GenerationFailed(3))
        ));
    }

    #[test]
    fn forced_loop_is_a_dead_end() {
        // a -> a forever: never reaches END.
        let model = model_from_stream(1, &["BEGIN", "a", "a", "a"]);
        let config = GeneratorConfig {
            max_line_attempts: 2,
            ..GeneratorConfig::default()
        };
        let generator = Generator::with_config(&model, config);
        let mut rng = StdRng::seed_from_u64(2);

        assert!(matches!(
            generator.generate_line(None, &mut rng),
            Err(MarkovError::GenerationFailed(2))
        ));
    }

    #[test]
    fn line_cap_stops_open_loops() {
        // a -> {a, b}, b -> a: random but never reaches END.
        let model = model_from_stream(1, &["BEGIN", "a", "a", "b", "a"]);
        let config = GeneratorConfig {
            max_line_attempts: 2,
            max_line_tokens: Some(10),
            ..GeneratorConfig::default()
        };
        let generator = Generator::with_config(&model, config);
        let mut rng = StdRng::seed_from_u64(2);

        assert!(matches!(
            generator.generate_line(None, &mut rng),
            Err(MarkovError::GenerationFailed(2))
        ));
    }

    #[test]
    fn empty_model_has_no_data() {
        let model = MarkovModel::new(2).unwrap();
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generator.generate(1, &mut rng),
            Err(MarkovError::NoData)
        ));
    }

    #[test]
    fn seeding_can_finish_a_line() {
        let model = model_from_stream(3, &["BEGIN", "hey", "END", "you", "END"]);
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(4);

        assert_eq!(generator.generate_line(None, &mut rng).unwrap(), vec!["hey"]);
    }

    #[test]
    fn lines_follow_each_other() {
        let model = model_from_stream(
            2,
            &["BEGIN", "one", "two", "END", "three", "four", "END", "five", "END"],
        );
        let generator = Generator::new(&model);
        let mut rng = StdRng::seed_from_u64(11);

        let text = generator.generate(3, &mut rng).unwrap();
        assert_eq!(text, "one two\nthree four\nfive");
    }

    #[test]
    fn render_decodes_tokens() {
        let model = MarkovModel::new(2).unwrap();
        let generator = Generator::with_config(
            &model,
            GeneratorConfig {
                separator: String::new(),
                strip_pos_tags: true,
                ..GeneratorConfig::default()
            },
        );
        let tokens = [
            "BEGIN", "Love#al", "___", "me#al", "\\c", "\\END", "犬#n", "END",
        ];
        assert_eq!(generator.render_line(&tokens), "Love me:END犬");
    }

    #[test]
    fn untagged_words_keep_hash_suffixes() {
        let model = MarkovModel::new(2).unwrap();
        let generator = Generator::new(&model);
        assert_eq!(
            generator.render_line(&["BEGIN", "play", "F#c", "#i", "END"]),
            "play F#c #i"
        );
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let model = model_from_stream(
            1,
            &["BEGIN", "a", "b", "END", "a", "c", "END", "b", "c", "a", "END"],
        );
        let generator = Generator::new(&model);
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        assert_eq!(
            generator.generate(5, &mut rng1).unwrap(),
            generator.generate(5, &mut rng2).unwrap()
        );
    }
}
