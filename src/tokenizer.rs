/// Tokenizers — turn one lyric line into word tokens.
///
/// The learner only needs the [`Tokenizer`] trait. Two implementations are
/// provided: whitespace splitting for space-delimited text and a MeCab
/// process wrapper for Japanese.

use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

use crate::schema::token::{tag_token, PosTag, SPACE};

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("analyzer failed: {0}")]
    Analyzer(String),
    #[error("analyzer output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Splits a single line into raw (unescaped) tokens.
pub trait Tokenizer {
    fn tokenize(&self, line: &str) -> Result<Vec<String>, TokenizeError>;

    /// Make sure the tokenizer is usable before a long learning run.
    fn check(&self) -> Result<(), TokenizeError> {
        Ok(())
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn tokenize(&self, line: &str) -> Result<Vec<String>, TokenizeError> {
        (**self).tokenize(line)
    }

    fn check(&self) -> Result<(), TokenizeError> {
        (**self).check()
    }
}

/// Splits on Unicode whitespace. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, line: &str) -> Result<Vec<String>, TokenizeError> {
        Ok(line.split_whitespace().map(str::to_string).collect())
    }
}

/// Runs the MeCab morphological analyzer once per line.
///
/// Half-width spaces are invisible to MeCab, so each one is replaced by the
/// [`SPACE`] token before analysis (full-width spaces are folded first).
#[derive(Debug, Clone)]
pub struct MecabTokenizer {
    command: String,
    tag_pos: bool,
}

impl Default for MecabTokenizer {
    fn default() -> Self {
        Self::new("mecab")
    }
}

impl MecabTokenizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            tag_pos: false,
        }
    }

    /// Attach a part-of-speech suffix (`word#tag`) to every token.
    pub fn with_pos_tags(mut self, tag_pos: bool) -> Self {
        self.tag_pos = tag_pos;
        self
    }

    fn run(&self, input: &str) -> Result<String, TokenizeError> {
        let mut cmd = Command::new(&self.command);
        if !self.tag_pos {
            cmd.args(["-O", "wakati"]);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
            stdin.write_all(b"\n")?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(TokenizeError::Analyzer(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

impl Tokenizer for MecabTokenizer {
    fn tokenize(&self, line: &str) -> Result<Vec<String>, TokenizeError> {
        let prepared = prepare_for_mecab(line);
        let stdout = self.run(&prepared)?;
        let tokens = if self.tag_pos {
            parse_tagged(&stdout)
        } else {
            parse_wakati(&stdout)
        };
        debug!(line, tokens = tokens.len(), "mecab tokenized line");
        Ok(tokens)
    }

    /// Runs the analyzer on empty input.
    fn check(&self) -> Result<(), TokenizeError> {
        self.run("").map(|_| ())
    }
}

fn prepare_for_mecab(line: &str) -> String {
    let folded: String = line
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '\u{3000}' { ' ' } else { c })
        .collect();
    folded.replace(' ', &format!(" {} ", SPACE))
}

/// `-O wakati` output: surface forms separated by single spaces.
fn parse_wakati(stdout: &str) -> Vec<String> {
    stdout
        .trim_end()
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Default output: `surface\tpos,detail,...` per line, terminated by `EOS`.
fn parse_tagged(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .take_while(|l| *l != "EOS")
        .filter_map(|l| {
            let (surface, features) = l.split_once('\t')?;
            if surface.is_empty() {
                return None;
            }
            if surface == SPACE {
                return Some(surface.to_string());
            }
            let pos = features.split(',').next().unwrap_or_default();
            Some(tag_token(surface, classify(surface, pos)))
        })
        .collect()
}

/// Latin letters and ASCII punctuation override the analyzer's category.
fn classify(surface: &str, pos: &str) -> PosTag {
    if surface.chars().any(|c| c.is_ascii_alphabetic()) {
        PosTag::Alphabet
    } else if surface.chars().any(|c| "!\"#$%&'()*+,-./:;<=>?\\".contains(c)) {
        PosTag::Symbol
    } else {
        PosTag::from_ipadic(pos)
    }
}
