/// Runtime configuration, loaded from a RON file.
///
/// ```ron
/// (
///     store_dir: "data",
///     order: 2,
///     line_count: 10,
///     tokenizer: Mecab(command: "mecab", pos_tags: false),
///     generator: (separator: "", max_line_attempts: 64, max_line_tokens: Some(512)),
/// )
/// ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::generator::GeneratorConfig;
use crate::tokenizer::{MecabTokenizer, Tokenizer, WhitespaceTokenizer};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which tokenizer to feed the learner with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenizerKind {
    Whitespace,
    Mecab {
        command: String,
        #[serde(default)]
        pos_tags: bool,
    },
}

impl Default for TokenizerKind {
    fn default() -> Self {
        TokenizerKind::Whitespace
    }
}

impl TokenizerKind {
    /// Whether learned tokens carry `#tag` part-of-speech suffixes.
    pub fn tags_pos(&self) -> bool {
        matches!(self, TokenizerKind::Mecab { pos_tags: true, .. })
    }

    pub fn build(&self) -> Box<dyn Tokenizer + Send + Sync> {
        match self {
            TokenizerKind::Whitespace => Box::new(WhitespaceTokenizer),
            TokenizerKind::Mecab { command, pos_tags } => {
                Box::new(MecabTokenizer::new(command.clone()).with_pos_tags(*pos_tags))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the RON store.
    pub store_dir: PathBuf,
    /// Markov order used when learning a new model.
    pub order: usize,
    /// Lines per generated lyric.
    pub line_count: usize,
    pub tokenizer: TokenizerKind,
    pub generator: GeneratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("data"),
            order: 2,
            line_count: 10,
            tokenizer: TokenizerKind::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Self::load_from_ron(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Generator settings, stripping tags whenever the tokenizer adds them.
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut generator = self.generator.clone();
        generator.strip_pos_tags |= self.tokenizer.tags_pos();
        generator
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order == 0 {
            return Err(ConfigError::Invalid("order must be at least 1".to_string()));
        }
        if self.line_count == 0 {
            return Err(ConfigError::Invalid("line_count must be at least 1".to_string()));
        }
        if self.generator.max_line_attempts == 0 {
            return Err(ConfigError::Invalid(
                "generator.max_line_attempts must be at least 1".to_string(),
            ));
        }
        if self.generator.max_line_tokens == Some(0) {
            return Err(ConfigError::Invalid(
                "generator.max_line_tokens must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
