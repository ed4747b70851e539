//! Lyric Markov — learns word-transition statistics from song lyrics and
//! generates new lyrics by sampling them.
//!
//! Text flows through a [`tokenizer::Tokenizer`], into a
//! [`core::learner::Learner`] that counts order-n grams in a
//! [`core::markov::MarkovModel`], which a [`core::generator::Generator`]
//! later walks to produce new lines. Models and raw lyrics persist through
//! a [`store::Store`].

pub mod config;
pub mod core;
pub mod schema;
pub mod store;
pub mod tokenizer;
