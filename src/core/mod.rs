pub mod codec;
pub mod generator;
pub mod learner;
pub mod markov;
pub mod sampling;
