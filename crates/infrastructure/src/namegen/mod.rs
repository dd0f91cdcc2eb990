pub mod alterations;
pub mod generator;
pub mod markov;

pub use generator::{AlterationConfig, NameGenerator};
pub use markov::MarkovModel;
