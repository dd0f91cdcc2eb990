pub mod candidate;
pub mod dispatch;
pub mod gate;
pub mod inflight;
pub mod persist;
pub mod pipeline;
pub mod wildcard;

pub use candidate::Candidate;
pub use inflight::Inflight;
pub use pipeline::{seed_brute_force, Scheduler};
