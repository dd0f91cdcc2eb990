pub mod diff;

pub use diff::{DiffEntry, TrackingUseCase};
