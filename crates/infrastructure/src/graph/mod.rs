pub mod arena;
pub mod store;

pub use arena::{Arena, NodeKind, NodeRecord};
pub use store::{EdgeLabel, GraphStore};
