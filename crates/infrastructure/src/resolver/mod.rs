pub mod pool;
pub mod state;
pub mod transport;
pub mod wildcard;

pub use pool::Pool;
pub use state::ResolverState;
