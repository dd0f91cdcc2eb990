pub mod cache;

pub use cache::AsnCacheImpl;
