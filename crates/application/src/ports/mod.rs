pub mod asn_cache;
pub mod data_source;
pub mod event_bus;
pub mod graph;
pub mod resolver;

pub use asn_cache::{AsnCache, AsnInfo};
pub use data_source::{DataSource, FoundName};
pub use event_bus::{EventBus, Topic};
pub use graph::{AddressUpsert, Graph};
pub use resolver::{Answer, Priority, QueryOutcome, ResolverPool, WildcardType};
