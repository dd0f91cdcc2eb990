pub mod enum_cmd;
pub mod track_cmd;

pub use enum_cmd::EnumArgs;
pub use track_cmd::TrackArgs;
