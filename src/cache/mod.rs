// Cache module for local filesystem state.
// Holds the offline copy of user preferences and the log directory location.

pub mod paths;
pub mod store;

pub use paths::{log_dir, preferences_path};
pub use store::{delete, read_cached, write_cached};
