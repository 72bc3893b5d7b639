// Story backend module.
// Client, endpoint bindings, and types for the JSON diary service.

pub mod client;
pub mod endpoints;
pub mod service;
pub mod types;

pub use client::ApiClient;
pub use service::StoryApi;
pub use types::*;
