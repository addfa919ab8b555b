mod hub;

pub use hub::{Hub, HubBuilder, TypedHubBuilder};
