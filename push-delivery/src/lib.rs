pub mod apns;
pub mod auth;

pub use apns::{ApnsClient, Push};
pub use auth::{issue, SignedAssertion};
