pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod flag;
pub mod schema;
pub mod types;

pub use config::Config;
pub use context::PushContext;
pub use db::DbPool;
pub use error::PushError;
pub use flag::iso_to_flag;
pub use types::{Alert, ChangeEvent, DispatchReport, NotificationIntent, Operation};
