pub mod classify;
pub mod resolve;
pub mod tokens;

pub use classify::{classify, Intent};
pub use resolve::resolve;
pub use tokens::tokens_for;
