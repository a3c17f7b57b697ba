// handlers/public/mod.rs - endpoints reachable without a token
pub mod health;

pub use health::{health, root};
