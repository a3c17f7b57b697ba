// handlers/mod.rs - handlers grouped by security tier
//
// Public (no auth) → Protected (JWT auth, role checks per handler)
pub mod protected;
pub mod public;
