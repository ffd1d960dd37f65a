//! HTTP host for quote intake: the axum router, the provider adapters and
//! startup wiring.

pub mod adapters;
pub mod bootstrap;
pub mod debug_env;
pub mod health;
pub mod intake;
