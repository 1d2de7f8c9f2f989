//! Duck Castle (workspace facade crate).
//!
//! Re-exports the rule core, the simulation engine, and the shared types under one name,
//! so `duck_castle::{core, engine, types}` stays stable while the implementation lives in
//! dedicated crates under `crates/`. The `cli` module backs the `duck-castle` binary.

pub mod cli;

pub use duck_castle_core as core;
pub use duck_castle_engine as engine;
pub use duck_castle_types as types;
