//! arbor-core library.
//!
//! Ordered work-item trees scoped to a project: sibling ordering with
//! fractional order keys, drag-intent classification, and validated moves
//! written through an [`repo::ItemRepository`].
//!
//! # Conventions
//!
//! - **Errors**: typed errors ([`error::MoveError`], [`repo::RepositoryError`])
//!   at the library surface; `anyhow::Result` only for config loading.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod intent;
pub mod legacy;
pub mod model;
pub mod mover;
pub mod order;
pub mod repo;
pub mod tree;
pub mod validate;
