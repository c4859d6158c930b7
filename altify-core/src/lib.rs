//! `altify-core` — domain types, adapter contracts, shared config/error/
//! observability helpers used by every other Altify crate.
//!
//! This crate has no concrete adapter dependencies (no `diesel`, no
//! `lapin`, no `axum`): it defines the shapes those crates implement, plus
//! in-memory fakes of all of them for tests (see [`fakes`]).

pub mod config;
pub mod domain;
pub mod error;
pub mod fakes;
pub mod observability;
pub mod ports;
