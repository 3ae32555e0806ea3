//! # Topicforge Core
//!
//! Runtime-agnostic logic for Topicforge: topic and job models, the
//! similarity grouper, markdown rendering for the output categories, the
//! metadata/blob store abstractions, and the artifact materializer that
//! turns generated text into stored files.
//!
//! This crate contains no tokio, sqlx, HTTP clients, or filesystem I/O.
//! Concrete stores and the text-generation client live in the
//! `topicforge` app crate.

pub mod generation;
pub mod grouping;
pub mod history;
pub mod materialize;
pub mod models;
pub mod render;
pub mod store;
pub mod tracker;
