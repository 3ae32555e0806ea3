//! # Topicforge
//!
//! Turns topic detections from an uploaded document into generated,
//! categorized, downloadable content.
//!
//! An upstream document-analysis step reports the topics it found in a
//! document. Topicforge consolidates related topics into groups, asks a
//! text-generation service for a long-form analysis of each group, renders
//! every analysis into a comprehensive markdown report and a condensed
//! executive summary, stores the artifacts, and records the job's
//! completion.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌────────────┐   ┌─────────────┐
//! │  Topics    │──▶│ Consolidate │──▶│  Generate  │──▶│ Materialize │
//! │ (trigger)  │   │  (groups)   │   │  (OpenAI)  │   │ render+store│
//! └────────────┘   └─────────────┘   └────────────┘   └──────┬──────┘
//!                                                            │
//!                               ┌─────────────────┬──────────┤
//!                               ▼                 ▼          ▼
//!                          ┌─────────┐      ┌──────────┐ ┌────────┐
//!                          │ SQLite  │      │ FS / S3  │ │  Job   │
//!                          │metadata │      │  blobs   │ │complete│
//!                          └─────────┘      └──────────┘ └────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! forge init                                  # create database
//! forge job create report.pdf --size 48213    # prints the job id
//! forge group topics.json                     # preview consolidation
//! forge process topics.json --job <id>        # run the pipeline
//! forge serve                                 # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite metadata store |
//! | [`blob_fs`] | Filesystem blob store |
//! | [`blob_s3`] | S3-compatible blob store |
//! | [`openai`] | Text-generation backends |
//! | [`generate`] | Paced generation over groups |
//! | [`pipeline`] | End-to-end processing of a job |
//! | [`jobs`] | Job history commands |
//! | [`server`] | HTTP server |
//! | [`logging`] | Tracing initialization |
//!
//! Domain types, consolidation, rendering, and the store traits live in
//! the runtime-agnostic [`topicforge_core`] crate.

pub mod blob_fs;
pub mod blob_s3;
pub mod config;
pub mod db;
pub mod generate;
pub mod jobs;
pub mod logging;
pub mod migrate;
pub mod openai;
pub mod pipeline;
pub mod server;
pub mod sqlite_store;
