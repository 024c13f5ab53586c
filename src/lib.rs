//! # Context Recall
//!
//! Passage retrieval and budgeted context assembly for language-model
//! prompts, over a small in-memory corpus.
//!
//! The engine itself lives in [`context_recall_core`]; this crate adds the
//! pieces around it: TOML configuration, logging, a filesystem corpus
//! loader, an async timeout wrapper, and the `recall` CLI commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │   Corpus    │──▶│ RetrievalEngine  │◀──│ContextService│◀── CLI (recall)
//! │ (walkdir)   │   │ chunk+embed+rank │   │ tokio timeout│
//! └─────────────┘   └──────────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! recall stats                          # index the corpus and summarize
//! recall search "release schedule"      # ranked passages
//! recall context "release schedule"     # prompt-ready context block
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | Filesystem corpus loader |
//! | [`logging`] | Tracing subscriber setup |
//! | [`service`] | Async, time-bounded engine front |
//! | [`search`] | `search` and `context` commands |
//! | [`stats`] | `stats` and `documents` commands |

pub mod config;
pub mod corpus;
pub mod logging;
pub mod search;
pub mod service;
pub mod stats;
