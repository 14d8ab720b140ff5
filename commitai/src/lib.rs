//! Groups commit proposals into non-overlapping commits and applies them.
//!
//! A reasoning service (or a hand-written document) proposes commits as
//! `(files, messages)` pairs. Proposals that share a file are merged
//! transitively, so every path lands in exactly one commit. The crate keeps
//! a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (normalization, grouping,
//!   message assembly). No I/O.
//! - **[`io`]**: Side effects (git, config file, HTTP reasoning services,
//!   terminal confirmation), each behind a trait or a thin adapter.
//!
//! Orchestration modules ([`generate`], [`commit`], [`orchestrate`],
//! [`setup`]) coordinate core logic with I/O to implement CLI commands.

pub mod commit;
pub mod core;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
pub mod orchestrate;
pub mod setup;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
