//! Side-effecting adapters: git, processes, config, reasoning services and
//! the terminal.

pub mod backend;
pub mod config;
pub mod confirm;
pub mod diff;
pub mod git;
pub mod process;
pub mod prompt;
pub mod reasoner;
