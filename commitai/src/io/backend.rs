//! Version-control backend abstraction.
//!
//! The [`Backend`] trait decouples the orchestrator from the actual `git`
//! subprocess. Tests use scripted backends that record calls and return
//! predetermined results without touching a repository.

use anyhow::Result;

use crate::core::message::quote_arg;
use crate::io::git::Git;

/// Synchronous stage/commit operations with textual output or an error.
pub trait Backend {
    /// Stage a single path, whatever its change kind.
    fn stage(&self, path: &str) -> Result<String>;

    /// Commit the given (already staged) paths with `message`.
    fn commit(&self, message: &str, files: &[String]) -> Result<String>;

    /// Human-readable command line for the commit, shown at confirmation.
    fn planned_command(&self, message: &str, files: &[String]) -> String;
}

impl Backend for Git {
    fn stage(&self, path: &str) -> Result<String> {
        self.stage_path(path)
    }

    fn commit(&self, message: &str, files: &[String]) -> Result<String> {
        self.commit_paths(message, files)
    }

    fn planned_command(&self, message: &str, files: &[String]) -> String {
        let mut parts = vec![
            self.program().to_string(),
            "commit".to_string(),
            "-m".to_string(),
            quote_arg(message),
            "--".to_string(),
        ];
        parts.extend(files.iter().map(|file| quote_arg(file)));
        parts.join(" ")
    }
}
