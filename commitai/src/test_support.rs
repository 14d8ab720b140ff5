//! Test-only fakes for the backend, confirmer and reasoner seams, plus a
//! throwaway git repository.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use tempfile::TempDir;

use crate::io::backend::Backend;
use crate::io::confirm::{ConfirmRequest, Confirmer};
use crate::io::reasoner::Reasoner;

/// One call observed by [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Stage(String),
    Commit { message: String, files: Vec<String> },
}

impl BackendCall {
    pub fn touches(&self, path: &str) -> bool {
        match self {
            BackendCall::Stage(staged) => staged == path,
            BackendCall::Commit { files, .. } => files.iter().any(|file| file == path),
        }
    }
}

/// Records calls and fails only where told to.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    stage_failures: HashMap<String, String>,
    /// Keyed by the first line of the commit message.
    commit_failures: HashMap<String, String>,
    calls: RefCell<Vec<BackendCall>>,
}

impl ScriptedBackend {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn fail_stage(mut self, path: &str, err: &str) -> Self {
        self.stage_failures
            .insert(path.to_string(), err.to_string());
        self
    }

    pub fn fail_commit(mut self, subject: &str, err: &str) -> Self {
        self.commit_failures
            .insert(subject.to_string(), err.to_string());
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }
}

impl Backend for ScriptedBackend {
    fn stage(&self, path: &str) -> Result<String> {
        self.calls
            .borrow_mut()
            .push(BackendCall::Stage(path.to_string()));
        match self.stage_failures.get(path) {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(String::new()),
        }
    }

    fn commit(&self, message: &str, files: &[String]) -> Result<String> {
        self.calls.borrow_mut().push(BackendCall::Commit {
            message: message.to_string(),
            files: files.to_vec(),
        });
        let subject = message.lines().next().unwrap_or_default();
        match self.commit_failures.get(subject) {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(format!("committed {}", files.join(" "))),
        }
    }

    fn planned_command(&self, _message: &str, files: &[String]) -> String {
        format!("scripted commit {}", files.join(" "))
    }
}

/// Owned copy of a [`ConfirmRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub message: String,
    pub files: Vec<String>,
    pub planned_command: String,
    pub position: usize,
    pub total: usize,
}

/// Answers from a queue; declines once the queue is empty.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: RefCell<VecDeque<bool>>,
    seen: RefCell<Vec<SeenRequest>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.borrow().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, request: &ConfirmRequest<'_>) -> bool {
        self.seen.borrow_mut().push(SeenRequest {
            message: request.message.to_string(),
            files: request.files.to_vec(),
            planned_command: request.planned_command.to_string(),
            position: request.position,
            total: request.total,
        });
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }
}

/// Returns the same raw document for every diff.
#[derive(Debug)]
pub struct ScriptedReasoner {
    response: Value,
    diffs: RefCell<Vec<String>>,
}

impl ScriptedReasoner {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            diffs: RefCell::new(Vec::new()),
        }
    }

    pub fn diffs(&self) -> Vec<String> {
        self.diffs.borrow().clone()
    }
}

impl Reasoner for ScriptedReasoner {
    fn propose(&self, diff: &str) -> Result<Value> {
        self.diffs.borrow_mut().push(diff.to_string());
        Ok(self.response.clone())
    }
}

/// Temporary git repository with an initial commit.
pub struct TestRepo {
    _temp: TempDir,
    root: PathBuf,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let root = temp.path().to_path_buf();
        let repo = Self { _temp: temp, root };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.email", "commitai@example.com"])?;
        repo.git(&["config", "user.name", "commitai"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        repo.write("README.md", "seed\n")?;
        repo.git(&["add", "README.md"])?;
        repo.git(&["commit", "--quiet", "-m", "initial"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn remove(&self, rel: &str) -> Result<()> {
        let path = self.root.join(rel);
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
    }

    /// Run git in the repository and return trimmed stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .with_context(|| format!("git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Subjects of all commits, newest first.
    pub fn subjects(&self) -> Result<Vec<String>> {
        let log = self.git(&["log", "--format=%s"])?;
        Ok(log.lines().map(str::to_string).collect())
    }

    /// Paths changed by the commit at `rev`.
    pub fn files_in(&self, rev: &str) -> Result<Vec<String>> {
        let out = self.git(&["show", "--name-only", "--format=", rev])?;
        Ok(out
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
