//! commitai: turn a working-tree diff into a set of non-overlapping commits.
//!
//! `generate` asks a reasoning service for commit proposals and prints the
//! merged groups as JSON; `commit` applies such a document to git; `run`
//! does both in one pass.

use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use commitai::commit::{commit_document, print_report};
use commitai::core::types::BatchResult;
use commitai::exit_codes;
use commitai::generate::{generate_groups, render_groups};
use commitai::io::config::{
    CommitaiConfig, ConfigOverrides, Provider, config_path, load_config,
};
use commitai::io::confirm::{Confirmer, PromptConfirmer};
use commitai::io::diff::{DiffReport, DiffScope, collect_diff, read_diff};
use commitai::io::git::Git;
use commitai::io::reasoner::{HttpModelCatalog, reasoner_for};
use commitai::logging;
use commitai::orchestrate::execute_batch;
use commitai::setup::run_setup;

#[derive(Parser)]
#[command(
    name = "commitai",
    version,
    about = "Group diff changes into non-overlapping commits"
)]
struct Cli {
    /// Config file (defaults to $COMMITAI_CONFIG, then the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Propose commit groups for the current diff and print them as JSON.
    #[command(visible_aliases = ["gen", "g"])]
    Generate {
        #[command(flatten)]
        service: ServiceArgs,
        /// Read the diff from stdin instead of running git.
        #[arg(long)]
        stdin: bool,
    },
    /// Apply a proposal document to the repository.
    #[command(visible_alias = "c")]
    Commit {
        /// Git executable.
        #[arg(long)]
        git: Option<String>,
        /// Proposal JSON file; stdin when omitted.
        #[arg(short, long, value_name = "PATH")]
        input: Option<PathBuf>,
        /// Ask before each commit (requires --input).
        #[arg(long)]
        confirm: bool,
    },
    /// Generate and commit in one pass, confirming each group.
    Run {
        #[command(flatten)]
        service: ServiceArgs,
        /// Read the diff from stdin instead of running git (requires --yes).
        #[arg(long)]
        stdin: bool,
        /// Commit every group without asking.
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the effective configuration with API keys masked.
    Config,
    /// Interactively choose provider, API key and model.
    Setup,
}

/// Overrides for the reasoning service and git.
#[derive(Args, Debug, Default)]
struct ServiceArgs {
    /// Git executable.
    #[arg(long)]
    git: Option<String>,
    /// Reasoning service provider (openai, anthropic).
    #[arg(long)]
    provider: Option<Provider>,
    /// Model name; provider default when unset.
    #[arg(long)]
    model: Option<String>,
    /// API key for the selected provider.
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    openai_api_key: Option<String>,
    #[arg(long)]
    anthropic_api_key: Option<String>,
}

impl ServiceArgs {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            git: self.git,
            provider: self.provider,
            model: self.model,
            api_key: self.api_key,
            openai_api_key: self.openai_api_key,
            anthropic_api_key: self.anthropic_api_key,
        }
    }
}

fn main() {
    logging::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version land here too; clap decides the stream.
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = cli.config.as_deref();
    match cli.command {
        Command::Generate { service, stdin } => cmd_generate(config, service, stdin),
        Command::Commit {
            git,
            input,
            confirm,
        } => cmd_commit(config, git, input.as_deref(), confirm),
        Command::Run {
            service,
            stdin,
            yes,
        } => cmd_run(config, service, stdin, yes),
        Command::Config => cmd_config(config),
        Command::Setup => cmd_setup(config),
    }
}

fn cmd_generate(config: Option<&Path>, service: ServiceArgs, stdin: bool) -> Result<i32> {
    let cfg = effective_config(config, service.into_overrides())?;
    let diff = obtain_diff(&cfg, stdin)?;
    let reasoner = reasoner_for(&cfg)?;
    let groups = generate_groups(&diff, reasoner.as_ref())?;
    println!("{}", render_groups(&groups)?);
    Ok(exit_codes::OK)
}

fn cmd_commit(
    config: Option<&Path>,
    git: Option<String>,
    input: Option<&Path>,
    confirm: bool,
) -> Result<i32> {
    if confirm && input.is_none() {
        bail!("--confirm requires --input so answers can be read from stdin");
    }
    let overrides = ConfigOverrides {
        git,
        ..ConfigOverrides::default()
    };
    let cfg = effective_config(config, overrides)?;
    let raw = match input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("read proposals from stdin")?;
            raw
        }
    };
    let git = repo_git(&cfg)?;
    let terminal = confirm.then(PromptConfirmer::terminal);
    let confirmer = terminal.as_ref().map(|c| c as &dyn Confirmer);
    let result = commit_document(&raw, confirmer, &git)?;
    Ok(report(&result))
}

fn cmd_run(config: Option<&Path>, service: ServiceArgs, stdin: bool, yes: bool) -> Result<i32> {
    if stdin && !yes {
        bail!("--stdin requires --yes because confirmation answers are read from stdin");
    }
    let cfg = effective_config(config, service.into_overrides())?;
    let diff = obtain_diff(&cfg, stdin)?;
    let reasoner = reasoner_for(&cfg)?;
    let groups = generate_groups(&diff, reasoner.as_ref())?;
    let git = repo_git(&cfg)?;
    let terminal = (!yes).then(PromptConfirmer::terminal);
    let confirmer = terminal.as_ref().map(|c| c as &dyn Confirmer);
    let result = execute_batch(groups, confirmer, &git);
    Ok(report(&result))
}

fn cmd_config(config: Option<&Path>) -> Result<i32> {
    let path = config_path(config)?;
    let cfg = load_config(&path)?;
    let rendered = toml::to_string_pretty(&cfg.redacted()).context("serialize config toml")?;
    println!("# {}", path.display());
    print!("{rendered}");
    Ok(exit_codes::OK)
}

fn cmd_setup(config: Option<&Path>) -> Result<i32> {
    let path = config_path(config)?;
    let catalog = HttpModelCatalog::new(CommitaiConfig::default().request_timeout())?;
    let stdin = std::io::stdin();
    run_setup(&path, &catalog, &mut stdin.lock(), &mut std::io::stdout())?;
    Ok(exit_codes::OK)
}

fn effective_config(config: Option<&Path>, overrides: ConfigOverrides) -> Result<CommitaiConfig> {
    let path = config_path(config)?;
    let mut cfg = load_config(&path)?;
    cfg.apply(overrides);
    cfg.validate()?;
    debug!(path = %path.display(), provider = %cfg.provider, "effective config");
    Ok(cfg)
}

fn repo_git(cfg: &CommitaiConfig) -> Result<Git> {
    let cwd = env::current_dir().context("resolve current directory")?;
    Ok(Git::with_program(cfg.git.clone(), cwd))
}

fn obtain_diff(cfg: &CommitaiConfig, stdin: bool) -> Result<DiffReport> {
    if stdin {
        return read_diff(std::io::stdin().lock());
    }
    let report = collect_diff(&repo_git(cfg)?, cfg.diff_limits())?;
    if report.scope == DiffScope::Unstaged {
        eprintln!("No staged changes found. Using unstaged changes instead.");
    }
    Ok(report)
}

fn report(result: &BatchResult) -> i32 {
    print_report(result);
    if result.has_failures() {
        exit_codes::COMMIT_FAILED
    } else {
        exit_codes::OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_generate_aliases() {
        for name in ["generate", "gen", "g"] {
            let cli = Cli::parse_from(["commitai", name, "--stdin"]);
            assert!(matches!(cli.command, Command::Generate { stdin: true, .. }));
        }
    }

    #[test]
    fn parse_generate_overrides() {
        let cli = Cli::parse_from([
            "commitai",
            "generate",
            "--provider",
            "anthropic",
            "--model",
            "claude-x",
            "--api-key",
            "k",
        ]);
        let Command::Generate { service, stdin } = cli.command else {
            panic!("expected generate");
        };
        assert!(!stdin);
        let overrides = service.into_overrides();
        assert_eq!(overrides.provider, Some(Provider::Anthropic));
        assert_eq!(overrides.model.as_deref(), Some("claude-x"));
        assert_eq!(overrides.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn unknown_provider_is_a_parse_error() {
        assert!(Cli::try_parse_from(["commitai", "generate", "--provider", "llama"]).is_err());
    }

    #[test]
    fn parse_commit_with_alias_and_global_config() {
        let cli = Cli::parse_from([
            "commitai",
            "c",
            "--input",
            "plan.json",
            "--confirm",
            "--config",
            "/tmp/c.toml",
        ]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/c.toml")));
        let Command::Commit {
            git,
            input,
            confirm,
        } = cli.command
        else {
            panic!("expected commit");
        };
        assert!(git.is_none());
        assert_eq!(input.as_deref(), Some(Path::new("plan.json")));
        assert!(confirm);
    }

    #[test]
    fn parse_run_yes() {
        let cli = Cli::parse_from(["commitai", "run", "-y"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                yes: true,
                stdin: false,
                ..
            }
        ));
    }

    #[test]
    fn confirm_without_input_is_rejected() {
        let err = cmd_commit(None, None, None, true).unwrap_err();
        assert!(err.to_string().contains("--confirm requires --input"));
    }

    #[test]
    fn run_stdin_without_yes_is_rejected() {
        let err = cmd_run(None, ServiceArgs::default(), true, false).unwrap_err();
        assert!(err.to_string().contains("--stdin requires --yes"));
    }
}
