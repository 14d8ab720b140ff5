//! Interactive first-run configuration (`commitai setup`).

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::io::config::{CommitaiConfig, Provider, load_config, write_config};
use crate::io::reasoner::ModelCatalog;

/// What `setup` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    Written(CommitaiConfig),
    /// Existing file kept because overwrite was declined.
    Kept,
}

/// Ask for provider, key and model, then write `path`.
///
/// Settings other than the ones asked for are carried over from an existing
/// file when it still loads; an unreadable file is replaced by defaults.
/// `catalog` supplies the model menu, with the built-in list as fallback.
pub fn run_setup<R: BufRead, W: Write>(
    path: &Path,
    catalog: &dyn ModelCatalog,
    input: &mut R,
    out: &mut W,
) -> Result<SetupOutcome> {
    writeln!(out, "commitai setup")?;
    let mut cfg = CommitaiConfig::default();
    if path.exists() {
        let answer = ask(
            input,
            out,
            &format!("Config already exists at {}. Overwrite? (y/n): ", path.display()),
        )?;
        if !matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes") {
            writeln!(out, "Setup cancelled; existing config kept.")?;
            return Ok(SetupOutcome::Kept);
        }
        match load_config(path) {
            Ok(existing) => cfg = existing,
            Err(err) => {
                warn!(path = %path.display(), err = %format!("{err:#}"), "existing config unreadable, previous settings discarded");
                writeln!(out, "Existing config could not be read; starting from defaults.")?;
            }
        }
    }

    let provider = choose_provider(input, out)?;
    let api_key = ask(input, out, &format!("Enter your {provider} API key: "))?;
    if api_key.is_empty() {
        writeln!(
            out,
            "Warning: No API key provided. You will need to set it later or use environment variables."
        )?;
    }
    cfg.provider = provider;
    cfg.api_key = api_key;

    let models = offered_models(provider, cfg.resolve_api_key(), catalog, out)?;
    cfg.model = choose_model(&models, input, out)?;
    write_config(path, &cfg)?;
    info!(path = %path.display(), provider = %provider, "config written");
    writeln!(out, "Configuration saved to {}", path.display())?;
    Ok(SetupOutcome::Written(cfg))
}

/// Catalog models when a key is available and the listing works, otherwise
/// the provider's built-in list.
fn offered_models<W: Write>(
    provider: Provider,
    api_key: Option<String>,
    catalog: &dyn ModelCatalog,
    out: &mut W,
) -> Result<Vec<String>> {
    let fallback = || -> Vec<String> {
        provider
            .known_models()
            .iter()
            .map(|model| (*model).to_string())
            .collect()
    };
    let Some(api_key) = api_key else {
        return Ok(fallback());
    };
    writeln!(out, "Fetching available models...")?;
    match catalog.models(provider, &api_key) {
        Ok(models) if !models.is_empty() => Ok(models),
        Ok(_) => Ok(fallback()),
        Err(err) => {
            warn!(err = %format!("{err:#}"), "model listing failed");
            writeln!(out, "Unable to fetch models from {provider} API. Using default list.")?;
            Ok(fallback())
        }
    }
}

fn choose_provider<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Provider> {
    writeln!(out, "Select a provider:")?;
    for (index, provider) in Provider::ALL.iter().enumerate() {
        writeln!(out, "  {}. {provider}", index + 1)?;
    }
    loop {
        let answer = ask(input, out, "Provider number: ")?;
        if let Some(provider) = pick(&answer, &Provider::ALL) {
            return Ok(*provider);
        }
        if let Ok(provider) = answer.parse::<Provider>() {
            return Ok(provider);
        }
        writeln!(out, "Invalid choice: {answer}")?;
    }
}

fn choose_model<R: BufRead, W: Write>(models: &[String], input: &mut R, out: &mut W) -> Result<String> {
    writeln!(out, "Select a model:")?;
    for (index, model) in models.iter().enumerate() {
        writeln!(out, "  {}. {model}", index + 1)?;
    }
    let custom = models.len() + 1;
    writeln!(out, "  {custom}. Custom (enter manually)")?;
    loop {
        let answer = ask(input, out, "Model number: ")?;
        if let Some(model) = pick(&answer, models) {
            return Ok(model.clone());
        }
        if answer.parse::<usize>().ok() == Some(custom) {
            let name = ask(input, out, "Model name: ")?;
            if !name.is_empty() {
                return Ok(name);
            }
            writeln!(out, "Model name cannot be empty.")?;
            continue;
        }
        writeln!(out, "Invalid choice: {answer}")?;
    }
}

/// 1-based menu selection.
fn pick<'a, T>(answer: &str, items: &'a [T]) -> Option<&'a T> {
    let index = answer.parse::<usize>().ok()?;
    index.checked_sub(1).and_then(|i| items.get(i))
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("read answer")?;
    if read == 0 {
        bail!("setup aborted: input closed");
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::fs;
    use std::io::Cursor;

    fn unreachable_catalog(_: Provider, _: &str) -> Result<Vec<String>> {
        Err(anyhow!("offline"))
    }

    fn setup_with(
        path: &Path,
        catalog: &dyn ModelCatalog,
        answers: &str,
    ) -> (Result<SetupOutcome>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut out = Vec::new();
        let result = run_setup(path, catalog, &mut input, &mut out);
        (result, String::from_utf8(out).expect("utf8"))
    }

    fn setup(path: &Path, answers: &str) -> (Result<SetupOutcome>, String) {
        setup_with(path, &unreachable_catalog, answers)
    }

    #[test]
    fn writes_selected_provider_key_and_model() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("commitai/config.toml");
        let (result, transcript) = setup(&path, "2\nsk-ant-123\n1\n");
        let outcome = result.expect("setup");
        assert!(transcript.contains("  1. openai"));
        assert!(transcript.contains("Custom (enter manually)"));
        assert!(transcript.contains("Using default list."));

        let written = load_config(&path).expect("load");
        assert_eq!(outcome, SetupOutcome::Written(written.clone()));
        assert_eq!(written.provider, Provider::Anthropic);
        assert_eq!(written.api_key, "sk-ant-123");
        assert_eq!(written.model, Provider::Anthropic.known_models()[0]);
    }

    #[test]
    fn listed_models_replace_builtin_menu() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let keys = RefCell::new(Vec::new());
        let catalog = |provider: Provider, key: &str| -> Result<Vec<String>> {
            keys.borrow_mut().push((provider, key.to_string()));
            Ok(vec!["gpt-4.1".to_string(), "gpt-4o".to_string()])
        };
        let (result, transcript) = setup_with(&path, &catalog, "1\nsk-1\n2\n");
        result.expect("setup");
        assert!(transcript.contains("  1. gpt-4.1\n  2. gpt-4o\n  3. Custom (enter manually)"));
        assert_eq!(*keys.borrow(), vec![(Provider::OpenAi, "sk-1".to_string())]);
        assert_eq!(load_config(&path).expect("load").model, "gpt-4o");
    }

    #[test]
    fn empty_listing_falls_back_to_builtin_menu() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let empty = |_: Provider, _: &str| -> Result<Vec<String>> { Ok(Vec::new()) };
        let (result, _) = setup_with(&path, &empty, "1\nsk-1\n1\n");
        result.expect("setup");
        assert_eq!(
            load_config(&path).expect("load").model,
            Provider::OpenAi.known_models()[0]
        );
    }

    #[test]
    fn reprompts_on_bad_choices_and_accepts_custom_model() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let custom = Provider::OpenAi.known_models().len() + 1;
        let answers = format!("9\nopenai\nsk-1\n0\n{custom}\nmy-model\n");
        let (result, transcript) = setup(&path, &answers);
        result.expect("setup");
        assert!(transcript.contains("Invalid choice: 9"));
        assert!(transcript.contains("Invalid choice: 0"));
        let written = load_config(&path).expect("load");
        assert_eq!(written.provider, Provider::OpenAi);
        assert_eq!(written.model, "my-model");
    }

    #[test]
    fn blank_api_key_is_accepted_with_warning() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let (result, transcript) = setup(&path, "1\n\n1\n");
        result.expect("setup");
        assert!(transcript.contains("Warning: No API key provided."));
        let written = load_config(&path).expect("load");
        assert_eq!(written.api_key, "");
        assert_eq!(written.model, Provider::OpenAi.known_models()[0]);
    }

    #[test]
    fn declining_overwrite_keeps_existing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "model = \"keep-me\"\n").expect("seed");
        let (result, _) = setup(&path, "n\n");
        assert_eq!(result.expect("setup"), SetupOutcome::Kept);
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "model = \"keep-me\"\n"
        );
    }

    #[test]
    fn overwrite_preserves_unrelated_settings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "git = \"/opt/git\"\n").expect("seed");
        let (result, _) = setup(&path, "y\n1\nsk-2\n2\n");
        result.expect("setup");
        let written = load_config(&path).expect("load");
        assert_eq!(written.git, "/opt/git");
        assert_eq!(written.model, Provider::OpenAi.known_models()[1]);
    }

    #[test]
    fn overwrite_replaces_unreadable_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "provider = \"mistral\"\nrequest_timeout_secs = 0\n").expect("seed");
        let (result, transcript) = setup(&path, "y\n1\nsk-1\n1\n");
        result.expect("setup");
        assert!(transcript.contains("starting from defaults"));
        let written = load_config(&path).expect("load");
        assert_eq!(written.provider, Provider::OpenAi);
        assert_eq!(
            written.request_timeout_secs,
            CommitaiConfig::default().request_timeout_secs
        );
    }

    #[test]
    fn closed_input_aborts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let (result, _) = setup(&path, "1\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("input closed"));
        assert!(!path.exists());
    }
}
