//! Prompt rendering for the reasoning service.

use anyhow::Result;
use minijinja::{Environment, context};

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");
const USER_TEMPLATE: &str = include_str!("prompts/user.md");

/// Rendered system + user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)
            .expect("system template should be valid");
        env.add_template("user", USER_TEMPLATE)
            .expect("user template should be valid");
        Self { env }
    }

    /// Render prompts for `diff`.
    ///
    /// `json_only` adds an explicit "JSON only" instruction for providers
    /// without a structured response mode.
    pub fn render(&self, diff: &str, json_only: bool) -> Result<Prompt> {
        let system = self.env.get_template("system")?.render(context! {})?;
        let user = self.env.get_template("user")?.render(context! {
            diff => diff.trim_end(),
            json_only => json_only,
        })?;
        Ok(Prompt {
            system: system.trim().to_string(),
            user: user.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_diff_verbatim() {
        let diff = "diff --git a/x b/x\n+<tag> & \"quote\"\n";
        let prompt = PromptEngine::new().render(diff, false).expect("render");
        assert!(prompt.user.ends_with("+<tag> & \"quote\""));
        assert!(!prompt.user.contains("Return ONLY valid JSON"));
        assert!(prompt.system.contains("\"commits\""));
    }

    #[test]
    fn json_only_adds_instruction() {
        let prompt = PromptEngine::new().render("d", true).expect("render");
        assert!(
            prompt
                .user
                .starts_with("Please analyze this git diff and generate appropriate commit messages. Return ONLY valid JSON.")
        );
    }
}
