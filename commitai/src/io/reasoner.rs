//! Reasoning-service clients that turn diff text into raw proposals.
//!
//! The [`Reasoner`] trait decouples `generate` from the HTTP providers. The
//! returned value is the unvalidated proposal document; shape checking is
//! left to the normalizer. Failed requests are not retried.

use std::cmp::Ordering;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::io::config::{CommitaiConfig, Provider};
use crate::io::prompt::{Prompt, PromptEngine};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODELS_URL: &str = "https://api.openai.com/v1/models";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const TEMPERATURE: f64 = 0.3;
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object regex should compile"));
static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array regex should compile"));

/// Produces raw proposal data for a diff.
pub trait Reasoner {
    fn propose(&self, diff: &str) -> Result<Value>;
}

/// Build the reasoner selected by `config.provider`.
pub fn reasoner_for(config: &CommitaiConfig) -> Result<Box<dyn Reasoner>> {
    let api_key = config.resolve_api_key().ok_or_else(|| {
        anyhow!(
            "no API key for provider {}; run `commitai setup` or pass --api-key",
            config.provider
        )
    })?;
    let model = config.effective_model().to_string();
    let timeout = config.request_timeout();
    Ok(match config.provider {
        Provider::OpenAi => Box::new(OpenAiReasoner::new(api_key, model, timeout)?),
        Provider::Anthropic => Box::new(AnthropicReasoner::new(api_key, model, timeout)?),
    })
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("build http client")
}

/// Chat completions client using JSON response mode.
pub struct OpenAiReasoner {
    client: Client,
    api_key: String,
    model: String,
    prompts: PromptEngine,
}

impl OpenAiReasoner {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            prompts: PromptEngine::new(),
        })
    }

    fn request_body(&self, prompt: &Prompt) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
            "response_format": {"type": "json_object"},
            "temperature": TEMPERATURE,
        })
    }
}

impl Reasoner for OpenAiReasoner {
    #[instrument(skip_all, fields(model = %self.model, diff_bytes = diff.len()))]
    fn propose(&self, diff: &str) -> Result<Value> {
        let prompt = self.prompts.render(diff, false)?;
        info!("requesting proposals from openai");
        let response = self
            .client
            .post(OPENAI_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&prompt))
            .send()
            .context("OpenAI API error: send request")?;
        let body = read_json(response, "OpenAI")?;
        parse_openai_response(&body)
    }
}

/// Messages API client; the JSON is extracted from free text.
pub struct AnthropicReasoner {
    client: Client,
    api_key: String,
    model: String,
    prompts: PromptEngine,
}

impl AnthropicReasoner {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            prompts: PromptEngine::new(),
        })
    }

    fn request_body(&self, prompt: &Prompt) -> Value {
        json!({
            "model": self.model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "temperature": TEMPERATURE,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user},
            ],
        })
    }
}

impl Reasoner for AnthropicReasoner {
    #[instrument(skip_all, fields(model = %self.model, diff_bytes = diff.len()))]
    fn propose(&self, diff: &str) -> Result<Value> {
        let prompt = self.prompts.render(diff, true)?;
        info!("requesting proposals from anthropic");
        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(&prompt))
            .send()
            .context("Anthropic API error: send request")?;
        let body = read_json(response, "Anthropic")?;
        parse_anthropic_response(&body)
    }
}

/// Lists the models a provider offers, for `setup`.
pub trait ModelCatalog {
    fn models(&self, provider: Provider, api_key: &str) -> Result<Vec<String>>;
}

impl<F> ModelCatalog for F
where
    F: Fn(Provider, &str) -> Result<Vec<String>>,
{
    fn models(&self, provider: Provider, api_key: &str) -> Result<Vec<String>> {
        self(provider, api_key)
    }
}

/// Asks OpenAI's models endpoint. Anthropic has no listing endpoint, so its
/// built-in list is returned as is.
pub struct HttpModelCatalog {
    client: Client,
}

impl HttpModelCatalog {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }
}

impl ModelCatalog for HttpModelCatalog {
    #[instrument(skip_all, fields(provider = %provider))]
    fn models(&self, provider: Provider, api_key: &str) -> Result<Vec<String>> {
        match provider {
            Provider::OpenAi => {
                let response = self
                    .client
                    .get(OPENAI_MODELS_URL)
                    .bearer_auth(api_key)
                    .send()
                    .context("OpenAI API error: list models")?;
                let body = read_json(response, "OpenAI")?;
                Ok(openai_chat_models(&body))
            }
            Provider::Anthropic => Ok(provider
                .known_models()
                .iter()
                .map(|model| (*model).to_string())
                .collect()),
        }
    }
}

/// GPT model ids from a models listing: `gpt-4*` first, then the rest,
/// each in descending name order.
pub fn openai_chat_models(body: &Value) -> Vec<String> {
    let mut ids: Vec<String> = body
        .get("data")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|model| model.get("id").and_then(Value::as_str))
        .filter(|id| id.contains("gpt"))
        .map(str::to_string)
        .collect();
    ids.sort_by(|a, b| match (a.contains("gpt-4"), b.contains("gpt-4")) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.cmp(a),
    });
    ids
}

fn read_json(response: reqwest::blocking::Response, provider: &str) -> Result<Value> {
    let status = response.status();
    let text = response
        .text()
        .with_context(|| format!("{provider} API error: read response body"))?;
    if !status.is_success() {
        return Err(anyhow!("{provider} API error: {status}: {}", text.trim()));
    }
    debug!(%status, bytes = text.len(), "provider response received");
    serde_json::from_str(&text).with_context(|| format!("{provider} API error: parse response"))
}

/// Pull the proposal document out of a chat completion.
pub fn parse_openai_response(body: &Value) -> Result<Value> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("OpenAI API error: response has no message content"))?;
    serde_json::from_str(content).context("OpenAI API error: content is not valid JSON")
}

/// Pull the proposal document out of a messages response.
pub fn parse_anthropic_response(body: &Value) -> Result<Value> {
    let text = body
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Anthropic API error: response has no text content"))?;
    extract_json(text).ok_or_else(|| anyhow!("Anthropic API error: could not extract JSON from response"))
}

/// Find the outermost JSON object (or, failing that, array) in free text.
pub fn extract_json(text: &str) -> Option<Value> {
    [&*JSON_OBJECT, &*JSON_ARRAY]
        .into_iter()
        .filter_map(|re| re.find(text))
        .find_map(|found| serde_json::from_str(found.as_str()).ok())
}
