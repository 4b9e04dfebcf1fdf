/// OpenAI-compatible API client acting as a comparison oracle.
use anyhow::{Context, Result, anyhow, bail};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tierrank_core::{Candidate, Category, Choice, ComparisonOracle};
use tracing::debug;

use crate::parse::{Pick, parse_verdict};
use crate::prompt::build_prompt;

/// Default question put to the model for every pair.
pub const DEFAULT_CRITERION: &str = "Which of these would I rather rewatch?";

/// Configuration for the LLM endpoint.
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub criterion: String,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Oracle that asks a chat model which of two titles ranks higher.
///
/// Each pair is asked once. A transport error or an answer without a verdict
/// fails the comparison, which abandons the insertion.
pub struct LlmOracle {
    client: Client,
    config: LlmConfig,
    category: Category,
    calls: usize,
}

impl LlmOracle {
    pub fn new(client: Client, config: LlmConfig, category: Category) -> Self {
        LlmOracle {
            client,
            config,
            category,
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Send one prompt and return the raw answer text.
    async fn complete(&self, prompt: String) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: 800,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint.trim_end_matches('/'));

        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            req_builder = req_builder.bearer_auth(key);
        }

        let resp = req_builder.send().await.context("HTTP request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("LLM API returned {status}: {}", truncate(&body, 200));
        }

        let data: ChatCompletionResponse = resp
            .json()
            .await
            .context("Failed to parse LLM response JSON")?;

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No choices in LLM response"))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Translate the model's pick back to the caller's argument order.
fn pick_to_choice(pick: Pick, swapped: bool) -> Choice {
    match (pick, swapped) {
        (Pick::A, false) | (Pick::B, true) => Choice::First,
        (Pick::B, false) | (Pick::A, true) => Choice::Second,
    }
}

impl ComparisonOracle for LlmOracle {
    type Error = anyhow::Error;

    async fn prefer(&mut self, first: &Candidate, second: &Candidate) -> Result<Choice> {
        self.calls += 1;

        // Randomize which title is shown as A to blunt positional bias.
        let swapped = rand::rng().random_bool(0.5);
        let (a, b) = if swapped { (second, first) } else { (first, second) };
        let prompt = build_prompt(&self.config.criterion, self.category.as_str(), &a.title, &b.title);

        let answer = self.complete(prompt).await?;
        let pick = parse_verdict(&answer).ok_or_else(|| {
            anyhow!(
                "No verdict in answer comparing \"{}\" and \"{}\": {}",
                first.title,
                second.title,
                truncate(answer.trim(), 200)
            )
        })?;
        let choice = pick_to_choice(pick, swapped);
        debug!(first = %first.title, second = %second.title, ?choice, "model answered");
        Ok(choice)
    }
}
