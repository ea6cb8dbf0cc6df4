use crate::config::SEND_TIMEOUT_SECS;
use crate::error::{AppError, AppResult};
use crate::message::Message;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Provider code signalling a delivered message
const PUSHPLUS_OK: i64 = 200;

/// Body format understood by PushPlus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Html,
    #[default]
    Markdown,
    Txt,
    Json,
}

impl FromStr for Template {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Template::Html),
            "markdown" => Ok(Template::Markdown),
            "txt" => Ok(Template::Txt),
            "json" => Ok(Template::Json),
            other => Err(AppError::config(format!(
                "unknown template '{}', expected html, markdown, txt or json",
                other
            ))),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Template::Html => "html",
            Template::Markdown => "markdown",
            Template::Txt => "txt",
            Template::Json => "json",
        };
        f.write_str(name)
    }
}

/// Result of handing one message to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Rejected(String),
}

/// Anything that can deliver a rendered message.
///
/// `Err` means the message never got a provider verdict; the dispatcher
/// records it as a failed delivery like any rejection.
pub trait Notifier {
    fn send(&self, message: &Message) -> AppResult<Outcome>;
}

/// Decoded provider reply. Missing fields are tolerated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub raw: Value,
}

impl ProviderResponse {
    pub fn from_json(raw: Value) -> Self {
        Self {
            code: raw.get("code").and_then(Value::as_i64),
            msg: raw.get("msg").and_then(Value::as_str).map(String::from),
            raw,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(PUSHPLUS_OK)
    }

    pub fn outcome(&self) -> Outcome {
        if self.is_success() {
            Outcome::Delivered
        } else {
            Outcome::Rejected(
                self.msg
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "未知错误".to_string()),
            )
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    token: &'a str,
    title: &'a str,
    content: &'a str,
    template: Template,
}

/// Sends messages through the PushPlus HTTP API.
pub struct PushPlusNotifier {
    token: String,
    endpoint: String,
    template: Template,
    agent: ureq::Agent,
}

impl PushPlusNotifier {
    pub fn new(token: String, endpoint: String, template: Template) -> Self {
        Self::with_timeout(token, endpoint, template, Duration::from_secs(SEND_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        token: String,
        endpoint: String,
        template: Template,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            token,
            endpoint,
            template,
            agent,
        }
    }

    /// POST the message and decode the reply without classifying it.
    pub fn send_raw(&self, message: &Message) -> AppResult<ProviderResponse> {
        let request = SendRequest {
            token: &self.token,
            title: &message.title,
            content: &message.body,
            template: self.template,
        };

        debug!("POST {} ({}): {}", self.endpoint, self.template, message.title);

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(&request);

        let response = match response {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                return Err(AppError::network(format!(
                    "HTTP {} {}",
                    code,
                    r.status_text()
                )))
            }
            Err(e) => return Err(AppError::network(e.to_string())),
        };

        let raw: Value = response
            .into_json()
            .map_err(|e| AppError::network(format!("invalid provider response: {}", e)))?;

        Ok(ProviderResponse::from_json(raw))
    }
}

impl Notifier for PushPlusNotifier {
    /// Provider-level refusals come back as [`Outcome::Rejected`]; transport
    /// failures are returned as [`AppError::Network`].
    fn send(&self, message: &Message) -> AppResult<Outcome> {
        Ok(self.send_raw(message)?.outcome())
    }
}
