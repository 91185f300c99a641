//! Completion endpoint errors.
//!
//! Classifies what went wrong talking to an OpenAI-compatible chat
//! completions endpoint and decides, together with a [`RetryConfig`], whether
//! the agent loop may try the round trip again. Whatever is left after the
//! retries fails the session.

use crate::llm::RetryConfig;
use std::fmt;
use std::time::Duration;

/// Errors returned by a [`CompletionClient`](crate::llm::CompletionClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LLMError {
    /// What went wrong
    pub kind: LLMErrorKind,
}

/// Endpoint failure classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMErrorKind {
    /// The request never produced an HTTP response
    Transport {
        /// Underlying client error
        message: String,
    },
    /// No response within the provider timeout
    Timeout {
        /// The timeout that elapsed
        after: Duration,
    },
    /// HTTP 429
    RateLimited {
        /// Wait requested by the `retry-after` header, if any
        retry_after: Option<Duration>,
    },
    /// The API key was refused
    Unauthorized {
        /// Provider message or status
        detail: String,
    },
    /// The model is temporarily unable to serve requests
    Overloaded {
        /// Model that was asked for
        model: String,
    },
    /// The endpoint refused the request itself (bad model name, quota, ...)
    Rejected {
        /// HTTP status code
        status: u16,
        /// Provider message
        message: String,
        /// Provider error type, e.g. `insufficient_quota`
        error_type: Option<String>,
    },
    /// Any other 5xx response
    Server {
        /// HTTP status code
        status: u16,
        /// Provider message or reason phrase
        message: String,
    },
    /// A successful response whose body was not a usable completion
    MalformedResponse {
        /// What could not be understood
        detail: String,
    },
}

impl LLMError {
    /// Wraps a kind.
    #[must_use]
    pub fn new(kind: LLMErrorKind) -> Self {
        Self { kind }
    }

    /// The request failed before any response arrived.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(LLMErrorKind::Transport {
            message: message.into(),
        })
    }

    /// The provider timeout elapsed.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::new(LLMErrorKind::Timeout { after })
    }

    /// HTTP 429, with the `retry-after` wait when the endpoint sent one.
    #[must_use]
    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        Self::new(LLMErrorKind::RateLimited { retry_after })
    }

    /// The API key was refused.
    #[must_use]
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(LLMErrorKind::Unauthorized {
            detail: detail.into(),
        })
    }

    /// The model is overloaded.
    #[must_use]
    pub fn overloaded(model: impl Into<String>) -> Self {
        Self::new(LLMErrorKind::Overloaded {
            model: model.into(),
        })
    }

    /// The response body could not be turned into a completion.
    #[must_use]
    pub fn malformed_response(detail: impl Into<String>) -> Self {
        Self::new(LLMErrorKind::MalformedResponse {
            detail: detail.into(),
        })
    }

    /// Classifies a non-success response other than 429.
    ///
    /// `error_type` is the `error.type` (or `error.code`) field of an
    /// OpenAI-style error body when one could be parsed.
    #[must_use]
    pub fn from_status(
        status: u16,
        error_type: Option<&str>,
        message: impl Into<String>,
        model: &str,
    ) -> Self {
        let message = message.into();
        match (status, error_type.unwrap_or_default()) {
            (401 | 403, _) | (_, "authentication_error" | "invalid_api_key") => {
                Self::unauthorized(message)
            }
            (503, _) | (_, "server_overloaded" | "overloaded_error") => Self::overloaded(model),
            (500..=599, _) => Self::new(LLMErrorKind::Server { status, message }),
            _ => Self::new(LLMErrorKind::Rejected {
                status,
                message,
                error_type: error_type.map(str::to_string),
            }),
        }
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            LLMErrorKind::Transport { .. }
                | LLMErrorKind::Timeout { .. }
                | LLMErrorKind::RateLimited { .. }
                | LLMErrorKind::Overloaded { .. }
                | LLMErrorKind::Server { .. }
        )
    }

    /// Wait before retry number `attempt` (1-based), or `None` when this error
    /// ends the session.
    ///
    /// A `retry-after` from the endpoint replaces the exponential backoff;
    /// both are capped at the policy's maximum.
    #[must_use]
    pub fn retry_delay(&self, attempt: u32, policy: &RetryConfig) -> Option<Duration> {
        if !self.is_retriable() || attempt == 0 || attempt > policy.max_retries {
            return None;
        }
        let delay = match self.kind {
            LLMErrorKind::RateLimited {
                retry_after: Some(wait),
            } => wait,
            _ => policy.backoff_for_attempt(attempt),
        };
        Some(delay.min(policy.max_backoff))
    }
}

impl fmt::Display for LLMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LLMErrorKind::Transport { message } => write!(
                f,
                "could not reach the completion endpoint: {message}; check network access and provider.base_url"
            ),
            LLMErrorKind::Timeout { after } => write!(
                f,
                "completion endpoint did not answer within {}s; raise provider.timeout_secs for slow models",
                after.as_secs()
            ),
            LLMErrorKind::RateLimited {
                retry_after: Some(wait),
            } => write!(f, "rate limited by the completion endpoint; retry after {}s", wait.as_secs()),
            LLMErrorKind::RateLimited { retry_after: None } => {
                write!(f, "rate limited by the completion endpoint")
            }
            LLMErrorKind::Unauthorized { detail } => write!(
                f,
                "API key rejected ({detail}); check the variable named by provider.api_key_env"
            ),
            LLMErrorKind::Overloaded { model } => {
                write!(f, "model '{model}' is overloaded; try again shortly")
            }
            LLMErrorKind::Rejected {
                status,
                message,
                error_type: Some(error_type),
            } => write!(f, "request rejected (HTTP {status}, {error_type}): {message}"),
            LLMErrorKind::Rejected {
                status,
                message,
                error_type: None,
            } => write!(f, "request rejected (HTTP {status}): {message}"),
            LLMErrorKind::Server { status, message } => {
                write!(f, "completion endpoint failed (HTTP {status}): {message}")
            }
            LLMErrorKind::MalformedResponse { detail } => {
                write!(f, "unusable completion response: {detail}")
            }
        }
    }
}

impl std::error::Error for LLMError {}
