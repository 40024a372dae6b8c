use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OpenRouter API error ({status}): {message}")]
    OpenRouterApi {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("OpenRouter response error: {0}")]
    OpenRouterResponse(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("AI provider is not configured")]
    ProviderUnavailable,

    #[error("AI provider timed out after {0} seconds")]
    ProviderTimeout(u64),

    #[error("AI provider returned an empty reply")]
    EmptyReply,
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

impl BotError {
    /// Returns true for failures of the AI provider call path.
    #[must_use]
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            BotError::OpenRouterApi { .. }
                | BotError::OpenRouterResponse(_)
                | BotError::Reqwest(_)
                | BotError::ProviderTimeout(_)
                | BotError::EmptyReply
        )
    }

    /// Returns a user-friendly error message suitable for displaying in Discord
    pub fn user_message(&self) -> String {
        match self {
            BotError::Serenity(_) => {
                "🌾 Sorry, I'm having trouble communicating with Discord right now. Please try again later.".to_string()
            }
            BotError::Config(_) | BotError::EnvVar(_) | BotError::ProviderUnavailable => {
                "🌾 Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::Persistence(_) | BotError::Io(_) | BotError::Json(_) => {
                "🌾 Sorry, I couldn't save that to my records. Please try again later.".to_string()
            }
            BotError::OpenRouterApi { status, .. } => {
                match *status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        "🤖 Sorry, I'm having authentication issues with my AI service. Please contact the bot administrator.".to_string()
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        "🤖 Sorry, I've hit my rate limit. Please try again in a few moments.".to_string()
                    }
                    status if status.is_server_error() => {
                        "🤖 Sorry, the AI service is experiencing issues right now. Please try again later.".to_string()
                    }
                    _ => {
                        "🤖 Sorry, I'm having trouble connecting to my AI service. Please try again later.".to_string()
                    }
                }
            }
            BotError::OpenRouterResponse(_) | BotError::EmptyReply => {
                "🤖 Sorry, I received an unexpected response from my AI service. Please try again.".to_string()
            }
            BotError::Reqwest(_) | BotError::ProviderTimeout(_) => {
                "🤖 Sorry, I'm having network issues. Please try again in a moment.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
