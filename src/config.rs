use std::{env, path::PathBuf, str::FromStr, time::Duration};

use log::{debug, error, info, warn};
use poise::serenity_prelude::ChannelId;

use crate::error::{BotError, Result};

const DEFAULT_USER_DATA_FILE: &str = "storage/user_data.json";
const DEFAULT_MAX_WARNINGS: u32 = 3;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_CAP: usize = 1000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

/// Persona preamble sent as the first turn of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Cholan AI, a friendly and knowledgeable agricultural assistant bot created to help farmers \
and agricultural enthusiasts. You specialize in:

🌱 Crop management and farming techniques
🐛 Pest and disease control
🌰 Soil health and fertilization
🌦️ Weather and seasonal farming advice
♻️ Sustainable farming practices
🤖 Agricultural technology and innovations

Guidelines for responses:
- Keep responses helpful, practical, and concise (under 200 words)
- Use appropriate farming emojis occasionally to keep conversations friendly
- Focus on providing actionable agricultural advice and support
- Be encouraging and supportive to farmers
- If you don't know something specific, admit it and suggest reliable sources
- Always prioritize safety in your recommendations";

/// Credentials for the AI provider. Absent when either variable is missing.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub provider: Option<ProviderConfig>,
    pub system_prompt: String,
    pub audit_channel_id: Option<ChannelId>,
    pub user_data_file: PathBuf,
    pub max_warnings: u32,
    pub provider_timeout: Duration,
    pub session_cap: usize,
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key))
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, env::VarError>,
    {
        let discord_token = lookup("DISCORD_TOKEN").map_err(|e| {
            error!("Failed to load DISCORD_TOKEN from environment: {e}");
            e
        })?;

        let provider = match (lookup("OPENROUTER_API_KEY"), lookup("OPENROUTER_MODEL")) {
            (Ok(api_key), Ok(model)) if !api_key.is_empty() && !model.is_empty() => {
                Some(ProviderConfig { api_key, model })
            }
            _ => {
                error!(
                    "OPENROUTER_API_KEY or OPENROUTER_MODEL missing; AI responses are disabled"
                );
                None
            }
        };

        let system_prompt = lookup("SYSTEM_PROMPT")
            .ok()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let audit_channel_id = optional::<u64>(&lookup, "AUDIT_CHANNEL_ID")?
            .filter(|id| *id != 0)
            .map(ChannelId::new);

        let user_data_file = lookup("USER_DATA_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_USER_DATA_FILE), PathBuf::from);

        let max_warnings =
            optional::<u32>(&lookup, "MAX_WARNINGS")?.unwrap_or(DEFAULT_MAX_WARNINGS);
        if max_warnings == 0 {
            return Err(BotError::Config(
                "MAX_WARNINGS must be at least 1".to_string(),
            ));
        }

        let provider_timeout = Duration::from_secs(
            optional(&lookup, "PROVIDER_TIMEOUT_SECS")?.unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
        );
        let session_cap = optional(&lookup, "SESSION_CAP")?.unwrap_or(DEFAULT_SESSION_CAP);
        let session_idle = Duration::from_secs(
            optional(&lookup, "SESSION_IDLE_SECS")?.unwrap_or(DEFAULT_SESSION_IDLE_SECS),
        );

        info!("Configuration loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        if let Some(provider) = &provider {
            debug!(
                "OpenRouter API key length: {} characters",
                provider.api_key.len()
            );
            debug!("OpenRouter model: {}", provider.model);
        }
        debug!("System prompt length: {} characters", system_prompt.len());
        debug!("User data file: {}", user_data_file.display());
        if audit_channel_id.is_none() {
            warn!("AUDIT_CHANNEL_ID not set; audit lines go to the log only");
        }

        Ok(Self {
            discord_token,
            provider,
            system_prompt,
            audit_channel_id,
            user_data_file,
            max_warnings,
            provider_timeout,
            session_cap,
            session_idle,
        })
    }
}

fn optional<T>(
    lookup: &impl Fn(&str) -> std::result::Result<String, env::VarError>,
    key: &str,
) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| BotError::Config(format!("{key} is invalid ({raw}): {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> std::result::Result<String, env::VarError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() -> Result<()> {
        let config = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "token")]))?;
        assert!(config.provider.is_none());
        assert_eq!(config.max_warnings, 3);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.user_data_file, PathBuf::from("storage/user_data.json"));
        assert_eq!(config.provider_timeout, Duration::from_secs(30));
        assert_eq!(config.session_cap, 1000);
        assert!(config.audit_channel_id.is_none());
        Ok(())
    }

    #[test]
    fn missing_discord_token_is_fatal() {
        let result = Config::from_lookup(lookup(&[("OPENROUTER_API_KEY", "key")]));
        assert!(matches!(result, Err(BotError::EnvVar(_))));
    }

    #[test]
    fn provider_requires_both_key_and_model() -> Result<()> {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("OPENROUTER_API_KEY", "key"),
        ]))?;
        assert!(config.provider.is_none());

        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("OPENROUTER_API_KEY", "key"),
            ("OPENROUTER_MODEL", "google/gemini-flash-1.5"),
        ]))?;
        let provider = config.provider.ok_or(BotError::ProviderUnavailable)?;
        assert_eq!(provider.model, "google/gemini-flash-1.5");
        Ok(())
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("MAX_WARNINGS", "three"),
        ]));
        assert!(matches!(result, Err(BotError::Config(_))));

        let result = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("MAX_WARNINGS", "0"),
        ]));
        assert!(matches!(result, Err(BotError::Config(_))));
    }

    #[test]
    fn audit_channel_is_parsed() -> Result<()> {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "token"),
            ("AUDIT_CHANNEL_ID", "123456789012345678"),
        ]))?;
        assert_eq!(
            config.audit_channel_id,
            Some(ChannelId::new(123_456_789_012_345_678))
        );
        Ok(())
    }
}
