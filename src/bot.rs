//! Discord bot core logic and event handling.

use std::sync::Arc;

use log::{debug, error, info, warn};
use poise::{
    Framework, FrameworkError, FrameworkOptions, builtins,
    serenity_prelude::{
        ClientBuilder, Context, FullEvent, GatewayIntents, Message as SerenityMessage,
        ReactionType, UserId,
    },
};

use crate::audit::{AuditEvent, AuditLog};
use crate::clock::{Clock, SystemClock};
use crate::commands::all_commands;
use crate::config::Config;
use crate::content::emoji_reaction;
use crate::error::{BotError, Result};
use crate::moderation::{
    BANNED_MESSAGE, BANNED_USER_MESSAGE, BannedTermSet, JsonFileStore, ModerationEngine, Verdict,
    warning_message,
};
use crate::openrouter::OpenRouterClient;
use crate::provider::ChatProvider;
use crate::session::{SessionLimits, SessionManager};

/// Shared state handed to every command and event.
pub struct Data {
    pub moderation: ModerationEngine,
    pub sessions: SessionManager,
    pub audit: AuditLog,
}

impl Data {
    /// Wire the engines from configuration.
    pub fn from_config(config: &Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let provider: Option<Arc<dyn ChatProvider>> = config.provider.as_ref().and_then(|p| {
            debug!("Initializing OpenRouter client");
            match OpenRouterClient::new(p.api_key.clone(), p.model.clone(), config.provider_timeout)
            {
                Ok(client) => Some(Arc::new(client) as Arc<dyn ChatProvider>),
                Err(e) => {
                    error!("Failed to initialize OpenRouter client: {e}");
                    None
                }
            }
        });

        let moderation = ModerationEngine::load(
            Box::new(JsonFileStore::new(&config.user_data_file)),
            BannedTermSet::default(),
            config.max_warnings,
            Arc::clone(&clock),
        );

        let sessions = SessionManager::new(
            provider,
            clock,
            config.system_prompt.clone(),
            SessionLimits {
                provider_timeout: config.provider_timeout,
                cap: config.session_cap,
                idle: config.session_idle,
            },
        );

        Self {
            moderation,
            sessions,
            audit: AuditLog::new(config.audit_channel_id),
        }
    }
}

/// Run the Discord bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;
    let data = Data::from_config(&config);

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::DIRECT_MESSAGES;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: all_commands(),
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready and connected to Discord");
                debug!("Registering commands globally");
                builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully");
                Ok(data)
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(config.discord_token, intents)
        .framework(framework)
        .await?;

    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    Ok(())
}

async fn on_error(error: FrameworkError<'_, Data, BotError>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            error!("Command '{}' failed: {error}", ctx.command().name);
            if let Err(e) = ctx.say(error.user_message()).await {
                error!("Failed to report command error: {e}");
            }
        }
        other => {
            if let Err(e) = builtins::on_error(other).await {
                error!("Error while handling framework error: {e}");
            }
        }
    }
}

/// Message text with the bot's own mention removed.
fn strip_mention(content: &str, bot_user_id: UserId) -> String {
    content
        .replace(&format!("<@{bot_user_id}>"), "")
        .replace(&format!("<@!{bot_user_id}>"), "")
        .trim()
        .to_string()
}

/// Display form of a message author for audit lines.
pub(crate) fn describe_user(user: &poise::serenity_prelude::User) -> String {
    format!("@{} (ID: {})", user.tag(), user.id)
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> Result<()> {
    let FullEvent::Message { new_message } = event else {
        return Ok(());
    };
    let bot_user_id = ctx.cache.current_user().id;
    if new_message.author.bot || new_message.author.id == bot_user_id {
        return Ok(());
    }
    let is_dm = new_message.guild_id.is_none();
    if !is_dm && !new_message.mentions_user_id(bot_user_id) {
        return Ok(());
    }

    let text = strip_mention(&new_message.content, bot_user_id);
    if text.is_empty() {
        debug!("Ignoring empty mention from {}", new_message.author.tag());
        return Ok(());
    }

    info!(
        "Received message from {} in channel {}: {}",
        new_message.author.tag(),
        new_message.channel_id,
        text
    );

    if let Err(e) = handle_message(ctx, new_message, data, &text).await {
        error!(
            "Error processing message from {}: {}",
            new_message.author.tag(),
            e
        );
        data.audit
            .emit(
                &ctx.http,
                AuditEvent::Error {
                    user: describe_user(&new_message.author),
                    error: e.to_string(),
                },
            )
            .await;
        new_message.reply(&ctx.http, e.user_message()).await?;
    }
    Ok(())
}

/// Ban check, then word check, then the AI exchange.
async fn handle_message(
    ctx: &Context,
    new_message: &SerenityMessage,
    data: &Data,
    text: &str,
) -> Result<()> {
    let user = new_message.author.id.get();
    let who = describe_user(&new_message.author);

    if data.moderation.is_banned(user).await {
        new_message.reply(&ctx.http, BANNED_USER_MESSAGE).await?;
        data.audit
            .emit(
                &ctx.http,
                AuditEvent::BannedUserAttempt {
                    user: who,
                    text: text.to_string(),
                },
            )
            .await;
        return Ok(());
    }

    match data.moderation.evaluate(user, text).await {
        Verdict::Clean => {}
        Verdict::Warned {
            count,
            max,
            violation,
        } => {
            new_message
                .reply(&ctx.http, warning_message(count, max))
                .await?;
            data.audit
                .emit(
                    &ctx.http,
                    AuditEvent::Warned {
                        user: who,
                        count,
                        max,
                        terms: violation.terms,
                    },
                )
                .await;
            return Ok(());
        }
        Verdict::Banned { violation, .. } => {
            new_message.reply(&ctx.http, BANNED_MESSAGE).await?;
            data.audit
                .emit(
                    &ctx.http,
                    AuditEvent::Banned {
                        user: who,
                        terms: violation.terms,
                    },
                )
                .await;
            return Ok(());
        }
    }

    if let Err(e) = new_message.channel_id.broadcast_typing(&ctx.http).await {
        debug!("Failed to broadcast typing indicator: {e}");
    }

    let reply = data.sessions.respond(user, text).await;
    new_message.reply(&ctx.http, &reply).await?;
    info!(
        "Replied to {} in channel {}",
        new_message.author.tag(),
        new_message.channel_id
    );

    data.audit
        .emit(
            &ctx.http,
            AuditEvent::Exchange {
                user: who,
                text: text.to_string(),
                reply,
            },
        )
        .await;

    if let Some(emoji) = emoji_reaction(text)
        && let Err(e) = new_message
            .react(&ctx.http, ReactionType::Unicode(emoji.to_string()))
            .await
    {
        warn!("Failed to add reaction: {e}");
    }

    Ok(())
}
