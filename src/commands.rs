//! Poise slash commands.

use poise::serenity_prelude::User;

use crate::audit::AuditEvent;
use crate::bot::{Data, describe_user};
use crate::content::{random_joke, random_trivia, random_would_you_rather};
use crate::error::{BotError, Result};
use crate::moderation::{BANNED_USER_MESSAGE, ModerationStats};

/// Context type for bot commands.
type Context<'a> = poise::Context<'a, Data, BotError>;

const HELP_TEXT: &str = "🌾 **Cholan AI - your agricultural assistant**

Mention me or send me a DM to ask anything about farming, crops, soil or livestock.

**Commands**
/joke - a farming joke
/trivia - an agricultural trivia question
/wouldyourather - a farm-themed choice
/newchat - start a fresh conversation with the AI
/reset - reset your warnings
/help - this message

Please keep our agricultural community friendly and respectful! 🌱";

async fn audit(ctx: Context<'_>, event: AuditEvent) {
    ctx.data().audit.emit(ctx.http(), event).await;
}

async fn audit_command(ctx: Context<'_>, name: &'static str) {
    audit(
        ctx,
        AuditEvent::Command {
            name,
            user: describe_user(ctx.author()),
        },
    )
    .await;
}

/// Show what Cholan AI can do.
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<()> {
    ctx.say(HELP_TEXT).await?;
    audit_command(ctx, "help").await;
    Ok(())
}

/// Tell a farming joke.
#[poise::command(slash_command)]
pub async fn joke(ctx: Context<'_>) -> Result<()> {
    ctx.say(random_joke()).await?;
    audit_command(ctx, "joke").await;
    Ok(())
}

/// Ask an agricultural trivia question.
#[poise::command(slash_command)]
pub async fn trivia(ctx: Context<'_>) -> Result<()> {
    ctx.say(random_trivia().render()).await?;
    audit_command(ctx, "trivia").await;
    Ok(())
}

/// Ask a farm-themed "would you rather".
#[poise::command(slash_command, rename = "wouldyourather")]
pub async fn would_you_rather(ctx: Context<'_>) -> Result<()> {
    ctx.say(format!("🤔 {}", random_would_you_rather())).await?;
    audit_command(ctx, "wouldyourather").await;
    Ok(())
}

/// Reset your moderation warnings.
#[poise::command(slash_command)]
pub async fn reset(ctx: Context<'_>) -> Result<()> {
    let user = ctx.author().id.get();
    let moderation = &ctx.data().moderation;

    // A ban is only lifted by a moderator.
    if moderation.is_banned(user).await {
        ctx.say(BANNED_USER_MESSAGE).await?;
        return Ok(());
    }

    moderation.reset(user).await;
    ctx.say("🔄 Your warnings have been reset. Happy farming! 🌱")
        .await?;
    audit(
        ctx,
        AuditEvent::WarningsReset {
            user: describe_user(ctx.author()),
        },
    )
    .await;
    Ok(())
}

/// Start a fresh conversation with the AI.
#[poise::command(slash_command)]
pub async fn newchat(ctx: Context<'_>) -> Result<()> {
    ctx.data()
        .sessions
        .reset_session(ctx.author().id.get())
        .await;
    ctx.say("🧹 Your AI conversation has been reset. What would you like to talk about?")
        .await?;
    audit(
        ctx,
        AuditEvent::ContextReset {
            user: describe_user(ctx.author()),
        },
    )
    .await;
    Ok(())
}

/// Lift a user's ban.
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User to unban"] user: User,
) -> Result<()> {
    if !ctx.data().moderation.unban(user.id.get()).await {
        ctx.say(format!("{} is not banned.", user.tag())).await?;
        return Ok(());
    }

    ctx.say(format!("✅ {} has been unbanned.", user.tag()))
        .await?;
    audit(
        ctx,
        AuditEvent::Unbanned {
            user: describe_user(&user),
            by: describe_user(ctx.author()),
        },
    )
    .await;
    Ok(())
}

/// Show a user's warnings and ban status.
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn warnings(
    ctx: Context<'_>,
    #[description = "User to inspect"] user: User,
) -> Result<()> {
    let moderation = &ctx.data().moderation;
    let record = moderation.record(user.id.get()).await.unwrap_or_default();

    let status = match record.banned_at {
        Some(at) => format!("⛔ banned since {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => "✅ not banned".to_string(),
    };
    ctx.say(format!(
        "**{}**: {}/{} warnings, {status}",
        user.tag(),
        record.warning_count,
        moderation.max_warnings()
    ))
    .await?;
    audit_command(ctx, "warnings").await;
    Ok(())
}

fn render_stats(stats: &ModerationStats, max_warnings: u32, term_count: usize) -> String {
    format!(
        "📊 **Moderation Stats**
Users with warnings: {}
Banned users: {}
Average warnings: {:.2}
Users near ban: {}
Max warnings: {max_warnings}
Banned words: {term_count}",
        stats.users_with_warnings, stats.banned_users, stats.average_warnings, stats.users_near_ban
    )
}

/// Show moderation statistics.
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn modstats(ctx: Context<'_>) -> Result<()> {
    let moderation = &ctx.data().moderation;
    let stats = moderation.stats().await;
    let term_count = moderation.terms().await.len();

    ctx.say(render_stats(&stats, moderation.max_warnings(), term_count))
        .await?;
    audit_command(ctx, "modstats").await;
    Ok(())
}

/// Manage the banned word list.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    subcommands("banword_add", "banword_remove")
)]
pub async fn banword(_ctx: Context<'_>) -> Result<()> {
    Ok(())
}

/// Add a banned word.
#[poise::command(slash_command, rename = "add")]
pub async fn banword_add(
    ctx: Context<'_>,
    #[description = "Word to ban"] word: String,
) -> Result<()> {
    let term = word.trim().to_lowercase();
    if !ctx.data().moderation.add_term(&term).await {
        ctx.say(format!("'{term}' is already banned or empty."))
            .await?;
        return Ok(());
    }

    ctx.say(format!("🚫 Added '{term}' to the banned words."))
        .await?;
    audit(
        ctx,
        AuditEvent::TermAdded {
            term,
            by: describe_user(ctx.author()),
        },
    )
    .await;
    Ok(())
}

/// Remove a banned word.
#[poise::command(slash_command, rename = "remove")]
pub async fn banword_remove(
    ctx: Context<'_>,
    #[description = "Word to allow again"] word: String,
) -> Result<()> {
    let term = word.trim().to_lowercase();
    if !ctx.data().moderation.remove_term(&term).await {
        ctx.say(format!("'{term}' is not a banned word.")).await?;
        return Ok(());
    }

    ctx.say(format!("✅ Removed '{term}' from the banned words."))
        .await?;
    audit(
        ctx,
        AuditEvent::TermRemoved {
            term,
            by: describe_user(ctx.author()),
        },
    )
    .await;
    Ok(())
}

/// Check the AI provider and session table.
#[poise::command(slash_command, required_permissions = "BAN_MEMBERS")]
pub async fn health(ctx: Context<'_>) -> Result<()> {
    ctx.defer().await?;
    let sessions = &ctx.data().sessions;

    let provider = match sessions.provider_name() {
        Some(name) if sessions.health_check().await => format!("✅ {name} is responding"),
        Some(name) => format!("❌ {name} is not responding"),
        None => "❌ no AI provider configured".to_string(),
    };
    ctx.say(format!(
        "🩺 **Health**\nAI provider: {provider}\nActive conversations: {}",
        sessions.active_sessions().await
    ))
    .await?;
    audit_command(ctx, "health").await;
    Ok(())
}

/// All commands registered with the framework.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<Data, BotError>> {
    vec![
        help(),
        joke(),
        trivia(),
        would_you_rather(),
        reset(),
        newchat(),
        unban(),
        warnings(),
        modstats(),
        banword(),
        health(),
    ]
}
