use crate::bot::resilient::TelegramReply;
use crate::media::{MediaPipeline, Outcome, ReplyChannel};
use anyhow::Result;
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{debug, info};

/// Static reply to `/start`
pub const WELCOME_TEXT: &str = "Welcome to the X (Twitter) media download bot!\n\
Send me an X.com post link and I will fetch its photos or videos.";

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "Start the bot.")]
    Start,
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    info!(user_id = get_user_id_safe(&msg), "User initiated /start command.");
    TelegramReply::new(bot, &msg).send_text(WELCOME_TEXT).await
}

/// Text message handler: runs the media pipeline for post links.
///
/// Everything the pipeline can fail with is answered inside it, so this
/// handler only reports what happened.
pub async fn handle_text(bot: Bot, msg: Message, pipeline: Arc<MediaPipeline>) -> Outcome {
    let Some(text) = msg.text() else {
        return Outcome::Ignored;
    };

    let reply = TelegramReply::new(bot, &msg);
    let outcome = pipeline.handle(text, &reply).await;

    debug!(
        user_id = get_user_id_safe(&msg),
        chat_id = %msg.chat.id,
        ?outcome,
        "Message handled"
    );
    outcome
}
