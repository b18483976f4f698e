use crate::bot::handlers::{self, Command};
use crate::config::Settings;
use crate::media::{MediaPipeline, RetryPolicy};
use crate::twitter::{TweetLookup, TwitterClient};
use std::convert::Infallible;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<Settings>) {
    let pipeline = init_pipeline(&settings);

    let bot = Bot::new(settings.telegram_bot_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        // No per-chat ordering: a rate-limit backoff must not hold up other
        // messages, including later ones from the same chat.
        .distribution_function(|_| None::<Infallible>)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_pipeline(settings: &Settings) -> Arc<MediaPipeline> {
    let lookup: Arc<dyn TweetLookup> = Arc::new(TwitterClient::new(settings));
    let policy = RetryPolicy::from_settings(settings);

    info!(
        "X API client initialized (base: {}, timeout: {}s, rate limit attempts: {}, base delay: {}s)",
        settings.twitter_api_base_url,
        settings.lookup_timeout_secs,
        policy.max_attempts,
        policy.base_delay.as_secs()
    );

    Arc::new(MediaPipeline::new(lookup, policy))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text_message))
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text_message(
    bot: Bot,
    msg: Message,
    pipeline: Arc<MediaPipeline>,
) -> Result<(), teloxide::RequestError> {
    handlers::handle_text(bot, msg, pipeline).await;
    respond(())
}
