/// Command and message handlers
pub mod handlers;
/// Resilient replies with automatic retry for Telegram API operations
pub mod resilient;
/// Telegram runtime entrypoint
pub mod runner;
