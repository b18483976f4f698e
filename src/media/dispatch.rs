//! Reply selection for a resolved bundle.

use super::{MediaBundle, MediaItem, ReplyChannel};
use anyhow::Result;
use tracing::debug;

/// Reply when the post has no attachments at all
pub const NO_MEDIA_TEXT: &str = "This post has no media!";
/// Reply when every attachment was filtered out
pub const NO_DOWNLOADABLE_MEDIA_TEXT: &str = "This post has no downloadable media!";

/// What to send back for a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<'a> {
    /// One grouped message with every item, in bundle order
    Group(Vec<MediaItem>),
    /// A single photo or video
    Single(&'a MediaItem),
    /// A fixed text instead of media
    Text(&'static str),
}

/// Decide how a bundle is answered.
#[must_use]
pub fn plan_reply(bundle: &MediaBundle) -> Reply<'_> {
    let mut items = bundle.items();
    match (items.next(), items.next()) {
        (None, _) if bundle.has_media() => Reply::Text(NO_DOWNLOADABLE_MEDIA_TEXT),
        (None, _) => Reply::Text(NO_MEDIA_TEXT),
        (Some(item), None) => Reply::Single(item),
        (Some(_), Some(_)) => Reply::Group(bundle.items().cloned().collect()),
    }
}

/// Send the reply for `bundle`.
///
/// # Errors
///
/// Returns the transport error of the failed send.
pub async fn dispatch(bundle: &MediaBundle, reply: &dyn ReplyChannel) -> Result<()> {
    match plan_reply(bundle) {
        Reply::Group(items) => {
            debug!(items = items.len(), "Sending media group");
            reply.send_media_group(&items).await
        }
        Reply::Single(MediaItem::Photo { url }) => reply.send_photo(url).await,
        Reply::Single(MediaItem::Video { url, .. }) => reply.send_video(url).await,
        Reply::Text(text) => reply.send_text(text).await,
    }
}
