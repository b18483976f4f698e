//! Post URL recognition.

use lazy_regex::regex_captures;

/// Identifier of a post taken from a matched link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    /// Numeric post identifier
    pub post_id: String,
}

/// Match a post link at the start of `text`.
///
/// Only the leading part of the message is checked, anything after the
/// numeric identifier (query string, `/photo/1`, more text) is ignored.
///
/// # Examples
///
/// ```
/// use x_media_relay::media::match_post;
///
/// let post = match_post("https://x.com/rustlang/status/1234?s=20").unwrap();
/// assert_eq!(post.post_id, "1234");
/// assert!(match_post("look: https://x.com/rustlang/status/1234").is_none());
/// ```
#[must_use]
pub fn match_post(text: &str) -> Option<PostReference> {
    let (_, post_id) = regex_captures!(
        r"^https?://(?:www\.)?(?:twitter\.com|x\.com)/\w+/status/([0-9]+)",
        text
    )?;

    Some(PostReference {
        post_id: post_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(text: &str) -> Option<String> {
        match_post(text).map(|p| p.post_id)
    }

    #[test]
    fn test_supported_hosts() {
        assert_eq!(id("https://x.com/user/status/1"), Some("1".into()));
        assert_eq!(id("http://twitter.com/user/status/22"), Some("22".into()));
        assert_eq!(id("https://www.x.com/user_1/status/333"), Some("333".into()));
        assert_eq!(
            id("https://www.twitter.com/User/status/4444"),
            Some("4444".into())
        );
    }

    #[test]
    fn test_trailing_parts_do_not_leak_into_id() {
        assert_eq!(id("https://x.com/u/status/123?s=20"), Some("123".into()));
        assert_eq!(id("https://x.com/u/status/123#frag"), Some("123".into()));
        assert_eq!(id("https://x.com/u/status/123/photo/1"), Some("123".into()));
        assert_eq!(
            id("https://x.com/u/status/123 nice one\nsecond line"),
            Some("123".into())
        );
    }

    #[test]
    fn test_rejects_other_text() {
        assert_eq!(id(""), None);
        assert_eq!(id("hello"), None);
        assert_eq!(id("see https://x.com/u/status/1"), None);
        assert_eq!(id("https://x.com/u/status/abc"), None);
        assert_eq!(id("https://x.com/u/likes"), None);
        assert_eq!(id("https://mobile.twitter.com/u/status/1"), None);
        assert_eq!(id("ftp://x.com/u/status/1"), None);
        assert_eq!(id("https://evilx.com/u/status/1"), None);
    }

    #[test]
    fn test_only_ascii_digits_form_the_id() {
        assert_eq!(id("https://x.com/u/status/\u{661}\u{662}\u{663}"), None);
        assert_eq!(id("https://x.com/u/status/\u{ff11}\u{ff12}"), None);
        assert_eq!(id("https://x.com/u/status/12\u{663}"), Some("12".into()));
    }

    proptest! {
        #[test]
        fn never_panics(s in "\\PC*") {
            let _ = match_post(&s);
        }

        #[test]
        fn extracts_the_status_digits(
            handle in "[A-Za-z0-9_]{1,15}",
            post_id in "[0-9]{1,19}",
            suffix in "(\\?s=[0-9]{1,3}|/photo/[1-4]|/video/1)?"
        ) {
            let text = format!("https://x.com/{handle}/status/{post_id}{suffix}");
            prop_assert_eq!(id(&text), Some(post_id));
        }

        #[test]
        fn ignores_text_without_link_prefix(s in "[^h].*") {
            prop_assert!(match_post(&s).is_none());
        }
    }
}
