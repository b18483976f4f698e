//! Post lookup and media extraction.

use super::{MediaBundle, MediaItem};
use crate::twitter::{LookupError, Media, MediaType, TweetLookup, TweetResponse, Variant};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Only this encoding is sent back to Telegram
const MP4_CONTENT_TYPE: &str = "video/mp4";

/// Resolves post identifiers into media bundles.
#[derive(Clone)]
pub struct MediaResolver {
    lookup: Arc<dyn TweetLookup>,
}

impl MediaResolver {
    /// Create a resolver over a shared lookup client
    #[must_use]
    pub fn new(lookup: Arc<dyn TweetLookup>) -> Self {
        Self { lookup }
    }

    /// Look up a post and extract its media.
    ///
    /// # Errors
    ///
    /// Returns the lookup error, `NotFound` or `Rejected` when the API answers
    /// with a problem instead of the post, or `Malformed` for unusable payloads.
    #[instrument(skip(self))]
    pub async fn resolve(&self, post_id: &str) -> Result<MediaBundle, LookupError> {
        let response = self.lookup.lookup_tweet(post_id).await?;
        let bundle = extract_bundle(&response)?;
        debug!(
            items = bundle.len(),
            has_media = bundle.has_media(),
            "Resolved post media"
        );
        Ok(bundle)
    }
}

/// Build a bundle from a lookup response.
///
/// # Errors
///
/// Returns `NotFound`, `Rejected` or `Malformed` when the response holds no post.
pub fn extract_bundle(response: &TweetResponse) -> Result<MediaBundle, LookupError> {
    if response.data.is_none() {
        let detail = response
            .errors
            .first()
            .and_then(|p| p.detail.clone().or_else(|| p.title.clone()))
            .unwrap_or_else(|| "response has no data".to_string());
        return Err(if response.is_not_found() {
            LookupError::NotFound(detail)
        } else if !response.errors.is_empty() {
            LookupError::Rejected(detail)
        } else {
            LookupError::Malformed(detail)
        });
    }

    let Some(media) = response.includes.as_ref().and_then(|i| i.media.as_ref()) else {
        return Ok(MediaBundle::without_media());
    };

    let mut bundle = MediaBundle::with_media();
    for item in media {
        if let Some(extracted) = extract_item(item)? {
            bundle.push(extracted);
        }
    }
    Ok(bundle)
}

fn extract_item(media: &Media) -> Result<Option<MediaItem>, LookupError> {
    match media.kind {
        MediaType::Photo => {
            let url = media.url.clone().ok_or_else(|| {
                LookupError::Malformed(format!("photo {} has no url", media.media_key))
            })?;
            Ok(Some(MediaItem::Photo { url }))
        }
        MediaType::Video | MediaType::AnimatedGif => {
            let Some(best) = best_mp4_variant(&media.variants) else {
                debug!(media_key = %media.media_key, "No MP4 variant, dropping video");
                return Ok(None);
            };
            Ok(Some(MediaItem::Video {
                url: best.url.clone(),
                bitrate: best.bit_rate,
            }))
        }
        MediaType::Unknown => {
            debug!(media_key = %media.media_key, "Skipping unsupported media type");
            Ok(None)
        }
    }
}

/// Highest-bitrate MP4 encoding; missing bitrates count as 0 and ties keep
/// the earliest variant.
#[must_use]
pub fn best_mp4_variant(variants: &[Variant]) -> Option<&Variant> {
    variants
        .iter()
        .filter(|v| v.content_type == MP4_CONTENT_TYPE)
        .fold(None, |best: Option<&Variant>, candidate| match best {
            Some(current) if current.bit_rate.unwrap_or(0) >= candidate.bit_rate.unwrap_or(0) => {
                Some(current)
            }
            _ => Some(candidate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::{ApiProblem, Includes, MockTweetLookup, Tweet};
    use mockall::predicate::eq;

    fn variant(content_type: &str, bit_rate: Option<u64>, url: &str) -> Variant {
        Variant {
            bit_rate,
            content_type: content_type.to_string(),
            url: url.to_string(),
        }
    }

    fn photo(key: &str, url: &str) -> Media {
        Media {
            media_key: key.to_string(),
            kind: MediaType::Photo,
            url: Some(url.to_string()),
            preview_image_url: None,
            variants: Vec::new(),
        }
    }

    fn video(key: &str, variants: Vec<Variant>) -> Media {
        Media {
            media_key: key.to_string(),
            kind: MediaType::Video,
            url: None,
            preview_image_url: Some(format!("https://pbs.twimg.com/{key}.jpg")),
            variants,
        }
    }

    fn response(media: Option<Vec<Media>>) -> TweetResponse {
        TweetResponse {
            data: Some(Tweet {
                id: "42".to_string(),
                text: "post".to_string(),
                attachments: None,
            }),
            includes: Some(Includes { media }),
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_best_variant_ignores_non_mp4() {
        let variants = vec![
            variant("video/mp4", Some(500), "low.mp4"),
            variant("video/mp4", Some(1200), "high.mp4"),
            variant("video/webm", Some(2000), "huge.webm"),
        ];
        assert_eq!(
            best_mp4_variant(&variants).map(|v| v.url.as_str()),
            Some("high.mp4")
        );
    }

    #[test]
    fn test_best_variant_missing_bitrate_and_ties() {
        let variants = vec![
            variant("application/x-mpegURL", None, "pl.m3u8"),
            variant("video/mp4", None, "unknown.mp4"),
            variant("video/mp4", Some(0), "zero.mp4"),
        ];
        assert_eq!(
            best_mp4_variant(&variants).map(|v| v.url.as_str()),
            Some("unknown.mp4")
        );

        let only_hls = vec![variant("application/x-mpegURL", None, "pl.m3u8")];
        assert!(best_mp4_variant(&only_hls).is_none());
    }

    #[test]
    fn test_photos_come_before_videos() -> Result<(), LookupError> {
        let bundle = extract_bundle(&response(Some(vec![
            video("v", vec![variant("video/mp4", Some(1), "v.mp4")]),
            photo("p", "p.jpg"),
        ])))?;

        let items: Vec<&MediaItem> = bundle.items().collect();
        assert_eq!(
            items,
            [
                &MediaItem::Photo {
                    url: "p.jpg".to_string()
                },
                &MediaItem::Video {
                    url: "v.mp4".to_string(),
                    bitrate: Some(1)
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_no_media_expansion_is_flagged() -> Result<(), LookupError> {
        let mut no_includes = response(None);
        no_includes.includes = None;
        let bundle = extract_bundle(&no_includes)?;
        assert!(bundle.is_empty());
        assert!(!bundle.has_media());

        let includes_without_media = extract_bundle(&response(None))?;
        assert!(!includes_without_media.has_media());
        Ok(())
    }

    #[test]
    fn test_filtered_out_media_keeps_flag() -> Result<(), LookupError> {
        let bundle = extract_bundle(&response(Some(vec![video(
            "v",
            vec![variant("application/x-mpegURL", None, "pl.m3u8")],
        )])))?;
        assert!(bundle.is_empty());
        assert!(bundle.has_media());
        Ok(())
    }

    #[test]
    fn test_animated_gif_is_sent_as_video() -> Result<(), LookupError> {
        let mut gif = video("g", vec![variant("video/mp4", Some(0), "g.mp4")]);
        gif.kind = MediaType::AnimatedGif;
        let bundle = extract_bundle(&response(Some(vec![gif])))?;
        assert_eq!(
            bundle.items().next(),
            Some(&MediaItem::Video {
                url: "g.mp4".to_string(),
                bitrate: Some(0)
            })
        );
        Ok(())
    }

    #[test]
    fn test_photo_without_url_is_malformed() {
        let mut broken = photo("p", "p.jpg");
        broken.url = None;
        assert!(matches!(
            extract_bundle(&response(Some(vec![broken]))),
            Err(LookupError::Malformed(_))
        ));
    }

    #[test]
    fn test_problem_without_data_is_not_found() {
        let missing = TweetResponse {
            data: None,
            includes: None,
            errors: vec![ApiProblem {
                title: Some("Not Found Error".to_string()),
                detail: Some("Could not find tweet with id: [1].".to_string()),
                kind: Some("https://api.twitter.com/2/problems/resource-not-found".to_string()),
                resource_id: Some("1".to_string()),
            }],
        };
        assert!(matches!(
            extract_bundle(&missing),
            Err(LookupError::NotFound(_))
        ));
        assert!(matches!(
            extract_bundle(&TweetResponse::default()),
            Err(LookupError::Malformed(_))
        ));

        let protected = TweetResponse {
            errors: vec![ApiProblem {
                title: Some("Authorization Error".to_string()),
                detail: Some("Sorry, you are not authorized to see the Tweet.".to_string()),
                kind: Some("https://api.twitter.com/2/problems/not-authorized-for-resource".to_string()),
                resource_id: Some("2".to_string()),
            }],
            ..TweetResponse::default()
        };
        assert!(matches!(
            extract_bundle(&protected),
            Err(LookupError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_is_deterministic() -> Result<(), LookupError> {
        let payload = response(Some(vec![
            photo("p1", "p1.jpg"),
            video(
                "v1",
                vec![
                    variant("video/mp4", Some(256_000), "v1-low.mp4"),
                    variant("video/mp4", Some(2_176_000), "v1-high.mp4"),
                ],
            ),
            photo("p2", "p2.jpg"),
        ]));

        let mut lookup = MockTweetLookup::new();
        lookup
            .expect_lookup_tweet()
            .with(eq("42"))
            .times(2)
            .returning(move |_| Ok(payload.clone()));

        let resolver = MediaResolver::new(Arc::new(lookup));
        let first = resolver.resolve("42").await?;
        let second = resolver.resolve("42").await?;

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_propagates_rate_limit() {
        let mut lookup = MockTweetLookup::new();
        lookup
            .expect_lookup_tweet()
            .returning(|_| Err(LookupError::RateLimited { wait_secs: None }));

        let resolver = MediaResolver::new(Arc::new(lookup));
        assert_eq!(
            resolver.resolve("1").await,
            Err(LookupError::RateLimited { wait_secs: None })
        );
    }
}
