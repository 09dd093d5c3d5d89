pub mod error;
pub mod types;

pub use error::{Result, YoutubeError};
pub use types::ChannelDigest;

use serde::de::DeserializeOwned;
use types::{ChannelListResponse, SearchListResponse, VideoListResponse};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Number of recent uploads sampled for view/like averages.
const RECENT_VIDEO_SAMPLE: u32 = 15;

/// YouTube Data API v3 client for channel research.
pub struct YoutubeClient {
    client: reqwest::Client,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        if self.api_key.is_empty() {
            return Err(YoutubeError::MissingApiKey);
        }

        let resp = self
            .client
            .get(format!("{BASE_URL}/{endpoint}"))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(YoutubeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Resolve a channel ID from a URL, handle, or bare channel name.
    pub async fn resolve_channel_id(&self, channel_url: &str) -> Result<String> {
        if let Some(id) = channel_id_from_url(channel_url) {
            return Ok(id);
        }
        let name = channel_name_from_url(channel_url)
            .ok_or_else(|| YoutubeError::UnrecognizedChannel(channel_url.to_string()))?;

        let response: SearchListResponse = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", &name),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        response
            .items
            .into_iter()
            .find_map(|item| item.id.channel_id)
            .ok_or_else(|| YoutubeError::UnrecognizedChannel(channel_url.to_string()))
    }

    /// Fetch channel statistics plus recent-upload averages.
    pub async fn channel_digest(&self, channel_url: &str) -> Result<ChannelDigest> {
        let channel_id = self.resolve_channel_id(channel_url).await?;
        tracing::info!(channel_id = %channel_id, "Fetching YouTube channel stats");

        let channels: ChannelListResponse = self
            .get("channels", &[("part", "statistics"), ("id", &channel_id)])
            .await?;
        let stats = channels
            .items
            .first()
            .map(|c| &c.statistics)
            .ok_or_else(|| YoutubeError::UnrecognizedChannel(channel_url.to_string()))?;
        let total_videos = stats.video_count.parse().unwrap_or(0);
        let subscriber_count = stats.subscriber_count.parse().unwrap_or(0);

        let max_results = RECENT_VIDEO_SAMPLE.to_string();
        let uploads: SearchListResponse = self
            .get(
                "search",
                &[
                    ("part", "id,snippet"),
                    ("channelId", &channel_id),
                    ("maxResults", &max_results),
                    ("order", "date"),
                    ("type", "video"),
                ],
            )
            .await?;

        let mut video_ids = Vec::new();
        let mut recent_videos = Vec::new();
        for item in &uploads.items {
            if item.id.kind != "youtube#video" {
                continue;
            }
            if let Some(id) = &item.id.video_id {
                video_ids.push(id.clone());
            }
            if let Some(snippet) = &item.snippet {
                recent_videos.push((snippet.title.clone(), snippet.published_at.clone()));
            }
        }

        let (average_views, average_likes) = if video_ids.is_empty() {
            (0.0, 0.0)
        } else {
            let videos: VideoListResponse = self
                .get(
                    "videos",
                    &[("part", "statistics"), ("id", &video_ids.join(","))],
                )
                .await?;
            let mut views = 0u64;
            let mut likes = 0u64;
            let mut counted = 0u64;
            for video in &videos.items {
                views += video.statistics.view_count.parse().unwrap_or(0);
                likes += video.statistics.like_count.parse().unwrap_or(0);
                counted += 1;
            }
            if counted == 0 {
                (0.0, 0.0)
            } else {
                (views as f64 / counted as f64, likes as f64 / counted as f64)
            }
        };

        Ok(ChannelDigest {
            total_videos,
            subscriber_count,
            recent_videos,
            average_views,
            average_likes,
        })
    }
}

/// Extract a channel ID from a `/channel/UC...` URL.
fn channel_id_from_url(url: &str) -> Option<String> {
    let rest = url.split("/channel/").nth(1)?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Extract a channel handle or name from `@handle`, `/c/Name`, `/user/Name`
/// URLs, or a bare name.
fn channel_name_from_url(url: &str) -> Option<String> {
    let segment_after = |marker: &str| -> Option<String> {
        let rest = url.split(marker).nth(1)?;
        let name: String = rest.chars().take_while(|c| *c != '/' && *c != '?').collect();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    };

    if let Some(handle) = segment_after("@") {
        return Some(handle);
    }
    if let Some(name) = segment_after("/c/") {
        return Some(name);
    }
    if let Some(name) = segment_after("/user/") {
        return Some(name);
    }
    if !url.contains("://") {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_channel_id_from_url() {
        assert_eq!(
            channel_id_from_url("https://www.youtube.com/channel/UCh2jMEvFpPZMpNWtkWEojwg"),
            Some("UCh2jMEvFpPZMpNWtkWEojwg".to_string())
        );
        assert_eq!(channel_id_from_url("https://www.youtube.com/@acme"), None);
    }

    #[test]
    fn extracts_handle_custom_and_legacy_names() {
        assert_eq!(
            channel_name_from_url("https://www.youtube.com/@acme"),
            Some("acme".to_string())
        );
        assert_eq!(
            channel_name_from_url("https://www.youtube.com/c/AcmeVideos"),
            Some("AcmeVideos".to_string())
        );
        assert_eq!(
            channel_name_from_url("https://www.youtube.com/user/LegacyAcme"),
            Some("LegacyAcme".to_string())
        );
        assert_eq!(
            channel_name_from_url("Acme Inc"),
            Some("Acme Inc".to_string())
        );
        assert_eq!(channel_name_from_url("https://youtube.com/"), None);
    }

    #[test]
    fn digest_renders_as_analysis_input() {
        let digest = ChannelDigest {
            total_videos: 42,
            subscriber_count: 1200,
            recent_videos: vec![("Launch day".into(), "2026-01-01T00:00:00Z".into())],
            average_views: 3400.0,
            average_likes: 120.0,
        };
        let text = digest.to_string();
        assert!(text.contains("Total Videos: 42"));
        assert!(text.contains("Launch day"));
    }
}
