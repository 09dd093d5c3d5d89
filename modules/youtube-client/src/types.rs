use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelItem {
    pub id: String,
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default)]
    pub video_count: String,
    #[serde(default)]
    pub subscriber_count: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
    #[serde(default)]
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub kind: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub struct VideoItem {
    pub statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default)]
    pub view_count: String,
    #[serde(default)]
    pub like_count: String,
}

/// Aggregated channel metrics for one research pass.
#[derive(Debug, Clone)]
pub struct ChannelDigest {
    pub total_videos: u64,
    pub subscriber_count: u64,
    pub recent_videos: Vec<(String, String)>,
    pub average_views: f64,
    pub average_likes: f64,
}

impl std::fmt::Display for ChannelDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total Videos: {}", self.total_videos)?;
        writeln!(f, "Number of Subscribers: {}", self.subscriber_count)?;
        writeln!(f, "Average Views: {:.0}", self.average_views)?;
        writeln!(f, "Average Likes: {:.0}", self.average_likes)?;
        writeln!(f, "Recent Videos:")?;
        for (title, published_at) in &self.recent_videos {
            writeln!(f, "- {title} (Published: {published_at})")?;
        }
        Ok(())
    }
}
