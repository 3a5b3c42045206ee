//! Twitter v2 transport for the liked-posts feed.

use crate::config::TwitterSettings;
use crate::error::Result;
use crate::ports::{FeedProvider, HttpReply};

pub struct TwitterLikes {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl TwitterLikes {
    pub fn new(client: reqwest::Client, settings: &TwitterSettings) -> Self {
        Self {
            client,
            url: format!(
                "{}/users/{}/liked_tweets",
                settings.api_base.trim_end_matches('/'),
                settings.user_id
            ),
            api_key: settings.api_key.clone(),
        }
    }

    fn query(pagination_token: Option<&str>) -> Vec<(&'static str, &str)> {
        let mut query = vec![
            ("expansions", "author_id,attachments.media_keys"),
            ("media.fields", "url,type"),
        ];
        if let Some(token) = pagination_token {
            query.push(("pagination_token", token));
        }
        query
    }
}

#[async_trait::async_trait]
impl FeedProvider for TwitterLikes {
    async fn liked_page(&self, pagination_token: Option<&str>) -> Result<HttpReply> {
        tracing::debug!(pagination_token, "Requesting liked posts page");
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.api_key)
            .query(&Self::query(pagination_token))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(HttpReply::new(status, body))
    }
}
