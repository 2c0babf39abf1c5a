//! Network access to the video platform.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::config::NetworkConfig;
use crate::error::{Error, Result};

/// A streaming response body with its declared length.
pub struct AssetStream {
    /// Length declared by the server, if any.
    pub content_length: Option<u64>,
    /// Body chunks in order.
    pub body: BoxStream<'static, Result<Bytes>>,
}

/// Abstraction over the remote platform for testability.
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Fetches the embed page for a video identifier.
    async fn fetch_embed(&self, id: &str) -> Result<String>;

    /// Opens a streaming GET for an asset URL.
    async fn open_asset(&self, url: &str) -> Result<AssetStream>;
}

/// Production host backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpHost {
    client: reqwest::Client,
    embed_base_url: String,
    catalog_timeout: Duration,
}

impl HttpHost {
    /// Builds a host with timeouts taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30));
        if let Some(ref agent) = config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(Self {
            client: builder.build()?,
            embed_base_url: config.embed_base_url.clone(),
            catalog_timeout: Duration::from_secs(config.catalog_timeout_secs),
        })
    }

    /// Returns the embed URL for a video identifier.
    #[must_use]
    pub fn embed_url(&self, id: &str) -> String {
        format!("{}{}", self.embed_base_url, id)
    }
}

#[async_trait]
impl VideoHost for HttpHost {
    async fn fetch_embed(&self, id: &str) -> Result<String> {
        let body = self
            .client
            .get(self.embed_url(id))
            .timeout(self.catalog_timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    async fn open_asset(&self, url: &str) -> Result<AssetStream> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(AssetStream {
            content_length: resp.content_length(),
            body: resp.bytes_stream().map_err(Error::from).boxed(),
        })
    }
}
