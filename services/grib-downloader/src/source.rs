//! HTTP seam: where GRIB bytes come from.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use tracing::debug;

use grib_common::{BoxError, GribError, GribResult};

use crate::download::DownloadConfig;

/// Response body as a stream of byte buffers of any size.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Status line and body of a GET request.
pub struct SourceResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl SourceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can answer a single streaming GET.
#[async_trait]
pub trait GribSource: Send + Sync {
    /// Issue the request. An `Err` means no response was received at all.
    async fn get(&self, url: &str) -> Result<SourceResponse, BoxError>;
}

/// `reqwest`-backed source used by the binary.
pub struct HttpGribSource {
    client: Client,
}

impl HttpGribSource {
    pub fn new(config: &DownloadConfig) -> GribResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .tcp_nodelay(true);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| GribError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl GribSource for HttpGribSource {
    async fn get(&self, url: &str) -> Result<SourceResponse, BoxError> {
        debug!(url = %url, "Connect to API");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e)))
            .boxed();

        Ok(SourceResponse { status, body })
    }
}
