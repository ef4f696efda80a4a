//! Artifact repository upload over HTTP PUT

use crate::connectors::{ArtifactRepository, ConnectorError};
use crate::core::logger::SharedLogger;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// HTTP client shared by every repository built from one set of connectors
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(concat!("deployflow/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Uploads artifacts into a repository path such as
/// `https://artifacts.example.com/artifactory/releases`
pub struct HttpArtifactRepository {
    client: Client,
    url: String,
    logger: SharedLogger,
}

impl HttpArtifactRepository {
    pub fn new(client: Client, url: String, logger: SharedLogger) -> Self {
        Self {
            client,
            url,
            logger,
        }
    }

    /// Destination URL for an artifact: repository URL plus the file name
    pub fn destination(&self, artifact: &Path) -> String {
        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", self.url.trim_end_matches('/'), name)
    }

    async fn put(&self, artifact: &Path) -> Result<(), ConnectorError> {
        let body = tokio::fs::read(artifact).await?;
        let url = self.destination(artifact);

        let response = self
            .client
            .put(&url)
            .body(body)
            .send()
            .await
            .map_err(|e| ConnectorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Api(format!("HTTP {} uploading to {}", status, url)));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactRepository for HttpArtifactRepository {
    async fn attempt_upload(&self, artifact: &Path) -> bool {
        match self.put(artifact).await {
            Ok(()) => true,
            Err(e) => {
                self.logger
                    .debug(&format!("Upload of {} failed: {}", artifact.display(), e));
                false
            }
        }
    }
}
