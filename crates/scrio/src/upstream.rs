//! # Upstream Source
//!
//! Fetches repository archives from the upstream git host. The host
//! exposes every repository as `{org}/{repo}/archive/{ref}.{ext}`, so a
//! whole resource arrives in one request and the extractor takes it
//! from there.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ResourceError;
use crate::resource::ResourceDescriptor;

/// Archive container requested from upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFlavor {
    /// `{ref}.zip`
    #[default]
    Zip,
    /// `{ref}.tar.gz`
    TarGz,
}

impl ArchiveFlavor {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFlavor::Zip => "zip",
            ArchiveFlavor::TarGz => "tar.gz",
        }
    }
}

/// Archive fetcher bound to one upstream host
pub struct UpstreamSource {
    client: Client,
    base_url: Url,
    flavor: ArchiveFlavor,
}

impl UpstreamSource {
    pub fn new(client: Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            flavor: config.archive_flavor,
        }
    }

    /// Archive endpoint for a resource.
    pub fn archive_url(&self, desc: &ResourceDescriptor) -> Result<Url, ResourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ResourceError::UrlError(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&desc.organization)
            .push(&desc.repo_name())
            .push("archive")
            .push(&format!("{}.{}", desc.resolved_ref(), self.flavor.extension()));
        Ok(url)
    }

    /// Download a resource's archive.
    ///
    /// A 404 means the resource does not exist under that organization
    /// and ref; that verdict is final and must not fall back to stale
    /// cache copies. Every other failure is transient.
    pub async fn fetch_archive(&self, desc: &ResourceDescriptor) -> Result<Bytes, ResourceError> {
        let url = self.archive_url(desc)?;
        debug!(url = %url, "fetching upstream archive");

        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ResourceError::NotFound(desc.identifier())),
            status if status.is_success() => {
                let bytes = response.bytes().await?;
                debug!(url = %url, bytes = bytes.len(), "upstream archive downloaded");
                Ok(bytes)
            }
            status => Err(ResourceError::StatusCode(status)),
        }
    }
}
