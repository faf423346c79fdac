use crate::cli::{OutputFormat, ResourceArgs};
use crate::error::AppError;
use crate::output;
use regex::Regex;
use scrio_engine::{ResourceCache, ResourceCacheConfig, ResourceDescriptor, ResourceType};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How often `status --wait` re-probes the upstream host.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Executes parsed subcommands against the cache engine.
pub struct CommandExecutor {
    cache: ResourceCache,
}

impl CommandExecutor {
    pub async fn new(config: ResourceCacheConfig) -> Result<Self, AppError> {
        let cache = ResourceCache::new(config).await?;
        Ok(Self { cache })
    }

    /// Fetch a resource and print or save its assembled content.
    pub async fn fetch(
        &self,
        target: &ResourceArgs,
        format: &OutputFormat,
        output_file: Option<&Path>,
    ) -> Result<(), AppError> {
        let descriptor = descriptor_from(target)?;
        info!(resource = %descriptor, "fetching resource");
        let content = self.cache.get_resource(&descriptor).await?;
        let rendered = output::render_content(&content, format)?;
        output::emit(&rendered, output_file)
    }

    /// Print the file paths a resource contains, one per line.
    pub async fn paths(&self, target: &ResourceArgs, filter: Option<&str>) -> Result<(), AppError> {
        let pattern = filter
            .map(Regex::new)
            .transpose()
            .map_err(|e| AppError::InvalidInput(format!("Invalid filter pattern: {e}")))?;
        let descriptor = descriptor_from(target)?;
        let content = self.cache.get_resource(&descriptor).await?;

        let paths = output::collect_paths(&content.value, pattern.as_ref());
        if paths.is_empty() {
            info!(resource = %descriptor, "no matching paths");
        } else {
            println!("{}", paths.join("\n"));
        }
        Ok(())
    }

    /// Print per-tier cache statistics.
    pub async fn stats(&self, format: &OutputFormat) -> Result<(), AppError> {
        let stats = self.cache.stats().await;
        let rendered = output::render_stats(&stats, format)?;
        output::emit(&rendered, None)
    }

    /// Probe the upstream host and print the reachability verdict.
    pub async fn status(&self, wait: Option<u64>, format: &OutputFormat) -> Result<(), AppError> {
        let monitor = self.cache.monitor();
        match wait {
            Some(secs) => {
                monitor
                    .wait_for_online(Duration::from_secs(secs), WAIT_POLL_INTERVAL)
                    .await;
            }
            None => {
                monitor.force_check().await;
            }
        }
        let rendered = output::render_status(&monitor.status(), format)?;
        output::emit(&rendered, None)
    }

    /// Remove one resource from every cache tier.
    pub async fn delete(&self, target: &ResourceArgs) -> Result<(), AppError> {
        let descriptor = descriptor_from(target)?;
        self.cache.delete(&descriptor).await?;
        println!("Removed {descriptor} from all cache tiers");
        Ok(())
    }

    /// Empty every cache tier.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.cache.clear().await?;
        println!("All cache tiers cleared");
        Ok(())
    }

    /// Drain background cache work before exit.
    pub async fn shutdown(self) {
        self.cache.shutdown().await;
    }
}

fn descriptor_from(target: &ResourceArgs) -> Result<ResourceDescriptor, AppError> {
    let resource: ResourceType = target.resource.parse()?;
    let mut descriptor =
        ResourceDescriptor::new(&target.language, &target.organization, resource);
    if let Some(version) = &target.version {
        descriptor = descriptor.with_version(version);
    }
    Ok(descriptor)
}
