//! # Key-Value Store Backends
//!
//! Narrow storage contract behind the distributed cache tier. The REST
//! implementation talks to a remote namespace over HTTP; the in-memory
//! one backs local development and tests; the null one stands in when
//! no store is reachable so the tier degrades instead of failing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use url::Url;

use crate::cache::CacheResult;

/// Minimal operations the KV tier needs from a remote store
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the raw value for a key, `None` when absent.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Write a value, optionally with a store-side expiration.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()>;

    /// Remove a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// List keys under a prefix.
    async fn list(&self, prefix: &str) -> CacheResult<Vec<String>>;
}

fn into_io(e: reqwest::Error) -> std::io::Error {
    std::io::Error::other(e)
}

/// KV namespace exposed over a REST API.
///
/// Values live under `{base}/values/{key}`, listings under
/// `{base}/keys?prefix=`. Writes pass the expiration as an
/// `expiration_ttl` query parameter in seconds.
pub struct RestKvStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestKvStore {
    pub fn new(client: Client, base_url: Url, token: Option<String>) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn value_url(&self, key: &str) -> CacheResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "KV base URL cannot be a base")
            })?
            .pop_if_empty()
            .push("values")
            .push(key);
        Ok(url)
    }

    fn keys_url(&self) -> CacheResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "KV base URL cannot be a base")
            })?
            .pop_if_empty()
            .push("keys");
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let request = self.authorize(self.client.get(self.value_url(key)?));
        let response = request.send().await.map_err(into_io)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                Ok(Some(response.bytes().await.map_err(into_io)?.to_vec()))
            }
            status => Err(std::io::Error::other(format!(
                "KV get returned status {status}"
            ))),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let mut request = self.authorize(self.client.put(self.value_url(key)?)).body(value);
        if let Some(ttl) = ttl {
            request = request.query(&[("expiration_ttl", ttl.as_secs())]);
        }

        let response = request.send().await.map_err(into_io)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!(
                "KV put returned status {}",
                response.status()
            )))
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let request = self.authorize(self.client.delete(self.value_url(key)?));
        let response = request.send().await.map_err(into_io)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(std::io::Error::other(format!(
                "KV delete returned status {status}"
            ))),
        }
    }

    async fn list(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let request = self
            .authorize(self.client.get(self.keys_url()?))
            .query(&[("prefix", prefix)]);
        let response = request.send().await.map_err(into_io)?;

        if !response.status().is_success() {
            return Err(std::io::Error::other(format!(
                "KV list returned status {}",
                response.status()
            )));
        }
        response.json::<Vec<String>>().await.map_err(into_io)
    }
}

struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(stored) if stored.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.data.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let stored = StoredValue {
            data: value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().unwrap().insert(key.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let entries = self.entries.lock().unwrap();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, stored)| key.starts_with(prefix) && !stored.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Store that holds nothing and accepts everything.
///
/// Substituted when the configured store fails its startup probe so
/// the rest of the chain keeps working.
pub struct NullKvStore;

#[async_trait]
impl KvStore for NullKvStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn list(&self, _prefix: &str) -> CacheResult<Vec<String>> {
        Ok(Vec::new())
    }
}
