use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::sync::mpsc;
use std::thread;
use tracing::debug;

use crate::schema::DatasetKind;

pub const DEFAULT_BASE_URL: &str = "https://www.padherder.com";

/// Endpoint serving a dataset, e.g. `https://www.padherder.com/api/monsters/`
pub fn dataset_url(base_url: &str, kind: DatasetKind) -> String {
    format!("{}/api/{}/", base_url.trim_end_matches('/'), kind.key())
}

/// Source of raw response bodies
pub trait Fetch: Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

pub struct PadherderClient {
    client: Client,
}

impl PadherderClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("padherder-cache")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for PadherderClient {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad response from {}", url))?;

        let text = response.text().context("Failed to read response")?;
        debug!("{}: received {}", url, format_size(text.len() as u64));
        Ok(text)
    }
}

/// Fetch every request concurrently, handling responses as they arrive
///
/// `on_response` runs on the calling thread, one response at a time, in
/// completion order. Its first error stops the batch; requests still in
/// flight finish but their bodies are dropped.
pub fn fetch_all<F, H>(fetcher: &F, requests: Vec<(DatasetKind, String)>, mut on_response: H) -> Result<()>
where
    F: Fetch + ?Sized,
    H: FnMut(DatasetKind, Result<String>) -> Result<()>,
{
    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();

        for (kind, url) in requests {
            let tx = tx.clone();
            scope.spawn(move || {
                debug!("requesting {}", url);
                let _ = tx.send((kind, fetcher.fetch(&url)));
            });
        }
        drop(tx);

        for (kind, body) in rx {
            on_response(kind, body)?;
        }
        Ok(())
    })
}

/// Format bytes as human-readable string
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::collections::HashSet;

    struct Echo;

    impl Fetch for Echo {
        fn fetch(&self, url: &str) -> Result<String> {
            if url.contains("awakenings") {
                bail!("connection reset");
            }
            Ok(url.to_string())
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1500), "1.5 KB");
        assert_eq!(format_size(1_500_000), "1.5 MB");
    }

    #[test]
    fn test_dataset_url() {
        assert_eq!(
            dataset_url(DEFAULT_BASE_URL, DatasetKind::LeaderSkills),
            "https://www.padherder.com/api/leader_skills/"
        );
        assert_eq!(
            dataset_url("http://localhost:8000/", DatasetKind::Monsters),
            "http://localhost:8000/api/monsters/"
        );
    }

    #[test]
    fn test_fetch_all_delivers_every_response() {
        let requests: Vec<_> = [DatasetKind::ActiveSkills, DatasetKind::Monsters]
            .into_iter()
            .map(|kind| (kind, dataset_url("http://test", kind)))
            .collect();

        let mut seen = HashSet::new();
        fetch_all(&Echo, requests, |kind, body| {
            assert_eq!(body?, dataset_url("http://test", kind));
            seen.insert(kind);
            Ok(())
        })
        .unwrap();

        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_fetch_all_stops_on_error() {
        let requests = vec![(
            DatasetKind::Awakenings,
            dataset_url("http://test", DatasetKind::Awakenings),
        )];

        let result = fetch_all(&Echo, requests, |_, body| body.map(|_| ()));

        assert_eq!(result.unwrap_err().to_string(), "connection reset");
    }
}
