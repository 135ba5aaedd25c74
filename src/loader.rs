//! Data loader - fetch the precomputed JSON documents
//!
//! Documents are read relative to a base that is either a local directory or
//! an http(s) URL. The three explorer documents are fetched concurrently;
//! papers and topics are required, the global summary is optional and any
//! failure to get it degrades to `None`.

use serde::de::DeserializeOwned;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisData;
use crate::model::{Dataset, GlobalData, Paper, Topic};

pub const PAPERS_FILE: &str = "data/papers.json";
pub const TOPICS_FILE: &str = "data/topics.json";
pub const GLOBAL_FILE: &str = "data/global.json";
pub const ANALYSIS_FILE: &str = "data/analysis.json";

const USER_AGENT: &str = "PaperAtlas/0.1";

/// Errors that can occur while fetching a document
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid data base '{base}': {reason}")]
    InvalidBase { base: String, reason: String },
}

/// Where documents are read from
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Local(PathBuf),
    /// Always ends with '/' so relative joins stay under it
    Remote(reqwest::Url),
}

impl DataSource {
    pub fn parse(base: &str) -> Result<Self, LoadError> {
        let base = base.trim();
        if base.starts_with("http://") || base.starts_with("https://") {
            let mut with_slash = base.to_string();
            if !with_slash.ends_with('/') {
                with_slash.push('/');
            }
            reqwest::Url::parse(&with_slash)
                .map(DataSource::Remote)
                .map_err(|e| LoadError::InvalidBase {
                    base: base.to_string(),
                    reason: e.to_string(),
                })
        } else if base.contains("://") {
            Err(LoadError::InvalidBase {
                base: base.to_string(),
                reason: "only http and https URLs are supported".to_string(),
            })
        } else if base.is_empty() {
            Ok(DataSource::Local(PathBuf::from(".")))
        } else {
            Ok(DataSource::Local(PathBuf::from(base)))
        }
    }

    /// Human readable location of a document
    pub fn location(&self, relative: &str) -> String {
        match self {
            DataSource::Local(dir) => dir.join(relative).display().to_string(),
            DataSource::Remote(base) => base
                .join(relative)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| format!("{}{}", base, relative)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Loader {
    source: DataSource,
    client: reqwest::Client,
}

impl Loader {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_base(base: &str) -> Result<Self, LoadError> {
        Ok(Self::new(DataSource::parse(base)?))
    }

    async fn read_bytes(&self, relative: &str) -> Result<Vec<u8>, LoadError> {
        match &self.source {
            DataSource::Local(dir) => {
                let path = dir.join(relative);
                tokio::fs::read(&path).await.map_err(|source| LoadError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
            DataSource::Remote(base) => {
                let url = base.join(relative).map_err(|e| LoadError::InvalidBase {
                    base: base.to_string(),
                    reason: e.to_string(),
                })?;
                let http_err = |source| LoadError::Http {
                    url: url.to_string(),
                    source,
                };

                let response = self
                    .client
                    .get(url.clone())
                    .header("User-Agent", USER_AGENT)
                    .send()
                    .await
                    .map_err(http_err)?;

                if !response.status().is_success() {
                    return Err(LoadError::Status {
                        url: url.to_string(),
                        status: response.status(),
                    });
                }
                let bytes = response.bytes().await.map_err(http_err)?;
                Ok(bytes.to_vec())
            }
        }
    }

    /// Fetch one document and deserialize it
    pub async fn fetch_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T, LoadError> {
        let location = self.source.location(relative);
        debug!("Fetching {}", location);
        let bytes = self.read_bytes(relative).await?;
        debug!("Read {} bytes from {}", bytes.len(), location);
        serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse { location, source })
    }

    /// Papers, topics and (if available) the global summary
    pub async fn load_dataset(&self) -> Result<Dataset, LoadError> {
        let (papers, topics, global) = tokio::join!(
            self.fetch_json::<Vec<Paper>>(PAPERS_FILE),
            self.fetch_json::<Vec<Topic>>(TOPICS_FILE),
            self.fetch_json::<GlobalData>(GLOBAL_FILE),
        );

        let global = match global {
            Ok(global) => Some(global),
            Err(e) => {
                warn!("Global summary unavailable, continuing without it: {}", e);
                None
            }
        };
        let dataset = Dataset {
            papers: papers?,
            topics: topics?,
            global,
        };

        let report = dataset.integrity_report();
        if !report.is_consistent() {
            warn!(
                "{} papers reference unknown topics {:?}; they keep fallback colors",
                report.unknown_cluster_papers, report.unknown_clusters
            );
        }
        info!(
            "Loaded {} papers, {} topics, {} journals from {}",
            report.papers,
            report.topics,
            report.journals,
            self.source.location("data")
        );
        Ok(dataset)
    }

    pub async fn load_analysis(&self) -> Result<AnalysisData, LoadError> {
        let data: AnalysisData = self.fetch_json(ANALYSIS_FILE).await?;
        info!(
            "Loaded analysis data: {} topics, {} journals",
            data.topic_counts.len(),
            data.top_journals_global.len()
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const PAPERS: &str = r#"[
        {"id": "a", "title": "Graph Drawing", "journal": "X", "date": "2020-01-01",
         "x": 0.0, "y": 1.0, "z": 2.0, "cluster": "0", "abstract": "", "citations": 3,
         "dist_to_topic": 0.2, "dist_to_global": 1.5},
        {"id": "b", "title": "Noise", "journal": "Y", "date": "2021-01-01",
         "x": 1.0, "y": 1.0, "z": 1.0, "cluster": -1, "abstract": "", "citations": null,
         "dist_to_topic": -1, "dist_to_global": 2.0}
    ]"#;
    const TOPICS: &str = r#"[{"id": "0", "keywords": ["graph", "layout"], "position": [0, 0, 0], "count": 1}]"#;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), PAPERS_FILE, PAPERS);
        write(dir.path(), TOPICS_FILE, TOPICS);
        dir
    }

    fn loader(dir: &tempfile::TempDir) -> Loader {
        Loader::new(DataSource::Local(dir.path().to_path_buf()))
    }

    #[tokio::test]
    async fn test_missing_global_still_loads() {
        let dir = fixture();
        let dataset = loader(&dir).load_dataset().await.unwrap();
        assert_eq!(dataset.papers.len(), 2);
        assert_eq!(dataset.topics.len(), 1);
        assert!(dataset.global.is_none());
        assert_eq!(dataset.papers[1].cluster, "-1");
    }

    #[tokio::test]
    async fn test_global_loaded_when_present() {
        let dir = fixture();
        write(dir.path(), GLOBAL_FILE, r#"{"position": [1, 2, 3], "keywords": ["data"]}"#);
        let dataset = loader(&dir).load_dataset().await.unwrap();
        assert_eq!(dataset.global.unwrap().position, glam::Vec3::new(1.0, 2.0, 3.0));
    }

    #[tokio::test]
    async fn test_numeric_ids_and_missing_coordinates_load() {
        let dir = fixture();
        write(
            dir.path(),
            PAPERS_FILE,
            r#"[{"id": 42, "title": "Volume Rendering", "journal": "X", "date": "2018-03-01",
                 "x": 0.5, "y": null, "cluster": 0, "abstract": "", "citations": 1,
                 "dist_to_topic": 0.1, "dist_to_global": 0.9}]"#,
        );
        let dataset = loader(&dir).load_dataset().await.unwrap();
        assert_eq!(dataset.papers[0].id, "42");
        assert_eq!(dataset.papers[0].position(), glam::Vec3::new(0.5, 0.0, 0.0));
    }

    #[tokio::test]
    async fn test_malformed_global_degrades_to_none() {
        let dir = fixture();
        write(dir.path(), GLOBAL_FILE, "{ not json");
        let dataset = loader(&dir).load_dataset().await.unwrap();
        assert!(dataset.global.is_none());
    }

    #[tokio::test]
    async fn test_missing_papers_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), TOPICS_FILE, TOPICS);
        let err = loader(&dir).load_dataset().await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[tokio::test]
    async fn test_malformed_topics_is_a_parse_error() {
        let dir = fixture();
        write(dir.path(), TOPICS_FILE, r#"[{"id": "0"}]"#);
        let err = loader(&dir).load_dataset().await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("topics.json"));
    }

    #[tokio::test]
    async fn test_missing_analysis_is_an_error() {
        let dir = fixture();
        assert!(loader(&dir).load_analysis().await.is_err());
        write(dir.path(), ANALYSIS_FILE, r#"{"topic_counts": {"0": 4}}"#);
        let data = loader(&dir).load_analysis().await.unwrap();
        assert_eq!(data.topic_counts.get("0"), Some(&4));
    }

    #[test]
    fn test_data_source_parsing() {
        assert_eq!(DataSource::parse(".").unwrap(), DataSource::Local(PathBuf::from(".")));
        assert_eq!(DataSource::parse("").unwrap(), DataSource::Local(PathBuf::from(".")));

        let remote = DataSource::parse("https://example.org/atlas").unwrap();
        assert_eq!(remote.location(PAPERS_FILE), "https://example.org/atlas/data/papers.json");

        assert!(matches!(
            DataSource::parse("ftp://example.org"),
            Err(LoadError::InvalidBase { .. })
        ));
    }
}
