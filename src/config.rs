use crate::metadata::CorpusFilter;
use crate::query::QueryOptions;
use crate::retrieval::BootstrapPolicy;
use crate::ui::StatusUI;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "acl-search";
const CONFIG_FILE: &str = "config.toml";
const METADATA_FILE: &str = "anthology.csv";

pub const ENV_ENDPOINT: &str = "ACL_SEARCH_ENDPOINT";
pub const ENV_INDEX: &str = "ACL_SEARCH_INDEX";
pub const ENV_METADATA: &str = "ACL_SEARCH_METADATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config already exists at {0}")]
    AlreadyExists(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub endpoint: String,
    pub index: String,
    pub timeout_secs: u64,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        RetrievalSection {
            endpoint: "http://127.0.0.1:8000".to_string(),
            index: "paper_abstracts".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSection {
    pub attempts: u32,
    pub delay_ms: u64,
    pub smoke_query: String,
    pub smoke_k: usize,
}

impl Default for BootstrapSection {
    fn default() -> Self {
        BootstrapSection {
            attempts: 5,
            delay_ms: 500,
            smoke_query: "dummy".to_string(),
            smoke_k: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    pub default_k: usize,
    pub default_min_year: i64,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for QuerySection {
    fn default() -> Self {
        QuerySection {
            default_k: crate::query::DEFAULT_K,
            default_min_year: 0,
            retries: 2,
            retry_delay_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareSection {
    pub source_url: String,
}

impl Default for PrepareSection {
    fn default() -> Self {
        PrepareSection {
            source_url: "https://aclanthology.org/anthology+abstracts.bib.gz".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Metadata table. Falls back to `<data_dir>/anthology.csv`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub retrieval: RetrievalSection,
    pub bootstrap: BootstrapSection,
    pub query: QuerySection,
    pub corpus: CorpusFilter,
    pub server: ServerSection,
    pub prepare: PrepareSection,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("data"));
        Config {
            metadata_path: None,
            data_dir,
            retrieval: RetrievalSection::default(),
            bootstrap: BootstrapSection::default(),
            query: QuerySection::default(),
            corpus: CorpusFilter::default(),
            server: ServerSection::default(),
            prepare: PrepareSection::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Reads the config at `path` (or the default location). A missing file is
    /// not an error: the defaults apply. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => expand_path(path),
            None => Self::default_path()?,
        };
        let mut config = Self::read_config_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_config_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        config.data_dir = expand_path(&config.data_dir);
        config.metadata_path = config.metadata_path.as_deref().map(expand_path);
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = non_empty(ENV_ENDPOINT) {
            self.retrieval.endpoint = endpoint;
        }
        if let Some(index) = non_empty(ENV_INDEX) {
            self.retrieval.index = index;
        }
        if let Some(path) = non_empty(ENV_METADATA) {
            self.metadata_path = Some(expand_path(Path::new(&path)));
        }
    }

    /// Writes the defaults to `path`, refusing to clobber an existing file.
    pub fn init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let config = Config::default();
        config.save(path)?;
        StatusUI::success(&format!("Config saved to: {}", path.display()));
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, self.to_toml()?).map_err(io_err)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(METADATA_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval.timeout_secs.max(1))
    }

    pub fn bootstrap_policy(&self) -> BootstrapPolicy {
        BootstrapPolicy {
            index: self.retrieval.index.clone(),
            attempts: self.bootstrap.attempts,
            delay: Duration::from_millis(self.bootstrap.delay_ms),
            smoke_query: self.bootstrap.smoke_query.clone(),
            smoke_k: self.bootstrap.smoke_k,
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            timeout: self.request_timeout(),
            retries: self.query.retries,
            retry_delay: Duration::from_millis(self.query.retry_delay_ms),
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    shellexpand::tilde(&path.to_string_lossy())
        .into_owned()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read_config_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bootstrap.attempts, 5);
        assert_eq!(config.query.default_k, 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            metadata_path = "/srv/acl/anthology.csv"

            [retrieval]
            endpoint = "http://search.internal:9000"

            [corpus]
            after_year = 2015
            "#,
        )
        .unwrap();

        assert_eq!(config.metadata_path(), PathBuf::from("/srv/acl/anthology.csv"));
        assert_eq!(config.retrieval.endpoint, "http://search.internal:9000");
        assert_eq!(config.retrieval.index, "paper_abstracts");
        assert_eq!(config.corpus.after_year, Some(2015));
        assert_eq!(config.corpus.publishers, CorpusFilter::default().publishers);
        assert_eq!(config.server.bind, "127.0.0.1:5000");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = Config::parse("[retrieval\nendpoint = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://10.0.0.2:8000"),
            (ENV_INDEX, "abstracts_v2"),
            (ENV_METADATA, "/tmp/meta.csv"),
        ]
        .into_iter()
        .collect();

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.retrieval.endpoint, "http://10.0.0.2:8000");
        assert_eq!(config.bootstrap_policy().index, "abstracts_v2");
        assert_eq!(config.metadata_path(), PathBuf::from("/tmp/meta.csv"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("   ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn metadata_defaults_into_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/var/lib/acl"),
            ..Config::default()
        };
        assert_eq!(config.metadata_path(), PathBuf::from("/var/lib/acl/anthology.csv"));
    }

    #[test]
    fn policies_are_built_from_sections() {
        let mut config = Config::default();
        config.bootstrap.attempts = 3;
        config.bootstrap.delay_ms = 10;
        config.query.retries = 0;
        config.retrieval.timeout_secs = 0;

        let policy = config.bootstrap_policy();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(10));
        assert_eq!(policy.smoke_query, "dummy");

        let options = config.query_options();
        assert_eq!(options.retries, 0);
        assert_eq!(options.timeout, Duration::from_secs(1));
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let written = Config::init(&path).unwrap();
        let reread = Config::read_config_file(&path).unwrap();
        assert_eq!(written, reread);

        assert!(matches!(
            Config::init(&path),
            Err(ConfigError::AlreadyExists(_))
        ));
    }
}
