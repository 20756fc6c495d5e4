use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, FILES_DEFAULT_PATH, FILES_DEFAULT_PREFIX,
    FILES_DEFAULT_URL_EXPIRY_SECS, FILES_MAX_URL_EXPIRY_SECS, FILTERS_DEFAULT_MAX_CRITERIA,
    FILTERS_DEFAULT_MAX_JSON_BYTES, SQLITE_DB_FILENAME,
};

// =============================================================================
// Storage Backend Enum
// =============================================================================

/// Storage backend type for file storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Filesystem => write!(f, "filesystem"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

// =============================================================================
// File Config (JSON, every field optional)
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilesFilesystemFileConfig {
    pub path: Option<String>,
}

/// S3 storage configuration
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilesS3FileConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// File storage configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilesFileConfig {
    pub storage: Option<StorageBackend>,
    pub prefix: Option<String>,
    pub url_expiry_secs: Option<u64>,
    pub filesystem: Option<FilesFilesystemFileConfig>,
    pub s3: Option<FilesS3FileConfig>,
}

/// Filter parsing limits section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FiltersFileConfig {
    pub max_json_bytes: Option<usize>,
    pub max_criteria: Option<usize>,
}

/// Metadata database section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<String>,
}

/// Top-level JSON config file
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub files: Option<FilesFileConfig>,
    pub filters: Option<FiltersFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(files) = other.files {
            let current = self.files.get_or_insert_with(FilesFileConfig::default);
            if files.storage.is_some() {
                tracing::trace!(storage = ?files.storage, "Merging files.storage");
                current.storage = files.storage;
            }
            if files.prefix.is_some() {
                tracing::trace!(prefix = ?files.prefix, "Merging files.prefix");
                current.prefix = files.prefix;
            }
            if files.url_expiry_secs.is_some() {
                tracing::trace!(secs = ?files.url_expiry_secs, "Merging files.url_expiry_secs");
                current.url_expiry_secs = files.url_expiry_secs;
            }
            if let Some(filesystem) = files.filesystem {
                let current_fs = current
                    .filesystem
                    .get_or_insert_with(FilesFilesystemFileConfig::default);
                if filesystem.path.is_some() {
                    tracing::trace!(path = ?filesystem.path, "Merging files.filesystem.path");
                    current_fs.path = filesystem.path;
                }
            }
            if let Some(s3) = files.s3 {
                let current_s3 = current.s3.get_or_insert_with(FilesS3FileConfig::default);
                if s3.bucket.is_some() {
                    tracing::trace!(bucket = ?s3.bucket, "Merging files.s3.bucket");
                    current_s3.bucket = s3.bucket;
                }
                if s3.region.is_some() {
                    tracing::trace!(region = ?s3.region, "Merging files.s3.region");
                    current_s3.region = s3.region;
                }
                if s3.endpoint.is_some() {
                    tracing::trace!(endpoint = ?s3.endpoint, "Merging files.s3.endpoint");
                    current_s3.endpoint = s3.endpoint;
                }
            }
        }

        if let Some(filters) = other.filters {
            let current = self.filters.get_or_insert_with(FiltersFileConfig::default);
            if filters.max_json_bytes.is_some() {
                tracing::trace!(bytes = ?filters.max_json_bytes, "Merging filters.max_json_bytes");
                current.max_json_bytes = filters.max_json_bytes;
            }
            if filters.max_criteria.is_some() {
                tracing::trace!(count = ?filters.max_criteria, "Merging filters.max_criteria");
                current.max_criteria = filters.max_criteria;
            }
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
        }
    }
}

// =============================================================================
// Runtime Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// File storage configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct FilesConfig {
    pub storage: StorageBackend,
    /// Object keys are `{prefix}/{id}`; empty means bare ids
    pub prefix: String,
    pub url_expiry_secs: u64,
    pub filesystem_path: String,
    pub s3: Option<S3Config>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Filesystem,
            prefix: FILES_DEFAULT_PREFIX.to_string(),
            url_expiry_secs: FILES_DEFAULT_URL_EXPIRY_SECS,
            filesystem_path: FILES_DEFAULT_PATH.to_string(),
            s3: None,
        }
    }
}

/// Limits applied when parsing criteria documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiltersConfig {
    pub max_json_bytes: usize,
    pub max_criteria: usize,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            max_json_bytes: FILTERS_DEFAULT_MAX_JSON_BYTES,
            max_criteria: FILTERS_DEFAULT_MAX_CRITERIA,
        }
    }
}

/// Metadata database configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub files: FilesConfig,
    pub filters: FiltersConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.querykit/querykit.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(cli, file_config)
    }

    /// Layer defaults, file config and CLI/env overrides
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_files = file_config.files.unwrap_or_default();
        let file_filters = file_config.filters.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();

        let storage = cli.files_storage.or(file_files.storage).unwrap_or_default();

        let file_s3 = file_files.s3.unwrap_or_default();
        let s3 = cli
            .files_s3_bucket
            .clone()
            .or(file_s3.bucket)
            .filter(|bucket| !bucket.trim().is_empty())
            .map(|bucket| S3Config {
                bucket,
                region: file_s3.region,
                endpoint: file_s3.endpoint,
            });

        let files = FilesConfig {
            storage,
            prefix: file_files
                .prefix
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_else(|| FILES_DEFAULT_PREFIX.to_string()),
            url_expiry_secs: cli
                .files_url_expiry_secs
                .or(file_files.url_expiry_secs)
                .unwrap_or(FILES_DEFAULT_URL_EXPIRY_SECS),
            filesystem_path: cli
                .files_path
                .clone()
                .or(file_files.filesystem.and_then(|fs| fs.path))
                .unwrap_or_else(|| FILES_DEFAULT_PATH.to_string()),
            s3,
        };

        let defaults = FiltersConfig::default();
        let filters = FiltersConfig {
            max_json_bytes: file_filters
                .max_json_bytes
                .unwrap_or(defaults.max_json_bytes),
            max_criteria: file_filters.max_criteria.unwrap_or(defaults.max_criteria),
        };

        let database = DatabaseConfig {
            path: expand_path(
                &cli.database_path
                    .clone()
                    .or(file_database.path)
                    .unwrap_or_else(|| SQLITE_DB_FILENAME.to_string()),
            ),
        };

        let config = Self {
            files,
            filters,
            database,
        };
        config.validate()?;

        tracing::debug!(
            storage = %config.files.storage,
            database = %config.database.path.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        // S3 bucket required when using S3 storage
        if self.files.storage == StorageBackend::S3 && self.files.s3.is_none() {
            anyhow::bail!(
                "Configuration error: files.s3.bucket is required (and non-empty) when files.storage is 's3'"
            );
        }

        if self.files.url_expiry_secs == 0 || self.files.url_expiry_secs > FILES_MAX_URL_EXPIRY_SECS
        {
            anyhow::bail!(
                "Configuration error: files.url_expiry_secs must be between 1 and {}",
                FILES_MAX_URL_EXPIRY_SECS
            );
        }

        if self.filters.max_json_bytes == 0 || self.filters.max_criteria == 0 {
            anyhow::bail!("Configuration error: filters limits must be greater than 0");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.querykit/querykit.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_storage_backend_serde() {
        let backend: StorageBackend = serde_json::from_str(r#""filesystem""#).unwrap();
        assert_eq!(backend, StorageBackend::Filesystem);

        let backend: StorageBackend = serde_json::from_str(r#""s3""#).unwrap();
        assert_eq!(backend, StorageBackend::S3);
    }

    #[test]
    fn test_storage_backend_display() {
        assert_eq!(StorageBackend::Filesystem.to_string(), "filesystem");
        assert_eq!(StorageBackend::S3.to_string(), "s3");
    }

    #[test]
    fn test_file_config_parse_full() {
        let config = parse(
            r#"{
                "files": {
                    "storage": "s3",
                    "prefix": "uploads",
                    "url_expiry_secs": 600,
                    "s3": { "bucket": "docs", "region": "eu-west-1" }
                },
                "filters": { "max_json_bytes": 1024, "max_criteria": 5 },
                "database": { "path": "/tmp/q.db" }
            }"#,
        );

        let files = config.files.as_ref().unwrap();
        assert_eq!(files.storage, Some(StorageBackend::S3));
        assert_eq!(files.prefix.as_deref(), Some("uploads"));
        assert_eq!(
            files.s3.as_ref().unwrap().region.as_deref(),
            Some("eu-west-1")
        );
        assert_eq!(config.filters.as_ref().unwrap().max_criteria, Some(5));
        assert_eq!(
            config.database.as_ref().unwrap().path.as_deref(),
            Some("/tmp/q.db")
        );
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config = parse("{}");
        assert!(config.files.is_none());
        assert!(config.filters.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let config = parse(r#"{ "filters": {}, "fliters": 1 }"#);
        assert_eq!(config.extra.get("fliters").unwrap(), 1);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = parse(
            r#"{
                "files": { "prefix": "base", "s3": { "bucket": "a", "region": "us-east-1" } },
                "filters": { "max_criteria": 10 }
            }"#,
        );
        let overlay = parse(
            r#"{
                "files": { "s3": { "bucket": "b" } },
                "filters": { "max_json_bytes": 2048 },
                "database": { "path": "over.db" }
            }"#,
        );
        base.merge(overlay);

        let files = base.files.as_ref().unwrap();
        assert_eq!(files.prefix.as_deref(), Some("base"));
        let s3 = files.s3.as_ref().unwrap();
        assert_eq!(s3.bucket.as_deref(), Some("b"));
        assert_eq!(s3.region.as_deref(), Some("us-east-1"));

        let filters = base.filters.as_ref().unwrap();
        assert_eq!(filters.max_criteria, Some(10));
        assert_eq!(filters.max_json_bytes, Some(2048));
        assert_eq!(
            base.database.as_ref().unwrap().path.as_deref(),
            Some("over.db")
        );
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_layers(&CliConfig::default(), FileConfig::default()).unwrap();

        assert_eq!(config.files.storage, StorageBackend::Filesystem);
        assert_eq!(config.files.prefix, FILES_DEFAULT_PREFIX);
        assert_eq!(config.files.url_expiry_secs, FILES_DEFAULT_URL_EXPIRY_SECS);
        assert_eq!(config.filters, FiltersConfig::default());
        assert!(config.database.path.ends_with(SQLITE_DB_FILENAME));
    }

    #[test]
    fn test_app_config_cli_override() {
        let cli = CliConfig {
            files_storage: Some(StorageBackend::S3),
            files_s3_bucket: Some("cli-bucket".to_string()),
            files_url_expiry_secs: Some(60),
            database_path: Some("/var/lib/querykit/meta.db".to_string()),
            ..CliConfig::default()
        };
        let file_config = parse(r#"{ "files": { "s3": { "bucket": "file-bucket" } } }"#);
        let config = AppConfig::from_layers(&cli, file_config).unwrap();

        assert_eq!(config.files.storage, StorageBackend::S3);
        assert_eq!(config.files.s3.unwrap().bucket, "cli-bucket");
        assert_eq!(config.files.url_expiry_secs, 60);
        assert_eq!(
            config.database.path,
            PathBuf::from("/var/lib/querykit/meta.db")
        );
    }

    #[test]
    fn test_prefix_slashes_trimmed() {
        let config =
            AppConfig::from_layers(&CliConfig::default(), parse(r#"{"files":{"prefix":"/a/b/"}}"#))
                .unwrap();
        assert_eq!(config.files.prefix, "a/b");
    }

    #[test]
    fn test_s3_requires_bucket() {
        let cli = CliConfig {
            files_storage: Some(StorageBackend::S3),
            ..CliConfig::default()
        };
        let err = AppConfig::from_layers(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("files.s3.bucket"));
    }

    #[test]
    fn test_blank_bucket_rejected() {
        let cli = CliConfig {
            files_storage: Some(StorageBackend::S3),
            files_s3_bucket: Some("  ".to_string()),
            ..CliConfig::default()
        };
        assert!(AppConfig::from_layers(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_url_expiry_bounds() {
        let cli = CliConfig {
            files_url_expiry_secs: Some(FILES_MAX_URL_EXPIRY_SECS + 1),
            ..CliConfig::default()
        };
        assert!(AppConfig::from_layers(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_zero_filter_limits_rejected() {
        let file_config = parse(r#"{ "filters": { "max_criteria": 0 } }"#);
        assert!(AppConfig::from_layers(&CliConfig::default(), file_config).is_err());
    }

    #[test]
    fn test_missing_config_path_fails() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/definitely/not/here/querykit.json")),
            ..CliConfig::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
