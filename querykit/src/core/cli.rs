use clap::{Parser, Subcommand};

use std::path::PathBuf;

use uuid::Uuid;

use super::config::StorageBackend;
use super::constants::{
    ENV_CONFIG, ENV_DATABASE_PATH, ENV_FILES_PATH, ENV_FILES_S3_BUCKET, ENV_FILES_STORAGE,
    ENV_FILES_URL_EXPIRY_SECS,
};
use crate::data::sql::Backend;

#[derive(Parser)]
#[command(name = "querykit")]
#[command(version, about = "Filter criteria to SQL predicates, plus file storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// File storage backend (filesystem or s3)
    #[arg(long, global = true, env = ENV_FILES_STORAGE, value_parser = parse_storage_backend)]
    pub files_storage: Option<StorageBackend>,

    /// Root directory for the filesystem storage backend
    #[arg(long, global = true, env = ENV_FILES_PATH)]
    pub files_path: Option<String>,

    /// S3 bucket for the s3 storage backend
    #[arg(long, global = true, env = ENV_FILES_S3_BUCKET)]
    pub files_s3_bucket: Option<String>,

    /// Lifetime of generated file URLs in seconds
    #[arg(long, global = true, env = ENV_FILES_URL_EXPIRY_SECS)]
    pub files_url_expiry_secs: Option<u64>,

    /// SQLite database holding file metadata
    #[arg(long, global = true, env = ENV_DATABASE_PATH)]
    pub database_path: Option<String>,
}

/// Parse storage backend from CLI/env string
fn parse_storage_backend(s: &str) -> Result<StorageBackend, String> {
    match s.to_lowercase().as_str() {
        "filesystem" => Ok(StorageBackend::Filesystem),
        "s3" => Ok(StorageBackend::S3),
        _ => Err(format!(
            "Invalid storage backend '{}'. Valid options: filesystem, s3",
            s
        )),
    }
}

/// Parse SQL dialect from CLI string
fn parse_dialect(s: &str) -> Result<Backend, String> {
    s.parse()
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Render criteria as a SELECT for an entity
    Sql {
        /// Entity to select from, as named in the schema
        #[arg(long, short = 'e')]
        entity: String,

        /// Schema JSON file describing entities, fields and relations
        #[arg(long, short = 's')]
        schema: PathBuf,

        /// Criteria JSON array, or @path to read it from a file
        #[arg(long)]
        criteria: String,

        /// SQL dialect (sqlite or postgres)
        #[arg(long, default_value = "sqlite", value_parser = parse_dialect)]
        dialect: Backend,
    },
    /// Validate criteria without a schema
    Check {
        /// Criteria JSON array, or @path to read it from a file
        #[arg(long)]
        criteria: String,
    },
    /// File storage commands
    Files {
        #[command(subcommand)]
        command: FilesCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum FilesCommands {
    /// Store a local file and print its id
    Upload {
        path: PathBuf,
    },
    /// Print a download URL for a stored file
    Url {
        id: Uuid,
    },
    /// Delete a stored file and its metadata
    Delete {
        id: Uuid,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub files_storage: Option<StorageBackend>,
    pub files_path: Option<String>,
    pub files_s3_bucket: Option<String>,
    pub files_url_expiry_secs: Option<u64>,
    pub database_path: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        files_storage: cli.files_storage,
        files_path: cli.files_path,
        files_s3_bucket: cli.files_s3_bucket,
        files_url_expiry_secs: cli.files_url_expiry_secs,
        database_path: cli.database_path,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_storage_backend() {
        assert_eq!(parse_storage_backend("S3"), Ok(StorageBackend::S3));
        assert_eq!(
            parse_storage_backend("filesystem"),
            Ok(StorageBackend::Filesystem)
        );
        assert!(parse_storage_backend("ftp").is_err());
    }

    #[test]
    fn test_sql_command() {
        let cli = Cli::try_parse_from([
            "querykit",
            "sql",
            "--entity",
            "person",
            "--schema",
            "schema.json",
            "--criteria",
            "[]",
            "--dialect",
            "postgres",
        ])
        .unwrap();

        match cli.command {
            Commands::Sql {
                entity, dialect, ..
            } => {
                assert_eq!(entity, "person");
                assert_eq!(dialect, Backend::Postgres);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_dialect_defaults_to_sqlite() {
        let cli = Cli::try_parse_from([
            "querykit", "sql", "-e", "person", "-s", "schema.json", "--criteria", "[]",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sql {
                dialect: Backend::Sqlite,
                ..
            }
        ));
    }

    #[test]
    fn test_files_url_requires_uuid() {
        assert!(Cli::try_parse_from(["querykit", "files", "url", "not-a-uuid"]).is_err());

        let cli = Cli::try_parse_from([
            "querykit",
            "files",
            "url",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Files {
                command: FilesCommands::Url { .. }
            }
        ));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "querykit",
            "check",
            "--criteria",
            "[]",
            "--files-storage",
            "s3",
        ])
        .unwrap();
        assert_eq!(cli.files_storage, Some(StorageBackend::S3));
    }
}
