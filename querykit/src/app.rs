//! Core application

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::cli::{self, Commands, FilesCommands};
use crate::core::config::{AppConfig, FiltersConfig};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::files::{FileService, FileUpload};
use crate::data::filters::{Criterion, parse_criteria, to_predicate};
use crate::data::sql::{Backend, Schema, SqlCriteriaBuilder};
use crate::data::{FileRepository, SqliteService};

pub struct CoreApp {
    pub config: AppConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: AppConfig::load(&cli_config)?,
        };

        match command {
            Commands::Sql {
                entity,
                schema,
                criteria,
                dialect,
            } => app.sql(&entity, &schema, &criteria, dialect),
            Commands::Check { criteria } => app.check(&criteria),
            Commands::Files { command } => app.files(command).await,
        }
    }

    fn sql(&self, entity: &str, schema: &Path, criteria: &str, dialect: Backend) -> Result<()> {
        let schema_json = std::fs::read_to_string(schema)
            .with_context(|| format!("Failed to read schema file: {}", schema.display()))?;
        let schema = Schema::from_json(&schema_json)
            .with_context(|| format!("Invalid schema file: {}", schema.display()))?;
        let criteria = load_criteria(criteria, &self.config.filters)?;

        let (sql, params) = render_select(&schema, entity, &criteria, dialect)?;
        println!("{sql}");
        for line in param_lines(&params) {
            println!("{line}");
        }
        Ok(())
    }

    fn check(&self, criteria: &str) -> Result<()> {
        let criteria = load_criteria(criteria, &self.config.filters)?;
        for criterion in &criteria {
            println!("{}", describe(criterion));
        }
        println!("{} criteria OK", criteria.len());
        Ok(())
    }

    async fn files(&self, command: FilesCommands) -> Result<()> {
        let database = Arc::new(
            SqliteService::init(&self.config.database.path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open database: {}",
                        self.config.database.path.display()
                    )
                })?,
        );
        let repository: Arc<dyn FileRepository> = Arc::new(Arc::clone(&database));
        let files = FileService::new(self.config.files.clone(), repository)
            .await
            .context("Failed to initialize file service")?;

        let result = match command {
            FilesCommands::Upload { path } => upload(&files, &path).await,
            FilesCommands::Url { id } => files
                .get_file_url(id)
                .await
                .map(|url| println!("{url}"))
                .with_context(|| format!("Failed to get URL for file {id}")),
            FilesCommands::Delete { id } => files
                .delete_file(id)
                .await
                .map(|()| println!("Deleted {id}"))
                .with_context(|| format!("Failed to delete file {id}")),
        };

        database.close().await;
        result
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn upload(files: &FileService, path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    let upload = FileUpload::new(name, data).with_content_type(content_type.essence_str());
    let id = files
        .upload_file(&upload)
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    println!("{id}");
    Ok(())
}

/// Criteria from an inline JSON argument or `@path`
fn load_criteria(arg: &str, limits: &FiltersConfig) -> Result<Vec<Criterion>> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read criteria file: {path}"))?,
        None => arg.to_string(),
    };
    parse_criteria(&json, limits).context("Invalid criteria")
}

/// SELECT statement and bound parameters for criteria over `entity`
fn render_select(
    schema: &Schema,
    entity: &str,
    criteria: &[Criterion],
    dialect: Backend,
) -> Result<(String, Vec<String>)> {
    let mut builder = SqlCriteriaBuilder::new(schema, dialect, entity)
        .with_context(|| format!("Unknown entity: {entity}"))?;
    let root = builder.root();
    let predicate = to_predicate(&root, criteria, &mut builder).context("Invalid criteria")?;

    let query = builder.into_query(predicate);
    let params = query.params().iter().map(ToString::to_string).collect();
    Ok((query.to_sql(), params))
}

/// Bound parameters labelled by 1-based position, independent of placeholder syntax
fn param_lines(params: &[String]) -> Vec<String> {
    params
        .iter()
        .enumerate()
        .map(|(i, param)| format!("  [{}] {}", i + 1, param))
        .collect()
}

fn describe(criterion: &Criterion) -> String {
    let value = serde_json::to_string(criterion.value()).unwrap_or_default();
    if criterion.value().is_absent() {
        format!("{} {}", criterion.key(), criterion.operator())
    } else {
        format!("{} {} {}", criterion.key(), criterion.operator(), value)
    }
}
