use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

use pagestore_core::PageData;
use pagestore_engine::{PageStore, StoreConfig, config::CONFIG_FILE_NAME};

const LOG_ENV: &str = "PAGESTORE_LOG";

#[derive(Parser)]
#[command(author, version, about = "Read and write editor page content", long_about = None)]
struct Cli {
    /// Config file (defaults to ./pagestore.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, or ":memory:"; overrides config and environment
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored page for a path
    Get { path: String },
    /// Create or replace the page for a path
    Save {
        path: String,
        /// JSON document; read from stdin when neither this nor --file is given
        #[arg(conflicts_with = "file")]
        data: Option<String>,
        /// Read the JSON document from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List stored pages
    List,
    /// Remove the page for a path
    Delete { path: String },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file, then `PAGESTORE_*` values from `lookup`, then `--database`.
fn load_config<F>(config: Option<&Path>, database: Option<&str>, lookup: F) -> Result<StoreConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    config.apply_overrides(lookup)?;
    if let Some(database) = database {
        config.database = Some(database.to_string());
    }
    Ok(config)
}

fn read_document(data: Option<String>, file: Option<PathBuf>, mut stdin: impl Read) -> Result<PageData> {
    let raw = match (data, file) {
        (Some(data), _) => data,
        (None, Some(file)) => std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?,
        (None, None) => {
            let mut buf = String::new();
            stdin.read_to_string(&mut buf)?;
            buf
        }
    };
    serde_json::from_str(&raw).map_err(|e| anyhow!("page data is not valid JSON: {e}"))
}

fn run(command: Commands, store: &mut PageStore, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Get { path } => {
            writeln!(out, "{}", serde_json::to_string_pretty(&store.get_page(&path)?)?)?;
        }
        Commands::Save { path, data, file } => {
            let document = read_document(data, file, std::io::stdin().lock())?;
            let outcome = store.save_page_detailed(&path, &document)?;
            writeln!(
                out,
                "{}",
                serde_json::json!({
                    "id": outcome.id,
                    "revision": outcome.revision,
                    "created": outcome.created,
                })
            )?;
        }
        Commands::List => {
            writeln!(out, "{}", serde_json::to_string_pretty(&store.list_pages()?)?)?;
        }
        Commands::Delete { path } => {
            let deleted = store.delete_page(&path)?;
            writeln!(out, "{}", serde_json::json!({ "deleted": deleted }))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.exists()));
    let config = load_config(
        config_path.as_deref(),
        cli.database.as_deref(),
        |key| std::env::var(key).ok(),
    )?;
    debug!(?config, "loaded configuration");

    let mut store = PageStore::open(&config)?;
    run(cli.command, &mut store, &mut std::io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagestore_engine::config::{ENV_BUSY_TIMEOUT_MS, ENV_DATABASE};
    use serde_json::{Value, json};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn run_to_json(command: Commands, store: &mut PageStore) -> Value {
        let mut out = Vec::new();
        run(command, store, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn config_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "database = \"file.db\"\nbusy_timeout_ms = 100\n");

        let config = load_config(Some(path.as_path()), None, no_env).unwrap();
        assert_eq!(config.database.as_deref(), Some("file.db"));
        assert_eq!(config.busy_timeout_ms, 100);
    }

    #[test]
    fn env_overrides_file_and_flag_overrides_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "database = \"file.db\"\nbusy_timeout_ms = 100\n");
        let env = |key: &str| match key {
            ENV_DATABASE => Some("env.db".to_string()),
            ENV_BUSY_TIMEOUT_MS => Some("7".to_string()),
            _ => None,
        };

        let config = load_config(Some(path.as_path()), None, env).unwrap();
        assert_eq!(config.database.as_deref(), Some("env.db"));
        assert_eq!(config.busy_timeout_ms, 7);

        let config = load_config(Some(path.as_path()), Some("flag.db"), env).unwrap();
        assert_eq!(config.database.as_deref(), Some("flag.db"));
        assert_eq!(config.busy_timeout_ms, 7);
    }

    #[test]
    fn no_sources_leaves_database_unset() {
        let config = load_config(None, None, no_env).unwrap();
        assert!(config.database.is_none());
        assert!(PageStore::open(&config).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("absent.toml").as_path()), None, no_env).is_err());
    }

    #[test]
    fn document_from_argument_wins() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.json");
        std::fs::write(&file, "{\"from\": \"file\"}").unwrap();

        let data = read_document(Some("{\"from\": \"arg\"}".into()), Some(file.clone()), "{}".as_bytes()).unwrap();
        assert_eq!(data, json!({"from": "arg"}));

        let data = read_document(None, Some(file), "{}".as_bytes()).unwrap();
        assert_eq!(data, json!({"from": "file"}));
    }

    #[test]
    fn document_from_stdin() {
        let data = read_document(None, None, "[1, 2]".as_bytes()).unwrap();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn invalid_json_rejected() {
        let err = read_document(Some("{not json".into()), None, "".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
        assert!(read_document(None, None, "".as_bytes()).is_err());
    }

    #[test]
    fn get_unknown_path_prints_null() {
        let mut store = PageStore::open_in_memory().unwrap();
        let out = run_to_json(Commands::Get { path: "/missing".into() }, &mut store);
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn save_get_and_delete() {
        let mut store = PageStore::open_in_memory().unwrap();
        let saved = run_to_json(
            Commands::Save {
                path: "/home".into(),
                data: Some("{\"v\": 1}".into()),
                file: None,
            },
            &mut store,
        );
        assert_eq!(saved["created"], json!(true));
        assert_eq!(saved["revision"], json!(1));

        let page = run_to_json(Commands::Get { path: "/home".into() }, &mut store);
        assert_eq!(page["data"], json!({"v": 1}));
        assert_eq!(page["path"], json!("/home"));

        let listed = run_to_json(Commands::List, &mut store);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let deleted = run_to_json(Commands::Delete { path: "/home".into() }, &mut store);
        assert_eq!(deleted, json!({"deleted": true}));
        let deleted = run_to_json(Commands::Delete { path: "/home".into() }, &mut store);
        assert_eq!(deleted, json!({"deleted": false}));
    }
}
