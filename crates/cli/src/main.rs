// Planilla CLI - personnel record grids against the backend

mod edit;
mod exit_codes;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use planilla_client::{BackendClient, ClientError};
use planilla_config::{ConfigError, FichaConfig};
use planilla_core::{DescriptorError, GridId, Page, PhotoLookup, RowLifecycle};

use exit_codes::{
    client_exit_code, EXIT_CONFIG, EXIT_CONFIG_GRID, EXIT_EDIT_UNSAVED, EXIT_ERROR,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "planilla")]
#[command(about = "Personnel record grids: list, inspect and edit rows against the backend")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: <config dir>/planilla/config.json)
    #[arg(long, global = true, env = "PLANILLA_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides `baseUrl` from the config file)
    #[arg(long, global = true, env = "PLANILLA_BASE_URL")]
    base_url: Option<String>,

    /// Log in as this user before running the command
    #[arg(long, global = true, env = "PLANILLA_USER")]
    user: Option<String>,

    /// Password for --user
    #[arg(long, global = true, env = "PLANILLA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the records of a grid's listing endpoint
    #[command(after_help = "\
Examples:
  planilla list
  planilla list --grid tablaAcademica --json")]
    List {
        /// Grid id
        #[arg(long, short = 'g', default_value = "tablaEmpleados")]
        grid: String,

        /// Print the raw JSON records
        #[arg(long)]
        json: bool,
    },

    /// Print the record card of one employee
    Show {
        /// Identifying value (DPI)
        dpi: String,

        /// Print the card as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print where an employee's photo lives
    Photo {
        dpi: String,
    },

    /// Upload a photo (png, jpg, jpeg, gif, webp)
    UploadPhoto {
        dpi: String,
        file: PathBuf,
    },

    /// Remove an employee's photo
    RemovePhoto {
        dpi: String,
    },

    /// Interactive editing session (reads commands from stdin)
    #[command(after_help = "\
Examples:
  planilla edit
  planilla edit -g tablaEmpleados -g tablaMedica
  printf 'dpick tablaEmpleados 1\\nset 2 Ana\\nsave\\n' | planilla edit

Type `help` inside the session for the command list.")]
    Edit {
        /// Grids to put on the page (default: all configured grids)
        #[arg(long = "grid", short = 'g')]
        grids: Vec<String>,

        /// Start with empty grids instead of loading listings
        #[arg(long)]
        no_load: bool,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options shared by every command.
struct Globals {
    config: Option<PathBuf>,
    base_url: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

fn main() -> ExitCode {
    init_logging();

    let Cli { config, base_url, user, password, command } = Cli::parse();
    let globals = Globals { config, base_url, user, password };

    let result = match command {
        None => {
            eprintln!("Usage: planilla <command> [options]");
            eprintln!("       planilla --help for more information");
            Ok(())
        }
        Some(Commands::Config { command }) => cmd_config(&globals, command),
        Some(command) => run_backend_command(&globals, command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Log records from every crate go to stderr; `PLANILLA_LOG` sets the
/// filter (default `warn`).
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("PLANILLA_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        let hint = match &err {
            ClientError::Network(_) => {
                Some("check `baseUrl` in the config file or pass --base-url".to_string())
            }
            ClientError::Http(401 | 403, _) => Some("log in with --user/--password".to_string()),
            _ => None,
        };
        Self { code: client_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self {
            code: EXIT_CONFIG,
            message: err.to_string(),
            hint: Some("run `planilla config init --force` to rewrite the defaults".to_string()),
        }
    }
}

impl From<DescriptorError> for CliError {
    fn from(err: DescriptorError) -> Self {
        Self { code: EXIT_CONFIG_GRID, message: err.to_string(), hint: None }
    }
}

// ── Setup ───────────────────────────────────────────────────────────

fn config_path(globals: &Globals) -> PathBuf {
    globals.config.clone().unwrap_or_else(FichaConfig::config_path)
}

fn load_config(globals: &Globals) -> Result<FichaConfig, CliError> {
    let mut config = match &globals.config {
        Some(path) => FichaConfig::load_from(path)?,
        None => FichaConfig::load()?,
    };
    if let Some(base_url) = &globals.base_url {
        config.base_url = base_url.clone();
    }
    Ok(config)
}

fn connect(globals: &Globals, config: &FichaConfig) -> Result<BackendClient, CliError> {
    let client = BackendClient::from_config(config)?;
    match (&globals.user, &globals.password) {
        (Some(user), Some(password)) => client.login(user, password)?,
        (Some(_), None) => return Err(CliError::usage("--password is required with --user")),
        (None, _) => {}
    }
    Ok(client)
}

fn run_backend_command(globals: &Globals, command: Commands) -> Result<(), CliError> {
    let config = load_config(globals)?;
    let client = connect(globals, &config)?;

    match command {
        Commands::List { grid, json } => cmd_list(&config, &client, &grid, json),
        Commands::Show { dpi, json } => cmd_show(&client, &dpi, json),
        Commands::Photo { dpi } => cmd_photo(&config, &client, &dpi),
        Commands::UploadPhoto { dpi, file } => cmd_upload_photo(&client, &dpi, &file),
        Commands::RemovePhoto { dpi } => cmd_remove_photo(&client, &dpi),
        Commands::Edit { grids, no_load } => cmd_edit(&config, &client, &grids, no_load),
        Commands::Config { command } => cmd_config(globals, command),
    }
}

// ── Commands ────────────────────────────────────────────────────────

fn cmd_list(config: &FichaConfig, client: &BackendClient, grid: &str, json: bool) -> Result<(), CliError> {
    let descriptor = config
        .grid(grid)
        .ok_or_else(|| CliError::usage(format!("unknown grid '{}'", grid)))?
        .to_descriptor(&config.api_empleados)?;
    let records = client.list_records(descriptor.endpoint())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(&records).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{}", text).map_err(|e| CliError::io(e.to_string()))?;
        return Ok(());
    }

    let mut page = Page::new();
    page.add_grid(descriptor.id().clone());
    page.load_records(&descriptor, &records);
    if let Some(table) = page.table(descriptor.id()) {
        edit::write_table(&descriptor, table, &mut out).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

fn cmd_show(client: &BackendClient, dpi: &str, json: bool) -> Result<(), CliError> {
    let ficha = client.fetch_ficha(dpi)?;

    if json {
        let map: serde_json::Map<String, serde_json::Value> = ficha
            .fields()
            .iter()
            .map(|(field, value)| (field.to_string(), serde_json::Value::String(value.clone())))
            .collect();
        let text = serde_json::to_string_pretty(&map).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    for (field, value) in ficha.fields() {
        let value = if value.is_empty() { "-" } else { value.as_str() };
        println!("{:<18} {}", field, value);
    }
    Ok(())
}

fn cmd_photo(config: &FichaConfig, client: &BackendClient, dpi: &str) -> Result<(), CliError> {
    match client.lookup_photo(dpi)? {
        PhotoLookup::Found { location } => println!("{}", client.url(&location)),
        PhotoLookup::Missing => {
            println!("no photo for {} (placeholder: {})", dpi.trim(), client.url(&config.placeholder))
        }
    }
    Ok(())
}

fn cmd_upload_photo(client: &BackendClient, dpi: &str, file: &Path) -> Result<(), CliError> {
    let landed = client.upload_photo(dpi, file)?;
    println!("Photo uploaded: {}", landed);
    Ok(())
}

fn cmd_remove_photo(client: &BackendClient, dpi: &str) -> Result<(), CliError> {
    client.remove_photo(dpi)?;
    println!("Photo removed");
    Ok(())
}

fn cmd_edit(
    config: &FichaConfig,
    client: &BackendClient,
    grids: &[String],
    no_load: bool,
) -> Result<(), CliError> {
    let lifecycle = build_page(config, grids, |endpoint| {
        if no_load {
            return Ok(Vec::new());
        }
        client.list_records(endpoint)
    })?;

    let mut session = edit::EditSession::new(lifecycle, client, client, client);
    eprintln!("planilla edit session; type `help` for commands");
    let stdin = io::stdin();
    let stdout = io::stdout();
    session
        .run(stdin.lock(), &mut stdout.lock())
        .map_err(|e| CliError::io(e.to_string()))?;

    if session.lifecycle().state().is_editing() {
        return Err(CliError {
            code: EXIT_EDIT_UNSAVED,
            message: "input ended with unsaved edits".to_string(),
            hint: Some("finish with `save` or `cancel`".to_string()),
        });
    }
    Ok(())
}

/// Put the selected grids on a fresh page, register them, and fill each
/// from `load`. A listing that fails to load leaves its grid empty.
fn build_page(
    config: &FichaConfig,
    grids: &[String],
    load: impl Fn(&str) -> Result<Vec<serde_json::Value>, ClientError>,
) -> Result<RowLifecycle, CliError> {
    let selected: Vec<_> = if grids.is_empty() {
        config.grids.iter().collect()
    } else {
        grids
            .iter()
            .map(|id| {
                config
                    .grid(id)
                    .ok_or_else(|| CliError::usage(format!("unknown grid '{}'", id)))
            })
            .collect::<Result<_, _>>()?
    };

    let mut lifecycle = RowLifecycle::new(config.placeholder.clone());
    for grid in &selected {
        let descriptor = grid.to_descriptor(&config.api_empleados)?;
        let endpoint = descriptor.endpoint().to_string();
        let id = GridId::new(grid.id.as_str());

        lifecycle.add_grid(id.clone());
        lifecycle.register(descriptor);
        match load(&endpoint) {
            Ok(records) => {
                if let Ok(count) = lifecycle.load_records(&id, &records) {
                    log::info!("loaded {} rows into {}", count, id);
                }
            }
            Err(e) => log::warn!("could not load {} from {}: {}", id, endpoint, e),
        }
    }
    Ok(lifecycle)
}

fn cmd_config(globals: &Globals, command: ConfigCommands) -> Result<(), CliError> {
    let path = config_path(globals);
    match command {
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Show => {
            let config = load_config(globals)?;
            let text = serde_json::to_string_pretty(&config).map_err(|e| CliError::io(e.to_string()))?;
            println!("{}", text);
        }
        ConfigCommands::Init { force } => {
            init_config(&path, force)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::usage(format!("{} already exists", path.display()))
            .with_hint("pass --force to overwrite it"));
    }
    FichaConfig::default().save_to(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_edit_with_grids() {
        let cli = Cli::try_parse_from([
            "planilla", "--base-url", "http://h:1", "edit", "-g", "tablaEmpleados", "-g", "tablaMedica",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://h:1"));
        match cli.command {
            Some(Commands::Edit { grids, no_load }) => {
                assert_eq!(grids, vec!["tablaEmpleados", "tablaMedica"]);
                assert!(!no_load);
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planilla").join("config.json");

        init_config(&path, false).unwrap();
        assert_eq!(FichaConfig::load_from(&path).unwrap(), FichaConfig::default());

        let err = init_config(&path, false).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        init_config(&path, true).unwrap();
    }

    #[test]
    fn test_build_page_loads_selected_grids() {
        let config = FichaConfig::default();
        let grids = vec!["tablaEmpleados".to_string(), "tablaConyuge".to_string()];
        let lifecycle = build_page(&config, &grids, |endpoint| {
            assert_eq!(endpoint, "/api/empleados");
            Ok(vec![serde_json::json!({"Numero de DPI": "1234", "Nombre": "Ana"})])
        })
        .unwrap();

        assert_eq!(lifecycle.registry().len(), 2);
        let table = lifecycle.page().table(&GridId::from("tablaEmpleados")).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].cell(1), Some("Ana"));
        assert_eq!(table.rows()[0].len(), 20);
    }

    #[test]
    fn test_build_page_tolerates_failed_listing() {
        let config = FichaConfig::default();
        let lifecycle = build_page(&config, &[], |_| Err(ClientError::Network("refused".into()))).unwrap();
        assert_eq!(lifecycle.registry().len(), 6);
        assert!(lifecycle.page().tables().iter().all(|t| t.is_empty()));
    }

    #[test]
    fn test_build_page_unknown_grid_is_usage_error() {
        let config = FichaConfig::default();
        let err = build_page(&config, &["tablaFantasma".to_string()], |_| Ok(Vec::new())).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }

    #[test]
    fn test_client_error_exit_codes_and_hints() {
        let err = CliError::from(ClientError::Network("refused".into()));
        assert_eq!(err.code, exit_codes::EXIT_BACKEND_NETWORK);
        assert!(err.hint.is_some());

        let err = CliError::from(ClientError::Http(401, String::new()));
        assert_eq!(err.code, exit_codes::EXIT_BACKEND_HTTP);
        assert_eq!(err.hint.as_deref(), Some("log in with --user/--password"));
    }
}
