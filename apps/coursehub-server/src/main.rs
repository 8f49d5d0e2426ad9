use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, AppConfigProvider, CliArgs};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use accounts::Accounts;
use api_ingress::ApiIngress;
use courses::Courses;
use modkit::{ModuleCtxBuilder, ModuleRegistry, RunOptions, ShutdownOptions};
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// Adapter to make AppConfigProvider implement modkit::ConfigProvider
struct ModkitConfigAdapter(AppConfigProvider);

impl modkit::ConfigProvider for ModkitConfigAdapter {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get_module_config(module_name)
    }
}

/// CourseHub Server - online courses backend
#[derive(Parser)]
#[command(name = "coursehub-server")]
#[command(about = "CourseHub Server - online courses backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Apply database migrations and exit
    Migrate,
    /// Create an administrator, or promote an existing account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Delete all payments, lessons and courses
    PurgeCatalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    bind_ingress_to_server(&mut config);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("CourseHub Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config).await,
        Commands::Migrate => migrate(config, args).await,
        Commands::CreateAdmin { email, password } => {
            create_admin(config, args, &email, &password).await
        }
        Commands::PurgeCatalog => purge_catalog(config, args).await,
    }
}

/// `server.host:port` wins over `modules.api_ingress.bind_addr`.
fn bind_ingress_to_server(config: &mut AppConfig) {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));
    if let Some(obj) = section.as_object_mut() {
        obj.insert("bind_addr".to_string(), serde_json::Value::String(addr));
    }
}

async fn connect_db(config: &AppConfig, args: &CliArgs) -> Result<Option<DatabaseConnection>> {
    let Some(db_config) = config.database.clone() else {
        if args.mock {
            return connect("sqlite::memory:", Some(1), None).await.map(Some);
        }
        tracing::warn!("No database configuration found, running without database");
        return Ok(None);
    };

    let base_dir = PathBuf::from(&config.server.home_dir);
    let dsn = db_config.resolve_url(&base_dir, args.mock)?;
    // Every pooled connection to `sqlite::memory:` is its own database.
    let max_conns = if args.mock { Some(1) } else { db_config.max_conns };
    connect(&dsn, max_conns, db_config.busy_timeout_ms).await.map(Some)
}

async fn connect(
    dsn: &str,
    max_conns: Option<u32>,
    busy_timeout_ms: Option<u32>,
) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(dsn.to_string());
    opts.acquire_timeout(Duration::from_secs(5)).sqlx_logging(false);
    if let Some(n) = max_conns {
        opts.max_connections(n);
    }
    if let Some(ms) = busy_timeout_ms {
        let busy = Duration::from_millis(u64::from(ms));
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy));
    }

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to '{dsn}'"))?;
    tracing::info!(backend = ?db.get_database_backend(), "Connected to database");
    Ok(db)
}

struct Modules {
    ingress: Arc<ApiIngress>,
    accounts: Arc<Accounts>,
    courses: Arc<Courses>,
}

impl Modules {
    fn new() -> Self {
        Self {
            ingress: Arc::new(ApiIngress::default()),
            accounts: Arc::new(Accounts::default()),
            courses: Arc::new(Courses::default()),
        }
    }

    /// Init order matters: courses resolves the accounts client during init.
    fn registry(&self) -> Result<ModuleRegistry> {
        let registry = ModuleRegistry::builder()
            .module(api_ingress::MODULE_NAME, self.ingress.clone())
            .rest_host(self.ingress.clone())
            .stateful(self.ingress.clone())
            .module(accounts::MODULE_NAME, self.accounts.clone())
            .db(self.accounts.clone())
            .rest(self.accounts.clone())
            .stateful(self.accounts.clone())
            .module(courses::MODULE_NAME, self.courses.clone())
            .db(self.courses.clone())
            .rest(self.courses.clone())
            .build()?;
        Ok(registry)
    }
}

fn config_provider(config: &AppConfig) -> Arc<ModkitConfigAdapter> {
    Arc::new(ModkitConfigAdapter(AppConfigProvider::new(config.clone())))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let db = connect_db(&config, &args).await?;
    let modules = Modules::new();

    let run_options = RunOptions {
        modules_cfg: config_provider(&config),
        db,
        registry: modules.registry()?,
        shutdown: ShutdownOptions::Signals,
        client_hub: None,
    };

    modkit::run(run_options).await
}

/// Runs init and migrations without serving; returns the initialized modules.
async fn prepare(config: &AppConfig, args: &CliArgs) -> Result<Modules> {
    let db = connect_db(config, args)
        .await?
        .context("this command needs a database section in the config")?;
    let modules = Modules::new();
    let registry = modules.registry()?;

    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_db(db.clone())
        .with_config_provider(config_provider(config))
        .build();
    registry.run_init_phase(&ctx).await?;
    registry.run_db_phase(&db).await?;
    Ok(modules)
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    Modules::new().registry()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn migrate(config: AppConfig, args: CliArgs) -> Result<()> {
    prepare(&config, &args).await?;
    println!("Migrations applied");
    Ok(())
}

async fn create_admin(config: AppConfig, args: CliArgs, email: &str, password: &str) -> Result<()> {
    let modules = prepare(&config, &args).await?;
    let user = modules
        .accounts
        .service()?
        .create_admin(email, password)
        .await
        .context("create-admin failed")?;
    tracing::info!(user_id = user.id, "Administrator ready");
    println!("Administrator {} (id {}) is ready", user.email, user.id);
    Ok(())
}

async fn purge_catalog(config: AppConfig, args: CliArgs) -> Result<()> {
    let modules = prepare(&config, &args).await?;
    let stats = modules
        .courses
        .service()?
        .purge_catalog()
        .await
        .context("purge-catalog failed")?;
    println!(
        "Deleted {} payments, {} lessons, {} courses",
        stats.payments, stats.lessons, stats.courses
    );
    Ok(())
}
