//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter (e.g. `reportapp_core=debug`).
const LOG_ENV: &str = "REPORTAPP_LOG";

#[derive(Parser)]
#[command(name = "reportapp")]
#[command(version)]
#[command(about = "File and track citizen reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "REPORTAPP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Show whether a session is stored
    Status,
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Ask for a password reset email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Show or change the signed-in user's profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// List report categories
    Categories,
    /// Manage your reports
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Print name and email
    Show,
    /// Change name and password
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
}

/// Report fields shared by `create` and `update`.
#[derive(clap::Args, Debug, Clone, Default)]
struct ReportFields {
    #[arg(long)]
    title: Option<String>,
    /// Category id (see `reportapp categories`)
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(clap::Subcommand)]
enum ReportCommands {
    /// List your reports
    List,
    /// File a new report
    Create {
        #[command(flatten)]
        fields: ReportFields,
        /// Street address (overrides the geocoded one)
        #[arg(long)]
        location: Option<String>,
        /// Image reference to attach
        #[arg(long)]
        image: Option<String>,
        /// Latitude to reverse-geocode into the address
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude to reverse-geocode into the address
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Edit one of your reports
    Update {
        #[arg(value_name = "REPORT_ID")]
        id: i64,
        #[command(flatten)]
        fields: ReportFields,
    },
    /// Delete one of your reports
    Delete {
        #[arg(value_name = "REPORT_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the report service base URL
    SetApiUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Loaded per command so `config` subcommands work with a broken file.
    let app = commands::App::load;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&app()?, &email, &password).await
        }
        Commands::Logout => commands::auth::logout(&app()?).await,
        Commands::Status => commands::auth::status(&app()?).await,
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            commands::auth::register(&app()?, &name, &email, &password, &confirm_password).await
        }
        Commands::ResetPassword { email } => commands::auth::reset_password(&app()?, &email).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile::show(&app()?).await,
            ProfileCommands::Update {
                name,
                password,
                confirm_password,
            } => commands::profile::update(&app()?, &name, &password, &confirm_password).await,
        },

        Commands::Categories => commands::reports::categories(&app()?).await,

        Commands::Reports { command } => match command {
            ReportCommands::List => commands::reports::list(&app()?).await,
            ReportCommands::Create {
                fields,
                location,
                image,
                lat,
                lon,
            } => {
                commands::reports::create(
                    &app()?,
                    commands::reports::CreateOptions {
                        title: fields.title,
                        category: fields.category,
                        description: fields.description,
                        location,
                        image,
                        coordinates: lat.zip(lon),
                    },
                )
                .await
            }
            ReportCommands::Update { id, fields } => {
                commands::reports::update(
                    &app()?,
                    id,
                    fields.title,
                    fields.category,
                    fields.description,
                )
                .await
            }
            ReportCommands::Delete { id } => commands::reports::delete(&app()?, id).await,
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetApiUrl { url } => commands::config::set_api_url(&url),
        },
    }
}
