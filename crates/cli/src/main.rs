mod auth;
mod config;
mod context;
mod dashboard;
mod output;
mod submit;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tokentrack",
    version,
    about = "tokentrack CLI - track token usage and cost of AI prompts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Display name (prompted when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Check whether the backend is reachable
    Health,

    /// Sync, then print totals, the usage chart and recent activity
    Dashboard {
        /// Also print the raw responses of the last API exchange
        #[arg(long)]
        trace: bool,
    },

    /// List synced usage logs, most recent first
    Logs {
        /// Maximum number of logs to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Sync and write all usage logs to a dated CSV file
    Export {
        /// Directory to write the CSV into
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Send a prompt for processing and resync
    Submit {
        /// Model ID (defaults to `dashboard.default_model`)
        #[arg(long)]
        model: Option<String>,

        /// Prompt text
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },

    /// List the models prompts can be sent to
    Models,

    /// Show or set configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Update config values
    Set {
        /// Backend base URL, including the `/api` prefix
        #[arg(long)]
        server: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { email } => auth::run_login(email).await,
        Commands::Register { name, email } => auth::run_register(name, email).await,
        Commands::Logout => auth::run_logout(),
        Commands::Whoami => auth::run_whoami().await,
        Commands::Health => dashboard::run_health().await,
        Commands::Dashboard { trace } => dashboard::run_dashboard(trace).await,
        Commands::Logs { limit } => dashboard::run_logs(limit).await,
        Commands::Export { output } => dashboard::run_export(&output).await,
        Commands::Submit { model, prompt } => submit::run_submit(model, prompt).await,
        Commands::Models => config::show_models(),
        Commands::Config { action } => match action {
            ConfigAction::Show => config::show_config(),
            ConfigAction::Set { server, timeout } => config::set_config(server, timeout),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
