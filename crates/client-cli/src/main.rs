use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emby_portal::config::Config;
use emby_portal::tui;

mod commands;

const DEFAULT_LOG_FILTER: &str = "emby_portal=info";

#[derive(Parser)]
#[command(name = "emby-portal")]
#[command(about = "Emby subscription portal - sign up, manage your account and administer plans")]
#[command(version)]
struct Cli {
    /// Backend API URL (overrides env and config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether you are signed in and whether you are an admin
    Status,
    /// Sign in to the portal
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Create an account
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// Plan id to subscribe to (defaults to the cheapest monthly plan)
        #[arg(short, long)]
        plan: Option<String>,
    },
    /// Show your account and subscription
    Account {
        /// Print the billing portal link
        #[arg(long)]
        billing: bool,
    },
    /// List subscription plans
    Pricing {
        /// Show yearly plans instead of monthly ones
        #[arg(long)]
        yearly: bool,
    },
    /// Administer users and plans
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Frequently asked questions
    Support,
    /// How to set up the Emby app
    Setup,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// List users
    Users,
    /// Show portal statistics
    Stats,
    /// List all plans, including inactive ones
    Plans,
    /// Create a plan
    PlanCreate {
        #[arg(long)]
        name: String,
        /// Price in major units, e.g. 9.99
        #[arg(long)]
        price: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "usd")]
        currency: String,
        #[arg(long, default_value = "month")]
        interval: String,
    },
    /// Activate or deactivate a plan
    PlanToggle { plan_id: String },
    /// Archive (deactivate) a plan
    PlanArchive {
        plan_id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Enable or disable a user
    UserToggle { username: String },
    /// Delete a user
    UserDelete {
        username: String,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, timeout_secs)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // The shell owns the terminal, so logs go to a file instead
        let log_dir = Config::log_dir()?;
        let appender = tracing_appender::rolling::never(&log_dir, "emby-portal.log");
        let (writer, _guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
            .init();

        let ctx = commands::context(cli.api_url)?;
        tracing::info!("Starting navigation shell against {}", ctx.client.base_url());
        let handoff = tui::run(ctx).await?;
        if let Some(url) = handoff {
            println!("\x1b[1;36m🔗 Continue in your browser:\x1b[0m");
            println!("   \x1b[4m{}\x1b[0m", url);
        }
        return Ok(());
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match command {
        Commands::Config { action } => commands::config(action),
        Commands::Support => {
            commands::support();
            Ok(())
        }
        Commands::Setup => {
            commands::setup();
            Ok(())
        }
        command => {
            let ctx = commands::context(cli.api_url)?;
            match command {
                Commands::Status => commands::status(&ctx).await,
                Commands::Login { username } => commands::login(&ctx, username).await,
                Commands::Logout => commands::logout(&ctx).await,
                Commands::Signup { username, email, plan } => commands::signup(&ctx, username, email, plan).await,
                Commands::Account { billing } => commands::account(&ctx, billing).await,
                Commands::Pricing { yearly } => commands::pricing(&ctx, yearly).await,
                Commands::Admin { action } => commands::admin(&ctx, action).await,
                Commands::Config { .. } | Commands::Support | Commands::Setup => Ok(()),
            }
        }
    }
}
