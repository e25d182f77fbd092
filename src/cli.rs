use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use stockdeck::alerts::{AlertFeed, AlertStreamClient};
use stockdeck::api::{ApiClient, ApiError};
use stockdeck::auth::{AuthError, AuthService, AuthStore};
use stockdeck::config::{Config, load_config};
use stockdeck::session::{SessionEvent, SessionLifecycle, TimeoutPolicy};
use stockdeck::watchlist::WatchlistService;

#[derive(Parser)]
#[command(name = "stockdeck")]
#[command(about = "stockdeck - stock watchlist dashboard client")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Prompted for interactively when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and store the session tokens
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for interactively when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and revoke the refresh token
    Logout,
    /// Manage watchlists
    Watchlists {
        #[command(subcommand)]
        command: WatchlistCommands,
    },
    /// Show the portfolio-wide overview
    Portfolio,
    /// Follow the live alert feed
    Watch,
    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// List watchlists
    List,
    /// Create a watchlist
    Create { name: String },
    /// Delete a watchlist
    Delete { id: i64 },
    /// Show the stocks in a watchlist
    Overview { id: i64 },
}

pub fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run_async(cli))
}

async fn run_async(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        return Ok(());
    };

    if let Commands::Version = command {
        println!("stockdeck {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(cli.config)?;
    let store = Arc::new(AuthStore::new(AuthStore::default_path()));
    store.load().await.context("Failed to load stored tokens")?;

    let api = ApiClient::new(&config, Arc::clone(&store)).context("Failed to build API client")?;
    let auth = Arc::new(AuthService::new(api.clone(), Arc::clone(&store)));

    match command {
        Commands::Version => unreachable!("handled above"),
        Commands::Register {
            name,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            auth.register(name, &email, password)
                .await
                .map_err(friendly_auth_error)?;
            println!("Account created for {}. Run 'stockdeck login' to sign in.", email);
        }
        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let response = auth
                .login(&email, password)
                .await
                .map_err(friendly_auth_error)?;
            println!("Logged in as {}.", response.user.name);
        }
        Commands::Logout => match auth.logout().await {
            Ok(()) => println!("Logged out."),
            Err(AuthError::MissingRefreshToken) => println!("Not logged in."),
            Err(e) => {
                // Local session state is already destroyed at this point
                warn!(error = %e, "Server-side logout failed");
                println!("Logged out locally; server revocation failed: {}", e);
            }
        },
        Commands::Watchlists { command } => {
            require_login(&store).await?;
            let service = WatchlistService::new(api);
            run_watchlists(&service, command).await?;
        }
        Commands::Portfolio => {
            require_login(&store).await?;
            let service = WatchlistService::new(api);
            let overview = service.portfolio_overview().await?;
            println!(
                "Total value: {:.2}  Gain/loss: {:+.2}",
                overview.overall_total_value, overview.overall_total_gain_loss
            );
            for stock in &overview.stocks {
                println!(
                    "  {}  last dividend {} on {} (yield {:.2}%)",
                    stock.symbol,
                    stock.most_recent_dividend.amount,
                    stock.most_recent_dividend.payment_date,
                    stock.most_recent_dividend.dividend_yield
                );
            }
        }
        Commands::Watch => {
            require_login(&store).await?;
            watch(&config, store, auth).await?;
        }
    }

    Ok(())
}

async fn run_watchlists(service: &WatchlistService, command: WatchlistCommands) -> Result<()> {
    match command {
        WatchlistCommands::List => {
            let watchlists = service.list().await?;
            if watchlists.is_empty() {
                println!("No watchlists yet. Create one with 'stockdeck watchlists create <name>'.");
            }
            for watchlist in watchlists {
                println!("{:>4}  {}", watchlist.id, watchlist.name);
            }
        }
        WatchlistCommands::Create { name } => {
            let watchlist = service.create(name).await?;
            println!("Created watchlist {} (id {}).", watchlist.name, watchlist.id);
        }
        WatchlistCommands::Delete { id } => {
            service.delete(id).await?;
            println!("Deleted watchlist {}.", id);
        }
        WatchlistCommands::Overview { id } => {
            let stocks = service.stocks(id).await?;
            for stock in stocks {
                println!(
                    "{:<6} {:<24} {:>10.2} {:>+8.2}",
                    stock.symbol, stock.name, stock.price, stock.change
                );
            }
        }
    }
    Ok(())
}

/// Live alert feed with the session lifecycle active.
///
/// Stdin lines count as user activity; a line of `r` forces a manual
/// stream reconnect; Ctrl+C exits. Every exit path tears down the stream
/// and the lifecycle.
async fn watch(config: &Config, store: Arc<AuthStore>, auth: Arc<AuthService>) -> Result<()> {
    let lifecycle = SessionLifecycle::new(TimeoutPolicy::from_config(config), auth);
    lifecycle.init().await;
    let mut events = lifecycle.subscribe();

    let feed = Arc::new(AlertFeed::new());
    let stream = AlertStreamClient::new(config, store, Arc::clone(&feed));
    stream.connect().await;

    println!("Watching alerts. Press Enter to stay active, 'r' + Enter to reconnect, Ctrl+C to quit.");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut printed = 0usize;
    let mut ticker = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down.");
                break;
            }
            event = events.recv() => {
                if let Ok(SessionEvent::Expired(reason)) = event {
                    eprintln!("Session expired ({}). Please log in again.", reason);
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    lifecycle.record_activity().await;
                    if line.trim() == "r" {
                        println!("Reconnecting...");
                        stream.reconnect().await;
                    }
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = ticker.tick() => {
                let alerts = feed.snapshot().await;
                if alerts.len() > printed {
                    // New alerts sit at the front; print oldest-new first
                    for alert in alerts[..alerts.len() - printed].iter().rev() {
                        println!(
                            "[{}] {} {}: {} (trigger {:.2}, now {:.2})",
                            alert.timestamp.format("%H:%M:%S"),
                            alert.severity.to_uppercase(),
                            alert.symbol,
                            alert.message,
                            alert.trigger_price,
                            alert.current_price
                        );
                    }
                    printed = alerts.len();
                }
            }
        }
    }

    stream.shutdown().await;
    lifecycle.cleanup().await;
    Ok(())
}

async fn require_login(store: &Arc<AuthStore>) -> Result<()> {
    if !store.is_authenticated().await {
        bail!("Not logged in (or session expired). Run 'stockdeck login' first.");
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => inquire::Password::new("Password:")
            .without_confirmation()
            .prompt()
            .context("Failed to read password"),
    }
}

fn friendly_auth_error(err: AuthError) -> anyhow::Error {
    match err {
        AuthError::Api(ApiError::Auth { .. }) => {
            anyhow::anyhow!("Invalid credentials")
        }
        AuthError::Api(ApiError::RateLimited) => {
            anyhow::anyhow!("Too many requests. Please try again later.")
        }
        other => other.into(),
    }
}
