//! scanpay - QR payment client
//!
//! Scan a payment code with the camera and pay it from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use scanpay::api::AccountId;
use scanpay::app::{cache, unread_count, App, LogFormat, ProfileDraft, SessionToken, Settings};
use scanpay::camera::FacingMode;

#[derive(Parser, Debug)]
#[command(name = "scanpay")]
#[command(about = "Scan QR payment codes and pay them")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Camera facing mode
    #[arg(long = "facing", value_name = "MODE", global = true)]
    facing: Option<FacingMode>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true, value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan until the configured number of codes is found (Ctrl-C to stop)
    Scan,
    /// Scan a code and pay it
    Pay {
        /// Amount, e.g. 12.50
        #[arg(short = 'a', long = "amount")]
        amount: String,
        #[arg(short = 'n', long = "note", default_value = "")]
        note: String,
    },
    /// Show or update your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// List notifications
    Notifications {
        /// Mark a notification as read
        #[arg(long = "mark-read", value_name = "ID")]
        mark_read: Option<u64>,
    },
    /// Transaction history
    History,
    /// Store a session token for the ledger service
    Login {
        #[arg(long = "token")]
        token: String,
        /// Token lifetime in seconds
        #[arg(long = "expires-in", value_name = "SECS")]
        expires_in: Option<i64>,
    },
    /// Forget the stored session token
    Logout,
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    Show,
    Set {
        #[arg(long = "name")]
        name: String,
        #[arg(long = "phone")]
        phone: String,
        /// Your account id (encoded in your QR code)
        #[arg(long = "account")]
        account: String,
    },
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(facing) = cli.facing {
        settings.scan.facing_mode = facing;
    }
    Ok(settings)
}

fn init_logging(settings: &Settings, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&settings.logging.level).to_string();

    match settings.logging.format {
        LogFormat::Text => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
                .init();
        }
        LogFormat::Structured => {
            let filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
            tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    init_logging(&settings, cli.log_level.as_deref());

    info!("scanpay v{}", env!("CARGO_PKG_VERSION"));

    // Create tokio runtime for async operations
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli.command, settings))
}

async fn run(command: Command, settings: Settings) -> Result<()> {
    match command {
        Command::Login { token, expires_in } => {
            let token = SessionToken::new(token, expires_in.map(chrono::Duration::seconds));
            cache::save_token(&token)?;
            println!("Signed in");
            return Ok(());
        }
        Command::Logout => {
            cache::clear_token();
            println!("Signed out");
            return Ok(());
        }
        _ => {}
    }

    let token = cache::load_token();
    if token.is_none() {
        warn!("No session token; ledger requests will fail until `scanpay login`");
    }
    let app = App::new(settings, token.as_ref())?;

    let outcome = tokio::select! {
        outcome = execute(&app, command) => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            let results = app.scanner().results();
            for result in &results {
                println!("{}", result.data);
            }
            Ok(())
        }
    };

    app.shutdown().await;
    outcome
}

async fn execute(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Scan => {
            let results = app.scan().await?;
            for result in results {
                println!("{}\t{}", result.timestamp.to_rfc3339(), result.data);
            }
        }
        Command::Pay { amount, note } => {
            println!("Point the camera at a payment code...");
            let receipt = app.scan_and_pay(&amount, &note).await?;
            println!("Paid {} to {}", receipt.formatted_amount(), receipt.recipient_name);
            println!("  transaction  {}", receipt.transaction_id);
            println!("  recipient    {}", receipt.recipient);
            println!("  note         {}", receipt.note);
            println!("  time         {}", receipt.timestamp.to_rfc3339());
        }
        Command::Profile { action } => match action {
            ProfileAction::Show => match app.profile().await? {
                Some(profile) => {
                    println!("{}", profile.display_name);
                    println!("  phone    {}", profile.phone_number);
                    println!("  account  {}", profile.qr_code);
                }
                None => println!("No profile yet; create one with `scanpay profile set`"),
            },
            ProfileAction::Set {
                name,
                phone,
                account,
            } => {
                let draft = ProfileDraft {
                    display_name: name,
                    phone_number: phone,
                };
                let profile = app.save_profile(draft, &AccountId::new(account)).await?;
                println!("Saved profile for {}", profile.display_name);
            }
        },
        Command::Notifications { mark_read } => {
            if let Some(id) = mark_read {
                app.mark_notification_read(id)
                    .await
                    .with_context(|| format!("Failed to mark notification {} read", id))?;
            }

            let notifications = app.notifications().await?;
            println!("{} unread", unread_count(&notifications));
            for n in notifications {
                let marker = if n.is_read { ' ' } else { '*' };
                println!("{} {:>6}  {}  {}", marker, n.id, n.time().format("%Y-%m-%d %H:%M"), n.message);
            }
        }
        Command::History => {
            for entry in app.history().await? {
                println!(
                    "{}  {:>10}  {}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.signed_amount(),
                    entry.counterparty,
                    entry.note
                );
            }
        }
        Command::Login { .. } | Command::Logout => {}
    }

    Ok(())
}
