//! `passportd`: the Passport client shell, wired to an in-process server
//! core for local development.
//!
//! Subcommands:
//! - `run`: boot-time SSO decision, demo login, scheduler-driven renewal
//!   until ctrl-c
//! - `status`: classify the local session cache
//! - `logout`: clear local state

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use passport_core::{Config, PassportContext, Paths};
use passport_shell::{AuthController, InProcessGateway, SchedulerDriver, StartupCoordinator};
use passport_storage::{create_protector, SessionFileCache, StorageError};

#[derive(Parser)]
#[command(name = "passportd", about = "Passport SSO client shell")]
struct Cli {
    /// Base directory override for the session file and config.
    #[arg(long, env = "PASSPORT_BASE_DIR")]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the shell: evaluate the local session, log in if needed,
    /// keep the credential renewed.
    Run {
        /// Phone number to log in with when no local session is usable.
        #[arg(long)]
        phone: Option<String>,
        /// Verification code matching the phone.
        #[arg(long)]
        code: Option<String>,
    },
    /// Report the state of the local session cache.
    Status,
    /// Clear the local session cache.
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match &cli.base_dir {
        Some(dir) => Paths::with_base_dir(dir.clone()),
        None => Paths::new().context("resolve data directory")?,
    };
    let config = Config::load(&paths).unwrap_or_default();
    passport_core::init_logging(&config.log_level);

    let cache = Arc::new(SessionFileCache::new(
        paths.session_file(),
        create_protector(),
    ));

    match cli.command {
        Command::Run { phone, code } => run(cache, config, phone, code).await,
        Command::Status => status(&cache),
        Command::Logout => {
            cache.delete().context("clear local session")?;
            println!("local session cleared");
            Ok(())
        }
    }
}

async fn run(
    cache: Arc<SessionFileCache>,
    config: Config,
    phone: Option<String>,
    code: Option<String>,
) -> Result<()> {
    // Local development backend: the real server core, in-process, with
    // the verification code pre-seeded so the login flow is drivable.
    let ctx = PassportContext::new();
    let gateway = Arc::new(InProcessGateway::new(&ctx));

    let controller = AuthController::new(
        gateway.clone(),
        cache.clone(),
        Box::new(|status| println!("session status: {status}")),
        config.app_id.clone(),
    );

    let startup_controller = controller.clone();
    let startup = StartupCoordinator::new(
        cache.clone(),
        Box::new(move |status, record| {
            println!("session status: {status}");
            if let Some(record) = record {
                info!(guid = %record.guid, "resuming session via SSO");
                startup_controller.refresh();
            }
        }),
    );
    startup.handle_startup(Utc::now());

    // No usable local session: log in with the supplied phone + code.
    if cache.read().is_err() {
        let phone = phone.context("no local session; --phone is required")?;
        let code = code.context("no local session; --code is required")?;
        gateway
            .issue_code(&phone, &code)
            .map_err(|c| anyhow::anyhow!("issue code rejected: {c}"))?;
        controller
            .login(&phone, &code)
            .map_err(|c| anyhow::anyhow!("login rejected: {c}"))?;
    }

    let driver = SchedulerDriver::spawn(
        controller.scheduler(),
        Duration::from_secs(config.poll_interval_secs),
    );
    info!("scheduler running, ctrl-c to stop");

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    driver.shutdown().await;
    info!("shut down cleanly");
    Ok(())
}

fn status(cache: &SessionFileCache) -> Result<()> {
    match cache.read() {
        Ok(record) => {
            let status = record.validation_status(Utc::now());
            println!(
                "guid={} phone={} created_at={} expires_at={} status={status:?}",
                record.guid, record.phone, record.created_at, record.expires_at
            );
        }
        Err(StorageError::NotFound) => println!("no local session"),
        Err(e) => println!("local session unusable: {e}"),
    }
    Ok(())
}
