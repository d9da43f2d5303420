use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use stkpoll::application::poller::CheckoutPoller;
use stkpoll::application::subscription::SubscriptionMonitor;
use stkpoll::config::CheckoutConfig;
use stkpoll::domain::ports::PaymentGatewayBox;
use stkpoll::domain::session::SessionStatus;
use stkpoll::error::CheckoutError;
use stkpoll::infrastructure::http::HttpPaymentGateway;
use stkpoll::infrastructure::in_memory::ScriptedGateway;
use stkpoll::interfaces::console::session_writer::{JsonLineWriter, describe};
use tracing::info;

/// Progress is logged on every status change and at this countdown step.
const PROGRESS_EVERY_SECS: u32 = 30;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults to ./stkpoll.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API root, e.g. https://backend.example.com/api
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Use the built-in sandbox backend instead of the network.
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pay for a subscription plan with an M-Pesa STK push
    Pay {
        /// Subscription plan id, e.g. starter
        #[arg(long)]
        plan: String,

        /// Phone number that receives the payment prompt
        #[arg(long)]
        phone: String,
    },
    /// Show whether the current subscription is active
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    if let Err(e) = stkpoll::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    let mut config = CheckoutConfig::load(cli.config.as_deref()).into_diagnostic()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
        config.validate().into_diagnostic()?;
    }

    let gateway: PaymentGatewayBox = if cli.simulate {
        info!("Using simulated payment backend");
        Box::new(ScriptedGateway::simulated())
    } else {
        Box::new(HttpPaymentGateway::new(&config).into_diagnostic()?)
    };

    match cli.command {
        Command::Pay { plan, phone } => pay(gateway, &config, &plan, &phone).await,
        Command::Status => status(gateway).await,
    }
}

async fn pay(
    gateway: PaymentGatewayBox,
    config: &CheckoutConfig,
    plan: &str,
    phone: &str,
) -> Result<ExitCode> {
    let mut poller = CheckoutPoller::new(gateway, config.poller_settings());

    let mut updates = poller.subscribe();
    let progress = tokio::spawn(async move {
        let mut last_status = SessionStatus::Idle;
        while updates.changed().await.is_ok() {
            let session = updates.borrow_and_update().clone();
            if session.status != last_status
                || session.countdown_seconds % PROGRESS_EVERY_SECS == 0
            {
                info!("{}", describe(&session));
                last_status = session.status;
            }
        }
    });

    let initiated = poller.initiate(plan, phone).await.map(|_| ());
    let exit = match initiated {
        Ok(()) => {
            tokio::select! {
                status = poller.run() => exit_code(status),
                _ = tokio::signal::ctrl_c() => {
                    poller.abandon();
                    let status = poller.session().status;
                    if status.is_terminal() {
                        exit_code(status)
                    } else {
                        ExitCode::from(130)
                    }
                }
            }
        }
        Err(CheckoutError::Validation(message)) => {
            eprintln!("{}", message);
            return Ok(ExitCode::FAILURE);
        }
        Err(CheckoutError::Initiation(_)) => ExitCode::FAILURE,
        Err(e) => return Err(e).into_diagnostic(),
    };

    let session = poller.session().clone();
    drop(poller);
    progress.await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = JsonLineWriter::new(stdout.lock());
    writer.write(&session).into_diagnostic()?;

    Ok(exit)
}

async fn status(gateway: PaymentGatewayBox) -> Result<ExitCode> {
    let health = SubscriptionMonitor::new(gateway).check().await;

    let stdout = io::stdout();
    let mut writer = JsonLineWriter::new(stdout.lock());
    writer.write(&health).into_diagnostic()?;

    Ok(ExitCode::SUCCESS)
}

fn exit_code(status: SessionStatus) -> ExitCode {
    match status {
        SessionStatus::Success => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
