//! Daily News Digest — binary entrypoint.
//! Wires the render loop, the clock poller, and the initial news refresh.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_news_digest::clock::{ClockJob, DailyClock};
use daily_news_digest::config::{self, AppConfig, MailConfig};
use daily_news_digest::digest::DigestJob;
use daily_news_digest::display::{ConsoleSurface, DisplayController, RenderSurface, SystemOpener};
use daily_news_digest::notify::{MailDispatcher, SmtpDispatcher};
use daily_news_digest::scrape;
use daily_news_digest::store::NewsStore;
use daily_news_digest::subscribe::{
    SubscribeError, SubscribeOutcome, SubscriptionController, SubscriptionState,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_news_digest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let app_cfg = AppConfig::from_env();

    // Missing mail collaborator configuration is fatal at startup.
    let mail_cfg = match MailConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = ?e, "mail configuration incomplete, check your .env file");
            std::process::exit(1);
        }
    };
    let dispatcher: Arc<dyn MailDispatcher> = match SmtpDispatcher::from_config(&mail_cfg) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            tracing::error!(error = ?e, "smtp transport setup failed");
            std::process::exit(1);
        }
    };
    let feeds = match config::load_feeds_default() {
        Ok(feeds) => feeds,
        Err(e) => {
            tracing::error!(error = ?e, "feed configuration unreadable");
            std::process::exit(1);
        }
    };

    let store = Arc::new(NewsStore::new(&app_cfg.cache_path));
    let state = Arc::new(Mutex::new(SubscriptionState::default()));
    let clock = Arc::new(DailyClock::new());
    let digest_job: Arc<dyn ClockJob> = Arc::new(DigestJob::new(
        Arc::clone(&store),
        Arc::clone(&state),
        Arc::clone(&dispatcher),
    ));
    let subscriptions = SubscriptionController::new(
        Arc::clone(&state),
        Arc::clone(&dispatcher),
        Arc::clone(&clock),
        digest_job,
        app_cfg.fire_time,
    );

    let (frames_tx, mut frames_rx) = mpsc::channel(4);
    let sources = Arc::new(scrape::feeds_from_config(&feeds));
    let display = Arc::new(DisplayController::new(
        Arc::clone(&store),
        sources,
        frames_tx,
        Box::new(SystemOpener),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = Arc::clone(&clock).spawn_poller(app_cfg.poll_secs, shutdown_rx);
    display.request_refresh();

    if let Some(recipient) = &app_cfg.prefill_recipient {
        println!("Subscription input pre-filled; type `subscribe {recipient}` to activate.");
    }
    println!("Commands: subscribe <address> | refresh | open <line> | quit");

    let surface = ConsoleSurface;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(frame) = frames_rx.recv() => {
                display.apply(frame);
                surface.present(&display.frame());
            }
            line = input.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(line.trim(), &subscriptions, &display).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = ?e, "stdin read failed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = poller.await;
    tracing::info!("window closed");
}

/// Returns false when the loop should exit.
async fn handle_command(
    line: &str,
    subscriptions: &SubscriptionController,
    display: &Arc<DisplayController>,
) -> bool {
    let (command, arg) = line
        .split_once(' ')
        .map(|(c, rest)| (c, rest.trim()))
        .unwrap_or((line, ""));
    match command {
        "quit" | "exit" => return false,
        "refresh" => display.request_refresh(),
        "open" => match arg.parse::<usize>() {
            Ok(n) => display.open_link(n),
            Err(_) => println!("usage: open <line>"),
        },
        "subscribe" => match subscriptions.subscribe(arg).await {
            Ok(SubscribeOutcome::Activated) => {
                println!(
                    "Daily email subscription activated!\n\
                     You will receive news updates at {} daily.\n\
                     A confirmation email has been sent to your address.",
                    subscriptions.fire_time().format("%H:%M")
                );
            }
            Ok(SubscribeOutcome::AlreadyActive) => {
                println!("Subscription is already active.");
            }
            Err(SubscribeError::InvalidAddress(msg)) => {
                println!("Please enter a valid email address ({msg}).");
            }
            Err(SubscribeError::DispatchFailed(_)) => {
                println!(
                    "Failed to send confirmation email. \
                     Please check your email address and try again."
                );
            }
        },
        "" => {}
        other => println!("Unknown command: {other}"),
    }
    true
}
