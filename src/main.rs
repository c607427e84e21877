use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dual_cam_remote::domain::settings::{SettingsService, SlotStore};
use dual_cam_remote::infrastructure::bluetooth::{LoggingTransport, RemoteService, ServiceConfig};
use dual_cam_remote::infrastructure::control::{
    self, run_control_server, ControlCommand, ControlHandle, ControlResponse,
};
use dual_cam_remote::infrastructure::logging::{init_logger, resolve_log_dir};
use dual_cam_remote::presentation::status;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Dual camera remote - keeps two action cameras recording in sync
#[derive(Parser, Debug)]
#[command(name = "dual-cam-remote")]
#[command(about = "Dual camera remote control core", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one JSON control command to a running remote
    Send {
        /// Command, e.g. '{"Action":"Shutter"}'
        #[arg(required = true, value_name = "JSON")]
        command: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings_service = SettingsService::new()?;

    if let Some(Command::Send { command }) = args.command {
        return run_client(&settings_service, &command);
    }

    let log_settings = &settings_service.get().log_settings;
    let log_dir = resolve_log_dir(log_settings, settings_service.path());
    let _logging_guard = init_logger(log_settings, &log_dir)
        .map_err(|e| eprintln!("Failed to initialize logging: {:#}", e))
        .ok();

    info!("Starting Dual Camera Remote");
    info!("Settings: {}", settings_service.path().display());

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(run(settings_service))
}

async fn run(settings_service: SettingsService) -> Result<()> {
    let config = ServiceConfig::from_settings(settings_service.get())?;
    let socket_name = settings_service.get().control_socket_name.clone();
    let store: Arc<Mutex<dyn SlotStore>> = Arc::new(Mutex::new(settings_service));

    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel();

    let service = Arc::new(RemoteService::new(
        Arc::new(LoggingTransport),
        store,
        config,
        notice_tx,
    ));

    tokio::spawn(service.clone().run_events(event_rx));
    tokio::spawn(service.clone().run_foreground(action_rx));
    tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            info!("{}", status::notice_line(&notice));
        }
    });

    service.start();
    for line in status::render(&service.snapshot(), tokio::time::Instant::now()) {
        info!("{}", line);
    }

    let handle = ControlHandle {
        actions: action_tx,
        events: event_tx,
        shutdown: shutdown_tx,
    };
    std::thread::spawn(move || {
        if let Err(e) = run_control_server(&socket_name, handle) {
            error!("Control channel stopped: {:#}", e);
        }
    });

    tokio::select! {
        _ = shutdown_rx.recv() => info!("Quit requested"),
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Interrupted");
        }
    }

    Ok(())
}

fn run_client(settings_service: &SettingsService, args: &[String]) -> Result<()> {
    let json = args.join(" ");
    let cmd: ControlCommand =
        serde_json::from_str(&json).with_context(|| format!("Invalid command: {json}"))?;

    match control::send_command(&settings_service.get().control_socket_name, &cmd)? {
        ControlResponse::Pong => println!("Pong"),
        ControlResponse::Success(message) => println!("{message}"),
        ControlResponse::Error(message) => bail!(message),
    }
    Ok(())
}
