//! Local control channel
//!
//! JSON lines over a local socket. Each request line is a [`ControlCommand`],
//! each reply line a [`ControlResponse`]. Clients are served on their own
//! thread so a second client can cancel a pairing the first one is waiting on.

use crate::domain::models::{RadioEvent, UserAction};
use crate::infrastructure::bluetooth::ActionRequest;
use anyhow::{Context, Result};
use interprocess::local_socket::{
    traits::{ListenerExt, Stream as _},
    GenericFilePath, GenericNamespaced, ListenerOptions, Name, NameType, Stream as LocalStream,
    ToFsName, ToNsName,
};
use interprocess::TryClone;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Ping,
    Action(UserAction),
    /// Feed a radio event as if the transport had reported it
    Inject(RadioEvent),
    Quit,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ControlResponse {
    Pong,
    Success(String),
    Error(String),
}

/// Channels into the running remote
#[derive(Clone)]
pub struct ControlHandle {
    pub actions: mpsc::UnboundedSender<ActionRequest>,
    pub events: mpsc::UnboundedSender<RadioEvent>,
    pub shutdown: mpsc::UnboundedSender<()>,
}

impl ControlHandle {
    /// Runs on a plain thread; blocks until the foreground worker replies.
    pub fn execute(&self, cmd: ControlCommand) -> ControlResponse {
        match cmd {
            ControlCommand::Ping => ControlResponse::Pong,
            ControlCommand::Action(action) => {
                let (request, reply) = ActionRequest::new(action);
                if self.actions.send(request).is_err() {
                    return ControlResponse::Error("Remote is shutting down".to_string());
                }
                match reply.blocking_recv() {
                    Ok(Ok(message)) => ControlResponse::Success(message),
                    Ok(Err(e)) => ControlResponse::Error(e.to_string()),
                    Err(_) => ControlResponse::Error("Action dropped".to_string()),
                }
            }
            ControlCommand::Inject(event) => match self.events.send(event) {
                Ok(()) => ControlResponse::Success("Injected".to_string()),
                Err(_) => ControlResponse::Error("Remote is shutting down".to_string()),
            },
            ControlCommand::Quit => {
                let _ = self.shutdown.send(());
                ControlResponse::Success("Quitting".to_string())
            }
        }
    }
}

/// Abstract namespace where supported, otherwise a file path
pub fn socket_name(name: &str) -> std::io::Result<Name<'_>> {
    if GenericNamespaced::is_supported() {
        name.to_ns_name::<GenericNamespaced>()
    } else {
        name.to_fs_name::<GenericFilePath>()
    }
}

/// Serve control clients until the listener fails
pub fn run_control_server(name: &str, handle: ControlHandle) -> Result<()> {
    let listener = ListenerOptions::new()
        .name(socket_name(name)?)
        .create_sync()
        .with_context(|| format!("Failed to bind control socket {name}"))?;

    info!("Control channel listening on {}", name);

    for conn in listener.incoming().filter_map(|x| x.ok()) {
        debug!("Control client connected");
        let handle = handle.clone();
        std::thread::spawn(move || {
            if let Err(e) = handle_connection(conn, &handle) {
                error!("Control connection error: {:#}", e);
            }
        });
    }

    Ok(())
}

fn handle_connection(mut stream: LocalStream, handle: &ControlHandle) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut buffer = String::new();

    loop {
        buffer.clear();
        if reader.read_line(&mut buffer)? == 0 {
            break;
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ControlCommand>(&buffer) {
            Ok(cmd) => {
                info!("Received command: {:?}", cmd);
                handle.execute(cmd)
            }
            Err(e) => ControlResponse::Error(format!("Invalid command: {e}")),
        };
        let json = serde_json::to_string(&response)? + "\n";
        stream.write_all(json.as_bytes())?;
        stream.flush()?;
    }
    Ok(())
}

/// Send one command to a running remote and wait for its reply
pub fn send_command(name: &str, cmd: &ControlCommand) -> Result<ControlResponse> {
    let mut stream = LocalStream::connect(socket_name(name)?)
        .with_context(|| format!("Remote is not running on {name}"))?;

    let json = serde_json::to_string(cmd)? + "\n";
    stream.write_all(json.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    serde_json::from_str(&line).context("Malformed reply from remote")
}
