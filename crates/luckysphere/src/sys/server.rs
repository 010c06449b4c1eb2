use crate::events::AppEvent;
use async_channel::Sender;
use drawctl::{ControlCommand, SOCKET_PATH};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

pub async fn run_server(tx: Sender<AppEvent>) {
    remove_socket();

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };
    log::info!("Listening on {}", SOCKET_PATH);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(handle_client(stream, tx));
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(stream: UnixStream, tx: Sender<AppEvent>) {
    let mut lines = BufReader::new(stream).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let command = match line.parse::<ControlCommand>() {
            Ok(command) => command,
            Err(e) => {
                log::warn!("Ignoring control line '{}': {}", line.trim(), e);
                continue;
            }
        };

        log::debug!("Control command: {}", command);
        if tx.send(AppEvent::from(command)).await.is_err() {
            break;
        }
    }
}

/// Removes a stale socket file left by an earlier run.
pub fn remove_socket() {
    if fs_err::metadata(SOCKET_PATH).is_ok() {
        let _ = fs_err::remove_file(SOCKET_PATH);
    }
}
