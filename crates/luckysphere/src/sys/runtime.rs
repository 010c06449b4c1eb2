use crate::events::AppEvent;
use async_channel::Sender;
use std::io;
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;

/// Runs the control socket and config watcher on their own thread and runtime.
pub fn start_background_services(tx: Sender<AppEvent>) -> io::Result<JoinHandle<()>> {
    let rt = Runtime::new()?;

    thread::Builder::new()
        .name("luckysphere-services".to_string())
        .spawn(move || {
            rt.block_on(async {
                {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        crate::sys::server::run_server(tx).await;
                    });
                }

                {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        crate::config::run_async_watcher(tx).await;
                    });
                }

                std::future::pending::<()>().await;
            });
        })
}
