//! Console implementations of the reload transport and failure notifier

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use colored::*;
use sluice_plugin_protocol::{CollaboratorResult, FailureNotifier, ReloadTransport};
use tracing::{info, warn};

/// Prints reload requests instead of pushing them to a browser
#[derive(Debug, Default)]
pub struct ConsoleReloadTransport {
    reloads: AtomicUsize,
}

impl ConsoleReloadTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reloads announced so far
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReloadTransport for ConsoleReloadTransport {
    async fn start(&self, address: &str) -> CollaboratorResult<()> {
        println!("{} http://{}", "Serving at".cyan(), address);
        Ok(())
    }

    async fn notify(&self, changed: &[PathBuf]) -> CollaboratorResult<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        let files = changed
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        info!(changed = changed.len(), "reloading browsers");
        println!("{} {}", "Reloading browsers:".cyan(), files.bright_black());
        Ok(())
    }
}

/// Writes failures to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl FailureNotifier for ConsoleNotifier {
    fn notify_failure(&self, title: &str, message: &str) {
        warn!(title, message, "task failure notified");
        eprintln!("{} {}", title.red().bold(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reloads_counted() {
        let transport = ConsoleReloadTransport::new();
        transport.start("localhost:9000").await.unwrap();
        transport
            .notify(&[PathBuf::from("build/css/main.css")])
            .await
            .unwrap();
        transport.notify(&[]).await.unwrap();
        assert_eq!(transport.reloads(), 2);
        transport.stop().await.unwrap();
    }
}
