//! Sound playback queue.
//!
//! Scripts push file paths; a single background task plays them one after
//! another through an external player command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Pause between two queued sounds.
const GAP_BETWEEN_SOUNDS: Duration = Duration::from_secs(1);

/// Sender half of the playback queue.
#[derive(Debug, Clone)]
pub struct AudioQueue {
    tx: mpsc::UnboundedSender<PathBuf>,
}

impl AudioQueue {
    /// Create a queue and the receiver the player task consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a file. Missing files are logged and dropped.
    pub fn enqueue(&self, path: &Path) -> bool {
        if !path.is_file() {
            warn!("Sound file not found: {}", path.display());
            return false;
        }

        if self.tx.send(path.to_path_buf()).is_err() {
            debug!("Audio player stopped, dropping {}", path.display());
            return false;
        }

        debug!("Queued sound: {}", path.display());
        true
    }
}

/// Play queued files until the queue closes or shutdown is signalled.
///
/// With an empty `player_command` files are only logged.
pub async fn run_player(
    mut rx: mpsc::UnboundedReceiver<PathBuf>,
    player_command: Vec<String>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if player_command.is_empty() {
        info!("No sound player configured; queued sounds will only be logged");
    }

    loop {
        let path = tokio::select! {
            path = rx.recv() => match path {
                Some(path) => path,
                None => break,
            },
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        };

        play(&player_command, &path).await;
        tokio::time::sleep(GAP_BETWEEN_SOUNDS).await;
    }

    debug!("Audio player stopped");
}

async fn play(player_command: &[String], path: &Path) {
    let Some((program, args)) = player_command.split_first() else {
        info!("Playing sound: {}", path.display());
        return;
    };

    info!("Playing sound: {}", path.display());
    match Command::new(program).args(args).arg(path).status().await {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("Sound player exited with {} for {}", status, path.display()),
        Err(e) => warn!("Failed to run sound player '{}': {}", program, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_not_queued() {
        let (queue, mut rx) = AudioQueue::channel();
        assert!(!queue.enqueue(Path::new("/nonexistent/sound.mp3")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_existing_file_queued() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (queue, mut rx) = AudioQueue::channel();

        assert!(queue.enqueue(file.path()));
        assert_eq!(rx.try_recv().unwrap(), file.path());
    }

    #[tokio::test]
    async fn test_player_stops_when_queue_closes() {
        let (queue, rx) = AudioQueue::channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(queue);
        run_player(rx, Vec::new(), shutdown_rx).await;
    }

    #[tokio::test]
    async fn test_player_stops_on_shutdown() {
        let (_queue, rx) = AudioQueue::channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let player = tokio::spawn(run_player(rx, Vec::new(), shutdown_rx));
        shutdown_tx.send(true).unwrap();
        player.await.unwrap();
    }
}
