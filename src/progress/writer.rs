use derive_new::new;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ProgressStore;
use crate::model::{ProgressPatch, UserId, VideoId};

/// One store write, addressed to the (user, video) it was issued for.
#[derive(Debug, Clone, PartialEq, new)]
pub struct SaveRequest {
    pub user: UserId,
    pub video: VideoId,
    pub patch: ProgressPatch,
}

/// Background task that applies save requests one at a time, in the order they were submitted.
///
/// Failed writes are logged and dropped; the next natural save point carries newer state anyway.
#[derive(Debug)]
pub struct ProgressWriter {
    tx: mpsc::UnboundedSender<SaveRequest>,
    handle: JoinHandle<()>,
}

impl ProgressWriter {
    pub fn spawn<S: ProgressStore>(store: S) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();

        let handle = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let SaveRequest { user, video, patch } = &request;

                if let Err(error) = store.save(user, video, *patch).await {
                    tracing::warn!(user.id = %user, video.id = %video, %error, "could not save progress");
                }
            }

            tracing::debug!("progress writer drained");
        });

        Self { tx, handle }
    }

    pub fn submit(&self, request: SaveRequest) {
        if let Err(error) = self.tx.send(request) {
            let request = error.0;
            tracing::error!(video.id = %request.video, "progress writer is gone, dropping write");
        }
    }

    /// Stops accepting writes and waits until every submitted write was attempted.
    pub async fn close(self) {
        drop(self.tx);

        if let Err(error) = self.handle.await {
            tracing::error!(%error, "progress writer task failed");
        }
    }
}
