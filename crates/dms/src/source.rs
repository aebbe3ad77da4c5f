//! Landmark sources feeding the monitor

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::landmarks::LandmarkFrame;

/// Producer of per-frame face landmarks.
///
/// Returning `None` means the source has stopped for good; the monitoring
/// session ends when that happens.
#[async_trait]
pub trait LandmarkSource: Send {
    async fn next_frame(&mut self) -> Option<LandmarkFrame>;
}

/// Source fed over a channel by an external vision process
pub struct ChannelSource {
    receiver: mpsc::Receiver<LandmarkFrame>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<LandmarkFrame>) -> Self {
        Self { receiver }
    }

    /// Create a sender/source pair
    pub fn channel(capacity: usize) -> (mpsc::Sender<LandmarkFrame>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl LandmarkSource for ChannelSource {
    async fn next_frame(&mut self) -> Option<LandmarkFrame> {
        self.receiver.recv().await
    }
}
