//! Recorded landmark input
//!
//! One JSON object per line: `{"faces": [[[x, y], ... 68 points], ...]}`.

use async_trait::async_trait;
use dms::{LandmarkFrame, LandmarkSource};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::MonitorError;

/// Replays JSON-lines landmark frames, optionally paced at a frame rate
pub struct ReplaySource<R> {
    lines: Lines<R>,
    pace: Option<Interval>,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    /// Open a recording file
    pub async fn open(path: &Path, fps: f64) -> Result<Self, MonitorError> {
        let file = File::open(path).await?;
        info!("Replaying landmarks from {} at {} fps", path.display(), fps);
        Ok(Self::from_reader(BufReader::new(file), fps))
    }
}

impl<R: AsyncBufRead + Unpin + Send> ReplaySource<R> {
    /// Read frames from any buffered reader; `fps` of 0 disables pacing.
    ///
    /// A rate whose frame period is not representable also disables pacing.
    pub fn from_reader(reader: R, fps: f64) -> Self {
        let period = (fps > 0.0)
            .then(|| Duration::try_from_secs_f64(1.0 / fps).ok())
            .flatten()
            .filter(|period| !period.is_zero());
        if fps > 0.0 && period.is_none() {
            warn!("Unusable replay rate {} fps, replaying unpaced", fps);
        }

        let pace = period.map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        Self {
            lines: reader.lines(),
            pace,
            line_no: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LandmarkSource for ReplaySource<R> {
    async fn next_frame(&mut self) -> Option<LandmarkFrame> {
        if let Some(pace) = &mut self.pace {
            pace.tick().await;
        }

        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    warn!("Landmark input read failed: {}", e);
                    return None;
                }
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<LandmarkFrame>(&line) {
                Ok(frame) => return Some(frame),
                Err(e) => warn!("Ignoring landmark line {}: {}", self.line_no, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_json(x: f64) -> String {
        let points: Vec<String> = (0..68).map(|i| format!("[{},{}]", x + i as f64, i)).collect();
        format!("[{}]", points.join(","))
    }

    #[tokio::test]
    async fn test_replay_reads_frames_and_skips_garbage() {
        let input = format!(
            "{{\"faces\": [{}]}}\n\nnot json\n{{\"faces\": []}}\n{{\"faces\": [[[0,0]]]}}\n",
            face_json(1.0)
        );
        let mut source = ReplaySource::from_reader(input.as_bytes(), 0.0);

        let first = source.next_frame().await.unwrap();
        assert_eq!(first.faces.len(), 1);
        assert_eq!(first.faces[0].points()[0], dms::Point::new(1.0, 0.0));

        let second = source.next_frame().await.unwrap();
        assert!(second.faces.is_empty());

        // Wrong landmark count is rejected, then the input ends
        assert!(source.next_frame().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extreme_rates_fall_back_to_unpaced() {
        for fps in [1e-300, 1e300, f64::INFINITY] {
            let input = "{\"faces\": []}\n".repeat(2);
            let mut source = ReplaySource::from_reader(input.as_bytes(), fps);
            assert!(source.pace.is_none());

            let start = tokio::time::Instant::now();
            source.next_frame().await.unwrap();
            source.next_frame().await.unwrap();
            assert_eq!(start.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_is_paced() {
        let input = "{\"faces\": []}\n".repeat(3);
        let mut source = ReplaySource::from_reader(input.as_bytes(), 10.0);

        let start = tokio::time::Instant::now();
        for _ in 0..3 {
            source.next_frame().await.unwrap();
        }
        // First tick is immediate, then one every 100ms
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }
}
