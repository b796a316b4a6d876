use std::{collections::VecDeque, path::Path, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::PerceptionFrame;
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    time::{interval, Interval, MissedTickBehavior},
};

/// Seam to the perception collaborator (camera plus hand/detector model).
#[async_trait]
pub trait PerceptionSource: Send {
    /// Next captured frame, or `Ok(None)` once the source is exhausted.
    async fn next_frame(&mut self) -> Result<Option<PerceptionFrame>>;
}

/// In-memory frames, handed out in order.
#[derive(Debug, Default)]
pub struct ScriptedPerception {
    frames: VecDeque<PerceptionFrame>,
}

impl ScriptedPerception {
    pub fn new(frames: impl IntoIterator<Item = PerceptionFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl PerceptionSource for ScriptedPerception {
    async fn next_frame(&mut self) -> Result<Option<PerceptionFrame>> {
        Ok(self.frames.pop_front())
    }
}

/// Recorded perception output: one JSON `PerceptionFrame` per line. Blank
/// lines and lines starting with `#` are skipped.
pub struct JsonLinesPerception<R> {
    lines: Lines<R>,
    line_no: usize,
    pacing: Option<Interval>,
}

impl JsonLinesPerception<BufReader<File>> {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("failed to open perception recording {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesPerception<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            pacing: None,
        }
    }

    /// Releases frames no faster than one per `period`, like a live camera.
    pub fn with_frame_interval(mut self, period: Duration) -> Self {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.pacing = Some(ticker);
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PerceptionSource for JsonLinesPerception<R> {
    async fn next_frame(&mut self) -> Result<Option<PerceptionFrame>> {
        if let Some(pacing) = self.pacing.as_mut() {
            pacing.tick().await;
        }

        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let frame = serde_json::from_str(line)
                .with_context(|| format!("invalid perception frame on line {}", self.line_no))?;
            return Ok(Some(frame));
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "tests/perception_tests.rs"]
mod tests;
