// THEORY:
// Frames are decoded ahead of the tracker by a background task, so image decoding
// overlaps with filtering. The tracker still consumes exactly one frame per tick;
// the bounded channel is only a read-ahead buffer, never a queue of work.
//
// A sequence is a directory of zero-padded, numbered files (`000.jpg`, `001.jpg`,
// ...). The first missing index ends the sequence. A file that exists but cannot
// be decoded is delivered as a dropped frame, so the tracker sees "no frame this
// tick" and keeps its state.

use particle_tracker::Frame;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One slot of the sequence. `frame` is `None` when the file could not be decoded.
#[derive(Debug)]
pub struct LoadedFrame {
    pub index: usize,
    pub frame: Option<Frame>,
}

/// The path of frame `index` inside `dir`, zero-padded to three digits.
pub fn frame_path(dir: &Path, index: usize, extension: &str) -> PathBuf {
    dir.join(format!("{index:03}.{extension}"))
}

/// A running read-ahead loader over a numbered image sequence.
pub struct SequenceSource {
    receiver: mpsc::Receiver<LoadedFrame>,
    loader: JoinHandle<()>,
}

impl SequenceSource {
    /// Starts decoding frames from `dir` in the background.
    pub fn spawn(dir: PathBuf, extension: String, max_frames: Option<usize>, read_ahead: usize) -> Self {
        let (sender, receiver) = mpsc::channel(read_ahead.max(1));
        let loader = tokio::spawn(async move {
            let limit = max_frames.unwrap_or(usize::MAX);
            for index in 0..limit {
                let path = frame_path(&dir, index, &extension);
                if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    debug!(path = %path.display(), "end of sequence");
                    break;
                }

                let decode_path = path.clone();
                let frame = match tokio::task::spawn_blocking(move || Frame::open(decode_path)).await {
                    Ok(Ok(frame)) => Some(frame),
                    Ok(Err(e)) => {
                        warn!(path = %path.display(), error = %e, "dropping undecodable frame");
                        None
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "frame decoder task failed");
                        None
                    }
                };

                if sender.send(LoadedFrame { index, frame }).await.is_err() {
                    break;
                }
            }
        });
        Self { receiver, loader }
    }

    /// The next frame slot, or `None` once the sequence is exhausted.
    pub async fn next(&mut self) -> Option<LoadedFrame> {
        self.receiver.recv().await
    }
}

impl Drop for SequenceSource {
    fn drop(&mut self) {
        self.loader.abort();
    }
}
