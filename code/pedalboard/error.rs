use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The MIDI file could not be turned into a [`crate::song::Song`].
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("{}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("{}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: midly::Error,
  },
}

/// Failures talking to the MIDI output collaborator.
#[derive(Debug, Error)]
pub enum PortError {
  #[error("failed to initialise MIDI client '{client}': {reason}")]
  Init { client: String, reason: String },
  #[error("failed to create virtual port '{port}': {reason}")]
  Create { port: String, reason: String },
  #[error("virtual port '{0}' is already open in another process")]
  InUse(String),
  #[error("failed to send MIDI message: {0}")]
  Send(String),
}

/// A send failed while events were being forwarded. All notes off has
/// already been attempted by the time this is returned.
#[derive(Debug, Error)]
pub enum PlaybackError {
  #[error("playback stopped after {forwarded} events: {source}")]
  Send {
    forwarded: usize,
    #[source]
    source: PortError,
  },
  #[error("failed to silence notes: {0}")]
  Silence(#[source] PortError),
}

#[derive(Debug, Error)]
pub enum GpioError {
  #[error("failed to request line {line} on {chip}: {reason}")]
  Request {
    chip: String,
    line: u32,
    reason: String,
  },
  #[error("failed to read line value: {0}")]
  Read(String),
  #[error("failed to wait for edge event: {0}")]
  Edge(String),
  #[error("line does not report edge events")]
  EdgesUnsupported,
}

#[derive(Debug, Error)]
pub enum BridgeError {
  #[error(transparent)]
  Gpio(#[from] GpioError),
  #[error(transparent)]
  Port(#[from] PortError),
}
