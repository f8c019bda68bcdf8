//! GPIO-to-MIDI bridge loop.
//!
//! The first sample sets the baseline. After that, every change of level
//! is one message: high sends note on, low sends note off. Without
//! debounce, each bounce on the wire turns into an extra on/off pair.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::BridgeError;
use crate::gpio::{Level, LineSource};
use crate::message;
use crate::port::MidiSink;

pub const DEFAULT_NOTE: u8 = 60;
pub const DEFAULT_VELOCITY: u8 = 100;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Upper bound on one edge wait, so a stop request is seen promptly.
pub const EDGE_WAIT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
  pub channel: u8,
  pub note: u8,
  pub velocity: u8,
  pub poll_interval: Duration,
  /// How long a new level must hold before it counts. Zero disables it.
  pub debounce: Duration,
}

impl Default for BridgeSettings {
  fn default() -> Self {
    BridgeSettings {
      channel: 0,
      note: DEFAULT_NOTE,
      velocity: DEFAULT_VELOCITY,
      poll_interval: DEFAULT_POLL_INTERVAL,
      debounce: Duration::ZERO,
    }
  }
}

/// Remembers the last accepted level and reports changes.
#[derive(Debug, Clone)]
pub struct TransitionTracker {
  level: Level,
  pending: Option<(Level, Duration)>,
  debounce: Duration,
}

impl TransitionTracker {
  pub fn new(initial: Level, debounce: Duration) -> Self {
    TransitionTracker {
      level: initial,
      pending: None,
      debounce,
    }
  }

  pub fn level(&self) -> Level {
    self.level
  }

  /// Feeds one sample taken at `at`. Returns the new level if it changed.
  pub fn observe(&mut self, sample: Level, at: Duration) -> Option<Level> {
    if sample == self.level {
      self.pending = None;
      return None;
    }
    if self.debounce.is_zero() {
      self.level = sample;
      return Some(sample);
    }
    match self.pending {
      Some((pending, since)) if pending == sample => {
        if at.saturating_sub(since) >= self.debounce {
          self.level = sample;
          self.pending = None;
          Some(sample)
        } else {
          None
        }
      }
      _ => {
        self.pending = Some((sample, at));
        None
      }
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeReport {
  pub samples: u64,
  pub note_ons: u64,
  pub note_offs: u64,
}

/// Runs until `cancel` trips. Uses edge events if the line offers them,
/// polling every `poll_interval` otherwise. A note still held when the
/// loop stops is released before returning.
pub fn run<L, S>(
  line: &mut L,
  sink: &mut S,
  settings: &BridgeSettings,
  cancel: &CancelToken,
) -> Result<BridgeReport, BridgeError>
where
  L: LineSource + ?Sized,
  S: MidiSink + ?Sized,
{
  let edges: bool = line.supports_edges();
  // The kernel already debounces edge events.
  let debounce: Duration = if edges { Duration::ZERO } else { settings.debounce };
  let start: Instant = Instant::now();
  let mut tracker: TransitionTracker = TransitionTracker::new(line.read()?, debounce);
  let mut report: BridgeReport = BridgeReport::default();
  info!(initial = %tracker.level(), edges, "bridge started");

  while !cancel.is_cancelled() {
    let sample: Level = if edges {
      match line.wait_edge(EDGE_WAIT)? {
        Some(level) => level,
        None => continue,
      }
    } else {
      line.read()?
    };
    report.samples += 1;

    if let Some(level) = tracker.observe(sample, start.elapsed()) {
      handle_value_change(level, sink, settings, &mut report)?;
    }

    if !edges && cancel.sleep(settings.poll_interval) {
      break;
    }
  }

  if tracker.level() == Level::High && report.note_ons > report.note_offs {
    handle_value_change(Level::Low, sink, settings, &mut report)?;
  }
  info!(?report, "bridge stopped");
  Ok(report)
}

fn handle_value_change<S: MidiSink + ?Sized>(
  level: Level,
  sink: &mut S,
  settings: &BridgeSettings,
  report: &mut BridgeReport,
) -> Result<(), BridgeError> {
  let event: [u8; 3] = match level {
    Level::High => message::note_on(settings.channel, settings.note, settings.velocity),
    Level::Low => message::note_off(settings.channel, settings.note, settings.velocity),
  };
  debug!(?event, "level change");
  sink.send(&event)?;
  match level {
    Level::High => {
      report.note_ons += 1;
      println!("Note on");
    }
    Level::Low => {
      report.note_offs += 1;
      println!("Note off");
    }
  }
  Ok(())
}
