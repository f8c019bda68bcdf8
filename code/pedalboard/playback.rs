//! Real-time playback of a [`Song`] to a [`MidiSink`].
//!
//! Events are due at the running sum of their deltas, measured from the
//! start of playback, so oversleeping one wait shortens the next one
//! instead of drifting. Whatever way playback ends, the sink gets exactly
//! one all-notes-off sweep before [`play`] returns.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::{PlaybackError, PortError};
use crate::message;
use crate::port::MidiSink;
use crate::song::{Meta, MidiEvent, Payload, Song};

/// Decides when "now" is and how to wait for a due time.
pub trait Pacer {
  /// Blocks until `due` (relative to the start of playback) or until
  /// `cancel` trips. Returns `true` if cancelled.
  fn wait_until(&mut self, due: Duration, cancel: &CancelToken) -> bool;

  fn elapsed(&self) -> Duration;
}

pub struct WallClock {
  start: Instant,
}

impl WallClock {
  pub fn start() -> Self {
    WallClock {
      start: Instant::now(),
    }
  }
}

impl Pacer for WallClock {
  fn wait_until(&mut self, due: Duration, cancel: &CancelToken) -> bool {
    let now: Duration = self.start.elapsed();
    if due > now {
      cancel.sleep(due - now)
    } else {
      cancel.is_cancelled()
    }
  }

  fn elapsed(&self) -> Duration {
    self.start.elapsed()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Completed,
  Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackReport {
  pub outcome: Outcome,
  /// Messages that reached the sink, not counting the all-notes-off sweep.
  pub forwarded: usize,
  pub notes: usize,
  pub skipped_meta: usize,
  pub elapsed: Duration,
}

/// Lazy, paced walk over a song: each event comes out only once its due
/// time has passed. Stops early if the token is cancelled.
pub struct Paced<'a, P: Pacer> {
  events: std::slice::Iter<'a, MidiEvent>,
  pacer: &'a mut P,
  cancel: &'a CancelToken,
  due: Duration,
  interrupted: bool,
}

impl<'a, P: Pacer> Paced<'a, P> {
  pub fn new(song: &'a Song, pacer: &'a mut P, cancel: &'a CancelToken) -> Self {
    Paced {
      events: song.events().iter(),
      pacer,
      cancel,
      due: Duration::ZERO,
      interrupted: false,
    }
  }

  pub fn interrupted(&self) -> bool {
    self.interrupted
  }
}

impl<'a, P: Pacer> Iterator for Paced<'a, P> {
  type Item = &'a MidiEvent;

  fn next(&mut self) -> Option<&'a MidiEvent> {
    if self.interrupted {
      return None;
    }
    let event: &'a MidiEvent = self.events.next()?;
    self.due += event.delta;
    if self.pacer.wait_until(self.due, self.cancel) {
      self.interrupted = true;
      return None;
    }
    Some(event)
  }
}

/// Plays `song` to `sink`, then silences all channels.
pub fn play<S, P>(
  song: &Song,
  sink: &mut S,
  pacer: &mut P,
  cancel: &CancelToken,
) -> Result<PlaybackReport, PlaybackError>
where
  S: MidiSink + ?Sized,
  P: Pacer,
{
  let mut report: PlaybackReport = PlaybackReport {
    outcome: Outcome::Completed,
    forwarded: 0,
    notes: 0,
    skipped_meta: 0,
    elapsed: Duration::ZERO,
  };

  let forwarding: Result<(), PortError> = forward_events(song, sink, pacer, cancel, &mut report);
  if let Err(err) = &forwarding {
    warn!(error = %err, "send failed during playback, silencing notes");
  }
  let silencing: Result<(), PortError> = send_all_notes_off(sink);
  report.elapsed = pacer.elapsed();

  match (forwarding, silencing) {
    (Err(source), _) => Err(PlaybackError::Send {
      forwarded: report.forwarded,
      source,
    }),
    (Ok(()), Err(err)) => Err(PlaybackError::Silence(err)),
    (Ok(()), Ok(())) => {
      info!(
        forwarded = report.forwarded,
        skipped_meta = report.skipped_meta,
        interrupted = report.outcome == Outcome::Interrupted,
        "playback finished"
      );
      Ok(report)
    }
  }
}

fn forward_events<S, P>(
  song: &Song,
  sink: &mut S,
  pacer: &mut P,
  cancel: &CancelToken,
  report: &mut PlaybackReport,
) -> Result<(), PortError>
where
  S: MidiSink + ?Sized,
  P: Pacer,
{
  let mut paced: Paced<P> = Paced::new(song, pacer, cancel);
  for event in paced.by_ref() {
    match &event.payload {
      Payload::Message(bytes) => {
        debug!(?bytes, channel = ?message::get_channel(bytes), "forward");
        sink.send(bytes)?;
        report.forwarded += 1;
        if message::is_note_event(bytes) {
          report.notes += 1;
        }
      }
      Payload::Meta(meta) => {
        if let Meta::TrackName(name) = meta {
          info!(%name, "track");
        }
        report.skipped_meta += 1;
      }
    }
  }
  if paced.interrupted() {
    report.outcome = Outcome::Interrupted;
  }
  Ok(())
}

/// Sends control change 123 on all 16 channels. Keeps going past a failed
/// channel and reports the first failure.
pub fn send_all_notes_off<S: MidiSink + ?Sized>(sink: &mut S) -> Result<(), PortError> {
  let mut first_error: Option<PortError> = None;
  for msg in message::all_notes_off() {
    if let Err(err) = sink.send(&msg) {
      if first_error.is_none() {
        first_error = Some(err);
      }
    }
  }
  match first_error {
    Some(err) => Err(err),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Recorder {
    sent: Vec<Vec<u8>>,
  }

  impl MidiSink for Recorder {
    fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
      self.sent.push(message.to_vec());
      Ok(())
    }
  }

  /// Jumps straight to each due time and remembers it.
  #[derive(Default)]
  struct Stepper {
    now: Duration,
    waits: Vec<Duration>,
  }

  impl Pacer for Stepper {
    fn wait_until(&mut self, due: Duration, cancel: &CancelToken) -> bool {
      self.waits.push(due);
      self.now = self.now.max(due);
      cancel.is_cancelled()
    }

    fn elapsed(&self) -> Duration {
      self.now
    }
  }

  fn note_song() -> Song {
    // Format 0, 480 ticks per beat: on, off one beat later.
    let mut data: Vec<u8> = b"MThd".to_vec();
    data.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]);
    let track: [u8; 13] = [
      0x00, 0x90, 60, 100, //
      0x83, 0x60, 0x80, 60, 0, // 480 ticks
      0x00, 0xFF, 0x2F, 0x00,
    ];
    data.extend_from_slice(b"MTrk");
    data.extend_from_slice(&(track.len() as u32).to_be_bytes());
    data.extend_from_slice(&track);
    Song::parse(&data).unwrap()
  }

  #[test]
  fn paced_waits_for_cumulative_due_times() {
    let song: Song = note_song();
    let mut pacer = Stepper::default();
    let cancel = CancelToken::new();
    let count: usize = Paced::new(&song, &mut pacer, &cancel).count();
    assert_eq!(count, 3);
    assert_eq!(
      pacer.waits,
      vec![Duration::ZERO, Duration::from_millis(500), Duration::from_millis(500)]
    );
  }

  #[test]
  fn forwards_messages_then_silences() {
    let song: Song = note_song();
    let mut sink = Recorder::default();
    let mut pacer = Stepper::default();
    let report: PlaybackReport = play(&song, &mut sink, &mut pacer, &CancelToken::new()).unwrap();
    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.forwarded, 2);
    assert_eq!(report.notes, 2);
    assert_eq!(report.skipped_meta, 1);
    assert_eq!(report.elapsed, Duration::from_millis(500));
    assert_eq!(sink.sent.len(), 2 + 16);
    assert_eq!(sink.sent[0], vec![0x90, 60, 100]);
    assert_eq!(sink.sent[1], vec![0x80, 60, 0]);
    assert_eq!(sink.sent[2], vec![0xB0, 123, 0]);
  }

  #[test]
  fn cancelled_before_start_still_silences_once() {
    let song: Song = note_song();
    let mut sink = Recorder::default();
    let mut pacer = Stepper::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let report: PlaybackReport = play(&song, &mut sink, &mut pacer, &cancel).unwrap();
    assert_eq!(report.outcome, Outcome::Interrupted);
    assert_eq!(report.forwarded, 0);
    assert_eq!(sink.sent.len(), 16);
  }

  struct Broken {
    attempts: usize,
  }

  impl MidiSink for Broken {
    fn send(&mut self, _message: &[u8]) -> Result<(), PortError> {
      self.attempts += 1;
      Err(PortError::Send("gone".to_string()))
    }
  }

  #[test]
  fn send_failure_still_attempts_every_channel() {
    let song: Song = note_song();
    let mut sink = Broken { attempts: 0 };
    let mut pacer = Stepper::default();
    let err: PlaybackError = play(&song, &mut sink, &mut pacer, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, PlaybackError::Send { forwarded: 0, .. }));
    assert_eq!(sink.attempts, 1 + 16);
  }
}
