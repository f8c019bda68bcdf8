//! Standard MIDI file loading.
//!
//! A [`Song`] is the file's tracks merged into one stream of [`MidiEvent`]s,
//! with every delta already converted from ticks to wall-clock time.
//!
//! - Format 0/1: tracks merged by absolute tick. Simultaneous events keep
//!   track order, then their order inside the track.
//! - Format 2: tracks played one after the other.
//! - Metrical timing follows tempo meta events (default 120 BPM). A tempo
//!   change applies to the events after it.
//! - SMPTE timing ignores tempo.

use std::fs;
use std::path::Path;
use std::time::Duration;

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use crate::error::LoadError;

/// Microseconds per quarter note until the file says otherwise.
pub const DEFAULT_TEMPO: u32 = 500_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Meta {
  Tempo(u32),
  TrackName(String),
  EndOfTrack,
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
  /// Status byte plus data bytes, or a complete `F0 .. F7` SysEx frame.
  Message(Vec<u8>),
  Meta(Meta),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
  /// Time since the previous event in the merged stream.
  pub delta: Duration,
  pub payload: Payload,
}

impl MidiEvent {
  pub fn is_meta(&self) -> bool {
    matches!(self.payload, Payload::Meta(_))
  }

  /// Raw bytes to put on the wire, `None` for meta events.
  pub fn bytes(&self) -> Option<&[u8]> {
    match &self.payload {
      Payload::Message(bytes) => Some(bytes),
      Payload::Meta(_) => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Song {
  pub format: Format,
  pub timing: Timing,
  pub track_count: usize,
  events: Vec<MidiEvent>,
}

impl Song {
  pub fn load(path: &Path) -> Result<Song, LoadError> {
    let data: Vec<u8> = fs::read(path).map_err(|source| LoadError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Song::parse(&data).map_err(|source| LoadError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn parse(data: &[u8]) -> Result<Song, midly::Error> {
    let smf: Smf = Smf::parse(data)?;
    Ok(Song::from_smf(&smf))
  }

  pub fn from_smf(smf: &Smf) -> Song {
    let stamped: Vec<(u64, &TrackEventKind)> = merge_tracks(smf.header.format, &smf.tracks);
    let mut clock: TickClock = TickClock::new(smf.header.timing);
    let mut events: Vec<MidiEvent> = Vec::with_capacity(stamped.len());
    let mut previous_tick: u64 = 0;
    for (tick, kind) in stamped {
      let delta: Duration = clock.duration(tick - previous_tick);
      previous_tick = tick;
      let payload: Payload = payload(kind);
      if let Payload::Meta(Meta::Tempo(tempo)) = payload {
        clock.set_tempo(tempo);
      }
      events.push(MidiEvent { delta, payload });
    }
    Song {
      format: smf.header.format,
      timing: smf.header.timing,
      track_count: smf.tracks.len(),
      events,
    }
  }

  pub fn events(&self) -> &[MidiEvent] {
    &self.events
  }

  /// Number of events that would reach the port.
  pub fn message_count(&self) -> usize {
    self.events.iter().filter(|event| !event.is_meta()).count()
  }

  pub fn duration(&self) -> Duration {
    self.events.iter().map(|event| event.delta).sum()
  }
}

fn merge_tracks<'a, 'e>(
  format: Format,
  tracks: &'e [Vec<TrackEvent<'a>>],
) -> Vec<(u64, &'e TrackEventKind<'a>)> {
  let mut stamped: Vec<(u64, &TrackEventKind)> = Vec::new();
  let mut track_start: u64 = 0;
  for track in tracks.iter() {
    let mut tick: u64 = track_start;
    for event in track.iter() {
      tick += u64::from(event.delta.as_int());
      stamped.push((tick, &event.kind));
    }
    if format == Format::Sequential {
      track_start = tick;
    }
  }
  if format != Format::Sequential {
    // Stable, so ties keep track order.
    stamped.sort_by_key(|(tick, _)| *tick);
  }
  stamped
}

fn payload(kind: &TrackEventKind) -> Payload {
  match kind {
    TrackEventKind::Midi { channel, message } => {
      Payload::Message(encode_channel_message(channel.as_int(), message))
    }
    TrackEventKind::SysEx(data) => {
      let mut bytes: Vec<u8> = Vec::with_capacity(data.len() + 1);
      bytes.push(0xF0);
      bytes.extend_from_slice(data);
      Payload::Message(bytes)
    }
    TrackEventKind::Escape(data) => Payload::Message(data.to_vec()),
    TrackEventKind::Meta(meta) => Payload::Meta(match meta {
      MetaMessage::Tempo(tempo) => Meta::Tempo(tempo.as_int()),
      MetaMessage::TrackName(name) => Meta::TrackName(String::from_utf8_lossy(name).into_owned()),
      MetaMessage::EndOfTrack => Meta::EndOfTrack,
      _ => Meta::Other,
    }),
  }
}

fn encode_channel_message(channel: u8, message: &MidiMessage) -> Vec<u8> {
  match *message {
    MidiMessage::NoteOff { key, vel } => vec![0x80 | channel, key.as_int(), vel.as_int()],
    MidiMessage::NoteOn { key, vel } => vec![0x90 | channel, key.as_int(), vel.as_int()],
    MidiMessage::Aftertouch { key, vel } => vec![0xA0 | channel, key.as_int(), vel.as_int()],
    MidiMessage::Controller { controller, value } => {
      vec![0xB0 | channel, controller.as_int(), value.as_int()]
    }
    MidiMessage::ProgramChange { program } => vec![0xC0 | channel, program.as_int()],
    MidiMessage::ChannelAftertouch { vel } => vec![0xD0 | channel, vel.as_int()],
    MidiMessage::PitchBend { bend } => {
      let raw: u16 = bend.0.as_int();
      vec![0xE0 | channel, (raw & 0x7F) as u8, (raw >> 7) as u8]
    }
  }
}

/// Converts tick counts to durations under the current tempo.
#[derive(Debug, Clone, Copy)]
struct TickClock {
  timing: Timing,
  tempo: u32,
}

impl TickClock {
  fn new(timing: Timing) -> Self {
    TickClock {
      timing,
      tempo: DEFAULT_TEMPO,
    }
  }

  fn set_tempo(&mut self, tempo: u32) {
    self.tempo = tempo;
  }

  fn duration(&self, ticks: u64) -> Duration {
    match self.timing {
      Timing::Metrical(ticks_per_beat) => {
        let ticks_per_beat: u128 = u128::from(ticks_per_beat.as_int().max(1));
        let nanos: u128 = u128::from(ticks) * u128::from(self.tempo) * 1_000 / ticks_per_beat;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
      }
      Timing::Timecode(fps, subframes) => {
        let ticks_per_second: f64 = f64::from(fps.as_f32()) * f64::from(subframes.max(1));
        Duration::from_secs_f64(ticks as f64 / ticks_per_second)
      }
    }
  }
}
