//! Play MIDI File - replays a standard MIDI file to a virtual MIDI port
//!
//! # How to run
//!
//! ```sh
//! cargo run --bin play_midi_file -- path/to/song.mid
//! ```
//!
//! Creates one virtual MIDI output port:
//! - "pedalboard:pedalboard": every non-meta event of the file, at the
//!   file's own tempo
//!
//! Connect it to a synth with `aconnect` or QJackCtl's ALSA tab. Ctrl+C
//! stops early. Either way all notes are switched off on every channel
//! before the port closes.

use std::process::ExitCode;
use clap::Parser;
use pedalboard::config::PlayerArgs;
use pedalboard::playback::{self, Outcome, PlaybackReport, WallClock};
use pedalboard::port::VirtualPort;
use pedalboard::song::Song;
use pedalboard::{logging, CancelToken, PlaybackError};
use tracing::{error, info};

fn main() -> ExitCode {
  logging::init();

  let args: PlayerArgs = match PlayerArgs::try_parse() {
    Ok(args) => args,
    Err(err) if err.use_stderr() => {
      let _ = err.print();
      return ExitCode::from(1);
    }
    Err(err) => err.exit(),
  };

  let song: Song = match Song::load(&args.file) {
    Ok(song) => song,
    Err(err) => {
      println!("Failed to open MIDI file: {}", err);
      return ExitCode::from(1);
    }
  };
  info!(
    format = ?song.format,
    tracks = song.track_count,
    messages = song.message_count(),
    duration = ?song.duration(),
    "loaded MIDI file"
  );

  let mut port: VirtualPort = match VirtualPort::open(&args.port.port_config()) {
    Ok(port) => port,
    Err(err) => {
      println!("Failed to open virtual MIDI port: {}", err);
      return ExitCode::from(1);
    }
  };

  let cancel: CancelToken = CancelToken::new();
  if let Err(err) = cancel.cancel_on_ctrlc() {
    error!(error = %err, "could not install Ctrl+C handler");
  }

  println!("Playing MIDI file: {}", args.file.display());
  let mut clock: WallClock = WallClock::start();
  let result: Result<PlaybackReport, PlaybackError> =
    playback::play(&song, &mut port, &mut clock, &cancel);
  port.close();

  match result {
    Ok(report) => {
      if report.outcome == Outcome::Interrupted {
        println!("\nPlayback interrupted. All notes off sent.");
      }
      println!("Finished playing in {:.2} seconds.", report.elapsed.as_secs_f64());
      ExitCode::SUCCESS
    }
    Err(err) => {
      println!("Playback failed: {}", err);
      ExitCode::from(1)
    }
  }
}
