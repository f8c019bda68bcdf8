//! Command-line configuration for both binaries.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};

use crate::bridge::{self, BridgeSettings};
use crate::gpio::{self, LineConfig};
use crate::port::{PortConfig, DEFAULT_PORT_NAME};

#[derive(Debug, Clone, Args)]
pub struct PortArgs {
  /// MIDI client name the virtual port is registered under
  #[arg(long, default_value = DEFAULT_PORT_NAME)]
  pub client_name: String,

  /// Name of the virtual output port
  #[arg(long, default_value = DEFAULT_PORT_NAME)]
  pub port_name: String,

  /// Start even if another process already exposes a port with this name
  #[arg(long)]
  pub allow_duplicate_port: bool,
}

impl PortArgs {
  pub fn port_config(&self) -> PortConfig {
    PortConfig {
      client_name: self.client_name.clone(),
      port_name: self.port_name.clone(),
      allow_duplicate: self.allow_duplicate_port,
    }
  }
}

/// Play a MIDI file to a virtual MIDI output port in real time.
#[derive(Debug, Clone, Parser)]
#[command(name = "play_midi_file", version)]
pub struct PlayerArgs {
  /// Standard MIDI file to play
  pub file: PathBuf,

  #[command(flatten)]
  pub port: PortArgs,
}

/// Send a MIDI note whenever a GPIO input changes level.
#[derive(Debug, Clone, Parser)]
#[command(name = "gpio_note", version)]
pub struct BridgeArgs {
  /// GPIO chip name or device path
  #[arg(long, default_value = gpio::DEFAULT_CHIP)]
  pub chip: String,

  /// Line offset on the chip
  #[arg(long, default_value_t = gpio::DEFAULT_LINE)]
  pub line: u32,

  /// Consumer label shown by gpioinfo
  #[arg(long, default_value = gpio::DEFAULT_CONSUMER)]
  pub consumer: String,

  /// Note number to play
  #[arg(long, default_value_t = bridge::DEFAULT_NOTE, value_parser = clap::value_parser!(u8).range(0..=127))]
  pub note: u8,

  /// Velocity for note on and note off
  #[arg(long, default_value_t = bridge::DEFAULT_VELOCITY, value_parser = clap::value_parser!(u8).range(0..=127))]
  pub velocity: u8,

  /// MIDI channel, 0-15
  #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=15))]
  pub channel: u8,

  /// Poll period when edge events are unavailable
  #[arg(long, default_value_t = 1)]
  pub poll_interval_ms: u64,

  /// Minimum time a new level must hold before it counts (0 = off)
  #[arg(long, default_value_t = 0)]
  pub debounce_ms: u64,

  /// Poll the line instead of waiting for edge events
  #[arg(long)]
  pub polling: bool,

  #[command(flatten)]
  pub port: PortArgs,
}

impl BridgeArgs {
  pub fn line_config(&self) -> LineConfig {
    LineConfig {
      chip: self.chip.clone(),
      line: self.line,
      consumer: self.consumer.clone(),
      edges: !self.polling,
      debounce: Duration::from_millis(self.debounce_ms),
    }
  }

  pub fn settings(&self) -> BridgeSettings {
    BridgeSettings {
      channel: self.channel,
      note: self.note,
      velocity: self.velocity,
      poll_interval: Duration::from_millis(self.poll_interval_ms),
      debounce: Duration::from_millis(self.debounce_ms),
    }
  }
}
