//! Virtual MIDI output port.
//!
//! On Linux the port shows up in ALSA as `<client>:<port>` (see `aconnect -l`
//! or QJackCtl's ALSA tab); on macOS as a CoreMIDI source named `<port>`.

use midir::os::unix::VirtualOutput;
use midir::{MidiInput, MidiInputPort, MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

use crate::error::PortError;

pub const DEFAULT_PORT_NAME: &str = "pedalboard";

/// Anything that accepts raw MIDI messages.
pub trait MidiSink {
  fn send(&mut self, message: &[u8]) -> Result<(), PortError>;
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
  fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
    (**self).send(message)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
  pub client_name: String,
  pub port_name: String,
  /// Skip the check for another process already exposing the same port.
  pub allow_duplicate: bool,
}

impl Default for PortConfig {
  fn default() -> Self {
    PortConfig {
      client_name: DEFAULT_PORT_NAME.to_string(),
      port_name: DEFAULT_PORT_NAME.to_string(),
      allow_duplicate: false,
    }
  }
}

pub struct VirtualPort {
  name: String,
  conn: MidiOutputConnection,
}

impl VirtualPort {
  /// Creates the virtual port, refusing if another instance already has it
  /// (unless `allow_duplicate` is set).
  pub fn open(config: &PortConfig) -> Result<Self, PortError> {
    if !config.allow_duplicate {
      ensure_unclaimed(config)?;
    }
    let midi_out: MidiOutput =
      MidiOutput::new(&config.client_name).map_err(|err| PortError::Init {
        client: config.client_name.clone(),
        reason: err.to_string(),
      })?;
    let conn: MidiOutputConnection =
      midi_out
        .create_virtual(&config.port_name)
        .map_err(|err| PortError::Create {
          port: config.port_name.clone(),
          reason: err.to_string(),
        })?;
    let name: String = format!("{}:{}", config.client_name, config.port_name);
    info!(port = %name, "virtual MIDI port created");
    Ok(VirtualPort { name, conn })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn close(self) {
    let _: MidiOutput = self.conn.close();
    info!(port = %self.name, "virtual MIDI port closed");
  }
}

impl MidiSink for VirtualPort {
  fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
    self
      .conn
      .send(message)
      .map_err(|err| PortError::Send(err.to_string()))
  }
}

/// Looks for a readable MIDI port that already carries our name.
pub fn ensure_unclaimed(config: &PortConfig) -> Result<(), PortError> {
  let probe_name: String = format!("{}-probe", config.client_name);
  let midi_in: MidiInput = MidiInput::new(&probe_name).map_err(|err| PortError::Init {
    client: probe_name.clone(),
    reason: err.to_string(),
  })?;
  let ports: Vec<MidiInputPort> = midi_in.ports();
  for port in ports.iter() {
    let Ok(name) = midi_in.port_name(port) else {
      continue;
    };
    debug!(%name, "existing MIDI port");
    if claims(&name, &config.client_name, &config.port_name) {
      return Err(PortError::InUse(name));
    }
  }
  Ok(())
}

/// ALSA reports `client:port client_id:port_id`, CoreMIDI just the port name.
fn claims(existing: &str, client_name: &str, port_name: &str) -> bool {
  existing == port_name || existing.starts_with(&format!("{}:{} ", client_name, port_name))
    || existing == format!("{}:{}", client_name, port_name)
}
