//! Pedalboard - MIDI file playback and GPIO-to-MIDI bridging
//!
//! Shared pieces behind the two binaries:
//! - `play_midi_file`: replays a standard MIDI file to a virtual output port
//! - `gpio_note`: turns a GPIO input pin into note-on/note-off messages
//!
//! The binaries own the real collaborators (a `midir` virtual port, a
//! `gpiocdev` line request). Everything in here talks to them through the
//! [`port::MidiSink`] and [`gpio::LineSource`] traits so the loops can be
//! driven by fakes in tests.

pub mod bridge;
pub mod cancel;
pub mod config;
pub mod error;
pub mod gpio;
pub mod logging;
pub mod message;
pub mod playback;
pub mod port;
pub mod song;

pub use cancel::CancelToken;
pub use error::{BridgeError, GpioError, LoadError, PlaybackError, PortError};
