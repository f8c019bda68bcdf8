//! GPIO Note - plays a MIDI note while a GPIO input is high
//!
//! # How to run
//!
//! ```sh
//! cargo run --bin gpio_note
//! cargo run --bin gpio_note -- --chip gpiochip0 --line 23 --note 36
//! ```
//!
//! Requests line 17 on gpiochip4 (the Raspberry Pi 5 header) as a
//! pulled-down input and creates one virtual MIDI output port:
//! - "pedalboard:pedalboard": note on (60, velocity 100) when the line goes
//!   high, note off when it goes low
//!
//! Runs until Ctrl+C. A note still sounding at that point is released.

#[cfg(target_os = "linux")]
fn main() -> anyhow::Result<()> {
  use anyhow::Context;
  use clap::Parser;
  use pedalboard::bridge::{self, BridgeReport};
  use pedalboard::config::BridgeArgs;
  use pedalboard::gpio::{CdevLine, LineConfig};
  use pedalboard::port::VirtualPort;
  use pedalboard::{logging, CancelToken};

  logging::init();
  let args: BridgeArgs = BridgeArgs::parse();

  let line_config: LineConfig = args.line_config();
  let mut line: CdevLine = CdevLine::request(&line_config)
    .with_context(|| format!("requesting {} line {}", line_config.chip, line_config.line))?;
  let mut port: VirtualPort = VirtualPort::open(&args.port.port_config())?;

  let cancel: CancelToken = CancelToken::new();
  cancel
    .cancel_on_ctrlc()
    .context("installing Ctrl+C handler")?;

  println!(
    "Watching {} line {}, sending note {} on '{}'. Ctrl+C to stop.",
    line_config.chip,
    line_config.line,
    args.note,
    port.name()
  );
  let report: BridgeReport = bridge::run(&mut line, &mut port, &args.settings(), &cancel)?;
  port.close();
  println!(
    "Stopped after {} note on / {} note off.",
    report.note_ons, report.note_offs
  );
  Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() -> anyhow::Result<()> {
  anyhow::bail!("gpio_note needs the Linux GPIO character device")
}
