//! GPIO input lines.
//!
//! [`LineSource`] is what the bridge loop needs from a pin. On Linux,
//! [`CdevLine`] backs it with the GPIO character device; tests use scripted
//! fakes.

use std::fmt;
use std::time::Duration;

use crate::error::GpioError;

pub const DEFAULT_CHIP: &str = "gpiochip4";
pub const DEFAULT_LINE: u32 = 17;
pub const DEFAULT_CONSUMER: &str = "note";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Low,
  High,
}

impl From<bool> for Level {
  fn from(high: bool) -> Self {
    if high {
      Level::High
    } else {
      Level::Low
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Level::Low => write!(f, "0"),
      Level::High => write!(f, "1"),
    }
  }
}

pub trait LineSource {
  fn read(&mut self) -> Result<Level, GpioError>;

  /// Whether [`LineSource::wait_edge`] can be used instead of polling.
  fn supports_edges(&self) -> bool {
    false
  }

  /// Blocks up to `timeout` for the next edge and returns the level it
  /// left the line at, or `None` if nothing happened.
  fn wait_edge(&mut self, _timeout: Duration) -> Result<Option<Level>, GpioError> {
    Err(GpioError::EdgesUnsupported)
  }
}

impl<L: LineSource + ?Sized> LineSource for &mut L {
  fn read(&mut self) -> Result<Level, GpioError> {
    (**self).read()
  }

  fn supports_edges(&self) -> bool {
    (**self).supports_edges()
  }

  fn wait_edge(&mut self, timeout: Duration) -> Result<Option<Level>, GpioError> {
    (**self).wait_edge(timeout)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
  /// Chip name (`gpiochip4`) or device path (`/dev/gpiochip4`).
  pub chip: String,
  pub line: u32,
  pub consumer: String,
  /// Ask the kernel for edge events; falls back to polling if refused.
  pub edges: bool,
  /// Kernel debounce period, only used together with edge events.
  pub debounce: Duration,
}

impl Default for LineConfig {
  fn default() -> Self {
    LineConfig {
      chip: DEFAULT_CHIP.to_string(),
      line: DEFAULT_LINE,
      consumer: DEFAULT_CONSUMER.to_string(),
      edges: true,
      debounce: Duration::ZERO,
    }
  }
}

impl LineConfig {
  pub fn chip_path(&self) -> String {
    if self.chip.contains('/') {
      self.chip.clone()
    } else {
      format!("/dev/{}", self.chip)
    }
  }
}

#[cfg(target_os = "linux")]
pub use cdev::CdevLine;

#[cfg(target_os = "linux")]
mod cdev {
  use std::time::Duration;

  use gpiocdev::line::{Bias, EdgeDetection, EdgeKind, Value};
  use gpiocdev::request::{Builder, Request};
  use tracing::{info, warn};

  use super::{Level, LineConfig, LineSource};
  use crate::error::GpioError;

  /// A single pulled-down input line held for as long as this value lives.
  pub struct CdevLine {
    request: Request,
    offset: u32,
    edges: bool,
  }

  impl CdevLine {
    pub fn request(config: &LineConfig) -> Result<Self, GpioError> {
      if config.edges {
        match Self::build(config, true).request() {
          Ok(request) => {
            info!(chip = %config.chip, line = config.line, "edge detection enabled");
            return Ok(CdevLine {
              request,
              offset: config.line,
              edges: true,
            });
          }
          Err(err) => {
            warn!(error = %err, "edge detection unavailable, polling instead");
          }
        }
      }
      let request: Request = Self::build(config, false)
        .request()
        .map_err(|err| GpioError::Request {
          chip: config.chip.clone(),
          line: config.line,
          reason: err.to_string(),
        })?;
      Ok(CdevLine {
        request,
        offset: config.line,
        edges: false,
      })
    }

    fn build(config: &LineConfig, edges: bool) -> Builder {
      let mut builder: Builder = Request::builder();
      builder
        .on_chip(config.chip_path())
        .with_consumer(config.consumer.as_str())
        .with_line(config.line)
        .as_input()
        .with_bias(Bias::PullDown);
      if edges {
        builder.with_edge_detection(EdgeDetection::BothEdges);
        if !config.debounce.is_zero() {
          builder.with_debounce_period(config.debounce);
        }
      }
      builder
    }
  }

  impl LineSource for CdevLine {
    fn read(&mut self) -> Result<Level, GpioError> {
      let value: Value = self
        .request
        .value(self.offset)
        .map_err(|err| GpioError::Read(err.to_string()))?;
      Ok(Level::from(value == Value::Active))
    }

    fn supports_edges(&self) -> bool {
      self.edges
    }

    fn wait_edge(&mut self, timeout: Duration) -> Result<Option<Level>, GpioError> {
      if !self.edges {
        return Err(GpioError::EdgesUnsupported);
      }
      let ready: bool = self
        .request
        .wait_edge_event(timeout)
        .map_err(|err| GpioError::Edge(err.to_string()))?;
      if !ready {
        return Ok(None);
      }
      let event = self
        .request
        .read_edge_event()
        .map_err(|err| GpioError::Edge(err.to_string()))?;
      Ok(Some(Level::from(event.kind == EdgeKind::Rising)))
    }
  }
}
