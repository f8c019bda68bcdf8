//! Raw MIDI message helpers.

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const ALL_NOTES_OFF: u8 = 123;
pub const CHANNELS: u8 = 16;

pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
  [NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

pub fn note_off(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
  [NOTE_OFF | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

/// Control change 123, value 0, on every channel in order.
pub fn all_notes_off() -> impl Iterator<Item = [u8; 3]> {
  (0..CHANNELS).map(|channel: u8| [CONTROL_CHANGE | channel, ALL_NOTES_OFF, 0])
}

pub fn get_channel(data: &[u8]) -> Option<u8> {
  match data.first() {
    Some(&status) if (0x80..0xF0).contains(&status) => Some(status & 0x0F),
    _ => None,
  }
}

pub fn is_note_on(data: &[u8]) -> bool {
  if data.len() >= 3 {
    let status: u8 = data[0] & 0xF0;
    status == NOTE_ON && data[2] > 0
  } else {
    false
  }
}

pub fn is_note_off(data: &[u8]) -> bool {
  if data.len() >= 3 {
    let status: u8 = data[0] & 0xF0;
    // Note off, or note on with velocity 0
    status == NOTE_OFF || (status == NOTE_ON && data[2] == 0)
  } else {
    false
  }
}

pub fn is_note_event(data: &[u8]) -> bool {
  is_note_on(data) || is_note_off(data)
}
