use std::io::Write;

use assert_cmd::Command;

fn player() -> Command {
  Command::cargo_bin("play_midi_file").unwrap()
}

#[test]
fn missing_argument_prints_usage_and_exits_1() {
  let assert = player().assert().code(1);
  let stderr: String = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
  assert!(stderr.contains("Usage"), "stderr was: {stderr}");
  let stdout: String = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
  assert!(!stdout.contains("Playing MIDI file"));
}

#[test]
fn help_still_exits_0() {
  player().arg("--help").assert().success();
}

#[test]
fn nonexistent_file_exits_1() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nope.mid");
  let assert = player().arg(&path).assert().code(1);
  let stdout: String = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
  assert!(stdout.contains("Failed to open MIDI file"), "stdout was: {stdout}");
  assert!(!stdout.contains("Playing MIDI file"));
}

#[test]
fn invalid_file_exits_1() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(b"MThd but not really").unwrap();
  let assert = player().arg(file.path()).assert().code(1);
  let stdout: String = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
  assert!(stdout.contains("Failed to open MIDI file"), "stdout was: {stdout}");
}

#[test]
fn truncated_file_exits_1_without_playing() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x00\x60").unwrap();
  file.write_all(b"MTrk\x00\x00\x00\x0C\x00\x90\x3C\x64\x60\x80").unwrap();
  let assert = player().arg(file.path()).assert().code(1);
  let stdout: String = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
  assert!(stdout.contains("Failed to open MIDI file"), "stdout was: {stdout}");
  assert!(!stdout.contains("Playing MIDI file"));
}
