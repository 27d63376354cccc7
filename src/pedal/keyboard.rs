use super::{InputLines, Pedal, PedalSet};
use crossbeam::channel::{Receiver, Sender};
use log::{info, warn};
use std::io::{self, BufRead};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Press, then release on its own after the tap length.
    Tap,
    Hold,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCommand {
    pub pedal: Pedal,
    pub action: KeyAction,
}

/// Parses `[hold|release] <pedal>`, e.g. `t`, `next`, `hold tap`.
pub fn parse_command(line: &str) -> Option<KeyCommand> {
    let mut words = line.split_whitespace();
    let first = words.next()?.to_ascii_lowercase();

    let (action, name) = match first.as_str() {
        "hold" => (KeyAction::Hold, words.next()?.to_ascii_lowercase()),
        "release" => (KeyAction::Release, words.next()?.to_ascii_lowercase()),
        _ => (KeyAction::Tap, first),
    };
    if words.next().is_some() {
        return None;
    }

    let pedal = match name.as_str() {
        "p" | "prev" => Pedal::Prev,
        "n" | "next" => Pedal::Next,
        "y" | "play" => Pedal::Play,
        "c" | "pause" | "continue" => Pedal::Continue,
        "t" | "tap" | "tempo" => Pedal::Tempo,
        _ => return None,
    };
    Some(KeyCommand { pedal, action })
}

/// Pedal lines driven by typed commands instead of GPIO.
pub struct KeyboardLines {
    rx: Receiver<KeyCommand>,
    held: PedalSet,
    release_at: [Option<Instant>; 5],
    tap_length: Duration,
}

impl KeyboardLines {
    pub fn new(rx: Receiver<KeyCommand>, tap_length: Duration) -> Self {
        KeyboardLines {
            rx,
            held: PedalSet::EMPTY,
            release_at: [None; 5],
            tap_length,
        }
    }

    fn refresh(&mut self) {
        let now = Instant::now();

        while let Ok(command) = self.rx.try_recv() {
            let slot = index(command.pedal);
            match command.action {
                KeyAction::Tap => {
                    self.held.insert(command.pedal);
                    self.release_at[slot] = Some(now + self.tap_length);
                }
                KeyAction::Hold => {
                    self.held.insert(command.pedal);
                    self.release_at[slot] = None;
                }
                KeyAction::Release => {
                    self.release(command.pedal);
                }
            }
        }

        for pedal in Pedal::ALL {
            if matches!(self.release_at[index(pedal)], Some(at) if now >= at) {
                self.release(pedal);
            }
        }
    }

    fn release(&mut self, pedal: Pedal) {
        self.held.remove(pedal);
        self.release_at[index(pedal)] = None;
    }
}

fn index(pedal: Pedal) -> usize {
    pedal.bit().trailing_zeros() as usize
}

impl InputLines for KeyboardLines {
    fn read_line(&mut self, pedal: Pedal) -> bool {
        self.refresh();
        self.held.contains(pedal)
    }
}

/// Reads commands from stdin until EOF and forwards them to the loop.
pub fn spawn_stdin_reader(tx: Sender<KeyCommand>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        info!("Pedal command reader started");
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => {
                    warn!("Unrecognised pedal command: {:?}", line);
                    eprintln!("Commands: p|n|y|c|t, or hold/release <pedal>");
                }
            }
        }
        info!("Pedal command reader stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            parse_command("t"),
            Some(KeyCommand {
                pedal: Pedal::Tempo,
                action: KeyAction::Tap
            })
        );
        assert_eq!(
            parse_command("  Hold PLAY "),
            Some(KeyCommand {
                pedal: Pedal::Play,
                action: KeyAction::Hold
            })
        );
        assert_eq!(
            parse_command("release pause"),
            Some(KeyCommand {
                pedal: Pedal::Continue,
                action: KeyAction::Release
            })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_command("jump"), None);
        assert_eq!(parse_command("hold"), None);
        assert_eq!(parse_command("next please"), None);
    }

    #[test]
    fn test_hold_and_release() {
        let (tx, rx) = unbounded();
        let mut lines = KeyboardLines::new(rx, Duration::from_millis(50));

        tx.send(KeyCommand {
            pedal: Pedal::Tempo,
            action: KeyAction::Hold,
        })
        .unwrap();
        assert!(lines.read_line(Pedal::Tempo));
        assert!(!lines.read_line(Pedal::Play));

        tx.send(KeyCommand {
            pedal: Pedal::Tempo,
            action: KeyAction::Release,
        })
        .unwrap();
        assert!(!lines.read_line(Pedal::Tempo));
    }

    #[test]
    fn test_tap_releases_itself() {
        let (tx, rx) = unbounded();
        let mut lines = KeyboardLines::new(rx, Duration::ZERO);

        tx.send(KeyCommand {
            pedal: Pedal::Next,
            action: KeyAction::Tap,
        })
        .unwrap();
        // A zero-length tap expires on the same refresh that applies it.
        assert!(!lines.read_line(Pedal::Next));
    }
}
