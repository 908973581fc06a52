use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use polar_core::{CueId, OnlineSwitch, ShowCommand, ShowSnapshot};
use tokio::sync::{mpsc, watch};

const SEEK_STEP_SECS: f64 = 5.0;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Maps key presses to show commands.
pub struct KeyMap {
    pub fade_out_ms: u64,
}

impl KeyMap {
    pub fn command_for(&self, key: KeyEvent, snapshot: &ShowSnapshot) -> Option<ShowCommand> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let command = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => ShowCommand::Shutdown,
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => ShowCommand::Shutdown,
            (KeyCode::Char('1'), _) => ShowCommand::SelectCue(CueId::Unloading),
            (KeyCode::Char('2'), _) => ShowCommand::SelectCue(CueId::HeadElf),
            (KeyCode::Char('3'), _) => ShowCommand::SelectCue(CueId::Rockin),
            (KeyCode::Char('p'), _) => ShowCommand::Play,
            (KeyCode::Char(' '), _) => ShowCommand::Pause,
            (KeyCode::Char('s'), _) => ShowCommand::Stop,
            (KeyCode::Char('f'), _) => ShowCommand::FadeOut(self.fade_out_ms),
            (KeyCode::Char('r'), _) => ShowCommand::Reset,
            (KeyCode::Left, _) => seek_by(snapshot, -SEEK_STEP_SECS)?,
            (KeyCode::Right, _) => seek_by(snapshot, SEEK_STEP_SECS)?,
            (KeyCode::Home, _) => ShowCommand::Seek(0.0),
            _ => return None,
        };
        Some(command)
    }

    /// The online toggle is handled by the input thread, not the show.
    pub fn is_online_toggle(&self, key: KeyEvent) -> bool {
        key.kind != KeyEventKind::Release && key.code == KeyCode::Char('o')
    }
}

fn seek_by(snapshot: &ShowSnapshot, seconds: f64) -> Option<ShowCommand> {
    if snapshot.length_seconds <= 0.0 {
        return None;
    }
    let target = snapshot.position_seconds + seconds;
    Some(ShowCommand::Seek(target / snapshot.length_seconds))
}

/// Leaves raw mode when dropped.
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Reads keys on a dedicated thread until the show stops listening.
pub fn spawn_input_thread(
    keymap: KeyMap,
    commands: mpsc::Sender<ShowCommand>,
    snapshots: watch::Receiver<ShowSnapshot>,
    online: OnlineSwitch,
) -> std::io::Result<JoinHandle<()>> {
    let raw_mode = RawMode::enable()?;

    Ok(thread::spawn(move || {
        let _raw_mode = raw_mode;
        while !commands.is_closed() {
            match event::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    log::warn!("Key input unavailable: {}", e);
                    break;
                }
            }

            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if keymap.is_online_toggle(key) {
                let online = online.toggle();
                log::info!("Link monitoring {}", if online { "online" } else { "offline" });
                continue;
            }
            let command = keymap.command_for(key, &snapshots.borrow());
            if let Some(command) = command {
                if commands.blocking_send(command).is_err() {
                    break;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use polar_core::LinkStatus;

    use super::*;

    fn snapshot(position: f64, length: f64) -> ShowSnapshot {
        ShowSnapshot {
            cue: Some(CueId::Unloading),
            position_seconds: position,
            length_seconds: length,
            paused: false,
            overlay_active: false,
            hold_white: false,
            link_status: LinkStatus::Down,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cue_keys() {
        let keymap = KeyMap { fade_out_ms: 800 };
        let snap = snapshot(0.0, 100.0);
        assert_eq!(
            keymap.command_for(press(KeyCode::Char('2')), &snap),
            Some(ShowCommand::SelectCue(CueId::HeadElf))
        );
        assert_eq!(
            keymap.command_for(press(KeyCode::Char('f')), &snap),
            Some(ShowCommand::FadeOut(800))
        );
        assert_eq!(keymap.command_for(press(KeyCode::Char('x')), &snap), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let keymap = KeyMap { fade_out_ms: 800 };
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            keymap.command_for(key, &snapshot(0.0, 0.0)),
            Some(ShowCommand::Shutdown)
        );
    }

    #[test]
    fn test_arrow_seek_is_relative() {
        let keymap = KeyMap { fade_out_ms: 800 };
        assert_eq!(
            keymap.command_for(press(KeyCode::Right), &snapshot(20.0, 100.0)),
            Some(ShowCommand::Seek(0.25))
        );
        assert_eq!(
            keymap.command_for(press(KeyCode::Left), &snapshot(20.0, 0.0)),
            None
        );
    }

    #[test]
    fn test_online_toggle_key() {
        let keymap = KeyMap { fade_out_ms: 800 };
        let key = press(KeyCode::Char('o'));
        assert!(keymap.is_online_toggle(key));
        assert_eq!(keymap.command_for(key, &snapshot(0.0, 0.0)), None);
        assert!(!keymap.is_online_toggle(press(KeyCode::Char('p'))));
    }
}
