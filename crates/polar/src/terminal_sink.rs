use std::io::{self, Stdout, Write};

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use polar_core::{FixtureColorFrame, FixtureSink, LinkStatus, ShowSnapshot};
use tokio::sync::watch;

/// Draws the fixture strip as a row of colored dots followed by a status
/// line, redrawn in place every frame.
pub struct TerminalSink {
    out: Stdout,
    snapshots: watch::Receiver<ShowSnapshot>,
}

impl TerminalSink {
    pub fn new(snapshots: watch::Receiver<ShowSnapshot>) -> Self {
        Self {
            out: io::stdout(),
            snapshots,
        }
    }

    fn draw(&mut self, frame: &FixtureColorFrame) -> io::Result<()> {
        let status = status_line(&self.snapshots.borrow());

        queue!(self.out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        for &(r, g, b) in frame.colors() {
            queue!(
                self.out,
                SetForegroundColor(Color::Rgb { r, g, b }),
                Print('●')
            )?;
        }
        queue!(self.out, ResetColor, Print(' '), Print(status))?;
        self.out.flush()
    }
}

impl FixtureSink for TerminalSink {
    fn send(&mut self, frame: &FixtureColorFrame) {
        if let Err(e) = self.draw(frame) {
            log::debug!("Terminal draw failed: {}", e);
        }
    }
}

fn status_line(snapshot: &ShowSnapshot) -> String {
    let cue = snapshot
        .cue
        .map(|cue| cue.to_string())
        .unwrap_or_else(|| "--".to_string());
    let link = match snapshot.link_status {
        LinkStatus::Up => "DMX ONLINE",
        LinkStatus::Down => "DMX OFFLINE",
    };
    let mut line = format!(
        "{}  {} / {}  [{}]",
        cue,
        snapshot.position_label(),
        snapshot.length_label(),
        link
    );
    if snapshot.paused {
        line.push_str(" PAUSED");
    }
    if snapshot.hold_white {
        line.push_str(" HOLD");
    }
    line
}
