//! Replay of a recorded `PlayablePresentation`.
//!
//! Treats the recording as an immutable visual script: frames are applied in
//! order, stepping backwards rebuilds the grid from the start, and shot
//! markers allow jumping from shot to shot.

use std::io::{self, Write};

use anyhow::{Result, bail};
use crossterm::event;

use crate::menubar::print_menu;
use crate::types::{Cell, Frame, PlayablePresentation};

use super::{blank_grid, draw_grid, draw_status, in_terminal};

pub struct ReplayPlayer {
    presentation: PlayablePresentation,
    current_frame: usize,
    grid: Vec<Vec<Cell>>,
}

impl ReplayPlayer {
    pub fn new(presentation: PlayablePresentation) -> Self {
        let grid = blank_grid(&presentation.contract);
        let mut player = Self {
            presentation,
            current_frame: 0,
            grid,
        };
        player.apply_frame(0);
        player
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    /// Play the recording in the terminal.
    pub fn play(&mut self) -> Result<()> {
        if self.presentation.frames.is_empty() {
            bail!("Recording has no frames");
        }
        let contract = self.presentation.contract.clone();
        in_terminal(&contract, |stdout| self.run_loop(stdout))
    }

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        self.seek(0);
        self.render_menubar(stdout)?;
        self.render_full(stdout)?;

        loop {
            match event::read()? {
                event::Event::Key(key) => {
                    use event::KeyCode::*;
                    let target = match key.code {
                        Char('q') | Esc => break,
                        Right | Char(' ') | Enter => Some(self.current_frame + 1),
                        Left => self.current_frame.checked_sub(1),
                        PageDown => self.next_marker(),
                        PageUp => self.prev_marker(),
                        Home => Some(0),
                        End => Some(self.last_frame()),
                        _ => None,
                    };
                    if let Some(target) = target.filter(|t| *t != self.current_frame) {
                        self.seek(target);
                        self.render_full(stdout)?;
                    }
                }
                event::Event::Resize(_, _) => {
                    self.render_menubar(stdout)?;
                    self.render_full(stdout)?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Grid management
    // -----------------------------------------------------------------------

    fn last_frame(&self) -> usize {
        self.presentation.frames.len().saturating_sub(1)
    }

    /// Move to `target` (clamped), applying frames forward or rebuilding.
    pub fn seek(&mut self, target: usize) {
        let target = target.min(self.last_frame());
        if target < self.current_frame || target == 0 {
            self.grid = blank_grid(&self.presentation.contract);
            for i in 0..=target {
                self.apply_frame(i);
            }
        } else {
            for i in self.current_frame + 1..=target {
                self.apply_frame(i);
            }
        }
        self.current_frame = target;
    }

    fn apply_frame(&mut self, index: usize) {
        let Some(frame) = self.presentation.frames.get(index) else {
            return;
        };
        match frame {
            Frame::Full { cells } => {
                self.grid = cells.clone();
            }
            Frame::Diff { changes } => {
                for change in changes {
                    let x = change.x as usize;
                    let y = change.y as usize;
                    if let Some(cell) = self.grid.get_mut(y).and_then(|row| row.get_mut(x)) {
                        *cell = change.cell.clone();
                    }
                }
            }
        }
    }

    pub fn next_marker(&self) -> Option<usize> {
        self.presentation
            .markers
            .iter()
            .map(|m| m.frame_index)
            .find(|i| *i > self.current_frame)
    }

    pub fn prev_marker(&self) -> Option<usize> {
        self.presentation
            .markers
            .iter()
            .map(|m| m.frame_index)
            .rfind(|i| *i < self.current_frame)
    }

    fn current_label(&self) -> Option<&str> {
        self.presentation
            .markers
            .iter()
            .rfind(|m| m.frame_index <= self.current_frame)
            .map(|m| m.label.as_str())
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn render_menubar(&self, stdout: &mut io::Stdout) -> Result<()> {
        let items: Vec<String> = [
            "[←] prev",
            "[→][Space] next",
            "[PgUp][PgDn] shot",
            "[Home] first",
            "[End] last",
            "[q][Esc] quit",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        print_menu(stdout, 0, &items)
    }

    fn render_full(&self, stdout: &mut io::Stdout) -> Result<()> {
        draw_grid(stdout, &self.grid)?;
        let status = format!(
            " Frame {}/{} | {} ",
            self.current_frame + 1,
            self.presentation.frames.len(),
            self.current_label().unwrap_or("-"),
        );
        draw_status(stdout, &self.presentation.contract, status)?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellChange, Marker, TerminalContract};

    fn recording() -> PlayablePresentation {
        let cell = |ch| Cell {
            ch,
            style: Default::default(),
        };
        let change = |x, ch| Frame::Diff {
            changes: vec![CellChange {
                x,
                y: 0,
                cell: cell(ch),
            }],
        };
        PlayablePresentation {
            contract: TerminalContract {
                width: 3,
                height: 1,
            },
            frames: vec![
                Frame::Full {
                    cells: vec![vec![cell('a'), cell(' '), cell(' ')]],
                },
                change(1, 'b'),
                change(2, 'c'),
            ],
            markers: vec![
                Marker {
                    frame_index: 0,
                    label: "one".into(),
                },
                Marker {
                    frame_index: 2,
                    label: "two".into(),
                },
            ],
        }
    }

    fn row(p: &ReplayPlayer) -> String {
        p.grid()[0].iter().map(|c| c.ch).collect()
    }

    #[test]
    fn seeking_rebuilds_backwards() {
        let mut p = ReplayPlayer::new(recording());
        p.seek(2);
        assert_eq!(row(&p), "abc");
        p.seek(1);
        assert_eq!(row(&p), "ab ");
        p.seek(99);
        assert_eq!(p.current_frame(), 2);
    }

    #[test]
    fn markers_jump_between_shots() {
        let mut p = ReplayPlayer::new(recording());
        p.seek(0);
        assert_eq!(p.next_marker(), Some(2));
        assert_eq!(p.prev_marker(), None);
        p.seek(2);
        assert_eq!(p.prev_marker(), Some(0));
        assert_eq!(p.current_label(), Some("two"));
    }
}
