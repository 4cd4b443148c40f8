//! Live terminal front end for a `Player`.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event;
use tracing::debug;

use crate::menubar::{binding_label, print_menu};
use crate::renderer::Renderer;
use crate::types::{Cell, TerminalContract};

use super::config::{PlayerConfig, matches_binding};
use super::{Player, blank_grid, draw_changes, draw_grid, draw_status, in_terminal};

pub struct TerminalPlayer<S> {
    player: Player<S>,
    config: PlayerConfig,
    contract: TerminalContract,
    grid: Vec<Vec<Cell>>,
}

enum Command {
    Quit,
    Redraw,
    Continue,
}

impl<S: Default> TerminalPlayer<S> {
    pub fn new(player: Player<S>, config: PlayerConfig) -> Self {
        let contract = TerminalContract {
            width: config.canvas.width,
            height: config.canvas.height,
        };
        let grid = blank_grid(&contract);
        TerminalPlayer {
            player,
            config,
            contract,
            grid,
        }
    }

    /// Run the animation in the terminal until the quit key.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub fn run(&mut self) -> Result<()> {
        let contract = self.contract.clone();
        in_terminal(&contract, |stdout| self.run_loop(stdout))
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let interval = Duration::from_secs_f64(self.config.tick_interval());
        let started = Instant::now();
        self.player.play();
        self.render_menubar(stdout)?;
        self.redraw(stdout, true)?;

        let mut next_tick = Instant::now() + interval;
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                let command = match event::read()? {
                    event::Event::Key(key) => self.handle_key(&key),
                    event::Event::Resize(_, _) => Command::Redraw,
                    _ => Command::Continue,
                };
                match command {
                    Command::Quit => break,
                    Command::Redraw => {
                        self.render_menubar(stdout)?;
                        self.redraw(stdout, true)?;
                    }
                    Command::Continue => {}
                }
                continue;
            }
            next_tick += interval;
            self.player.tick(started.elapsed().as_secs_f64());
            self.redraw(stdout, false)?;
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &event::KeyEvent) -> Command {
        let kb = &self.config.key_bindings;
        if matches_binding(&kb.quit, key) || key.code == event::KeyCode::Esc {
            return Command::Quit;
        }
        if matches_binding(&kb.play_pause, key) {
            self.player.toggle_play();
        } else if matches_binding(&kb.next_shot, key) {
            self.player.next_shot();
        } else if matches_binding(&kb.step_shot, key) {
            self.player.step_shot();
        } else if matches_binding(&kb.reset, key) {
            self.player.reset();
            return Command::Redraw;
        } else if matches_binding(&kb.toggle_loop, key) {
            self.player.toggle_loop();
        } else if matches_binding(&kb.faster, key) {
            self.player.faster();
        } else if matches_binding(&kb.slower, key) {
            self.player.slower();
        } else {
            debug!(?key, "unbound key");
        }
        Command::Continue
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn render_menubar(&self, stdout: &mut io::Stdout) -> Result<()> {
        let kb = &self.config.key_bindings;
        let items = [
            binding_label(&kb.play_pause, "play/pause"),
            binding_label(&kb.next_shot, "next"),
            binding_label(&kb.step_shot, "step"),
            binding_label(&kb.reset, "reset"),
            binding_label(&kb.toggle_loop, "loop"),
            binding_label(&format!("{}{}", kb.faster, kb.slower), "speed"),
            binding_label(&kb.quit, "quit"),
        ];
        print_menu(stdout, 0, &items)
    }

    /// Draw the cells that changed since the last frame, or all of them.
    fn redraw(&mut self, stdout: &mut io::Stdout, full: bool) -> Result<()> {
        let scene = self.player.frame(&self.contract);
        let grid = Renderer::rasterize(&scene, &self.contract);
        if full {
            draw_grid(stdout, &grid)?;
        } else {
            draw_changes(stdout, &Renderer::diff(&self.grid, &grid))?;
        }
        self.grid = grid;
        draw_status(stdout, &self.contract, self.status())?;
        stdout.flush()?;
        Ok(())
    }

    fn status(&self) -> String {
        let anim = self.player.animation();
        let shot = match (anim.current_shot_index(), anim.current_shot()) {
            (Some(i), Some(shot)) => format!("Shot {}/{}: {}", i + 1, anim.shots().len(), shot.name()),
            _ => "No shot".to_string(),
        };
        let mode = match (anim.is_playing(), anim.is_single_shot()) {
            (true, true) => "step",
            (true, false) => "playing",
            (false, _) => "paused",
        };
        format!(
            " {} | {} | loop {} | x{:.2} ",
            shot,
            mode,
            if anim.flags().looping { "on" } else { "off" },
            1.0 / self.player.engine().speedup(),
        )
    }
}
