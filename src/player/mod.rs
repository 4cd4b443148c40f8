//! Player — drives an animation against a clock.
//!
//! `Player` owns the geometry graph, the scene, the interpolation engine and
//! one animation, and exposes the host commands (play/pause, step, reset,
//! loop, speed). It is headless: `terminal` puts it on screen live, and
//! `record` renders it into a `PlayablePresentation` that `replay` shows.

pub mod config;
pub mod replay;
pub mod terminal;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use anyhow::bail;
use crossterm::terminal as term;
use crossterm::{cursor, execute, queue, style};
use kurbo::Rect;
use tracing::info;

use crate::animation::{Animation, Runtime};
use crate::engine::{Engine, TickOutcome};
use crate::error::OptionError;
use crate::graph::Graph;
use crate::renderer::{Rasterizer, Renderer};
use crate::scene::CanvasScene;
use crate::types::{
    Cell, CellChange, Marker, NamedColor, PlayablePresentation, ResolvedScene, Style, TermColor,
    TerminalContract,
};

pub use config::{PlayerConfig, matches_binding};
pub use replay::ReplayPlayer;
pub use terminal::TerminalPlayer;

/// Scene area shown before the first framing.
const INITIAL_VIEWPORT: Rect = Rect::new(-10.0, -10.0, 10.0, 10.0);

/// Bounds for `faster`/`slower`.
const MIN_SPEEDUP: f64 = 1.0 / 16.0;
const MAX_SPEEDUP: f64 = 16.0;

pub struct Player<S> {
    graph: Graph,
    scene: CanvasScene,
    engine: Engine,
    animation: Animation<S>,
    clock: f64,
}

impl<S: Default> Player<S> {
    /// Set up the collaborators and reset the animation once.
    pub fn new(animation: Animation<S>, config: &PlayerConfig) -> Self {
        let mut engine = Engine::new();
        engine.set_speedup(config.speedup);
        let mut player = Player {
            graph: Graph::new(),
            scene: CanvasScene::new(INITIAL_VIEWPORT, f64::from(config.canvas.width)),
            engine,
            animation,
            clock: 0.0,
        };
        player.reset();
        player
    }

    fn with_runtime<R>(&mut self, f: impl FnOnce(&mut Animation<S>, &mut Runtime<'_>) -> R) -> R {
        let mut rt = Runtime::new(&mut self.graph, &mut self.scene, &mut self.engine);
        f(&mut self.animation, &mut rt)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn scene(&self) -> &CanvasScene {
        &self.scene
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn animation(&self) -> &Animation<S> {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut Animation<S> {
        &mut self.animation
    }

    /// Seconds of animation time so far.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn reset(&mut self) {
        self.with_runtime(|anim, rt| anim.reset(rt));
    }

    pub fn play(&mut self) {
        self.with_runtime(|anim, rt| anim.play(rt, None));
    }

    pub fn stop(&mut self) {
        self.with_runtime(|anim, rt| anim.stop(rt));
    }

    pub fn toggle_play(&mut self) {
        if self.animation.is_playing() {
            self.stop();
        } else {
            self.play();
        }
    }

    /// Jump to the next shot and keep the current play mode.
    pub fn next_shot(&mut self) {
        self.with_runtime(|anim, rt| anim.play_next_shot(rt));
    }

    /// Play exactly one shot, the one after the current.
    pub fn step_shot(&mut self) {
        self.with_runtime(|anim, rt| {
            anim.stop(rt);
            anim.play_next_shot(rt);
        });
    }

    pub fn toggle_loop(&mut self) {
        let looping = !self.animation.flags().looping;
        self.animation.set_looping(looping);
    }

    /// Halve tween durations from the next tween on.
    pub fn faster(&mut self) {
        let speedup = (self.engine.speedup() / 2.0).max(MIN_SPEEDUP);
        self.engine.set_speedup(speedup);
        info!(speedup, "durations scaled");
    }

    pub fn slower(&mut self) {
        let speedup = (self.engine.speedup() * 2.0).min(MAX_SPEEDUP);
        self.engine.set_speedup(speedup);
        info!(speedup, "durations scaled");
    }

    pub fn set_option(&mut self, name: &str, text: &str) -> Result<bool, OptionError> {
        self.with_runtime(|anim, rt| anim.set_option(rt, name, text))
    }

    pub fn show_actors(&mut self, name: &str, shown: bool) {
        self.animation.show_actors(&mut self.graph, name, shown);
    }

    /// Tick at absolute time `now` (seconds).
    pub fn tick(&mut self, now: f64) -> TickOutcome {
        self.clock = now;
        self.with_runtime(|anim, rt| anim.tick(rt, now))
    }

    /// Tick `dt` seconds after the previous tick.
    pub fn advance(&mut self, dt: f64) -> TickOutcome {
        self.tick(self.clock + dt.max(0.0))
    }

    pub fn frame(&mut self, contract: &TerminalContract) -> ResolvedScene {
        Rasterizer::resolve(&mut self.graph, &self.scene, contract)
    }

    /// Play from the start for `seconds` at `fps` and collect the frames,
    /// with a marker wherever a shot starts.
    pub fn record(&mut self, seconds: f64, fps: u32, contract: TerminalContract) -> PlayablePresentation {
        let fps = fps.max(1);
        let started = Rc::new(RefCell::new(Vec::new()));
        let sink = started.clone();
        let listener = self
            .animation
            .on_shot_changed()
            .connect(move |change| sink.borrow_mut().push(change.name.clone()));

        let mut scenes = Vec::new();
        let mut markers = Vec::new();
        let frames = (seconds.max(0.0) * f64::from(fps)).ceil() as usize;
        let start = self.clock;
        self.play();
        for i in 0..=frames {
            if i > 0 {
                self.tick(start + i as f64 / f64::from(fps));
            }
            for label in started.borrow_mut().drain(..) {
                markers.push(Marker {
                    frame_index: scenes.len(),
                    label,
                });
            }
            scenes.push(self.frame(&contract));
        }
        self.animation.on_shot_changed().disconnect(listener);
        info!(frames = scenes.len(), markers = markers.len(), "recorded");
        Renderer::render(&scenes, contract, markers)
    }
}

// ---------------------------------------------------------------------------
// Terminal output
// ---------------------------------------------------------------------------

/// Rows reserved above the canvas for the menu bar.
const CANVAS_OFFSET: u16 = 1;

/// Run `body` on the alternate screen in raw mode. The terminal is restored
/// whatever `body` returns.
fn in_terminal(
    contract: &TerminalContract,
    body: impl FnOnce(&mut io::Stdout) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let (term_w, term_h) = term::size()?;
    // +2: one row for menu bar, one row for status bar
    if term_w < contract.width || term_h < contract.height + 2 {
        bail!(
            "Terminal too small: need {}x{}, have {}x{}",
            contract.width,
            contract.height + 2,
            term_w,
            term_h,
        );
    }

    let mut stdout = io::stdout();
    term::enable_raw_mode()?;
    execute!(
        stdout,
        term::EnterAlternateScreen,
        cursor::Hide,
        term::Clear(term::ClearType::All),
    )?;

    let result = body(&mut stdout);

    let _ = execute!(stdout, cursor::Show, term::LeaveAlternateScreen);
    let _ = term::disable_raw_mode();

    result
}

fn blank_grid(contract: &TerminalContract) -> Vec<Vec<Cell>> {
    vec![vec![Cell::default(); contract.width as usize]; contract.height as usize]
}

fn draw_grid(out: &mut impl Write, grid: &[Vec<Cell>]) -> anyhow::Result<()> {
    for (y, row) in grid.iter().enumerate() {
        queue!(out, cursor::MoveTo(0, y as u16 + CANVAS_OFFSET))?;
        for cell in row {
            let cs = to_content_style(&cell.style);
            queue!(out, style::PrintStyledContent(style::StyledContent::new(cs, cell.ch)))?;
        }
    }
    Ok(())
}

fn draw_changes(out: &mut impl Write, changes: &[CellChange]) -> anyhow::Result<()> {
    for change in changes {
        let cs = to_content_style(&change.cell.style);
        queue!(
            out,
            cursor::MoveTo(change.x, change.y + CANVAS_OFFSET),
            style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
        )?;
    }
    Ok(())
}

/// Dim status text on the row below the canvas, if the terminal has one.
fn draw_status(out: &mut impl Write, contract: &TerminalContract, status: String) -> anyhow::Result<()> {
    let status_y = contract.height + CANVAS_OFFSET;
    let (_, term_h) = term::size()?;
    if status_y >= term_h {
        return Ok(());
    }

    let mut cs = style::ContentStyle::default();
    cs.attributes.set(style::Attribute::Dim);

    queue!(
        out,
        cursor::MoveTo(0, status_y),
        term::Clear(term::ClearType::CurrentLine),
        style::PrintStyledContent(style::StyledContent::new(cs, status)),
    )?;
    Ok(())
}

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &TermColor) -> style::Color {
    match c {
        TermColor::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        TermColor::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}
