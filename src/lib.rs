//! Reactive 2-D geometry animations.
//!
//! Points and items live in a [`graph::Graph`]; moving a point redraws every
//! item built on it. An [`animation::Animation`] is a list of shots whose
//! preparation registers tweens with the [`engine::Engine`]; the controller
//! plays them in order against a [`scene::Scene`]. The [`player`] drives all
//! of it against a clock, on a terminal or into a recording.

pub mod animation;
pub mod demos;
pub mod engine;
pub mod error;
pub mod graph;
pub mod items;
pub mod menubar;
pub mod player;
pub mod renderer;
pub mod scene;
pub mod signal;
pub mod types;
