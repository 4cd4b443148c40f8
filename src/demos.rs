//! Built-in animations for the command line.

use std::f64::consts::TAU;

use anyhow::Context;

use crate::animation::{
    Actor, AnimOption, Animation, AnimationBuilder, Hooks, OptionResponse, Shot, ShotContext,
};
use crate::engine::Tween;
use crate::error::ValidationError;
use crate::graph::{ItemId, PointId};
use crate::items::Axis;
use crate::types::Color;

/// Name and one-line description of every demo.
pub const DEMOS: &[(&str, &str)] = &[
    ("radial", "A spoke sweeping around a circle"),
    ("cubes", "A pile of cubes, flattened and sliced"),
];

fn color_named(name: &str) -> Color {
    match name {
        "red" => Color::RED,
        "green" => Color::GREEN,
        "blue" => Color::BLUE,
        _ => Color::YELLOW,
    }
}

// ---------------------------------------------------------------------------
// Radial
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RadialState {
    hand: Option<PointId>,
    circle: Option<ItemId>,
    label: Option<ItemId>,
}

impl RadialState {
    fn hand(&self) -> anyhow::Result<PointId> {
        self.hand.context("radial actors were not generated")
    }

    fn circle(&self) -> anyhow::Result<ItemId> {
        self.circle.context("radial actors were not generated")
    }
}

fn radial_actors(ctx: &mut ShotContext<'_, RadialState>) -> anyhow::Result<()> {
    let radius = ctx.options.float("radius").unwrap_or(3.0);
    let color = color_named(ctx.options.str("color").unwrap_or("yellow"));
    let g = &mut *ctx.graph;

    let center = g.add_point(0.0, 0.0);
    let circle = g.add_circle(center, radius);
    let hand = g.add_radial(center, radius, 0.0)?;
    let spoke = g.add_line(center, hand);
    g.set_outline_color(spoke, color)?;
    let tag = g.add_relative(hand, 0.0, -1.0)?;
    let label = g.add_fixed_text(tag, "P", 1.0);

    ctx.state.hand = Some(hand);
    ctx.state.circle = Some(circle);
    ctx.state.label = Some(label);

    let show_label = ctx.options.bool("show_label").unwrap_or(true);
    ctx.add_actors(vec![
        Actor::new("circle", "The circle the spoke turns in", circle),
        Actor::new("spoke", "Line from the center to the rim", spoke),
    ]);
    ctx.add_actors(show_label.then(|| Actor::new("label", "Tag that follows the rim point", label)));
    Ok(())
}

fn sweep(ctx: &mut ShotContext<'_, RadialState>) -> anyhow::Result<()> {
    let hand = ctx.state.hand()?;
    let turns = ctx.options.int("turns").unwrap_or(1).max(1) as f64;
    let duration = ctx.engine.anim_duration() * turns;
    ctx.engine.animate(Tween::angle(hand, [0.0, TAU * turns], duration))?;
    Ok(())
}

fn point_at_rim(ctx: &mut ShotContext<'_, RadialState>) -> anyhow::Result<()> {
    let hand = ctx.state.hand()?;
    ctx.point_arrow_at(hand)?;
    let duration = ctx.engine.anim_duration();
    match ctx.state.label {
        Some(label) => ctx.engine.animate(Tween::opacity(label, [1.0, 0.2, 1.0], duration))?,
        None => ctx.engine.animate_value(vec![0.0, 1.0], duration, |_, _: f64| Ok(()))?,
    };
    Ok(())
}

fn grow(ctx: &mut ShotContext<'_, RadialState>) -> anyhow::Result<()> {
    let hand = ctx.state.hand()?;
    let circle = ctx.state.circle()?;
    let radius = ctx.options.float("radius").unwrap_or(3.0);
    let tween = Tween::new([radius, radius * 1.5, radius], ctx.engine.anim_duration(), move |g, r: f64| {
        g.set_circle_radius(circle, r)?;
        g.set_radius(hand, r)?;
        Ok(())
    });
    ctx.engine.animate(tween)?;
    Ok(())
}

/// A spoke on a circle: it sweeps around, gets pointed at, then the circle
/// breathes.
pub fn radial() -> Result<Animation<RadialState>, ValidationError> {
    AnimationBuilder::<RadialState>::new("Radial", "A spoke sweeping around a circle")
        .looping(true)
        .has_pointing_arrow(true)
        .with_options(vec![
            AnimOption::float("radius", "Circle radius", 3.0, 1.0, 8.0),
            AnimOption::int("turns", "Turns per sweep", 1, 1, 4),
            AnimOption::choice("color", "Spoke color", "yellow", &["yellow", "red", "green", "blue"]),
            AnimOption::boolean("show_label", "Show the rim tag", true),
        ])
        .with_hooks(Hooks::new().generate_actors(radial_actors).option_changed(|_, option| {
            // Color is picked up at the next reset.
            Ok(match option.name() {
                "color" => OptionResponse::Ignore,
                _ => OptionResponse::Default,
            })
        }))
        .shot_fn("Sweep\nThe spoke turns around the circle.", sweep)
        .with_shots(
            Shot::from_doc("Point\nThe arrow points at the rim.", point_at_rim).cleanup(|ctx| {
                ctx.hide_arrow();
                Ok(())
            }),
        )
        .shot_fn("Grow\nThe circle grows and shrinks back.", grow)
        .build()
}

// ---------------------------------------------------------------------------
// Cubes
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CubesState {
    grid: Option<ItemId>,
}

impl CubesState {
    fn grid(&self) -> anyhow::Result<ItemId> {
        self.grid.context("cube grid was not generated")
    }
}

fn grid_size(ctx: &ShotContext<'_, CubesState>) -> usize {
    ctx.options.int("size").unwrap_or(2).clamp(1, 4) as usize
}

fn cube_actors(ctx: &mut ShotContext<'_, CubesState>) -> anyhow::Result<()> {
    let n = grid_size(ctx);
    let squash = ctx.options.float("squash").unwrap_or(0.0);
    let origin = ctx.graph.add_point(0.0, 0.0);
    let grid = ctx.graph.add_cube_grid(origin, [n, n, n], 1.0, squash)?;
    ctx.state.grid = Some(grid);
    ctx.add_actors(Actor::new("grid", "The pile of cubes", grid));
    Ok(())
}

fn flatten(ctx: &mut ShotContext<'_, CubesState>) -> anyhow::Result<()> {
    let grid = ctx.state.grid()?;
    let squash = ctx.options.float("squash").unwrap_or(0.0);
    let tween = Tween::new([squash, 1.0, squash], ctx.engine.anim_duration() * 2.0, move |g, s: f64| {
        g.set_cube_grid_squash(grid, s)?;
        Ok(())
    });
    ctx.engine.animate(tween)?;
    Ok(())
}

/// One shot per horizontal layer, bottom to top.
fn layer_shots(ctx: &mut ShotContext<'_, CubesState>) -> anyhow::Result<Vec<Shot<CubesState>>> {
    let n = grid_size(ctx);
    let shots = (0..n)
        .map(|k| {
            Shot::<CubesState>::new(format!("Layer {}", k + 1), format!("Cubes at height {k} light up."))
                .prepare(move |ctx| {
                    let grid = ctx.state.grid()?;
                    let duration = ctx.engine.anim_duration();
                    for cube in ctx.graph.cube_grid_slice(grid, Axis::Z, k) {
                        ctx.engine.animate(Tween::outline_color(
                            cube,
                            [Color::WHITE, Color::GREEN],
                            duration,
                        ))?;
                    }
                    Ok(())
                })
                .cleanup(move |ctx| {
                    let grid = ctx.state.grid()?;
                    for cube in ctx.graph.cube_grid_slice(grid, Axis::Z, k) {
                        ctx.graph.set_outline_color(cube, Color::WHITE)?;
                    }
                    Ok(())
                })
        })
        .collect();
    Ok(shots)
}

/// A cube pile: squashed into a plan view and back, then lit one layer at a
/// time.
pub fn cubes() -> Result<Animation<CubesState>, ValidationError> {
    AnimationBuilder::<CubesState>::new("Cubes", "A pile of cubes, flattened and sliced")
        .looping(true)
        .with_options(vec![
            AnimOption::int("size", "Cubes along each edge", 2, 1, 4),
            AnimOption::float("squash", "Resting squash, 0 is isometric", 0.0, 0.0, 1.0),
        ])
        .with_hooks(
            Hooks::new()
                .generate_actors(cube_actors)
                .generate_shots(layer_shots),
        )
        .shot_fn("Flatten\nThe pile squashes into a plan view and back.", flatten)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Runtime;
    use crate::engine::Engine;
    use crate::graph::Graph;
    use crate::scene::CanvasScene;
    use kurbo::Rect;

    fn setup() -> (Graph, CanvasScene, Engine) {
        (
            Graph::new(),
            CanvasScene::new(Rect::new(-10.0, -10.0, 10.0, 10.0), 80.0),
            Engine::new(),
        )
    }

    #[test]
    fn radial_builds_actors_and_shots() {
        let (mut graph, mut scene, mut engine) = setup();
        let mut anim = radial().unwrap();
        let mut rt = Runtime::new(&mut graph, &mut scene, &mut engine);
        anim.reset(&mut rt);
        assert_eq!(anim.actors().names(), ["circle", "spoke", "label"]);
        let names: Vec<_> = anim.shots().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["Sweep", "Point", "Grow"]);
    }

    #[test]
    fn hiding_the_label_drops_its_actor() {
        let (mut graph, mut scene, mut engine) = setup();
        let mut anim = radial().unwrap();
        let mut rt = Runtime::new(&mut graph, &mut scene, &mut engine);
        anim.reset(&mut rt);
        assert!(anim.set_option(&mut rt, "show_label", "no").unwrap());
        assert_eq!(anim.actors().names(), ["circle", "spoke"]);
    }

    #[test]
    fn cubes_generate_one_shot_per_layer() {
        let (mut graph, mut scene, mut engine) = setup();
        let mut anim = cubes().unwrap();
        let mut rt = Runtime::new(&mut graph, &mut scene, &mut engine);
        anim.reset(&mut rt);
        let names: Vec<_> = anim.shots().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["Flatten", "Layer 1", "Layer 2"]);

        anim.set_option(&mut rt, "size", "3").unwrap();
        assert_eq!(anim.shots().len(), 4);
    }

    #[test]
    fn every_listed_demo_builds() {
        assert_eq!(DEMOS.len(), 2);
        assert!(radial().is_ok());
        assert!(cubes().is_ok());
    }
}
