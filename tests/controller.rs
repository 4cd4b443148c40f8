use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Point, Rect};

use geo_animator::animation::{
    Actor, AnimOption, Animation, AnimationBuilder, Hooks, Runtime, Shot,
};
use geo_animator::engine::{Engine, Tween};
use geo_animator::error::OptionError;
use geo_animator::graph::Graph;
use geo_animator::scene::{CanvasScene, Scene};

type Log = Vec<String>;

struct Harness {
    graph: Graph,
    scene: CanvasScene,
    engine: Engine,
    now: f64,
}

impl Harness {
    fn new() -> Self {
        Harness {
            graph: Graph::new(),
            scene: CanvasScene::new(Rect::new(-10.0, -10.0, 10.0, 10.0), 80.0),
            engine: Engine::new(),
            now: 0.0,
        }
    }

    fn with<S: Default, R>(
        &mut self,
        anim: &mut Animation<S>,
        f: impl FnOnce(&mut Animation<S>, &mut Runtime<'_>) -> R,
    ) -> R {
        let mut rt = Runtime::new(&mut self.graph, &mut self.scene, &mut self.engine);
        f(anim, &mut rt)
    }

    /// One tick to start the current shot's tweens, one to finish them.
    fn finish_shot<S: Default>(&mut self, anim: &mut Animation<S>) {
        let now = self.now;
        self.with(anim, |a, rt| {
            a.tick(rt, now);
            a.tick(rt, now + 1.0);
        });
        self.now += 1.0;
    }
}

/// A shot that logs its prepare and cleanup and runs one one-second tween.
fn timed(name: &'static str) -> Shot<Log> {
    Shot::<Log>::new(name, format!("Shot {name}"))
        .prepare(move |ctx| {
            ctx.state.push(format!("prepare {name}"));
            ctx.engine.animate_value(vec![0.0, 1.0], 1.0, |_, _: f64| Ok(()))?;
            Ok(())
        })
        .cleanup(move |ctx| {
            ctx.state.push(format!("cleanup {name}"));
            Ok(())
        })
}

fn three_shots(looping: bool) -> Animation<Log> {
    AnimationBuilder::<Log>::new("Three", "Three timed shots")
        .looping(looping)
        .with_shots([timed("a"), timed("b"), timed("c")])
        .build()
        .unwrap()
}

fn shot_names<S>(anim: &Animation<S>) -> Vec<String> {
    anim.shots().iter().map(|s| s.name().to_string()).collect()
}

fn record_changes<S: Default>(anim: &mut Animation<S>) -> Rc<RefCell<Vec<(usize, String)>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    anim.on_shot_changed()
        .connect(move |c| sink.borrow_mut().push((c.index, c.name.clone())));
    seen
}

#[test]
fn looping_animation_advances_back_to_the_first_shot() {
    let mut h = Harness::new();
    let mut anim = three_shots(true);
    h.with(&mut anim, |a, rt| a.reset(rt));
    let seen = record_changes(&mut anim);

    h.with(&mut anim, |a, rt| a.play(rt, None));
    for _ in 0..3 {
        h.finish_shot(&mut anim);
    }

    assert!(anim.is_playing());
    assert_eq!(anim.current_shot_index(), Some(0));
    let seen = seen.borrow();
    let indices: Vec<usize> = seen.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, [0, 1, 2, 0]);
    assert_eq!(seen.last().map(|(_, n)| n.as_str()), Some("a"));
}

#[test]
fn non_looping_animation_stops_after_the_last_shot() {
    let mut h = Harness::new();
    let mut anim = three_shots(false);
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    for _ in 0..3 {
        h.finish_shot(&mut anim);
    }

    assert!(!anim.is_playing());
    assert!(!h.engine.is_active());
    assert_eq!(anim.current_shot_index(), Some(2));
    assert_eq!(
        anim.state().as_slice(),
        ["prepare a", "cleanup a", "prepare b", "cleanup b", "prepare c", "cleanup c"]
    );
}

#[test]
fn no_tween_is_active_between_shots() {
    let mut h = Harness::new();
    let mut anim = three_shots(false);
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    let ended = h.with(&mut anim, |a, rt| {
        a.tick(rt, 0.0);
        a.tick(rt, 1.0)
    });
    assert!(ended.all_done);
    // the finished tween is gone; only the next shot's fresh one is queued
    assert_eq!(h.engine.active_count(), 1);
    assert_eq!(anim.current_shot_index(), Some(1));
}

#[test]
fn generated_shots_are_pruned_when_playback_restarts() {
    let mut h = Harness::new();
    let spawner = timed("b").prepare(|ctx| {
        ctx.add_next_shots(timed("x"));
        Ok(())
    });
    let mut anim: Animation<Log> = AnimationBuilder::<Log>::new("Spawn", "Generated shots")
        .looping(true)
        .with_shots(vec![timed("a"), spawner, timed("c")])
        .build()
        .unwrap();
    h.with(&mut anim, |a, rt| a.reset(rt));
    let seen = record_changes(&mut anim);

    h.with(&mut anim, |a, rt| a.play(rt, None));
    h.finish_shot(&mut anim); // a
    assert_eq!(shot_names(&anim), ["a", "b", "x", "c"]);
    assert!(anim.shots()[2].is_generated());
    for _ in 0..3 {
        h.finish_shot(&mut anim); // b, x, c
    }

    assert_eq!(shot_names(&anim), ["a", "b", "c"]);
    assert_eq!(anim.current_shot_index(), Some(0));
    let names: Vec<String> = seen.borrow().iter().map(|(_, n)| n.clone()).collect();
    assert_eq!(names, ["a", "b", "x", "c", "a"]);
}

#[test]
fn repeating_shot_plays_until_stopped() {
    let mut h = Harness::new();
    let mut anim: Animation<Log> = AnimationBuilder::<Log>::new("Repeat", "A repeating shot")
        .with_shots([timed("spin").repeat(true), timed("after")])
        .build()
        .unwrap();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    for _ in 0..3 {
        h.finish_shot(&mut anim);
    }
    assert!(anim.is_playing());
    assert_eq!(anim.current_shot_index(), Some(0));
    let prepares = anim.state().iter().filter(|l| *l == "prepare spin").count();
    assert_eq!(prepares, 4);

    h.with(&mut anim, |a, rt| a.stop(rt));
    assert!(!anim.is_playing());
    assert!(!h.engine.is_active());
    h.finish_shot(&mut anim);
    assert_eq!(anim.current_shot_index(), Some(0));
    // stopping does not run the cleanup of the interrupted shot
    assert_eq!(anim.state().last().map(String::as_str), Some("prepare spin"));
}

#[test]
fn single_shot_mode_stops_after_one_shot() {
    let mut h = Harness::new();
    let mut anim: Animation<Log> = AnimationBuilder::<Log>::new("Single", "One shot at a time")
        .looping(true)
        .with_shots([timed("spin").repeat(true), timed("after")])
        .build()
        .unwrap();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play_current_shot(rt);
    });
    assert!(anim.is_single_shot());
    h.finish_shot(&mut anim);

    assert!(!anim.is_playing());
    assert_eq!(anim.current_shot_index(), Some(0));
    assert_eq!(anim.state().as_slice(), ["prepare spin", "cleanup spin"]);

    h.with(&mut anim, |a, rt| {
        a.stop(rt);
        a.play_next_shot(rt);
    });
    assert_eq!(anim.current_shot_index(), Some(1));
    assert!(anim.is_single_shot());
}

#[test]
fn stop_cancels_completion_callbacks() {
    let mut h = Harness::new();
    let fired = Rc::new(Cell::new(false));
    let flag = fired.clone();
    let mut anim: Animation<Log> = AnimationBuilder::<Log>::new("Stop", "Stopping mid-shot")
        .shot_fn("Only", move |ctx| {
            let flag = flag.clone();
            let tween = Tween::new(vec![0.0, 1.0], 1.0, |_, _: f64| Ok(())).on_finished(move |_, _| {
                flag.set(true);
                Ok(())
            });
            ctx.engine.animate(tween)?;
            Ok(())
        })
        .build()
        .unwrap();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
        a.tick(rt, 0.0);
        a.stop(rt);
        a.tick(rt, 5.0);
    });
    assert!(!fired.get());
    assert!(!anim.is_playing());
}

#[test]
fn shot_without_tweens_finishes_on_the_next_tick() {
    let mut h = Harness::new();
    let mut anim: Animation<Log> = AnimationBuilder::<Log>::new("Instant", "No tweens")
        .shot_fn("One", |ctx| {
            ctx.state.push("one".into());
            Ok(())
        })
        .shot_fn("Two", |ctx| {
            ctx.state.push("two".into());
            Ok(())
        })
        .build()
        .unwrap();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    assert_eq!(anim.current_shot_index(), Some(0));
    let outcome = h.with(&mut anim, |a, rt| a.tick(rt, 0.0));
    assert!(outcome.all_done);
    assert_eq!(anim.current_shot_index(), Some(1));
    h.with(&mut anim, |a, rt| a.tick(rt, 0.1));
    assert!(!anim.is_playing());
    assert_eq!(anim.state().as_slice(), ["one", "two"]);
}

#[test]
fn failing_callback_does_not_stop_the_others() {
    let mut h = Harness::new();
    let shot = Shot::<Log>::new("Fragile", "")
        .prepare(|_| anyhow::bail!("boom"))
        .prepare(|ctx| {
            ctx.state.push("second".into());
            Ok(())
        });
    let mut anim = AnimationBuilder::<Log>::new("Fragile", "A failing callback")
        .with_shots(shot)
        .build()
        .unwrap();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    assert_eq!(anim.state().as_slice(), ["second"]);
}

fn counted() -> Animation<Log> {
    AnimationBuilder::<Log>::new("Counted", "Shots from an option")
        .with_options(AnimOption::int("count", "How many shots", 2, 1, 5))
        .with_hooks(Hooks::new().generate_shots(|ctx| {
            let n = ctx.options.int("count").unwrap_or(1);
            Ok((0..n)
                .map(|i| match i {
                    0 => timed("s0"),
                    1 => timed("s1"),
                    2 => timed("s2"),
                    3 => timed("s3"),
                    _ => timed("s4"),
                })
                .collect())
        }))
        .build()
        .unwrap()
}

#[test]
fn option_change_resets_and_restarts_from_the_first_shot() {
    let mut h = Harness::new();
    let mut anim = counted();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    h.finish_shot(&mut anim);
    assert_eq!(anim.current_shot_index(), Some(1));

    let changed = h.with(&mut anim, |a, rt| a.set_option(rt, "count", "3"));
    assert_eq!(changed, Ok(true));
    assert_eq!(shot_names(&anim), ["s0", "s1", "s2"]);
    assert!(anim.is_playing());
    assert_eq!(anim.current_shot_index(), Some(0));
    assert_eq!(anim.state().as_slice(), ["prepare s0"]);
}

#[test]
fn option_change_while_stopped_only_resets() {
    let mut h = Harness::new();
    let mut anim = counted();
    h.with(&mut anim, |a, rt| a.reset(rt));
    h.with(&mut anim, |a, rt| a.set_option(rt, "count", "4.4")).unwrap();
    assert_eq!(anim.options().int("count"), Some(4));
    assert_eq!(anim.shots().len(), 4);
    assert!(!anim.is_playing());
}

#[test]
fn bad_option_text_is_rejected() {
    let mut h = Harness::new();
    let mut anim = counted();
    h.with(&mut anim, |a, rt| a.reset(rt));

    let err = h.with(&mut anim, |a, rt| a.set_option(rt, "count", "many"));
    assert!(matches!(err, Err(OptionError::Coercion { .. })));
    assert_eq!(anim.options().int("count"), Some(2));

    let unknown = h.with(&mut anim, |a, rt| a.set_option(rt, "nope", "1"));
    assert_eq!(unknown, Ok(false));
}

fn with_actors() -> Animation<Log> {
    AnimationBuilder::<Log>::new("Actors", "Static and generated actors")
        .with_actors(|ctx| {
            let a = ctx.graph.add_point(0.0, 0.0);
            let frame = ctx.graph.add_centered_rect(a, 4.0, 4.0);
            ctx.add_actors(Actor::new("frame", "Static frame", frame));
            Ok(())
        })
        .with_hooks(Hooks::new().generate_actors(|ctx| {
            let c = ctx.graph.add_point(1.0, 1.0);
            let circle = ctx.graph.add_circle(c, 1.0);
            let d = ctx.graph.add_relative(c, 1.0, 0.0)?;
            let line = ctx.graph.add_line(c, d);
            ctx.add_actors([
                Actor::new("dots", "A circle", circle),
                Actor::new("dots", "A line", line),
            ]);
            Ok(())
        }))
        .with_shots(timed("only"))
        .build()
        .unwrap()
}

#[test]
fn reset_is_idempotent() {
    let mut h = Harness::new();
    let mut anim = with_actors();
    h.with(&mut anim, |a, rt| a.reset(rt));
    let names: Vec<String> = anim.actors().names().iter().map(|n| n.to_string()).collect();
    let points = h.graph.point_count();
    let items = h.graph.item_count();

    h.with(&mut anim, |a, rt| a.reset(rt));
    let again: Vec<String> = anim.actors().names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, again);
    assert_eq!(names, ["frame", "dots"]);
    assert_eq!(shot_names(&anim), ["only"]);
    assert_eq!(h.graph.point_count(), points);
    assert_eq!(h.graph.item_count(), items);
    assert_eq!(h.scene.items().len(), 3);
}

/// One static line; its shot drags the line's start point and fades it out.
fn moving_stick() -> Animation<Log> {
    AnimationBuilder::<Log>::new("Stick", "A static actor moved by a shot")
        .with_actors(|ctx| {
            let a = ctx.graph.add_point(0.0, 0.0);
            let b = ctx.graph.add_relative(a, 2.0, 0.0)?;
            let stick = ctx.graph.add_line(a, b);
            ctx.add_actors(Actor::new("stick", "Line from the origin", stick));
            Ok(())
        })
        .shot_fn("Drag", |ctx| {
            let stick = ctx
                .actors
                .named("stick")
                .map(|a| a.item())
                .next()
                .ok_or_else(|| anyhow::anyhow!("stick actor missing"))?;
            let start = ctx.graph.all_points(stick)[0];
            let keys = [Point::new(0.0, 0.0), Point::new(5.0, 5.0)];
            ctx.engine.animate(Tween::move_point(start, keys, 1.0))?;
            ctx.engine.animate(Tween::opacity(stick, [1.0, 0.0], 1.0))?;
            Ok(())
        })
        .build()
        .unwrap()
}

#[test]
fn reset_restores_static_actors_after_a_shot() {
    let mut h = Harness::new();
    let mut anim = moving_stick();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    h.finish_shot(&mut anim);

    let stick = anim.actors().named("stick").next().unwrap().item();
    let points = h.graph.all_points(stick);
    assert_eq!(h.graph.position(points[0]), Some(Point::new(5.0, 5.0)));
    assert_eq!(h.graph.position(points[1]), Some(Point::new(7.0, 5.0)));
    assert_eq!(h.graph.item_style(stick).unwrap().opacity, 0.0);

    h.with(&mut anim, |a, rt| a.reset(rt));
    assert_eq!(anim.actors().named("stick").next().unwrap().item(), stick);
    assert_eq!(h.graph.position(points[0]), Some(Point::new(0.0, 0.0)));
    assert_eq!(h.graph.position(points[1]), Some(Point::new(2.0, 0.0)));
    assert_eq!(h.graph.original_point(points[1]), h.graph.position(points[1]));
    assert_eq!(h.graph.item_style(stick).unwrap().opacity, 1.0);
    assert!(anim.actors().named("stick").all(|a| a.is_shown(&h.graph)));
}

#[test]
fn actor_visibility_survives_reset() {
    let mut h = Harness::new();
    let mut anim = with_actors();
    h.with(&mut anim, |a, rt| a.reset(rt));
    anim.show_actors(&mut h.graph, "dots", false);

    h.with(&mut anim, |a, rt| a.reset(rt));
    let snapshot = anim.actor_snapshot(&h.graph);
    assert_eq!(snapshot.get("dots"), Some(&false));
    assert_eq!(snapshot.get("frame"), Some(&true));
    assert!(anim.actors().named("dots").all(|a| !a.is_shown(&h.graph)));
}

#[test]
fn pointing_arrow_outlives_resets() {
    let mut h = Harness::new();
    let mut anim: Animation<Log> = AnimationBuilder::<Log>::new("Arrow", "Pointing")
        .has_pointing_arrow(true)
        .shot_fn("Point", |ctx| {
            let target = ctx.graph.add_point(2.0, 2.0);
            ctx.point_arrow_at(target)?;
            Ok(())
        })
        .build()
        .unwrap();
    h.with(&mut anim, |a, rt| {
        a.reset(rt);
        a.play(rt, None);
    });
    let arrow = h.scene.pointing_arrow(&mut h.graph);
    assert!(arrow.is_shown(&h.graph));

    h.with(&mut anim, |a, rt| a.reset(rt));
    assert!(h.graph.contains_item(arrow.item()));
    assert!(!arrow.is_shown(&h.graph));
    assert!(h.scene.contains(arrow.item()));
}
