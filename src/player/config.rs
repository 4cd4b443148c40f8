use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Scale applied to every tween duration; below 1 plays faster.
    #[serde(default = "default_speedup")]
    pub speedup: f64,
    #[serde(default)]
    pub canvas: CanvasSize,
    #[serde(default)]
    pub key_bindings: KeyBindings,
}

/// Canvas size in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u16,
    pub height: u16,
}

impl Default for CanvasSize {
    fn default() -> Self {
        CanvasSize {
            width: 80,
            height: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_play_pause")]
    pub play_pause: String,
    #[serde(default = "default_next_shot")]
    pub next_shot: String,
    #[serde(default = "default_step_shot")]
    pub step_shot: String,
    #[serde(default = "default_reset")]
    pub reset: String,
    #[serde(default = "default_toggle_loop")]
    pub toggle_loop: String,
    #[serde(default = "default_faster")]
    pub faster: String,
    #[serde(default = "default_slower")]
    pub slower: String,
    #[serde(default = "default_quit")]
    pub quit: String,
}

fn default_fps() -> u32 { 30 }
fn default_speedup() -> f64 { 1.0 }
fn default_play_pause() -> String { "Space".into() }
fn default_next_shot() -> String { "Right".into() }
fn default_step_shot() -> String { "s".into() }
fn default_reset() -> String { "Ctrl-r".into() }
fn default_toggle_loop() -> String { "l".into() }
fn default_faster() -> String { "+".into() }
fn default_slower() -> String { "-".into() }
fn default_quit() -> String { "q".into() }

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            play_pause: default_play_pause(),
            next_shot: default_next_shot(),
            step_shot: default_step_shot(),
            reset: default_reset(),
            toggle_loop: default_toggle_loop(),
            faster: default_faster(),
            slower: default_slower(),
            quit: default_quit(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            fps: default_fps(),
            speedup: default_speedup(),
            canvas: CanvasSize::default(),
            key_bindings: KeyBindings::default(),
        }
    }
}

impl PlayerConfig {
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read a config file. A missing file gives the defaults; an invalid
    /// one is reported and also gives the defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), "invalid player config ({e}), using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Seconds between ticks.
    pub fn tick_interval(&self) -> f64 {
        1.0 / f64::from(self.fps.max(1))
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("geo-animator");
        path.push("player.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(rest) = binding.strip_prefix("Alt-") {
        if !event.modifiers.contains(KeyModifiers::ALT) {
            return false;
        }
        return match rest {
            "Enter" => event.code == KeyCode::Enter,
            other => other
                .chars()
                .next()
                .is_some_and(|c| event.code == KeyCode::Char(c)),
        };
    }

    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        if !event.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        return rest
            .chars()
            .next()
            .is_some_and(|c| event.code == KeyCode::Char(c));
    }

    // Plain bindings never fire with Ctrl or Alt held.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }

    match binding {
        "Right" => event.code == KeyCode::Right,
        "Left" => event.code == KeyCode::Left,
        "Up" => event.code == KeyCode::Up,
        "Down" => event.code == KeyCode::Down,
        "Enter" => event.code == KeyCode::Enter,
        "Esc" => event.code == KeyCode::Esc,
        "Space" => event.code == KeyCode::Char(' '),
        "Tab" => event.code == KeyCode::Tab,
        "Backspace" => event.code == KeyCode::Backspace,
        "Home" => event.code == KeyCode::Home,
        "End" => event.code == KeyCode::End,
        s => {
            if let Some(rest) = s.strip_prefix('F') {
                if let Ok(n) = rest.parse::<u8>() {
                    return event.code == KeyCode::F(n);
                }
            }
            s.chars()
                .next()
                .is_some_and(|c| event.code == KeyCode::Char(c))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{ "fps": 12, "key_bindings": { "quit": "Esc" } }"#).unwrap();
        assert_eq!(config.fps, 12);
        assert_eq!(config.speedup, 1.0);
        assert_eq!(config.canvas, CanvasSize::default());
        assert_eq!(config.key_bindings.quit, "Esc");
        assert_eq!(config.key_bindings.play_pause, "Space");
    }

    #[test]
    fn unreadable_file_gives_defaults() {
        let config = PlayerConfig::load_from(Path::new("/nonexistent/geo-animator.json"));
        assert_eq!(config, PlayerConfig::default());
        assert!((config.tick_interval() - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn bindings_match_keys() {
        assert!(matches_binding("Space", &key(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert!(matches_binding("Ctrl-r", &key(KeyCode::Char('r'), KeyModifiers::CONTROL)));
        assert!(!matches_binding("r", &key(KeyCode::Char('r'), KeyModifiers::CONTROL)));
        assert!(matches_binding("F5", &key(KeyCode::F(5), KeyModifiers::NONE)));
        assert!(matches_binding("+", &key(KeyCode::Char('+'), KeyModifiers::NONE)));
        assert!(!matches_binding("Right", &key(KeyCode::Left, KeyModifiers::NONE)));
    }
}
