//! Platform abstraction layer
//!
//! The session talks to the page through the `Platform` trait:
//! - `render_frame`: draw a `Frame` snapshot
//! - `poll_input`: keys and UI commands since the last frame
//! - `emit_event`: game-over, score and jelly notifications for the page
//!
//! `HeadlessPlatform` records everything for tests and the native binary;
//! `web::WebPlatform` wires a canvas and DOM events on wasm32.

use serde::Serialize;

use crate::renderer::Frame;
use crate::settings::Background;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyAction {
    Jump,
    Left,
    Right,
}

impl KeyAction {
    /// `KeyboardEvent.key` value to action
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Spacebar" | "ArrowUp" => Some(KeyAction::Jump),
            "ArrowLeft" => Some(KeyAction::Left),
            "ArrowRight" => Some(KeyAction::Right),
            _ => None,
        }
    }
}

/// Input gathered by the platform since the previous frame
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { action: KeyAction, pressed: bool },
    StartRunner,
    StopRunner,
    ToggleBackground,
    /// Use an uploaded image as the runner background
    ApplyBackground(String),
    /// Use an uploaded image as the player/jelly texture
    ApplySkin(String),
    /// Build the jelly from an image of this size
    SpawnGhost { width: f32, height: f32 },
    ClearGhost,
    SetAutoBounce(bool),
    Resize { width: f32, height: f32 },
}

impl InputEvent {
    pub fn from_key(key: &str, pressed: bool) -> Option<Self> {
        KeyAction::from_key(key).map(|action| InputEvent::Key { action, pressed })
    }
}

/// Notifications for the page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    GameOver {
        score: u64,
        best: u64,
        /// Leaderboard rank the score would take
        rank: Option<usize>,
    },
    ScoreChanged { score: u64, best: u64 },
    JellySpawned { nodes: usize },
    JellyCleared,
    BackgroundChanged { background: Background },
    Error { message: String },
}

impl PageEvent {
    /// DOM event name
    pub fn name(&self) -> &'static str {
        match self {
            PageEvent::GameOver { .. } => "jelly-runner:game-over",
            PageEvent::ScoreChanged { .. } => "jelly-runner:score",
            PageEvent::JellySpawned { .. } => "jelly-runner:jelly-spawned",
            PageEvent::JellyCleared => "jelly-runner:jelly-cleared",
            PageEvent::BackgroundChanged { .. } => "jelly-runner:background",
            PageEvent::Error { .. } => "jelly-runner:error",
        }
    }
}

pub trait Platform {
    fn render_frame(&mut self, frame: &Frame);

    fn poll_input(&mut self) -> Vec<InputEvent>;

    fn emit_event(&mut self, event: PageEvent);
}

/// Scripted input, recorded output
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    pending: Vec<InputEvent>,
    pub frames_rendered: u64,
    pub last_frame: Option<Frame>,
    pub events: Vec<PageEvent>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue input for the next `poll_input`
    pub fn push_input(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    pub fn take_events(&mut self) -> Vec<PageEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Platform for HeadlessPlatform {
    fn render_frame(&mut self, frame: &Frame) {
        self.frames_rendered += 1;
        self.last_frame = Some(frame.clone());
    }

    fn poll_input(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }

    fn emit_event(&mut self, event: PageEvent) {
        log::debug!("Page event: {}", event.name());
        self.events.push(event);
    }
}
