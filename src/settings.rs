//! Player preferences
//!
//! Persisted separately from scores in LocalStorage.

use serde::{Deserialize, Serialize};

/// Chroma-key color written behind transparent recordings (0xRRGGBB)
pub const CHROMA_KEY: u32 = 0x00FF00;

/// Background behind the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Background {
    /// One of the two bundled images
    Stock(u8),
    /// An uploaded image applied from the gallery
    Custom,
}

impl Default for Background {
    fn default() -> Self {
        Background::Stock(0)
    }
}

impl Background {
    /// The toggle button flips between the stock images; leaving a custom
    /// background lands on the second one
    pub fn toggled(self) -> Self {
        match self {
            Background::Stock(i) => Background::Stock((i ^ 1) & 1),
            Background::Custom => Background::Stock(1),
        }
    }

    /// Index handed to the renderer; the custom image comes after the stock ones
    pub fn slot(&self) -> usize {
        match self {
            Background::Stock(i) => usize::from(*i),
            Background::Custom => 2,
        }
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            Background::Stock(0) => "Background (1)",
            Background::Stock(_) => "Background (2)",
            Background::Custom => "Background",
        }
    }
}

/// Which canvas a recording captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RecordSource {
    /// The jelly sandbox
    Jelly,
    /// The runner / free-roam player view
    #[default]
    Player,
}

impl RecordSource {
    pub fn file_name(&self) -> &'static str {
        match self {
            RecordSource::Jelly => "jelly.gif",
            RecordSource::Player => "player.gif",
        }
    }
}

/// Recorder options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    pub fps: u32,
    pub seconds: f32,
    pub source: RecordSource,
    /// Fill with the chroma key and mark it transparent instead of
    /// capturing the background
    pub transparent: bool,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            seconds: 5.0,
            source: RecordSource::Player,
            transparent: false,
        }
    }
}

/// Frame schedule handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingPlan {
    pub frame_count: u32,
    pub frame_delay_ms: u32,
    pub transparent_color: Option<u32>,
    /// Background and ground layers are hidden while recording
    pub hide_backdrop: bool,
    pub file_name: &'static str,
}

impl RecorderOptions {
    pub fn plan(&self) -> RecordingPlan {
        let fps = self.fps.max(1);
        let seconds = if self.seconds.is_finite() { self.seconds.max(0.0) } else { 0.0 };
        RecordingPlan {
            frame_count: (fps as f32 * seconds).round() as u32,
            frame_delay_ms: (1000.0 / fps as f32).round().max(1.0) as u32,
            transparent_color: self.transparent.then_some(CHROMA_KEY),
            hide_backdrop: self.transparent && self.source == RecordSource::Player,
            file_name: self.source.file_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub background: Background,
    /// Spawn the physics ghost when a skin is applied
    pub ghost_enabled: bool,
    /// Bounce the jelly on its top pins
    pub auto_bounce: bool,
    pub recorder: RecorderOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background: Background::default(),
            ghost_enabled: true,
            auto_bounce: false,
            recorder: RecorderOptions::default(),
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "jelly_runner_settings";

    pub fn toggle_background(&mut self) -> Background {
        self.background = self.background.toggled();
        self.background
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(json) = storage.and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten()) {
            if let Ok(settings) = serde_json::from_str(&json) {
                log::info!("Loaded settings from LocalStorage");
                return settings;
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Failed to save settings");
                    return;
                }
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
