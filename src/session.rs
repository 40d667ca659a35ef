//! Per-page session
//!
//! Owns everything the page used to keep in globals: the active mode, the
//! applied skin and background, the runner, the free-roam player, the
//! jelly scene, settings and the local leaderboard. The host calls
//! `frame` once per animation frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::highscores::Leaderboard;
use crate::persistence::scores::{NewScore, ScoreStore};
use crate::persistence::url::normalize_storage_url;
use crate::platform::{InputEvent, KeyAction, PageEvent, Platform};
use crate::renderer::Frame;
use crate::settings::{Background, Settings};
use crate::sim::{FreePlayer, JellyScene, MoveInput, RunnerEvent, RunnerState, TickInput, tick};
use crate::tuning::Tuning;

/// Which game owns the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Free-roam player pushing the jelly around
    #[default]
    Sandbox,
    /// Endless runner; the jelly is paused
    Runner,
}

pub struct Session {
    pub mode: Mode,
    pub stage: Vec2,
    /// Normalized URL of the applied skin
    pub skin_url: Option<String>,
    /// Normalized URL of the uploaded background, if one was applied
    pub background_url: Option<String>,
    pub settings: Settings,
    pub tuning: Tuning,
    pub runner: RunnerState,
    pub player: FreePlayer,
    pub jelly: JellyScene,
    pub leaderboard: Leaderboard,
    held: MoveInput,
    /// Score of the last finished run, for submission
    last_run: Option<u64>,
    last_score: u64,
}

impl Session {
    pub fn new(stage: Vec2, seed: u64, settings: Settings, tuning: Tuning) -> Self {
        let mut jelly = JellyScene::new(stage, tuning.clone(), seed.wrapping_add(1));
        jelly.set_auto_bounce(settings.auto_bounce);
        let mut runner = RunnerState::new(seed, tuning.runner.clone());
        runner.set_custom_background(settings.background == Background::Custom);
        log::info!("Session created ({}x{}, seed {})", stage.x, stage.y, seed);
        Self {
            mode: Mode::Sandbox,
            stage,
            skin_url: None,
            background_url: None,
            player: FreePlayer::new(stage, tuning.player.clone()),
            runner,
            jelly,
            leaderboard: Leaderboard::load(),
            settings,
            tuning,
            held: MoveInput::default(),
            last_run: None,
            last_score: 0,
        }
    }

    /// Score of the most recent game over, if not yet submitted
    pub fn pending_score(&self) -> Option<u64> {
        self.last_run
    }

    /// Submit the last run to the backend and place it on the local board.
    /// Returns the local rank.
    pub fn submit_score<S: ScoreStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: &str,
        thumb_data: Option<String>,
    ) -> Result<Option<usize>, BackendError> {
        let score = self.last_run.ok_or(BackendError::MissingField("score"))?;
        let record = store.submit(NewScore::sanitized(name, score as f64, thumb_data))?;
        self.last_run = None;
        let rank = self.leaderboard.insert(record);
        self.leaderboard.save();
        Ok(rank)
    }

    /// Advance one animation frame
    pub fn frame<P: Platform + ?Sized>(&mut self, platform: &mut P, dt: f32) {
        let mut outgoing = Vec::new();
        let mut tick_input = TickInput::default();
        for input in platform.poll_input() {
            self.apply(input, &mut tick_input, &mut outgoing);
        }

        match self.mode {
            Mode::Runner => {
                tick(&mut self.runner, &tick_input, dt);
                self.collect_runner_events(&mut outgoing);
            }
            Mode::Sandbox => {
                self.player.step(&self.held, self.stage, dt);
                self.held.jump = false;
                self.jelly.set_player_collider(Some(self.player.collider_rect()));
                self.jelly.step(dt);
            }
        }

        let frame = self.build_frame();
        platform.render_frame(&frame);
        for event in outgoing {
            platform.emit_event(event);
        }
    }

    fn apply(&mut self, input: InputEvent, tick_input: &mut TickInput, out: &mut Vec<PageEvent>) {
        match input {
            InputEvent::Key { action, pressed } => match action {
                KeyAction::Left => self.held.left = pressed,
                KeyAction::Right => self.held.right = pressed,
                KeyAction::Jump if pressed => match self.mode {
                    Mode::Runner => tick_input.jump = true,
                    Mode::Sandbox => self.held.jump = true,
                },
                KeyAction::Jump => {}
            },
            InputEvent::StartRunner => {
                if self.mode != Mode::Runner {
                    self.mode = Mode::Runner;
                    self.held = MoveInput::default();
                    self.jelly.set_enabled(false);
                    self.jelly.set_player_collider(None);
                    self.last_score = 0;
                    tick_input.start = Some((self.stage.x, self.stage.y));
                }
            }
            InputEvent::StopRunner => {
                if self.mode == Mode::Runner {
                    self.mode = Mode::Sandbox;
                    self.runner.stop();
                    self.runner.drain_events();
                    self.jelly.set_enabled(true);
                }
            }
            InputEvent::ToggleBackground => {
                // Stock images replace an applied upload; the gallery re-applies it
                let background = self.settings.toggle_background();
                self.background_url = None;
                self.runner.set_custom_background(false);
                self.settings.save();
                out.push(PageEvent::BackgroundChanged { background });
            }
            InputEvent::ApplyBackground(url) => {
                self.background_url = Some(normalize_storage_url(&url));
                self.settings.background = Background::Custom;
                self.runner.set_custom_background(true);
                self.settings.save();
                out.push(PageEvent::BackgroundChanged {
                    background: Background::Custom,
                });
            }
            InputEvent::ApplySkin(url) => {
                let url = normalize_storage_url(&url);
                log::info!("Skin applied: {}", url);
                self.skin_url = Some(url);
            }
            InputEvent::SpawnGhost { width, height } => {
                if !self.settings.ghost_enabled {
                    log::debug!("Ghost disabled, spawn ignored");
                    return;
                }
                match self.jelly.spawn(Vec2::new(width, height)) {
                    Ok(()) => {
                        let nodes = self.jelly.mesh().map_or(0, |m| m.nodes().len());
                        self.jelly.set_enabled(self.mode == Mode::Sandbox);
                        out.push(PageEvent::JellySpawned { nodes });
                    }
                    Err(err) => {
                        log::warn!("Jelly spawn failed: {}", err);
                        out.push(PageEvent::Error {
                            message: err.to_string(),
                        });
                    }
                }
            }
            InputEvent::ClearGhost => {
                if self.jelly.has_mesh() {
                    self.jelly.clear();
                    out.push(PageEvent::JellyCleared);
                }
            }
            InputEvent::SetAutoBounce(enabled) => {
                self.settings.auto_bounce = enabled;
                self.jelly.set_auto_bounce(enabled);
                self.settings.save();
            }
            InputEvent::Resize { width, height } => {
                if !(width > 0.0 && height > 0.0) {
                    log::warn!("Ignoring resize to {}x{}", width, height);
                    return;
                }
                self.stage = Vec2::new(width, height);
                self.jelly.resize(self.stage);
            }
        }
    }

    fn collect_runner_events(&mut self, out: &mut Vec<PageEvent>) {
        for event in self.runner.drain_events() {
            match event {
                RunnerEvent::GameOver { score, best } => {
                    self.last_run = Some(score);
                    out.push(PageEvent::GameOver {
                        score,
                        best,
                        rank: self.leaderboard.potential_rank(score),
                    });
                }
                RunnerEvent::Started | RunnerEvent::Restarted => self.last_score = 0,
                RunnerEvent::Spawned { variant, pieces } => {
                    log::debug!("Spawned {:?} x{}", variant, pieces);
                }
                _ => {}
            }
        }

        let score = &self.runner.score;
        if score.current != self.last_score {
            self.last_score = score.current;
            out.push(PageEvent::ScoreChanged {
                score: score.current,
                best: score.best,
            });
        }
    }

    fn build_frame(&mut self) -> Frame {
        let frame = Frame::new(self.stage, self.settings.background.slot());
        let frame = match self.mode {
            Mode::Runner => frame.with_runner(&self.runner),
            Mode::Sandbox => frame.with_player(&self.player.collider_rect(), &self.player.squash),
        };
        frame
            .with_jelly(self.jelly.view())
            .with_skin(self.skin_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::scores::MemoryScoreStore;
    use crate::platform::HeadlessPlatform;
    use crate::sim::RunPhase;

    const STAGE: Vec2 = Vec2::new(800.0, 600.0);
    const DT: f32 = 1.0 / 60.0;

    fn session() -> Session {
        let mut tuning = Tuning::default();
        tuning.wander.enabled = false;
        Session::new(STAGE, 7, Settings::default(), tuning)
    }

    #[test]
    fn test_sandbox_frame() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        session.frame(&mut platform, DT);
        assert_eq!(platform.frames_rendered, 1);
        let frame = platform.last_frame.as_ref().unwrap();
        assert!(frame.player.is_some());
        assert!(frame.hud.is_none());
        assert!(frame.jelly.is_none());
    }

    #[test]
    fn test_runner_start_stop() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        platform.push_input(InputEvent::StartRunner);
        session.frame(&mut platform, DT);
        assert_eq!(session.mode, Mode::Runner);
        assert_eq!(session.runner.phase, RunPhase::Running);
        assert!(!session.jelly.is_enabled());
        assert!(platform.last_frame.as_ref().unwrap().hud.is_some());

        platform.push_input(InputEvent::StopRunner);
        session.frame(&mut platform, DT);
        assert_eq!(session.mode, Mode::Sandbox);
        assert_eq!(session.runner.phase, RunPhase::NotRunning);
        assert!(session.runner.obstacles.is_empty());
        assert!(session.jelly.is_enabled());
    }

    #[test]
    fn test_score_events_and_game_over() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        platform.push_input(InputEvent::StartRunner);
        let mut game_over = None;
        for _ in 0..60 * 120 {
            session.frame(&mut platform, DT);
            for event in platform.take_events() {
                if let PageEvent::GameOver { score, .. } = event {
                    game_over = Some(score);
                }
            }
            if game_over.is_some() {
                break;
            }
        }
        // Nobody jumps, so an obstacle ends the run
        let score = game_over.unwrap();
        assert_eq!(session.pending_score(), Some(score));

        let mut store = MemoryScoreStore::new(0);
        let rank = session.submit_score(&mut store, "  ", None).unwrap();
        assert_eq!(store.top(1).unwrap()[0].name, "Player");
        assert_eq!(rank.is_some(), score > 0);
        assert_eq!(
            session.submit_score(&mut store, "x", None),
            Err(BackendError::MissingField("score"))
        );
    }

    #[test]
    fn test_spawn_and_clear_ghost() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        platform.push_input(InputEvent::SpawnGhost {
            width: 0.0,
            height: 10.0,
        });
        session.frame(&mut platform, DT);
        assert!(matches!(platform.take_events()[..], [PageEvent::Error { .. }]));
        assert!(!session.jelly.has_mesh());

        platform.push_input(InputEvent::SpawnGhost {
            width: 200.0,
            height: 160.0,
        });
        session.frame(&mut platform, DT);
        let events = platform.take_events();
        assert!(matches!(events[..], [PageEvent::JellySpawned { nodes }] if nodes > 0));
        assert!(platform.last_frame.as_ref().unwrap().jelly.is_some());

        platform.push_input(InputEvent::ClearGhost);
        session.frame(&mut platform, DT);
        assert_eq!(platform.take_events(), vec![PageEvent::JellyCleared]);
        assert!(!session.jelly.has_mesh());
    }

    #[test]
    fn test_ghost_disabled() {
        let mut settings = Settings::default();
        settings.ghost_enabled = false;
        let mut session = Session::new(STAGE, 1, settings, Tuning::default());
        let mut platform = HeadlessPlatform::new();
        platform.push_input(InputEvent::SpawnGhost {
            width: 100.0,
            height: 100.0,
        });
        session.frame(&mut platform, DT);
        assert!(!session.jelly.has_mesh());
        assert!(platform.take_events().is_empty());
    }

    #[test]
    fn test_background_and_skin() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        platform.push_input(InputEvent::ToggleBackground);
        session.frame(&mut platform, DT);
        assert_eq!(platform.last_frame.as_ref().unwrap().background, 1);

        let url = "https://x.supabase.co/storage/v1/object/sign/images/a.png?token=t";
        platform.push_input(InputEvent::ApplyBackground(url.into()));
        platform.push_input(InputEvent::ApplySkin(url.into()));
        session.frame(&mut platform, DT);
        assert!(session.runner.custom_background);
        assert_eq!(
            session.skin_url.as_deref(),
            Some("https://x.supabase.co/storage/v1/object/sign/images/a.png")
        );
        let frame = platform.last_frame.as_ref().unwrap();
        assert_eq!(frame.background, 2);
        assert!(frame.skin.is_some());
    }

    #[test]
    fn test_toggle_leaves_custom_background() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        let url = "https://x.supabase.co/storage/v1/object/public/images/b.png";
        platform.push_input(InputEvent::ApplyBackground(url.into()));
        session.frame(&mut platform, DT);
        assert_eq!(platform.last_frame.as_ref().unwrap().background, 2);
        platform.take_events();

        platform.push_input(InputEvent::ToggleBackground);
        session.frame(&mut platform, DT);
        assert!(!session.runner.custom_background);
        assert_eq!(session.background_url, None);
        assert_eq!(session.settings.background, Background::Stock(1));
        assert_eq!(platform.last_frame.as_ref().unwrap().background, 1);
        assert!(platform.take_events().contains(&PageEvent::BackgroundChanged {
            background: Background::Stock(1)
        }));
    }

    #[test]
    fn test_held_keys_move_player() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        let x0 = session.player.position.x;
        platform.push_input(InputEvent::Key {
            action: KeyAction::Right,
            pressed: true,
        });
        for _ in 0..10 {
            session.frame(&mut platform, DT);
        }
        assert!(session.player.position.x > x0);

        platform.push_input(InputEvent::Key {
            action: KeyAction::Right,
            pressed: false,
        });
        session.frame(&mut platform, DT);
        assert!(!session.held.right);
    }

    #[test]
    fn test_bad_resize_ignored() {
        let mut session = session();
        let mut platform = HeadlessPlatform::new();
        platform.push_input(InputEvent::Resize {
            width: 0.0,
            height: 300.0,
        });
        platform.push_input(InputEvent::Resize {
            width: 1024.0,
            height: 768.0,
        });
        session.frame(&mut platform, DT);
        assert_eq!(session.stage, Vec2::new(1024.0, 768.0));
    }
}
