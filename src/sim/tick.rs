//! Runner tick
//!
//! One call advances the runner by a real-time delta. The delta is clamped
//! so a stalled tab cannot tunnel the runner through an obstacle.

use rand::Rng;

use super::collision::aabb_overlap;
use super::obstacle::spawn_cluster;
use super::squash::SquashProfile;
use super::state::{GAME_OVER_MESSAGE, RunPhase, RunnerEvent, RunnerState};
use crate::consts::*;
use crate::tuning::RunnerTuning;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Space / ArrowUp: jump, or restart when dead
    pub jump: bool,
    /// Start a run on a stage of this size
    pub start: Option<(f32, f32)>,
    /// Leave the runner
    pub stop: bool,
}

/// Delay until the next cluster
///
/// `roll` is a uniform sample in `[0, 1)`. The randomized gap never drops
/// below `spawn_gap_min`, and the cluster's own width is added on top so
/// consecutive clusters cannot overlap.
pub fn next_spawn_delay(tuning: &RunnerTuning, speed: f32, cluster_span: f32, roll: f32) -> f32 {
    let slowdown = (speed - tuning.start_speed) / tuning.spawn_gap_speed_divisor;
    let gap = (tuning.spawn_gap_base - slowdown).max(tuning.spawn_gap_min)
        + roll * tuning.spawn_gap_variance;
    let px_per_sec = tuning.spawn_min_px_per_sec.max(speed + 1.0);
    gap + cluster_span.max(0.0) / px_per_sec
}

/// Advance the runner by `dt` seconds of real time
pub fn tick(state: &mut RunnerState, input: &TickInput, dt: f32) {
    if let Some((width, height)) = input.start {
        state.start(width, height);
    }
    if input.stop {
        state.stop();
    }
    if input.jump {
        state.jump();
    }

    if state.phase == RunPhase::NotRunning {
        return;
    }

    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.time_ticks += 1;

    if state.phase == RunPhase::Running {
        step_running(state, dt);
    }

    // Visuals keep settling while dead
    let vy = state.runner.vy;
    state.runner.squash.update(vy, &SquashProfile::RUNNER);
    advance_parallax(state, dt);
}

fn step_running(state: &mut RunnerState, dt: f32) {
    let tuning = &state.tuning;

    // Speed ramp
    let boost = (state.score.current as f32 * tuning.accel_boost_per_score).min(tuning.accel_boost_max);
    let accel = tuning.base_accel + boost;
    state.speed = (state.speed + accel * dt).min(tuning.max_speed);

    // Vertical kinematics
    let runner = &mut state.runner;
    runner.vy += tuning.gravity * dt;
    runner.y += runner.vy * dt;
    if runner.y >= state.ground_y {
        if !runner.on_ground {
            let impact = runner.vy;
            runner.squash.land(impact, &SquashProfile::RUNNER);
            state.events.push(RunnerEvent::Landed { impact });
        }
        runner.y = state.ground_y;
        runner.vy = 0.0;
        runner.on_ground = true;
    }

    // Spawning
    state.spawn_in -= dt;
    if state.spawn_in <= 0.0 {
        spawn(state);
    }

    // Scroll, then evict from the front (spawn order never changes)
    let dx = -state.speed * dt;
    for obstacle in state.obstacles.iter_mut() {
        obstacle.x += dx;
    }
    while state
        .obstacles
        .front()
        .is_some_and(|o| o.trailing_edge() < DESPAWN_X)
    {
        state.obstacles.pop_front();
    }

    // Collisions and pass bonuses
    let runner_box = state.runner_box();
    let runner_back = state.runner_back();
    let pass_gain = state.tuning.pass_score_gain;
    let mut hit = false;
    let mut bonus = 0.0;
    for obstacle in state.obstacles.iter_mut() {
        if aabb_overlap(&runner_box, &obstacle.aabb()) {
            hit = true;
            break;
        }
        if !obstacle.passed && obstacle.trailing_edge() < runner_back {
            obstacle.passed = true;
            bonus += pass_gain;
        }
    }
    // A run that ends this frame does not bank its pass bonuses
    if hit {
        die(state);
        return;
    }
    if bonus > 0.0 {
        state.score.add_pass(bonus);
        state.events.push(RunnerEvent::Passed { bonus });
    }

    state.score.add_time(dt * state.tuning.time_score_rate);
    state.score.update();
}

fn spawn(state: &mut RunnerState) {
    let spawn_x = state.stage.x;
    let floor_y = state.floor_y;
    let cluster = spawn_cluster(spawn_x, floor_y, state.rng_mut());
    let roll: f32 = state.rng_mut().random();
    state.spawn_in = next_spawn_delay(&state.tuning, state.speed, cluster.span, roll);

    log::debug!(
        "Spawned {} cluster ({} pieces, span {:.0}); next in {:.2}s",
        cluster.variant.as_str(),
        cluster.obstacles.len(),
        cluster.span,
        state.spawn_in
    );
    state.events.push(RunnerEvent::Spawned {
        variant: cluster.variant,
        pieces: cluster.obstacles.len(),
    });
    state.obstacles.extend(cluster.obstacles);
}

fn die(state: &mut RunnerState) {
    state.phase = RunPhase::Dead;
    state.speed = 0.0;
    state.score.update();
    state.message = Some(GAME_OVER_MESSAGE.to_string());
    let (score, best) = (state.score.current, state.score.best);
    state.events.push(RunnerEvent::GameOver { score, best });
    log::info!("Runner died: score {} (best {})", score, best);
}

fn advance_parallax(state: &mut RunnerState, dt: f32) {
    let speed = state.speed;
    for i in 0..state.parallax.len() {
        let factor = state.parallax_factor(i);
        state.parallax[i] -= speed * factor * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::Obstacle;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn running(seed: u64) -> RunnerState {
        let mut state = RunnerState::new(seed, RunnerTuning::default());
        let input = TickInput {
            start: Some((800.0, 400.0)),
            ..Default::default()
        };
        tick(&mut state, &input, 0.0);
        state
    }

    #[test]
    fn test_idle_runner_does_not_tick() {
        let mut state = RunnerState::new(1, RunnerTuning::default());
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.phase, RunPhase::NotRunning);
    }

    #[test]
    fn test_speed_ramps_and_caps() {
        let mut state = running(5);
        state.spawn_in = f32::MAX; // keep the track clear
        let before = state.speed;
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.speed > before);

        state.speed = 799.9;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.speed, 800.0);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = running(5);
        state.spawn_in = f32::MAX;
        tick(&mut state, &TickInput::default(), 10.0);
        // One clamped step of 50ms: 280 + 55 * 0.05
        assert!((state.speed - 282.75).abs() < 1e-3);
    }

    #[test]
    fn test_jump_arc_lands_back_on_ground() {
        let mut state = running(9);
        state.spawn_in = f32::MAX;
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut state, &jump, DT);
        assert!(!state.runner.on_ground);
        assert!(state.runner.y < state.ground_y);

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), DT);
            assert!(state.runner.y <= state.ground_y);
        }
        assert!(state.runner.on_ground);
        assert!(state
            .drain_events()
            .iter()
            .any(|e| matches!(e, RunnerEvent::Landed { .. })));
    }

    #[test]
    fn test_collision_kills_and_restart_resets() {
        let mut state = running(3);
        state.spawn_in = f32::MAX;
        // Obstacle right on top of the runner
        let x = state.runner.x;
        state.obstacles.push_back(Obstacle::new(x, state.floor_y, 20.0, 40.0));
        state.score.add_time(12.0);
        state.score.update();

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, RunPhase::Dead);
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.message.as_deref(), Some(GAME_OVER_MESSAGE));
        let events = state.drain_events();
        assert!(events.contains(&RunnerEvent::GameOver { score: 12, best: 12 }));

        // Dead runner ignores time
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.score.current, 12);

        let restart = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut state, &restart, 0.0);
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.score.current, 0);
        assert_eq!(state.score.best, 12);
        assert!(state.obstacles.is_empty());
        assert_eq!(state.speed, 280.0);
        assert!(state.runner.on_ground);
    }

    #[test]
    fn test_game_over_excludes_same_frame_pass_bonus() {
        let mut state = running(5);
        state.spawn_in = f32::MAX;
        let behind = state.runner_back() - 30.0;
        state.obstacles.push_back(Obstacle::new(behind, state.floor_y, 20.0, 40.0));
        state.obstacles.push_back(Obstacle::new(state.runner.x, state.floor_y, 20.0, 40.0));
        state.score.add_time(12.0);
        state.score.update();

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, RunPhase::Dead);
        assert_eq!(state.score.pass_points, 0.0);
        let events = state.drain_events();
        assert!(events.contains(&RunnerEvent::GameOver { score: 12, best: 12 }));
        assert!(!events.iter().any(|e| matches!(e, RunnerEvent::Passed { .. })));
    }

    #[test]
    fn test_pass_bonus_awarded_once() {
        let mut state = running(4);
        state.spawn_in = f32::MAX;
        // Already behind the runner's trailing edge
        let x = state.runner_back() - 30.0;
        state.obstacles.push_back(Obstacle::new(x, state.floor_y, 20.0, 40.0));

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.obstacles[0].passed);
        assert_eq!(state.score.pass_points, 5.0);

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.score.pass_points, 5.0);
        assert!(state.score.current >= 5);
    }

    #[test]
    fn test_offscreen_obstacles_evicted_from_front() {
        let mut state = running(4);
        state.spawn_in = f32::MAX;
        state.obstacles.push_back(Obstacle::new(-30.0, state.floor_y, 20.0, 40.0));
        state.obstacles.push_back(Obstacle::new(700.0, state.floor_y, 20.0, 40.0));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.obstacles.len(), 1);
        assert!(state.obstacles[0].x > 600.0);
    }

    #[test]
    fn test_spawn_schedules_next_cluster() {
        let mut state = running(8);
        state.spawn_in = 0.001;
        tick(&mut state, &TickInput::default(), DT);
        assert!(!state.obstacles.is_empty());
        assert!(state.spawn_in >= state.tuning.spawn_gap_min);
    }

    #[test]
    fn test_parallax_scrolls_left() {
        let mut state = running(2);
        state.spawn_in = f32::MAX;
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.parallax[0] < 0.0);
        assert!(state.parallax[5] < state.parallax[0], "front layers move faster");
    }

    #[test]
    fn test_determinism() {
        let mut a = running(777);
        let mut b = running(777);
        for i in 0..600 {
            let input = TickInput {
                jump: i % 45 == 0,
                ..Default::default()
            };
            tick(&mut a, &input, DT);
            tick(&mut b, &input, DT);
        }
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.score.current, b.score.current);
        assert_eq!(a.obstacles, b.obstacles);
    }

    proptest! {
        #[test]
        fn prop_spawn_delay_respects_min_gap(
            speed in 0.0f32..2000.0,
            span in 0.0f32..400.0,
            roll in 0.0f32..1.0,
        ) {
            let tuning = RunnerTuning::default();
            let delay = next_spawn_delay(&tuning, speed, span, roll);
            prop_assert!(delay >= tuning.spawn_gap_min);
        }

        #[test]
        fn prop_score_monotonic_and_grounded(seed in any::<u64>(), jumps in proptest::collection::vec(any::<bool>(), 1..400)) {
            let mut state = running(seed);
            let mut last = 0;
            for jump in jumps {
                let was_dead = state.phase == RunPhase::Dead;
                let input = TickInput { jump, ..Default::default() };
                tick(&mut state, &input, DT);
                if was_dead && jump {
                    prop_assert_eq!(state.score.current, 0);
                } else {
                    prop_assert!(state.score.current >= last);
                }
                prop_assert!(state.runner.y <= state.ground_y);
                prop_assert!(state.score.best >= state.score.current);
                last = state.score.current;
            }
        }
    }
}
