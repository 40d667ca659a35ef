//! Jelly Runner entry point
//!
//! On wasm32 this attaches to the page canvas and drives the session from
//! `requestAnimationFrame`. The native build runs a short headless demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;

    use jelly_runner::platform::web::WebPlatform;
    use jelly_runner::{Session, Settings, Tuning};

    /// First-frame delta when there is no previous timestamp
    const FIRST_DT: f32 = 1.0 / 60.0;

    struct Game {
        session: Session,
        platform: WebPlatform,
        last_time: f64,
    }

    pub async fn run() {
        let platform = match WebPlatform::attach("canvas") {
            Ok(platform) => platform,
            Err(err) => {
                log::error!("Failed to attach to canvas: {:?}", err);
                return;
            }
        };
        let (w, h) = platform.stage_size();
        let seed = js_sys::Date::now() as u64;
        let session = Session::new(Vec2::new(w, h), seed, Settings::load(), Tuning::default());

        let game = Rc::new(RefCell::new(Game {
            session,
            platform,
            last_time: 0.0,
        }));
        request_animation_frame(game);

        log::info!("Jelly Runner running!");
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                FIRST_DT
            };
            g.last_time = time;

            let Game { session, platform, .. } = &mut *g;
            session.frame(platform, dt);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Jelly Runner (native) starting...");
    log::info!("Native mode is headless - build for wasm32 to play in the browser");

    demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Spawn a jelly, let it settle, then play the runner until the first
/// game over and submit the score to an in-memory store
#[cfg(not(target_arch = "wasm32"))]
fn demo() {
    use glam::Vec2;
    use jelly_runner::persistence::MemoryScoreStore;
    use jelly_runner::platform::{HeadlessPlatform, InputEvent, PageEvent};
    use jelly_runner::{Session, Settings, Tuning};

    const DT: f32 = 1.0 / 60.0;

    let mut session = Session::new(Vec2::new(960.0, 540.0), 42, Settings::default(), Tuning::default());
    let mut platform = HeadlessPlatform::new();

    platform.push_input(InputEvent::SpawnGhost {
        width: 256.0,
        height: 256.0,
    });
    for _ in 0..120 {
        session.frame(&mut platform, DT);
    }
    if let Some(mesh) = session.jelly.mesh() {
        println!("Jelly: {} nodes, {} links", mesh.nodes().len(), mesh.links().len());
    }

    platform.push_input(InputEvent::StartRunner);
    let mut result = None;
    for _ in 0..60 * 60 {
        session.frame(&mut platform, DT);
        for event in platform.take_events() {
            if let PageEvent::GameOver { score, best, .. } = event {
                result = Some((score, best));
            }
        }
        if result.is_some() {
            break;
        }
    }

    match result {
        Some((score, best)) => {
            println!("Game over: score {} (best {})", score, best);
            let mut store = MemoryScoreStore::new(0);
            match session.submit_score(&mut store, "demo", None) {
                Ok(rank) => println!("Leaderboard rank: {:?}", rank),
                Err(err) => log::warn!("Score submission failed: {}", err),
            }
        }
        None => println!("Runner survived the demo"),
    }
    println!("Frames rendered: {}", platform.frames_rendered);
}
