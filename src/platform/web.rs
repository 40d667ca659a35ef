//! Browser adapter: 2D canvas drawing, keyboard/UI events, CustomEvents out
//!
//! The page drives UI commands by dispatching `jelly-runner:command`
//! events on `window` with a string `detail` (`start`, `stop`,
//! `background`, `clear`, `spawn:<w>x<h>`, `skin:<url>`, `bg:<url>`,
//! `bounce:on|off`).

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, CustomEvent, CustomEventInit, HtmlCanvasElement, KeyboardEvent, Window};

use super::{InputEvent, PageEvent, Platform};
use crate::renderer::{ColorVertex, Frame};

pub const COMMAND_EVENT: &str = "jelly-runner:command";

const BACKGROUNDS: [&str; 3] = ["#cfe8ff", "#ffe2c6", "#202030"];

fn css(color: [f32; 4]) -> String {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("rgba({},{},{},{})", c(color[0]), c(color[1]), c(color[2]), color[3])
}

/// Parse a `jelly-runner:command` detail string
pub fn parse_command(detail: &str) -> Option<InputEvent> {
    let (verb, arg) = detail.split_once(':').unwrap_or((detail, ""));
    match verb {
        "start" => Some(InputEvent::StartRunner),
        "stop" => Some(InputEvent::StopRunner),
        "background" => Some(InputEvent::ToggleBackground),
        "clear" => Some(InputEvent::ClearGhost),
        "bounce" => Some(InputEvent::SetAutoBounce(arg == "on")),
        "skin" if !arg.is_empty() => Some(InputEvent::ApplySkin(arg.to_string())),
        "bg" if !arg.is_empty() => Some(InputEvent::ApplyBackground(arg.to_string())),
        "spawn" => {
            let (w, h) = arg.split_once('x')?;
            Some(InputEvent::SpawnGhost {
                width: w.trim().parse().ok()?,
                height: h.trim().parse().ok()?,
            })
        }
        _ => None,
    }
}

pub struct WebPlatform {
    window: Window,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    queue: Rc<RefCell<Vec<InputEvent>>>,
    size: (u32, u32),
}

impl WebPlatform {
    /// Attach to `<canvas id="{canvas_id}">` and start listening for input
    pub fn attach(canvas_id: &str) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or("no canvas")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas.get_context("2d")?.ok_or("no 2d context")?.dyn_into()?;

        let platform = Self {
            window,
            canvas,
            ctx,
            queue: Rc::new(RefCell::new(Vec::new())),
            size: (0, 0),
        };
        platform.listen()?;
        Ok(platform)
    }

    pub fn stage_size(&self) -> (f32, f32) {
        (self.canvas.client_width() as f32, self.canvas.client_height() as f32)
    }

    fn listen(&self) -> Result<(), JsValue> {
        for (name, pressed) in [("keydown", true), ("keyup", false)] {
            let queue = self.queue.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(input) = InputEvent::from_key(&event.key(), pressed) {
                    // Keep space/arrows from scrolling the page
                    event.prevent_default();
                    queue.borrow_mut().push(input);
                }
            });
            self.window
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        let queue = self.queue.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: CustomEvent| {
            let detail = event.detail().as_string().unwrap_or_default();
            match parse_command(&detail) {
                Some(input) => queue.borrow_mut().push(input),
                None => log::warn!("Unknown command: {:?}", detail),
            }
        });
        self.window
            .add_event_listener_with_callback(COMMAND_EVENT, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn fill_triangles(&self, vertices: &[ColorVertex]) {
        for tri in vertices.chunks_exact(3) {
            self.ctx.begin_path();
            self.ctx.move_to(tri[0].position[0] as f64, tri[0].position[1] as f64);
            self.ctx.line_to(tri[1].position[0] as f64, tri[1].position[1] as f64);
            self.ctx.line_to(tri[2].position[0] as f64, tri[2].position[1] as f64);
            self.ctx.close_path();
            self.ctx.set_fill_style_str(&css(tri[0].color));
            self.ctx.fill();
        }
    }
}

impl Platform for WebPlatform {
    fn render_frame(&mut self, frame: &Frame) {
        let (w, h) = (frame.stage.x.max(1.0) as u32, frame.stage.y.max(1.0) as u32);
        if self.size != (w, h) {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
            self.size = (w, h);
        }

        let bg = BACKGROUNDS[frame.background.min(BACKGROUNDS.len() - 1)];
        self.ctx.set_fill_style_str(bg);
        self.ctx.fill_rect(0.0, 0.0, w as f64, h as f64);

        self.fill_triangles(&frame.ground);
        self.fill_triangles(&frame.obstacles);

        if let Some(jelly) = &frame.jelly {
            self.ctx.set_stroke_style_str("rgba(120,200,255,0.8)");
            let at = |i: u32| {
                let v = jelly.buffers.vertices[i as usize].position;
                (
                    (jelly.origin.x + v[0] * jelly.scale) as f64,
                    (jelly.origin.y + v[1] * jelly.scale) as f64,
                )
            };
            for tri in jelly.buffers.indices.chunks_exact(3) {
                let (a, b, c) = (at(tri[0]), at(tri[1]), at(tri[2]));
                self.ctx.begin_path();
                self.ctx.move_to(a.0, a.1);
                self.ctx.line_to(b.0, b.1);
                self.ctx.line_to(c.0, c.1);
                self.ctx.close_path();
                self.ctx.stroke();
            }
        }

        if let Some(sprite) = &frame.player {
            let min = sprite.rect.min();
            self.ctx.set_fill_style_str("#ffb347");
            self.ctx.fill_rect(
                min.x as f64,
                min.y as f64,
                sprite.rect.size.x as f64,
                sprite.rect.size.y as f64,
            );
        }

        self.ctx.set_fill_style_str("#111");
        self.ctx.set_font("16px monospace");
        if let Some(hud) = &frame.hud {
            let _ = self.ctx.fill_text(hud, 16.0, 28.0);
        }
        if let Some(banner) = &frame.banner {
            let _ = self.ctx.fill_text(banner, w as f64 / 2.0 - 120.0, h as f64 / 2.0);
        }
    }

    fn poll_input(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    fn emit_event(&mut self, event: PageEvent) {
        let init = CustomEventInit::new();
        match serde_json::to_string(&event) {
            Ok(json) => {
                if let Ok(detail) = js_sys::JSON::parse(&json) {
                    init.set_detail(&detail);
                }
            }
            Err(err) => log::warn!("Failed to encode {}: {}", event.name(), err),
        }
        match CustomEvent::new_with_event_init_dict(event.name(), &init) {
            Ok(custom) => {
                if self.window.dispatch_event(&custom).is_err() {
                    log::warn!("Failed to dispatch {}", event.name());
                }
            }
            Err(_) => log::warn!("Failed to create {}", event.name()),
        }
    }
}
