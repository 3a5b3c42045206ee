//! SDL2 fullscreen display backend.
//!
//! Each pushed image is uploaded to a texture and drawn aspect-fit on black,
//! optionally faded in.

use image::DynamicImage;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{BlendMode, Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use std::time::Duration;

use crate::config::DisplaySettings;
use crate::display::{blocking_section, Display};
use crate::error::{FrameError, Result};

const FADE_STEPS: u8 = 15;

/// How a new image replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Instant switch.
    Cut,
    /// Fade in from black.
    Fade,
}

impl Transition {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fade" => Transition::Fade,
            _ => Transition::Cut,
        }
    }
}

pub struct SdlDisplay {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: sdl2::EventPump,
    screen_width: u32,
    screen_height: u32,
    transition: Transition,
}

impl SdlDisplay {
    /// Initialize SDL2 and create a fullscreen window.
    pub fn new(settings: &DisplaySettings) -> Result<Self> {
        let setup = |what: &str, e: String| FrameError::DisplaySetup(format!("{what}: {e}"));

        let sdl_context = sdl2::init().map_err(|e| setup("SDL init failed", e))?;
        let video_subsystem = sdl_context
            .video()
            .map_err(|e| setup("SDL video init failed", e))?;

        let display_mode = video_subsystem
            .desktop_display_mode(0)
            .map_err(|e| setup("Failed to get display mode", e))?;
        let screen_width = display_mode.w as u32;
        let screen_height = display_mode.h as u32;

        tracing::info!("Creating fullscreen window: {}x{}", screen_width, screen_height);

        let title = settings.overlay_text.as_deref().unwrap_or("Now Playing");
        let window = video_subsystem
            .window(title, screen_width, screen_height)
            .fullscreen_desktop()
            .build()
            .map_err(|e| setup("Failed to create window", e.to_string()))?;

        let mut canvas = window
            .into_canvas()
            .accelerated()
            .present_vsync()
            .build()
            .map_err(|e| setup("Failed to create canvas", e.to_string()))?;

        sdl_context.mouse().show_cursor(false);

        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        canvas.present();

        let event_pump = sdl_context
            .event_pump()
            .map_err(|e| setup("Failed to get event pump", e))?;
        let texture_creator = canvas.texture_creator();

        Ok(Self {
            canvas,
            texture_creator,
            event_pump,
            screen_width,
            screen_height,
            transition: Transition::from_str(&settings.transition),
        })
    }

    /// Calculate aspect-fit rectangle for displaying an image.
    fn calculate_aspect_fit(&self, img_width: u32, img_height: u32) -> Rect {
        let screen_ratio = self.screen_width as f32 / self.screen_height as f32;
        let img_ratio = img_width as f32 / img_height as f32;

        let (fit_width, fit_height) = if img_ratio > screen_ratio {
            (self.screen_width, (self.screen_width as f32 / img_ratio) as u32)
        } else {
            ((self.screen_height as f32 * img_ratio) as u32, self.screen_height)
        };

        let x = ((self.screen_width - fit_width) / 2) as i32;
        let y = ((self.screen_height - fit_height) / 2) as i32;
        Rect::new(x, y, fit_width, fit_height)
    }
}

impl Display for SdlDisplay {
    fn update(&mut self, image: &DynamicImage) -> Result<()> {
        // Drain window events so the compositor does not mark us unresponsive.
        for _ in self.event_pump.poll_iter() {}

        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let fail = |what: &str, e: String| FrameError::Display(format!("{what}: {e}"));

        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::ABGR8888, width, height)
            .map_err(|e| fail("Failed to create texture", e.to_string()))?;
        texture
            .update(None, rgba.as_raw(), width as usize * 4)
            .map_err(|e| fail("Failed to update texture", e.to_string()))?;
        texture.set_blend_mode(BlendMode::Blend);

        let dest = self.calculate_aspect_fit(width, height);
        let steps = match self.transition {
            Transition::Cut => 1,
            Transition::Fade => FADE_STEPS,
        };
        let canvas = &mut self.canvas;
        blocking_section(|| -> Result<()> {
            for step in 1..=steps {
                texture.set_alpha_mod(((step as u32 * 255) / steps as u32) as u8);
                canvas.set_draw_color(Color::RGB(0, 0, 0));
                canvas.clear();
                canvas
                    .copy(&texture, None, dest)
                    .map_err(|e| fail("Failed to render image", e))?;
                canvas.present();
                if step < steps {
                    std::thread::sleep(Duration::from_millis(16));
                }
            }
            Ok(())
        })
    }

    fn cleanup(&mut self) {
        tracing::debug!("Shutting down SDL display");
        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();
        self.canvas.present();
    }
}
