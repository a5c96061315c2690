//! Frame orchestration
//!
//! `RenderCore` owns the framebuffer and the rasterizer, borrows renderables
//! for one frame and shares textures by `Arc`. Lifecycle:
//! Uninitialized -> init -> Ready -> begin_frame -> InFrame -> end_frame -> Ready.

use std::sync::Arc;
use crate::config::RenderConfig;
use super::buffer::Buffer2D;
use super::error::RenderError;
use super::framebuffer::Framebuffer;
use super::grid::{build_floor_grid, GridConfig, LineSegment};
use super::logging::{LogSink, Logger};
use super::mesh::Renderable;
use super::raster::{DrawContext, FrameStats, Rasterizer};
use super::shader::PixelShader;
use super::texture::Texture;
use super::types::{ByteOrder, Color, Palette, RenderFlag, RenderSettings};
use super::view::ViewData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Uninitialized,
    Ready,
    InFrame,
}

/// Borrowed view of the color target for a frame sink
#[derive(Debug, Clone, Copy)]
pub struct ColorBufferView<'b> {
    pub bytes: &'b [u8],
    pub width: usize,
    pub height: usize,
    pub pitch_bytes: usize,
    pub format: ByteOrder,
}

pub struct RenderCore<'a> {
    config: RenderConfig,
    state: CoreState,
    framebuffer: Option<Framebuffer>,
    raster: Rasterizer,
    view: Option<ViewData>,
    textures: Vec<Arc<Texture>>,
    active_texture: Option<usize>,
    renderables: Vec<Renderable<'a>>,
    grid: Vec<LineSegment>,
    logger: Logger,
}

impl<'a> RenderCore<'a> {
    pub fn new(config: RenderConfig, sink: Box<dyn LogSink>) -> Self {
        let grid = config.grid.map(build_floor_grid).unwrap_or_default();
        Self {
            raster: Rasterizer::new(config.raster),
            config,
            state: CoreState::Uninitialized,
            framebuffer: None,
            view: None,
            textures: Vec::new(),
            active_texture: None,
            renderables: Vec::new(),
            grid,
            logger: Logger::new(sink),
        }
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn require_init(&self) -> Result<(), RenderError> {
        match self.state {
            CoreState::Uninitialized => Err(RenderError::BackendNotInitialized),
            _ => Ok(()),
        }
    }

    fn require_frame(&self) -> Result<(), RenderError> {
        match self.state {
            CoreState::Uninitialized => Err(RenderError::BackendNotInitialized),
            CoreState::Ready => Err(RenderError::FrameNotOpen),
            CoreState::InFrame => Ok(()),
        }
    }

    /// Allocate framebuffers. Re-initializing a ready core reallocates them.
    pub fn init(&mut self, width: usize, height: usize) -> Result<(), RenderError> {
        if self.state == CoreState::InFrame {
            return Err(RenderError::FrameAlreadyOpen);
        }
        match Framebuffer::new(width, height, self.config.byte_order) {
            Ok(fb) => {
                self.framebuffer = Some(fb);
                self.state = CoreState::Ready;
                self.logger.info(&format!("render core initialized at {}x{}", width, height));
                Ok(())
            }
            Err(err) => {
                self.logger.error(&format!("init failed: {}", err));
                Err(err)
            }
        }
    }

    /// Reallocate framebuffers. Invalid sizes are rejected and the previous
    /// size is kept.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), RenderError> {
        match self.state {
            CoreState::Uninitialized => return Err(RenderError::BackendNotInitialized),
            CoreState::InFrame => return Err(RenderError::FrameAlreadyOpen),
            CoreState::Ready => {}
        }
        let fb = self.framebuffer.as_mut().ok_or(RenderError::BackendNotInitialized)?;
        if let Err(err) = fb.resize(width, height) {
            self.logger.warn(&format!("resize rejected: {}", err));
            return Err(err);
        }
        Ok(())
    }

    /// Open a frame and clear color and depth
    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        match self.state {
            CoreState::Uninitialized => return Err(RenderError::BackendNotInitialized),
            CoreState::InFrame => return Err(RenderError::FrameAlreadyOpen),
            CoreState::Ready => {}
        }
        let fb = self.framebuffer.as_mut().ok_or(RenderError::BackendNotInitialized)?;
        fb.clear(self.config.clear);
        self.raster.reset_stats();
        self.state = CoreState::InFrame;
        Ok(())
    }

    pub fn set_view_data(&mut self, view: ViewData) -> Result<(), RenderError> {
        self.require_init()?;
        self.view = Some(view);
        Ok(())
    }

    pub fn view_data(&self) -> Option<&ViewData> {
        self.view.as_ref()
    }

    /// Held until `end_frame`
    pub fn add_renderable(&mut self, renderable: Renderable<'a>) -> Result<(), RenderError> {
        self.require_init()?;
        self.renderables.push(renderable);
        Ok(())
    }

    /// Register a shared texture and return its index
    pub fn add_texture(&mut self, texture: Arc<Texture>) -> Result<usize, RenderError> {
        self.require_init()?;
        if texture.is_empty() {
            let err = RenderError::TextureInvalid(texture.name.clone());
            self.logger.warn(&format!("texture rejected: {}", err));
            return Err(err);
        }
        self.textures.push(texture);
        Ok(self.textures.len() - 1)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Texture used by renderables that don't name their own
    pub fn set_active_texture(&mut self, index: Option<usize>) -> Result<(), RenderError> {
        if let Some(i) = index {
            if i >= self.textures.len() {
                return Err(RenderError::TextureInvalid(format!("index {}", i)));
            }
        }
        self.active_texture = index;
        Ok(())
    }

    pub fn active_texture(&self) -> Option<usize> {
        self.active_texture
    }

    /// Rasterize every renderable added so far, then the queued overlays
    pub fn draw(&mut self) -> Result<(), RenderError> {
        self.require_frame()?;
        let view = self.view.ok_or(RenderError::NoViewData)?;
        let fb = self.framebuffer.as_mut().ok_or(RenderError::BackendNotInitialized)?;
        let settings = self.config.settings;

        if !self.grid.is_empty() {
            self.raster
                .draw_grid(fb, &view.view_projection, &self.grid, self.config.palette.grid);
        }

        for renderable in &self.renderables {
            let mesh = match renderable.view() {
                Ok(mesh) => mesh,
                Err(err) => {
                    self.logger.warn_once(
                        &format!("mesh:{}", renderable.name),
                        &format!("skipping renderable: {}", err),
                    );
                    continue;
                }
            };

            let texture_index = renderable.texture.or(self.active_texture);
            let texture = match texture_index {
                Some(i) => match self.textures.get(i) {
                    Some(tex) => Some(tex.as_ref()),
                    None => {
                        self.logger.warn_once(
                            &format!("texture:{}", i),
                            &format!("mesh '{}' references missing texture {}", mesh.name, i),
                        );
                        None
                    }
                },
                None => None,
            };

            let shader = PixelShader::select(settings, texture, mesh.has_uvs);
            let ctx = DrawContext::new(&view, renderable.model, settings, shader, mesh.has_normals)
                .with_overlay(self.config.palette, self.config.normal_length)
                .with_lighting(self.config.lighting);

            for tri in mesh.triangles() {
                self.raster.draw_triangle(fb, &tri, &ctx);
            }
        }

        self.raster.flush_overlay(fb);
        Ok(())
    }

    /// Close the frame, drop this frame's renderables and optionally flip
    /// rows for presentation
    pub fn end_frame(&mut self) -> Result<(), RenderError> {
        self.require_frame()?;
        if self.config.flip_on_present {
            if let Some(fb) = self.framebuffer.as_mut() {
                fb.flip_vertical();
            }
        }
        self.renderables.clear();
        self.state = CoreState::Ready;
        Ok(())
    }

    /// Release everything; the core must be initialized again before use
    pub fn shutdown(&mut self) {
        self.framebuffer = None;
        self.view = None;
        self.textures.clear();
        self.active_texture = None;
        self.renderables.clear();
        self.state = CoreState::Uninitialized;
    }

    pub fn color_buffer(&self) -> Result<ColorBufferView<'_>, RenderError> {
        let fb = self.framebuffer.as_ref().ok_or(RenderError::BackendNotInitialized)?;
        Ok(ColorBufferView {
            bytes: fb.color_bytes(),
            width: fb.width(),
            height: fb.height(),
            pitch_bytes: fb.color().pitch() * 4,
            format: fb.byte_order(),
        })
    }

    /// Depth cells as f32 bit patterns
    pub fn depth_buffer(&self) -> Result<&Buffer2D<u32>, RenderError> {
        self.framebuffer
            .as_ref()
            .map(|fb| fb.depth())
            .ok_or(RenderError::BackendNotInitialized)
    }

    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.framebuffer.as_ref()
    }

    pub fn settings(&self) -> RenderSettings {
        self.config.settings
    }

    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.config.settings = settings;
    }

    pub fn set_flag(&mut self, flag: RenderFlag, enabled: bool) {
        self.config.settings.set(flag, enabled);
    }

    pub fn toggle_flag(&mut self, flag: RenderFlag) {
        self.config.settings.toggle(flag);
    }

    pub fn is_flag_enabled(&self, flag: RenderFlag) -> bool {
        self.config.settings.is_enabled(flag)
    }

    pub fn palette(&self) -> Palette {
        self.config.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.config.palette = palette;
    }

    /// Replace the floor grid; None disables it
    pub fn enable_grid(&mut self, grid: Option<GridConfig>) {
        self.config.grid = grid;
        self.grid = grid.map(build_floor_grid).unwrap_or_default();
    }

    pub fn stats(&self) -> FrameStats {
        self.raster.stats()
    }

    /// Alpha-blended overlay rectangle; valid once initialized
    pub fn fill_rect_blended(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) -> Result<usize, RenderError> {
        let fb = self.framebuffer.as_mut().ok_or(RenderError::BackendNotInitialized)?;
        Ok(fb.fill_rect_blended(x, y, w, h, color))
    }
}
