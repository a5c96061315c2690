//! softraster viewer
//!
//! Spins two cubes over a floor grid and blits the software framebuffer to
//! the window every frame.
//!
//! Controls: drag with the left mouse button to orbit, wheel to zoom,
//! 1-6 toggle Wireframe/Shaded/Depth/Textures/Lights/Normals, G toggles the
//! grid, Space pauses the spin.
//!
//! Arguments: `--config <file.ron>` and `--texture <image>`.

mod orbit;

use std::path::PathBuf;
use std::sync::Arc;
use macroquad::prelude::*;
use softraster::config::{load_config, RenderConfig};
use softraster::rasterizer as sr;
use softraster::VERSION;
use orbit::OrbitCamera;

/// Internal render resolution
const VIEW_WIDTH: usize = 320;
const VIEW_HEIGHT: usize = 240;

const FLAG_KEYS: [(KeyCode, sr::RenderFlag); 6] = [
    (KeyCode::Key1, sr::RenderFlag::Wireframe),
    (KeyCode::Key2, sr::RenderFlag::Shaded),
    (KeyCode::Key3, sr::RenderFlag::Depth),
    (KeyCode::Key4, sr::RenderFlag::Textures),
    (KeyCode::Key5, sr::RenderFlag::Lights),
    (KeyCode::Key6, sr::RenderFlag::Normals),
];

#[derive(Debug, Default)]
struct ViewerArgs {
    config: Option<PathBuf>,
    texture: Option<PathBuf>,
}

impl ViewerArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        let mut out = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => out.config = args.next().map(PathBuf::from),
                "--texture" => out.texture = args.next().map(PathBuf::from),
                other => log::warn!("ignoring argument '{}'", other),
            }
        }
        out
    }
}

/// Defaults for interactive use: textured, grid on, rows flipped for display
fn viewer_config() -> RenderConfig {
    RenderConfig {
        settings: sr::RenderSettings::from_flags(&[
            sr::RenderFlag::Shaded,
            sr::RenderFlag::Depth,
            sr::RenderFlag::Textures,
        ]),
        byte_order: sr::ByteOrder::Rgba,
        flip_on_present: true,
        grid: Some(sr::GridConfig::default()),
        ..Default::default()
    }
}

fn load_texture(path: Option<&PathBuf>) -> sr::Texture {
    if let Some(path) = path {
        match sr::Texture::from_file(path) {
            Ok(tex) => {
                log::info!("loaded texture {} ({}x{})", path.display(), tex.width(), tex.height());
                return tex;
            }
            Err(e) => log::warn!("failed to load texture {}: {}", path.display(), e),
        }
    }
    sr::Texture::checkerboard(
        64,
        64,
        sr::Color::new(200, 90, 60),
        sr::Color::new(240, 220, 190),
    )
}

/// Frame sink: hand the color buffer to the GPU as an RGBA texture
fn present(view: &sr::ColorBufferView) -> Texture2D {
    let texture = match view.format {
        sr::ByteOrder::Rgba => Texture2D::from_rgba8(view.width as u16, view.height as u16, view.bytes),
        sr::ByteOrder::Bgra => {
            let rgba: Vec<u8> = view
                .bytes
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0], px[3]])
                .collect();
            Texture2D::from_rgba8(view.width as u16, view.height as u16, &rgba)
        }
    };
    texture.set_filter(FilterMode::Nearest);
    texture
}

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softraster v{}", VERSION),
        window_width: VIEW_WIDTH as i32 * 3,
        window_height: VIEW_HEIGHT as i32 * 3,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ViewerArgs::parse(std::env::args().skip(1));
    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("failed to load {}: {}, using defaults", path.display(), e);
                viewer_config()
            }
        },
        None => viewer_config(),
    };

    let cube = sr::Mesh::cube(1.0);
    let texture = Arc::new(load_texture(args.texture.as_ref()));

    let mut core = sr::RenderCore::new(config, Box::new(sr::LogCrateSink));
    if let Err(e) = core.init(VIEW_WIDTH, VIEW_HEIGHT) {
        log::error!("cannot start renderer: {}", e);
        return;
    }
    match core.add_texture(texture) {
        Ok(index) => {
            if let Err(e) = core.set_active_texture(Some(index)) {
                log::warn!("{}", e);
            }
        }
        Err(e) => log::warn!("{}", e),
    }

    let mut camera = OrbitCamera::default();
    let mut last_mouse = mouse_position();
    let mut spin = 0.0f32;
    let mut paused = false;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        for (key, flag) in FLAG_KEYS {
            if is_key_pressed(key) {
                core.toggle_flag(flag);
                log::info!("{} {}", flag.label(), if core.is_flag_enabled(flag) { "on" } else { "off" });
            }
        }
        if is_key_pressed(KeyCode::G) {
            let grid = match core.config().grid {
                Some(_) => None,
                None => Some(sr::GridConfig::default()),
            };
            core.enable_grid(grid);
        }
        if is_key_pressed(KeyCode::Space) {
            paused = !paused;
        }

        let mouse = mouse_position();
        if is_mouse_button_down(MouseButton::Left) {
            // Screen y grows down, world pitch grows up
            let dx = (mouse.1 - last_mouse.1) * 0.005;
            let dy = -(mouse.0 - last_mouse.0) * 0.005;
            camera.rotate(dx, dy);
        }
        last_mouse = mouse;

        let wheel = mouse_wheel().1;
        if wheel > 0.0 {
            camera.zoom(0.9);
        } else if wheel < 0.0 {
            camera.zoom(1.1);
        }

        if !paused {
            spin += get_frame_time() * 40.0;
        }

        let view = match camera.view_data(VIEW_WIDTH, VIEW_HEIGHT) {
            Ok(view) => view,
            Err(e) => {
                log::warn!("{}", e);
                next_frame().await;
                continue;
            }
        };

        let rotation = sr::mat4_rotation(sr::Vec3::new(spin * 0.5, spin, 0.0));
        let left = sr::mat4_mul(&sr::mat4_translation(sr::Vec3::new(-1.6, 1.0, 0.0)), &rotation);
        let right = sr::mat4_mul(
            &sr::mat4_translation(sr::Vec3::new(1.6, 1.0, 0.0)),
            &sr::mat4_mul(&rotation, &sr::mat4_scale(sr::Vec3::new(0.6, 0.6, 0.6))),
        );

        let frame = core
            .begin_frame()
            .and_then(|_| core.set_view_data(view))
            .and_then(|_| core.add_renderable(sr::Renderable::new(&cube, left)))
            .and_then(|_| core.add_renderable(sr::Renderable::new(&cube, right)))
            .and_then(|_| core.draw())
            .and_then(|_| core.fill_rect_blended(0, 0, VIEW_WIDTH as i32, 14, sr::Color::with_alpha(0, 0, 0, 160)))
            .and_then(|_| core.end_frame());
        if let Err(e) = frame {
            log::error!("frame failed: {}", e);
            // Leave the core ready for the next frame
            if let Err(e) = core.end_frame() {
                log::warn!("frame recovery: {}", e);
            }
        }

        clear_background(BLACK);
        if let Ok(buffer) = core.color_buffer() {
            let texture = present(&buffer);
            draw_texture_ex(
                &texture,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(screen_width(), screen_height())),
                    ..Default::default()
                },
            );
        }

        let stats = core.stats();
        let flags: Vec<&str> = core.settings().flags().iter().map(|f| f.label()).collect();
        draw_text(
            &format!(
                "{} | tris {}/{} | px {} | {:.0} fps",
                flags.join(" "),
                stats.triangles_rasterized,
                stats.triangles_submitted,
                stats.pixels_written,
                get_fps()
            ),
            8.0,
            screen_height() - 10.0,
            20.0,
            WHITE,
        );

        next_frame().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = ViewerArgs::parse(
            ["--config", "a.ron", "--bogus", "--texture", "t.png"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(args.config, Some(PathBuf::from("a.ron")));
        assert_eq!(args.texture, Some(PathBuf::from("t.png")));
    }

    #[test]
    fn test_viewer_config_flips_for_display() {
        let config = viewer_config();
        assert!(config.flip_on_present);
        assert!(config.settings.is_enabled(sr::RenderFlag::Textures));
    }
}
