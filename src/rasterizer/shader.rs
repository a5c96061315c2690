//! Default pixel shader
//!
//! A two-way variant instead of a shader object: flat white or a point-sampled
//! texture, both modulated by how directly the surface faces the camera (or
//! the light, with `Lights` on).

use super::math::{Vec2, Vec3};
use super::texture::Texture;
use super::types::{Color, Lighting, RenderFlag, RenderSettings};

/// Interpolated attributes for one covered pixel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fragment {
    pub weights: [f32; 3],
    pub world: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

/// Per-draw constants the shader reads
#[derive(Debug, Clone, Copy)]
pub struct ShadeEnv {
    pub camera_direction: Vec3,
    pub has_normals: bool,
    /// Some when the Lights flag is on
    pub lighting: Option<Lighting>,
}

#[derive(Debug, Clone, Copy)]
pub enum PixelShader<'t> {
    Flat,
    Textured(&'t Texture),
}

impl<'t> PixelShader<'t> {
    /// Textured only with the flag on, a bound texture and a mesh carrying UVs
    pub fn select(settings: RenderSettings, texture: Option<&'t Texture>, has_uvs: bool) -> Self {
        match texture {
            Some(tex) if settings.is_enabled(RenderFlag::Textures) && has_uvs && !tex.is_empty() => {
                PixelShader::Textured(tex)
            }
            _ => PixelShader::Flat,
        }
    }

    pub fn shade(&self, frag: &Fragment, env: &ShadeEnv) -> Color {
        let base = match self {
            PixelShader::Flat => Color::WHITE,
            PixelShader::Textured(tex) => tex.sample(frag.uv),
        };

        if !env.has_normals {
            return base;
        }

        let n = frag.normal.normalize();
        let facing = match env.lighting {
            Some(light) => lit_ratio(light, n),
            None => facing_ratio(env.camera_direction, n),
        };
        base.shade(facing)
    }
}

/// clamp(dot(-camera_direction, n), 0, 1); NaN counts as not facing
pub fn facing_ratio(camera_direction: Vec3, n: Vec3) -> f32 {
    let f = (-camera_direction).dot(n);
    if f.is_nan() {
        return 0.0;
    }
    f.clamp(0.0, 1.0)
}

/// Ambient plus diffuse from a directional light, bounded to [0, 1]
pub fn lit_ratio(light: Lighting, n: Vec3) -> f32 {
    let ambient = light.ambient.clamp(0.0, 1.0);
    let diffuse = facing_ratio(light.direction.normalize(), n);
    (ambient + (1.0 - ambient) * diffuse).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(has_normals: bool) -> ShadeEnv {
        ShadeEnv {
            camera_direction: Vec3::new(0.0, 0.0, 1.0),
            has_normals,
            lighting: None,
        }
    }

    fn frag(normal: Vec3, uv: Vec2) -> Fragment {
        Fragment {
            weights: [1.0, 0.0, 0.0],
            world: Vec3::ZERO,
            uv,
            normal,
        }
    }

    #[test]
    fn test_facing_ratio_bounds() {
        let cam = Vec3::new(0.3, -0.2, 0.9).normalize();
        let normals = [
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0).normalize(),
            Vec3::new(-0.5, 0.2, -0.8).normalize(),
            Vec3::ZERO,
            Vec3::new(f32::NAN, 0.0, 0.0),
        ];
        for n in normals {
            let f = facing_ratio(cam, n);
            assert!((0.0..=1.0).contains(&f), "{:?} -> {}", n, f);
        }
    }

    #[test]
    fn test_flat_without_normals_is_white() {
        let c = PixelShader::Flat.shade(&frag(Vec3::ZERO, Vec2::ZERO), &env(false));
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_flat_facing_camera_is_white() {
        let c = PixelShader::Flat.shade(&frag(Vec3::new(0.0, 0.0, -1.0), Vec2::ZERO), &env(true));
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_flat_facing_away_is_black() {
        let c = PixelShader::Flat.shade(&frag(Vec3::new(0.0, 0.0, 1.0), Vec2::ZERO), &env(true));
        assert_eq!(c, Color::BLACK);
    }

    #[test]
    fn test_interpolated_normal_is_renormalized() {
        // Half-length normal still faces fully
        let c = PixelShader::Flat.shade(&frag(Vec3::new(0.0, 0.0, -0.5), Vec2::ZERO), &env(true));
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_select_requires_flag_texture_and_uvs() {
        let tex = Texture::checkerboard(8, 8, Color::RED, Color::BLUE);
        let on = RenderSettings::default().with(RenderFlag::Textures);
        let off = RenderSettings::default();
        assert!(matches!(PixelShader::select(on, Some(&tex), true), PixelShader::Textured(_)));
        assert!(matches!(PixelShader::select(off, Some(&tex), true), PixelShader::Flat));
        assert!(matches!(PixelShader::select(on, Some(&tex), false), PixelShader::Flat));
        assert!(matches!(PixelShader::select(on, None, true), PixelShader::Flat));
    }

    #[test]
    fn test_textured_samples_uv() {
        let tex = Texture::checkerboard(8, 8, Color::RED, Color::BLUE);
        let shader = PixelShader::Textured(&tex);
        let c = shader.shade(&frag(Vec3::ZERO, Vec2::new(0.0, 0.0)), &env(false));
        assert_eq!(c, Color::RED);
        let c = shader.shade(&frag(Vec3::ZERO, Vec2::new(0.6, 0.0)), &env(false));
        assert_eq!(c, Color::BLUE);
    }

    #[test]
    fn test_lighting_keeps_ambient_floor() {
        let light = Lighting {
            direction: Vec3::new(0.0, -1.0, 0.0),
            ambient: 0.25,
        };
        // Lit from straight above
        assert!((lit_ratio(light, Vec3::UP) - 1.0).abs() < 1e-6);
        // Facing away still gets ambient
        assert!((lit_ratio(light, -Vec3::UP) - 0.25).abs() < 1e-6);
        let e = ShadeEnv {
            lighting: Some(light),
            ..env(true)
        };
        let c = PixelShader::Flat.shade(&frag(-Vec3::UP, Vec2::ZERO), &e);
        assert_eq!(c, Color::new(63, 63, 63));
    }
}
