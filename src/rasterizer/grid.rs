//! Floor grid on the y = 0 plane

use serde::{Deserialize, Serialize};
use super::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Vec3,
    pub b: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Distance between grid lines
    pub spacing: f32,
    /// Half-width of the grid in world units
    pub extent: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing: 1.0,
            extent: 10.0,
        }
    }
}

/// Build grid lines as one short segment per cell edge, so each piece can be
/// near-clipped on its own when the camera sits inside the grid.
pub fn build_floor_grid(config: GridConfig) -> Vec<LineSegment> {
    if !(config.spacing > 0.0 && config.extent > 0.0) {
        return Vec::new();
    }

    let steps = (config.extent / config.spacing).floor() as i32;
    let coord = |i: i32| i as f32 * config.spacing;
    let mut segments = Vec::new();

    for i in -steps..=steps {
        for j in -steps..steps {
            // Line parallel to Z at x = coord(i)
            segments.push(LineSegment {
                a: Vec3::new(coord(i), 0.0, coord(j)),
                b: Vec3::new(coord(i), 0.0, coord(j + 1)),
            });
            // Line parallel to X at z = coord(i)
            segments.push(LineSegment {
                a: Vec3::new(coord(j), 0.0, coord(i)),
                b: Vec3::new(coord(j + 1), 0.0, coord(i)),
            });
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_segment_count() {
        let grid = build_floor_grid(GridConfig {
            spacing: 1.0,
            extent: 2.0,
        });
        // 5 lines per axis, 4 pieces each
        assert_eq!(grid.len(), 2 * 5 * 4);
        assert!(grid.iter().all(|s| s.a.y == 0.0 && s.b.y == 0.0));
        assert!(grid
            .iter()
            .all(|s| s.a.x.abs() <= 2.0 && s.b.z.abs() <= 2.0));
    }

    #[test]
    fn test_invalid_grid_is_empty() {
        assert!(build_floor_grid(GridConfig { spacing: 0.0, extent: 5.0 }).is_empty());
        assert!(build_floor_grid(GridConfig { spacing: 1.0, extent: -1.0 }).is_empty());
        assert!(build_floor_grid(GridConfig { spacing: 2.0, extent: 1.0 }).is_empty());
    }
}
