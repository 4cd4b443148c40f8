//! Cubes drawn as three quadrilaterals, and rectangular piles of them.
//!
//! A cube is seen with its near top corner at the center point. Its three
//! visible faces all share that corner; the other corners are relative points
//! on it, so moving the center moves the whole cube.

use kurbo::Vec2;

use crate::error::{AnimationError, Result};
use crate::graph::{Graph, ItemId, PointId};
use crate::types::Color;

use super::{ItemKind, Outline, Resolve};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Screen-space edge vectors `[Δx, Δy, Δz]` of a cube with the given edge
/// length. `squash` 0 is corner-on (isometric), 1 is face-on.
pub fn cube_axes(radius: f64, squash: f64) -> [Vec2; 3] {
    let s = squash.clamp(0.0, 1.0);
    let (c30, s30) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
    let corner_x = Vec2::new(-radius * c30, -radius * s30);
    let corner_y = Vec2::new(radius * c30, -radius * s30);
    let face_y = Vec2::new(radius, 0.0);
    [
        corner_x.lerp(Vec2::ZERO, s),
        corner_y.lerp(face_y, s),
        Vec2::new(0.0, radius),
    ]
}

/// Corner offsets from the center in the order x, y, z, x+y, x+z, y+z.
fn corner_offsets(axes: [Vec2; 3]) -> [Vec2; 6] {
    let [x, y, z] = axes;
    [x, y, z, x + y, x + z, y + z]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    pub center: PointId,
    pub radius: f64,
    pub squash: f64,
    corners: [PointId; 6],
    /// Top, left, right.
    faces: [ItemId; 3],
}

impl Resolve for Cube {
    fn parameters(&self) -> Vec<PointId> {
        Vec::new()
    }

    fn children(&self) -> &[ItemId] {
        &self.faces
    }

    fn resolve(&self, _graph: &Graph) -> Option<Outline> {
        Some(Outline::Composite(self.faces.to_vec()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CubeGrid {
    pub origin: PointId,
    pub sizes: [usize; 3],
    pub radius: f64,
    pub squash: f64,
    centers: Vec<PointId>,
    cubes: Vec<ItemId>,
}

impl CubeGrid {
    fn index(&self, at: [usize; 3]) -> Option<usize> {
        let [i, j, k] = at;
        let [nx, ny, nz] = self.sizes;
        (i < nx && j < ny && k < nz).then(|| i + nx * (j + ny * k))
    }

    fn coords(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.sizes;
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    fn offset(axes: [Vec2; 3], at: [usize; 3]) -> Vec2 {
        axes[0] * at[0] as f64 + axes[1] * at[1] as f64 + axes[2] * at[2] as f64
    }
}

impl Resolve for CubeGrid {
    fn parameters(&self) -> Vec<PointId> {
        Vec::new()
    }

    fn children(&self) -> &[ItemId] {
        &self.cubes
    }

    fn resolve(&self, _graph: &Graph) -> Option<Outline> {
        Some(Outline::Composite(self.cubes.clone()))
    }
}

impl Graph {
    pub fn add_cube(&mut self, center: PointId, radius: f64, squash: f64) -> Result<ItemId> {
        let mut corners = [PointId::default(); 6];
        for (corner, d) in corners.iter_mut().zip(corner_offsets(cube_axes(radius, squash))) {
            *corner = self.add_relative(center, d.x, d.y)?;
        }
        let [cx, cy, cz, cxy, cxz, cyz] = corners;
        let shades = [0.85, 0.6, 0.4];
        let face_corners = [
            vec![center, cx, cxy, cy],
            vec![center, cx, cxz, cz],
            vec![center, cy, cyz, cz],
        ];
        let mut faces = [ItemId::default(); 3];
        for ((face, vertices), shade) in faces.iter_mut().zip(face_corners).zip(shades) {
            *face = self.add_polygon(vertices);
            self.set_fill_color(*face, Some(Color::rgb(shade, shade, shade)))?;
        }
        Ok(self.add_item(ItemKind::Cube(Cube {
            center,
            radius,
            squash: squash.clamp(0.0, 1.0),
            corners: [cx, cy, cz, cxy, cxz, cyz],
            faces,
        })))
    }

    fn cube(&self, id: ItemId) -> Result<&Cube> {
        match self.item(id).map(|i| &i.kind) {
            Some(ItemKind::Cube(c)) => Ok(c),
            Some(other) => Err(AnimationError::WrongKind {
                expected: "cube",
                actual: other.name(),
            }),
            None => Err(AnimationError::ItemNotFound {
                id: format!("{id:?}"),
            }),
        }
    }

    /// Offsets that place an identical cube next to this one along x, y, z.
    pub fn cube_deltas(&self, id: ItemId) -> Result<[Vec2; 3]> {
        let cube = self.cube(id)?;
        Ok(cube_axes(cube.radius, cube.squash))
    }

    pub fn set_cube_squash(&mut self, id: ItemId, squash: f64) -> Result<()> {
        let radius = self.cube(id)?.radius;
        self.reshape_cube(id, radius, squash)
    }

    pub fn set_cube_radius(&mut self, id: ItemId, radius: f64) -> Result<()> {
        let squash = self.cube(id)?.squash;
        self.reshape_cube(id, radius, squash)
    }

    fn reshape_cube(&mut self, id: ItemId, radius: f64, squash: f64) -> Result<()> {
        let corners = match self.item_kind_mut(id)? {
            ItemKind::Cube(c) => {
                c.radius = radius;
                c.squash = squash.clamp(0.0, 1.0);
                c.corners
            }
            other => {
                return Err(AnimationError::WrongKind {
                    expected: "cube",
                    actual: other.name(),
                });
            }
        };
        for (corner, d) in corners.into_iter().zip(corner_offsets(cube_axes(radius, squash))) {
            self.set(corner, d.x, d.y)?;
        }
        Ok(())
    }

    /// A `sizes[0] × sizes[1] × sizes[2]` pile of cubes starting at `origin`.
    /// Cubes further back or lower get a lower z-order.
    pub fn add_cube_grid(
        &mut self,
        origin: PointId,
        sizes: [usize; 3],
        radius: f64,
        squash: f64,
    ) -> Result<ItemId> {
        let axes = cube_axes(radius, squash);
        let mut centers = Vec::new();
        let mut cubes = Vec::new();
        for k in 0..sizes[2] {
            for j in 0..sizes[1] {
                for i in 0..sizes[0] {
                    let d = CubeGrid::offset(axes, [i, j, k]);
                    let center = self.add_relative(origin, d.x, d.y)?;
                    let cube = self.add_cube(center, radius, squash)?;
                    self.set_z_order(cube, -((i + j + k) as i32))?;
                    centers.push(center);
                    cubes.push(cube);
                }
            }
        }
        Ok(self.add_item(ItemKind::CubeGrid(CubeGrid {
            origin,
            sizes,
            radius,
            squash: squash.clamp(0.0, 1.0),
            centers,
            cubes,
        })))
    }

    fn cube_grid(&self, id: ItemId) -> Result<&CubeGrid> {
        match self.item(id).map(|i| &i.kind) {
            Some(ItemKind::CubeGrid(g)) => Ok(g),
            Some(other) => Err(AnimationError::WrongKind {
                expected: "cube grid",
                actual: other.name(),
            }),
            None => Err(AnimationError::ItemNotFound {
                id: format!("{id:?}"),
            }),
        }
    }

    pub fn cube_at(&self, grid: ItemId, at: [usize; 3]) -> Option<ItemId> {
        let grid = self.cube_grid(grid).ok()?;
        grid.index(at).map(|i| grid.cubes[i])
    }

    /// The cubes of one layer of the grid, perpendicular to `axis`.
    pub fn cube_grid_slice(&self, grid: ItemId, axis: Axis, index: usize) -> Vec<ItemId> {
        let Ok(grid) = self.cube_grid(grid) else {
            return Vec::new();
        };
        grid.cubes
            .iter()
            .enumerate()
            .filter(|(n, _)| grid.coords(*n)[axis.index()] == index)
            .map(|(_, cube)| *cube)
            .collect()
    }

    pub fn set_cube_grid_squash(&mut self, grid: ItemId, squash: f64) -> Result<()> {
        let (radius, cubes, centers, coords) = {
            let g = self.cube_grid(grid)?;
            let coords: Vec<_> = (0..g.cubes.len()).map(|n| g.coords(n)).collect();
            (g.radius, g.cubes.clone(), g.centers.clone(), coords)
        };
        if let ItemKind::CubeGrid(g) = self.item_kind_mut(grid)? {
            g.squash = squash.clamp(0.0, 1.0);
        }
        let axes = cube_axes(radius, squash);
        for ((cube, center), at) in cubes.into_iter().zip(centers).zip(coords) {
            let d = CubeGrid::offset(axes, at);
            self.set(center, d.x, d.y)?;
            self.reshape_cube(cube, radius, squash)?;
        }
        Ok(())
    }
}
