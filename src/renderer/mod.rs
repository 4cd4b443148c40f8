//! Renderer — the deterministic rasterizer.
//!
//! `raster` turns the live scene into `ResolvedScene`s (draw ops); this
//! module turns those into cell grids, and a sequence of them into a
//! `PlayablePresentation` (serializable, for replay).
//!
//! The renderer is pure and stateless. Given the same input, it always
//! produces the same output. It knows nothing about time, shots or the
//! geometry graph.

pub mod raster;

pub use raster::{Rasterizer, ViewMap};

use crate::types::{
    Cell, CellChange, Frame, Marker, PlayablePresentation, ResolvedScene, TerminalContract,
};

pub struct Renderer;

impl Renderer {
    /// Render a sequence of resolved scenes into a playable presentation.
    ///
    /// The first frame is always a full frame. Subsequent frames are diffs
    /// against the previous frame.
    pub fn render(
        scenes: &[ResolvedScene],
        contract: TerminalContract,
        markers: Vec<Marker>,
    ) -> PlayablePresentation {
        let mut frames = Vec::with_capacity(scenes.len());
        let mut prev_grid: Option<Vec<Vec<Cell>>> = None;

        for scene in scenes {
            let grid = Self::rasterize(scene, &contract);
            let frame = match &prev_grid {
                None => Frame::Full {
                    cells: grid.clone(),
                },
                Some(prev) => Frame::Diff {
                    changes: Self::diff(prev, &grid),
                },
            };
            frames.push(frame);
            prev_grid = Some(grid);
        }

        PlayablePresentation {
            contract,
            frames,
            markers,
        }
    }

    /// Rasterize a resolved scene onto a fixed-size cell grid.
    ///
    /// Draw operations are sorted by z-order so that higher z values
    /// paint over lower ones.
    pub fn rasterize(scene: &ResolvedScene, contract: &TerminalContract) -> Vec<Vec<Cell>> {
        let w = contract.width as usize;
        let h = contract.height as usize;
        let mut grid = vec![vec![Cell::default(); w]; h];

        let mut ops: Vec<_> = scene.ops.iter().collect();
        ops.sort_by_key(|op| op.z_order);

        for op in ops {
            let x = op.x as usize;
            let y = op.y as usize;
            if x < w && y < h {
                grid[y][x] = Cell {
                    ch: op.ch,
                    style: op.style.clone(),
                };
            }
        }

        grid
    }

    /// Compute a cell-level diff between two grids.
    pub fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: next_cell.clone(),
                    });
                }
            }
        }
        changes
    }
}
