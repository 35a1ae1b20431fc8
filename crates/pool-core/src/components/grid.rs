//! Grid Components
//!
//! Agent position and the bounded (optionally toroidal) multi-occupancy grid.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::agent::AgentId;

/// Component: an agent's current cell
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Resource: grid dimensions plus an index of which agents occupy each cell
#[derive(Resource, Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    toroidal: bool,
    /// Occupants per cell, in id order
    occupancy: BTreeMap<Cell, Vec<AgentId>>,
}

impl Grid {
    pub fn new(width: u32, height: u32, toroidal: bool) -> Self {
        Self {
            width,
            height,
            toroidal,
            occupancy: BTreeMap::new(),
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// Moore neighbourhood of `cell`, excluding the cell itself.
    ///
    /// Bounded grids drop off-grid cells; toroidal grids wrap and drop the
    /// duplicates that wrapping produces on narrow grids. Only a 1x1 grid
    /// yields an empty neighbourhood.
    pub fn neighborhood(&self, cell: Cell) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(8);
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let Some(candidate) = self.offset(cell, dx, dy) else {
                    continue;
                };
                if candidate != cell && !cells.contains(&candidate) {
                    cells.push(candidate);
                }
            }
        }
        cells
    }

    fn offset(&self, cell: Cell, dx: i64, dy: i64) -> Option<Cell> {
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        let (mut x, mut y) = (i64::from(cell.x) + dx, i64::from(cell.y) + dy);
        if self.toroidal {
            x = x.rem_euclid(w);
            y = y.rem_euclid(h);
        } else if x < 0 || y < 0 || x >= w || y >= h {
            return None;
        }
        Some(Cell::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?))
    }

    /// Agents in `cell`, in id order
    pub fn occupants(&self, cell: Cell) -> &[AgentId] {
        self.occupancy
            .get(&cell)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Clear the occupancy index (called before rebuilding)
    pub fn clear(&mut self) {
        self.occupancy.clear();
    }

    /// Add an agent to a cell; callers insert in id order
    pub fn place(&mut self, cell: Cell, agent: AgentId) {
        self.occupancy.entry(cell).or_default().push(agent);
    }

    /// Number of cells holding at least two agents
    pub fn crowded_cells(&self) -> usize {
        self.occupancy.values().filter(|v| v.len() > 1).count()
    }
}
