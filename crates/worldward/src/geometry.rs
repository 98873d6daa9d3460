//! Block coordinates and region shapes.

use serde::{Deserialize, Serialize};

/// An integer block coordinate in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned, inclusive block cuboid. `min` and `max` are normalized on
/// construction so callers may pass any two opposite corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCuboid {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockCuboid {
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    pub fn intersects(&self, other: &BlockCuboid) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// A 2D polygon on the x/z plane extruded over an inclusive y range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonPrism {
    /// Polygon vertices as (x, z) pairs, in order. At least three.
    pub points: Vec<(i32, i32)>,
    pub min_y: i32,
    pub max_y: i32,
}

impl PolygonPrism {
    pub fn new(points: Vec<(i32, i32)>, min_y: i32, max_y: i32) -> Self {
        Self {
            points,
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
        }
    }

    /// Even-odd crossing test on the x/z plane, then the y range.
    pub fn contains(&self, pos: BlockPos) -> bool {
        if self.points.len() < 3 || pos.y < self.min_y || pos.y > self.max_y {
            return false;
        }
        let (px, pz) = (f64::from(pos.x), f64::from(pos.z));
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let (xi, zi) = (f64::from(self.points[i].0), f64::from(self.points[i].1));
            let (xj, zj) = (f64::from(self.points[j].0), f64::from(self.points[j].1));
            if ((zi > pz) != (zj > pz)) && (px < (xj - xi) * (pz - zi) / (zj - zi) + xi) {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn bounds(&self) -> Option<BlockCuboid> {
        let first = *self.points.first()?;
        let mut min = (first.0, first.1);
        let mut max = (first.0, first.1);
        for &(x, z) in &self.points {
            min = (min.0.min(x), min.1.min(z));
            max = (max.0.max(x), max.1.max(z));
        }
        Some(BlockCuboid::new(
            BlockPos::new(min.0, self.min_y, min.1),
            BlockPos::new(max.0, self.max_y, max.1),
        ))
    }
}

/// The immutable spatial shape of a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RegionShape {
    Cuboid(BlockCuboid),
    Polygon(PolygonPrism),
    /// Covers the whole world. Only the per-world global region uses this.
    Global,
}

impl RegionShape {
    pub fn contains(&self, pos: BlockPos) -> bool {
        match self {
            RegionShape::Cuboid(cuboid) => cuboid.contains(pos),
            RegionShape::Polygon(prism) => prism.contains(pos),
            RegionShape::Global => true,
        }
    }

    /// Bounding cuboid, or `None` for unbounded shapes.
    pub fn bounds(&self) -> Option<BlockCuboid> {
        match self {
            RegionShape::Cuboid(cuboid) => Some(*cuboid),
            RegionShape::Polygon(prism) => prism.bounds(),
            RegionShape::Global => None,
        }
    }

    /// Whether the shape can overlap the given volume. Polygon prisms answer
    /// via their bounding box, so this may over-approximate but never misses.
    pub fn intersects_volume(&self, volume: &BlockCuboid) -> bool {
        match self {
            RegionShape::Cuboid(cuboid) => cuboid.intersects(volume),
            RegionShape::Polygon(prism) => prism
                .bounds()
                .map(|bounds| bounds.intersects(volume))
                .unwrap_or(false),
            RegionShape::Global => true,
        }
    }
}
