use crate::domain::items::item::{ItemId, ItemType};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Interactive node found under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Card { id: ItemId, item_type: ItemType },
    /// `None` is the "Home" entry.
    Breadcrumb { id: Option<ItemId> },
}

/// Host hit-test. Returns every tagged node under `point`, topmost first.
pub trait SpatialQuery: Send + Sync {
    fn targets_at(&self, point: Point) -> Vec<HitTarget>;
}
