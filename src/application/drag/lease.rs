use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::application::ports::pointer_listeners::PointerListeners;
use crate::application::ports::press_timer::PressTimer;
use crate::application::ports::spatial_query::SpatialQuery;
use crate::domain::items::item::ItemId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    pub press_delay: Duration,
    pub long_press: Duration,
    /// Pointer travel (px) that counts as deliberate movement.
    pub move_threshold: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            press_delay: Duration::from_millis(200),
            long_press: Duration::from_millis(500),
            move_threshold: 4.0,
        }
    }
}

/// Host collaborators shared by every card of one view.
pub struct DragContext {
    pub config: DragConfig,
    pub spatial: Arc<dyn SpatialQuery>,
    pub listeners: Arc<dyn PointerListeners>,
    pub timer: Arc<dyn PressTimer>,
    dragging: Mutex<Option<ItemId>>,
    drop_ancestors: Mutex<Vec<ItemId>>,
}

impl DragContext {
    pub fn new(
        config: DragConfig,
        spatial: Arc<dyn SpatialQuery>,
        listeners: Arc<dyn PointerListeners>,
        timer: Arc<dyn PressTimer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            spatial,
            listeners,
            timer,
            dragging: Mutex::new(None),
            drop_ancestors: Mutex::new(Vec::new()),
        })
    }

    /// Item currently following the pointer, if any.
    pub fn dragging(&self) -> Option<ItemId> {
        *lock(&self.dragging)
    }

    pub fn set_drop_ancestors(&self, ids: Vec<ItemId>) {
        *lock(&self.drop_ancestors) = ids;
    }

    pub fn is_drop_ancestor(&self, id: ItemId) -> bool {
        lock(&self.drop_ancestors).contains(&id)
    }
}

// State behind these locks is plain data, a poisoned guard is still consistent.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Held for the whole `Dragging` phase: claims the global dragging slot and
/// keeps the host's move/up listeners attached. Dropping it undoes both.
#[derive(Debug)]
pub struct DragLease {
    ctx: Arc<DragContext>,
    item: ItemId,
}

impl DragLease {
    pub fn acquire(ctx: &Arc<DragContext>, item: ItemId) -> Option<Self> {
        {
            let mut slot = lock(&ctx.dragging);
            match *slot {
                Some(other) if other != item => return None,
                _ => *slot = Some(item),
            }
        }
        ctx.listeners.attach(item);
        Some(Self {
            ctx: ctx.clone(),
            item,
        })
    }

    pub fn item(&self) -> ItemId {
        self.item
    }
}

impl Drop for DragLease {
    fn drop(&mut self) {
        self.ctx.listeners.detach(self.item);
        let mut slot = lock(&self.ctx.dragging);
        if *slot == Some(self.item) {
            *slot = None;
        }
    }
}

impl std::fmt::Debug for DragContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragContext")
            .field("config", &self.config)
            .field("dragging", &self.dragging())
            .finish_non_exhaustive()
    }
}
