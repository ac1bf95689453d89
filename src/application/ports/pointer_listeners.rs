use crate::domain::items::item::ItemId;

/// Global pointer-move/up subscription of the host, held only while dragging.
pub trait PointerListeners: Send + Sync {
    fn attach(&self, item: ItemId);
    fn detach(&self, item: ItemId);
}
