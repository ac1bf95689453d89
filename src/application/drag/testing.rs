use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{DragConfig, DragContext};
use crate::application::ports::pointer_listeners::PointerListeners;
use crate::application::ports::press_timer::{PressTimer, TimerFire, TimerHandle};
use crate::application::ports::spatial_query::{HitTarget, Point, SpatialQuery};
use crate::domain::items::item::ItemId;

#[derive(Default)]
pub struct ManualTimer {
    scheduled: Mutex<Vec<(TimerFire, Arc<AtomicBool>)>>,
}

impl ManualTimer {
    pub fn last_press(&self, item: ItemId) -> u64 {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(f, _)| f.item == item)
            .map(|(f, _)| f.press)
            .expect("no timer scheduled for item")
    }

    /// Scheduled timers that were neither cancelled nor dropped.
    pub fn live(&self) -> usize {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, cancelled)| !cancelled.load(Ordering::SeqCst))
            .count()
    }
}

impl PressTimer for ManualTimer {
    fn schedule(&self, fire: TimerFire, _after: Duration) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.scheduled
            .lock()
            .unwrap()
            .push((fire, cancelled.clone()));
        TimerHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct StubSpatial {
    targets: Mutex<Vec<HitTarget>>,
}

impl StubSpatial {
    pub fn set(&self, targets: Vec<HitTarget>) {
        *self.targets.lock().unwrap() = targets;
    }
}

impl SpatialQuery for StubSpatial {
    fn targets_at(&self, _point: Point) -> Vec<HitTarget> {
        self.targets.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct CountingListeners {
    active: AtomicI64,
}

impl CountingListeners {
    pub fn attached(&self) -> i64 {
        self.active.load(Ordering::SeqCst)
    }
}

impl PointerListeners for CountingListeners {
    fn attach(&self, _item: ItemId) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn detach(&self, _item: ItemId) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub ctx: Arc<DragContext>,
    pub timer: Arc<ManualTimer>,
    pub spatial: Arc<StubSpatial>,
    pub listeners: Arc<CountingListeners>,
}

impl Harness {
    pub fn new() -> Self {
        let timer = Arc::new(ManualTimer::default());
        let spatial = Arc::new(StubSpatial::default());
        let listeners = Arc::new(CountingListeners::default());
        let ctx = DragContext::new(
            DragConfig::default(),
            spatial.clone(),
            listeners.clone(),
            timer.clone(),
        );
        Self {
            ctx,
            timer,
            spatial,
            listeners,
        }
    }
}
