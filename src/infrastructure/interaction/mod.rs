use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::application::hierarchy::{HierarchyModel, NavTarget};
use crate::application::ports::pointer_listeners::PointerListeners;
use crate::application::ports::press_timer::{PressTimer, TimerFire, TimerHandle};
use crate::application::ports::spatial_query::{HitTarget, Point, SpatialQuery};
use crate::application::services::vault_view::InteractionEvent;
use crate::domain::items::item::{ItemId, ItemType};

/// Sleeps on the runtime and posts the fire back into the view's event queue.
/// Dropping the returned handle aborts the sleeping task.
pub struct TokioPressTimer {
    events: mpsc::UnboundedSender<InteractionEvent>,
    runtime: Handle,
}

impl TokioPressTimer {
    pub fn new(events: mpsc::UnboundedSender<InteractionEvent>) -> anyhow::Result<Self> {
        Ok(Self {
            events,
            runtime: Handle::try_current()?,
        })
    }
}

impl PressTimer for TokioPressTimer {
    fn schedule(&self, fire: TimerFire, after: Duration) -> TimerHandle {
        let events = self.events.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if events.send(InteractionEvent::Timer(fire)).is_err() {
                tracing::debug!(item_id = fire.item, "view_closed_before_timer_fired");
            }
        });
        TimerHandle::new(move || task.abort())
    }
}

/// Headless hosts have nothing to register; attach/detach are only traced.
#[derive(Debug, Default)]
pub struct TracingListeners;

impl PointerListeners for TracingListeners {
    fn attach(&self, item: ItemId) {
        tracing::trace!(item_id = item, "pointer_listeners_attached");
    }

    fn detach(&self, item: ItemId) {
        tracing::trace!(item_id = item, "pointer_listeners_detached");
    }
}

pub const BAR_HEIGHT: f64 = 40.0;
pub const CRUMB_WIDTH: f64 = 120.0;
pub const CARD_WIDTH: f64 = 160.0;
pub const CARD_HEIGHT: f64 = 120.0;

#[derive(Default)]
struct Layout {
    crumbs: Vec<Option<ItemId>>,
    cards: Vec<(ItemId, ItemType)>,
}

/// Fixed geometry for headless drags: a breadcrumb bar on top, cards below
/// in a grid of `columns`.
pub struct GridLayout {
    columns: usize,
    layout: Mutex<Layout>,
}

impl GridLayout {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            layout: Mutex::new(Layout::default()),
        }
    }

    pub fn arrange(&self, model: &HierarchyModel) {
        let mut layout = self.layout.lock().unwrap_or_else(|e| e.into_inner());
        layout.crumbs = model
            .breadcrumb()
            .into_iter()
            .map(|c| match c.target {
                NavTarget::Home => None,
                NavTarget::Node(id) => Some(id),
            })
            .collect();
        layout.cards = model
            .items()
            .iter()
            .map(|i| (i.id, i.item_type()))
            .collect();
    }

    pub fn card_center(&self, id: ItemId) -> Option<Point> {
        let layout = self.layout.lock().unwrap_or_else(|e| e.into_inner());
        let idx = layout.cards.iter().position(|(c, _)| *c == id)?;
        let (col, row) = (idx % self.columns, idx / self.columns);
        Some(Point::new(
            col as f64 * CARD_WIDTH + CARD_WIDTH / 2.0,
            BAR_HEIGHT + row as f64 * CARD_HEIGHT + CARD_HEIGHT / 2.0,
        ))
    }

    pub fn card_origin(&self, id: ItemId) -> Option<Point> {
        self.card_center(id)
            .map(|c| Point::new(c.x - CARD_WIDTH / 2.0, c.y - CARD_HEIGHT / 2.0))
    }

    pub fn crumb_center(&self, id: ItemId) -> Option<Point> {
        let layout = self.layout.lock().unwrap_or_else(|e| e.into_inner());
        let idx = layout.crumbs.iter().position(|c| *c == Some(id))?;
        Some(Point::new(
            idx as f64 * CRUMB_WIDTH + CRUMB_WIDTH / 2.0,
            BAR_HEIGHT / 2.0,
        ))
    }
}

impl SpatialQuery for GridLayout {
    fn targets_at(&self, point: Point) -> Vec<HitTarget> {
        if point.x < 0.0 || point.y < 0.0 {
            return Vec::new();
        }
        let layout = self.layout.lock().unwrap_or_else(|e| e.into_inner());
        if point.y < BAR_HEIGHT {
            let idx = (point.x / CRUMB_WIDTH) as usize;
            return layout
                .crumbs
                .get(idx)
                .map(|id| HitTarget::Breadcrumb { id: *id })
                .into_iter()
                .collect();
        }
        let col = (point.x / CARD_WIDTH) as usize;
        let row = ((point.y - BAR_HEIGHT) / CARD_HEIGHT) as usize;
        if col >= self.columns {
            return Vec::new();
        }
        layout
            .cards
            .get(row * self.columns + col)
            .map(|(id, item_type)| HitTarget::Card {
                id: *id,
                item_type: *item_type,
            })
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::access::AccessScope;
    use crate::application::ports::press_timer::TimerKind;
    use crate::domain::items::item::{Ancestor, Item, ItemParent};

    fn item(id: ItemId, ty: &str) -> Item {
        let mut v = serde_json::json!({"id": id, "name": "x", "type": ty});
        if ty != "group" {
            v["text"] = serde_json::json!("");
        }
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn grid_hit_tests_cards_and_breadcrumbs() {
        let grid = GridLayout::new(2);
        let model = HierarchyModel::new(
            AccessScope::full(),
            Some(9),
            vec![item(1, "link"), item(2, "group"), item(3, "copy")],
            Some(ItemParent {
                id: 9,
                name: "Here".into(),
                parents: vec![Ancestor {
                    id: 4,
                    name: "Top".into(),
                }],
            }),
        );
        grid.arrange(&model);

        let third = grid.card_center(3).unwrap();
        assert_eq!(
            grid.targets_at(third),
            vec![HitTarget::Card {
                id: 3,
                item_type: ItemType::Copy
            }]
        );
        assert_eq!(
            grid.targets_at(grid.crumb_center(4).unwrap()),
            vec![HitTarget::Breadcrumb { id: Some(4) }]
        );
        assert_eq!(
            grid.targets_at(Point::new(10.0, 10.0)),
            vec![HitTarget::Breadcrumb { id: None }]
        );
        assert!(grid.targets_at(Point::new(2000.0, 60.0)).is_empty());
    }

    #[tokio::test]
    async fn dropped_handle_aborts_the_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = TokioPressTimer::new(tx).unwrap();
        let fire = TimerFire {
            item: 1,
            kind: TimerKind::Drag,
            press: 1,
        };
        drop(timer.schedule(fire, Duration::from_millis(5)));
        let kept = timer.schedule(
            TimerFire {
                press: 2,
                ..fire
            },
            Duration::from_millis(10),
        );
        match rx.recv().await {
            Some(InteractionEvent::Timer(got)) => assert_eq!(got.press, 2),
            other => panic!("unexpected event {other:?}"),
        }
        drop(kept);
    }
}
