//! Pointer interaction state machine of a single item card.
//!
//! ```text
//! Idle -> PressPending -> Idle                 (release: select / movement: abort)
//!                      -> Dragging -> Committing -> Idle
//!                                  -> Idle      (release over nothing: return to origin)
//!                                  -> Selected  (long press without movement)
//! ```
//!
//! The controller is synchronous and owns no I/O: timers, hit-testing and
//! listener registration go through the host ports held by [`DragContext`].

pub mod lease;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

pub use lease::{DragConfig, DragContext, DragLease};

use crate::application::access::AccessScope;
use crate::application::ports::press_timer::{TimerFire, TimerHandle, TimerKind};
use crate::application::ports::spatial_query::{HitTarget, Point};
use crate::domain::items::item::{Item, ItemAction, ItemId, ItemType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    PressPending,
    Dragging,
    Selected,
    Committing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverVia {
    Card,
    Breadcrumb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverTarget {
    pub id: ItemId,
    pub via: HoverVia,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Input not relevant in the current phase.
    Ignored,
    PressStarted,
    /// Movement during the press window: scroll or click-through.
    Aborted,
    Select(ItemAction),
    DragStarted { position: Point },
    Moved {
        position: Point,
        hover: Option<HoverTarget>,
    },
    ShowOverlay,
    Commit { item: ItemId, target: ItemId },
    ReturnToOrigin,
    Committed,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    seq: u64,
    start: Point,
    /// Pointer position minus item origin at press time.
    offset: Point,
}

#[derive(Debug)]
enum State {
    Idle,
    PressPending {
        press: Press,
        drag_timer: TimerHandle,
        long_timer: TimerHandle,
    },
    Dragging {
        press: Press,
        lease: DragLease,
        long_timer: Option<TimerHandle>,
        position: Point,
        hover: Option<HoverTarget>,
    },
    Selected,
    Committing {
        target: ItemId,
    },
}

#[derive(Debug)]
pub struct DragController {
    item: Item,
    ctx: Arc<DragContext>,
    state: State,
    presses: u64,
}

impl DragController {
    /// `None` for token-scoped views: restricted mode never gets a machine.
    pub fn attach(item: Item, scope: &AccessScope, ctx: Arc<DragContext>) -> Option<Self> {
        if !scope.allows_drag() {
            return None;
        }
        Some(Self {
            item,
            ctx,
            state: State::Idle,
            presses: 0,
        })
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Replaces card data after a refetch. The interaction state is kept.
    pub fn set_item(&mut self, item: Item) {
        debug_assert_eq!(item.id, self.item.id);
        self.item = item;
    }

    pub fn phase(&self) -> DragPhase {
        match self.state {
            State::Idle => DragPhase::Idle,
            State::PressPending { .. } => DragPhase::PressPending,
            State::Dragging { .. } => DragPhase::Dragging,
            State::Selected => DragPhase::Selected,
            State::Committing { .. } => DragPhase::Committing,
        }
    }

    pub fn hover(&self) -> Option<HoverTarget> {
        match self.state {
            State::Dragging { hover, .. } => hover,
            _ => None,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match self.state {
            State::Dragging { position, .. } => Some(position),
            _ => None,
        }
    }

    pub fn pending_target(&self) -> Option<ItemId> {
        match self.state {
            State::Committing { target } => Some(target),
            _ => None,
        }
    }

    pub fn pointer_down(&mut self, pointer: Point, item_origin: Point) -> DragOutcome {
        match self.state {
            State::Idle => {}
            State::Committing { target } => {
                tracing::debug!(item_id = self.item.id, target, "press_ignored_commit_in_flight");
                return DragOutcome::Ignored;
            }
            _ => return DragOutcome::Ignored,
        }
        self.presses += 1;
        let press = Press {
            seq: self.presses,
            start: pointer,
            offset: pointer.offset_from(item_origin),
        };
        let cfg = self.ctx.config;
        let drag_timer = self.schedule(TimerKind::Drag, press.seq, cfg.press_delay);
        let long_timer = self.schedule(TimerKind::LongPress, press.seq, cfg.long_press);
        self.state = State::PressPending {
            press,
            drag_timer,
            long_timer,
        };
        DragOutcome::PressStarted
    }

    pub fn pointer_move(&mut self, pointer: Point) -> DragOutcome {
        let threshold = self.ctx.config.move_threshold;
        match &mut self.state {
            State::PressPending { press, .. } => {
                if pointer.distance(press.start) <= threshold {
                    return DragOutcome::Ignored;
                }
            }
            State::Dragging {
                press,
                long_timer,
                position,
                hover,
                ..
            } => {
                if long_timer.is_some() && pointer.distance(press.start) > threshold {
                    *long_timer = None;
                }
                *position = pointer.offset_from(press.offset);
                *hover = resolve_hover(&self.ctx, self.item.id, pointer);
                return DragOutcome::Moved {
                    position: *position,
                    hover: *hover,
                };
            }
            State::Idle | State::Selected | State::Committing { .. } => {
                return DragOutcome::Ignored;
            }
        }
        // Decisive movement before the press timer: drop both timers.
        self.state = State::Idle;
        tracing::debug!(item_id = self.item.id, "press_aborted_by_movement");
        DragOutcome::Aborted
    }

    pub fn pointer_up(&mut self, _pointer: Point) -> DragOutcome {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::PressPending { .. } => DragOutcome::Select(self.item.primary_action()),
            State::Dragging {
                hover: Some(target),
                ..
            } => {
                self.state = State::Committing { target: target.id };
                tracing::info!(item_id = self.item.id, target = target.id, "drag_commit");
                DragOutcome::Commit {
                    item: self.item.id,
                    target: target.id,
                }
            }
            State::Dragging { hover: None, .. } => DragOutcome::ReturnToOrigin,
            other => {
                self.state = other;
                DragOutcome::Ignored
            }
        }
    }

    pub fn timer_fired(&mut self, kind: TimerKind, press_seq: u64) -> DragOutcome {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::PressPending {
                press,
                drag_timer,
                long_timer,
            } if press.seq == press_seq => match kind {
                TimerKind::Drag => {
                    drop(drag_timer);
                    let Some(lease) = DragLease::acquire(&self.ctx, self.item.id) else {
                        tracing::debug!(
                            item_id = self.item.id,
                            dragging = ?self.ctx.dragging(),
                            "drag_slot_taken"
                        );
                        return DragOutcome::Aborted;
                    };
                    let position = press.start.offset_from(press.offset);
                    self.state = State::Dragging {
                        press,
                        lease,
                        long_timer: Some(long_timer),
                        position,
                        hover: None,
                    };
                    DragOutcome::DragStarted { position }
                }
                TimerKind::LongPress => {
                    self.state = State::Selected;
                    DragOutcome::ShowOverlay
                }
            },
            State::Dragging {
                press,
                long_timer: Some(_),
                ..
            } if press.seq == press_seq && kind == TimerKind::LongPress => {
                self.state = State::Selected;
                DragOutcome::ShowOverlay
            }
            other => {
                self.state = other;
                DragOutcome::Ignored
            }
        }
    }

    pub fn commit_resolved(&mut self, ok: bool) -> DragOutcome {
        match self.state {
            State::Committing { .. } => {
                self.state = State::Idle;
                if ok {
                    DragOutcome::Committed
                } else {
                    DragOutcome::ReturnToOrigin
                }
            }
            _ => DragOutcome::Ignored,
        }
    }

    pub fn dismiss_overlay(&mut self) -> DragOutcome {
        if matches!(self.state, State::Selected) {
            self.state = State::Idle;
        }
        DragOutcome::Ignored
    }

    /// Drops any pending timers and releases the drag lease.
    pub fn teardown(&mut self) {
        self.state = State::Idle;
    }

    fn schedule(&self, kind: TimerKind, press: u64, after: std::time::Duration) -> TimerHandle {
        self.ctx.timer.schedule(
            TimerFire {
                item: self.item.id,
                kind,
                press,
            },
            after,
        )
    }
}

/// Topmost card other than the dragged one wins; a breadcrumb entry is the
/// fallback. Leaves and the "Home" entry never become a hover target.
fn resolve_hover(ctx: &DragContext, dragged: ItemId, pointer: Point) -> Option<HoverTarget> {
    let targets = ctx.spatial.targets_at(pointer);
    let card = targets.iter().find_map(|t| match *t {
        HitTarget::Card { id, item_type } if id != dragged => Some((id, item_type)),
        _ => None,
    });
    if let Some((id, item_type)) = card {
        return (item_type == ItemType::Group).then_some(HoverTarget {
            id,
            via: HoverVia::Card,
        });
    }
    targets
        .iter()
        .find_map(|t| match *t {
            HitTarget::Breadcrumb { id } => Some(id),
            HitTarget::Card { .. } => None,
        })
        .flatten()
        .filter(|id| *id != dragged && ctx.is_drop_ancestor(*id))
        .map(|id| HoverTarget {
            id,
            via: HoverVia::Breadcrumb,
        })
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn link(id: ItemId) -> Item {
        serde_json::from_value(serde_json::json!({
            "id": id, "name": "Docs", "type": "link", "text": "https://example.com"
        }))
        .unwrap()
    }

    fn group(id: ItemId) -> Item {
        serde_json::from_value(serde_json::json!({"id": id, "name": "Work", "type": "group"}))
            .unwrap()
    }

    fn controller(h: &Harness, item: Item) -> DragController {
        DragController::attach(item, &AccessScope::full(), h.ctx.clone()).unwrap()
    }

    fn start_drag(h: &Harness, c: &mut DragController) {
        c.pointer_down(Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        let seq = h.timer.last_press(c.item().id);
        assert!(matches!(
            c.timer_fired(TimerKind::Drag, seq),
            DragOutcome::DragStarted { .. }
        ));
    }

    #[test]
    fn release_before_timer_selects() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        assert_eq!(
            c.pointer_down(Point::new(10.0, 10.0), Point::new(0.0, 0.0)),
            DragOutcome::PressStarted
        );
        assert_eq!(
            c.pointer_up(Point::new(10.0, 10.0)),
            DragOutcome::Select(ItemAction::OpenLink("https://example.com".into()))
        );
        assert_eq!(c.phase(), DragPhase::Idle);
        assert_eq!(h.timer.live(), 0);
        assert_eq!(h.listeners.attached(), 0);
    }

    #[test]
    fn group_click_navigates() {
        let h = Harness::new();
        let mut c = controller(&h, group(3));
        c.pointer_down(Point::new(1.0, 1.0), Point::new(0.0, 0.0));
        assert_eq!(
            c.pointer_up(Point::new(1.0, 1.0)),
            DragOutcome::Select(ItemAction::OpenGroup(3))
        );
    }

    #[test]
    fn movement_in_press_window_aborts_without_select() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        c.pointer_down(Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        assert_eq!(c.pointer_move(Point::new(11.0, 11.0)), DragOutcome::Ignored);
        assert_eq!(c.pointer_move(Point::new(10.0, 40.0)), DragOutcome::Aborted);
        assert_eq!(h.timer.live(), 0);
        assert_eq!(c.pointer_up(Point::new(10.0, 40.0)), DragOutcome::Ignored);
        let seq = h.timer.last_press(7);
        assert_eq!(c.timer_fired(TimerKind::Drag, seq), DragOutcome::Ignored);
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn drop_on_group_commits() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        start_drag(&h, &mut c);
        assert_eq!(h.listeners.attached(), 1);
        assert_eq!(h.ctx.dragging(), Some(7));

        h.spatial.set(vec![
            HitTarget::Card {
                id: 7,
                item_type: ItemType::Link,
            },
            HitTarget::Card {
                id: 3,
                item_type: ItemType::Group,
            },
        ]);
        let moved = c.pointer_move(Point::new(110.0, 60.0));
        assert_eq!(
            moved,
            DragOutcome::Moved {
                position: Point::new(100.0, 50.0),
                hover: Some(HoverTarget {
                    id: 3,
                    via: HoverVia::Card
                }),
            }
        );
        assert_eq!(
            c.pointer_up(Point::new(110.0, 60.0)),
            DragOutcome::Commit { item: 7, target: 3 }
        );
        assert_eq!(c.phase(), DragPhase::Committing);
        assert_eq!(h.listeners.attached(), 0);
        assert_eq!(h.ctx.dragging(), None);
        assert_eq!(c.commit_resolved(true), DragOutcome::Committed);
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn leaf_card_never_becomes_hover() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        start_drag(&h, &mut c);
        h.spatial.set(vec![HitTarget::Card {
            id: 3,
            item_type: ItemType::Group,
        }]);
        c.pointer_move(Point::new(50.0, 50.0));
        assert!(c.hover().is_some());

        // Moving onto a leaf clears the previous target.
        h.spatial.set(vec![HitTarget::Card {
            id: 8,
            item_type: ItemType::Password,
        }]);
        c.pointer_move(Point::new(80.0, 50.0));
        assert_eq!(c.hover(), None);
        assert_eq!(
            c.pointer_up(Point::new(80.0, 50.0)),
            DragOutcome::ReturnToOrigin
        );
        assert_eq!(c.phase(), DragPhase::Idle);
        assert_eq!(h.listeners.attached(), 0);
    }

    #[test]
    fn breadcrumb_ancestor_is_a_target_but_home_is_not() {
        let h = Harness::new();
        h.ctx.set_drop_ancestors(vec![1]);
        let mut c = controller(&h, link(7));
        start_drag(&h, &mut c);

        h.spatial.set(vec![HitTarget::Breadcrumb { id: None }]);
        c.pointer_move(Point::new(5.0, 5.0));
        assert_eq!(c.hover(), None);

        h.spatial.set(vec![HitTarget::Breadcrumb { id: Some(1) }]);
        c.pointer_move(Point::new(20.0, 5.0));
        assert_eq!(
            c.hover(),
            Some(HoverTarget {
                id: 1,
                via: HoverVia::Breadcrumb
            })
        );

        // Current container entry is not a listed drop ancestor.
        h.spatial.set(vec![HitTarget::Breadcrumb { id: Some(12) }]);
        c.pointer_move(Point::new(40.0, 5.0));
        assert_eq!(c.hover(), None);
    }

    #[test]
    fn long_press_without_movement_opens_overlay() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        start_drag(&h, &mut c);
        let seq = h.timer.last_press(7);
        assert_eq!(
            c.timer_fired(TimerKind::LongPress, seq),
            DragOutcome::ShowOverlay
        );
        assert_eq!(c.phase(), DragPhase::Selected);
        assert_eq!(h.listeners.attached(), 0);
        assert_eq!(c.pointer_down(Point::default(), Point::default()), DragOutcome::Ignored);
        c.dismiss_overlay();
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn movement_cancels_long_press() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        start_drag(&h, &mut c);
        c.pointer_move(Point::new(60.0, 60.0));
        let seq = h.timer.last_press(7);
        assert_eq!(c.timer_fired(TimerKind::LongPress, seq), DragOutcome::Ignored);
        assert_eq!(c.phase(), DragPhase::Dragging);
        assert_eq!(h.timer.live(), 0);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        c.pointer_down(Point::new(1.0, 1.0), Point::default());
        let first = h.timer.last_press(7);
        c.pointer_up(Point::new(1.0, 1.0));
        c.pointer_down(Point::new(1.0, 1.0), Point::default());
        assert_eq!(c.timer_fired(TimerKind::Drag, first), DragOutcome::Ignored);
        assert_eq!(c.phase(), DragPhase::PressPending);
    }

    #[test]
    fn restricted_scope_never_attaches() {
        let h = Harness::new();
        let scope = AccessScope::restricted(5, "T".into());
        assert!(DragController::attach(link(7), &scope, h.ctx.clone()).is_none());
    }

    #[test]
    fn press_is_blocked_while_commit_in_flight() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        start_drag(&h, &mut c);
        h.spatial.set(vec![HitTarget::Card {
            id: 3,
            item_type: ItemType::Group,
        }]);
        c.pointer_move(Point::new(50.0, 50.0));
        c.pointer_up(Point::new(50.0, 50.0));

        assert_eq!(
            c.pointer_down(Point::new(1.0, 1.0), Point::default()),
            DragOutcome::Ignored
        );
        assert_eq!(c.pending_target(), Some(3));
        assert_eq!(c.commit_resolved(false), DragOutcome::ReturnToOrigin);
        assert_eq!(
            c.pointer_down(Point::new(1.0, 1.0), Point::default()),
            DragOutcome::PressStarted
        );
    }

    #[test]
    fn dropping_a_dragging_controller_detaches_listeners() {
        let h = Harness::new();
        let mut c = controller(&h, link(7));
        start_drag(&h, &mut c);
        assert_eq!(h.listeners.attached(), 1);
        drop(c);
        assert_eq!(h.listeners.attached(), 0);
        assert_eq!(h.ctx.dragging(), None);
    }

    #[test]
    fn only_one_item_drags_at_a_time() {
        let h = Harness::new();
        let mut a = controller(&h, link(7));
        let mut b = controller(&h, link(8));
        start_drag(&h, &mut a);
        b.pointer_down(Point::new(1.0, 1.0), Point::default());
        let seq = h.timer.last_press(8);
        assert_eq!(b.timer_fired(TimerKind::Drag, seq), DragOutcome::Aborted);
        assert_eq!(b.phase(), DragPhase::Idle);
        assert_eq!(h.ctx.dragging(), Some(7));
    }
}
