use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::access::AccessScope;
use crate::application::drag::{DragContext, DragController, DragOutcome};
use crate::application::errors::{MoveError, VaultError};
use crate::application::hierarchy::{HierarchyModel, LoadHierarchy, NavTarget};
use crate::application::ports::items_port::ItemsPort;
use crate::application::ports::notifier::{Notification, Notifier};
use crate::application::ports::press_timer::TimerFire;
use crate::application::ports::spatial_query::Point;
use crate::application::use_cases::items::move_item::{MoveCommitted, MoveItem};
use crate::domain::items::item::{Item, ItemAction, ItemId};

/// Everything the view reacts to. Pointer and timer events come from the
/// host; commit and reload results are posted back by spawned tasks.
#[derive(Debug)]
pub enum InteractionEvent {
    PointerDown {
        item: ItemId,
        pointer: Point,
        origin: Point,
    },
    PointerMove {
        pointer: Point,
    },
    PointerUp {
        pointer: Point,
    },
    Timer(TimerFire),
    CommitResolved {
        item: ItemId,
        target: ItemId,
        result: Result<MoveCommitted, MoveError>,
    },
    Reloaded(Result<HierarchyModel, VaultError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Card { item: ItemId, outcome: DragOutcome },
    Reloaded,
}

/// One displayed container plus the drag machines of its cards.
pub struct VaultView {
    port: Arc<dyn ItemsPort>,
    notifier: Arc<dyn Notifier>,
    drag: Arc<DragContext>,
    events: mpsc::UnboundedSender<InteractionEvent>,
    model: HierarchyModel,
    cards: HashMap<ItemId, DragController>,
    pressed: Option<ItemId>,
}

impl VaultView {
    pub async fn open(
        port: Arc<dyn ItemsPort>,
        notifier: Arc<dyn Notifier>,
        drag: Arc<DragContext>,
        events: mpsc::UnboundedSender<InteractionEvent>,
        scope: AccessScope,
        node: Option<ItemId>,
    ) -> Result<Self, VaultError> {
        let model = load(port.as_ref(), notifier.as_ref(), &scope, node).await?;
        let mut view = Self {
            port,
            notifier,
            drag,
            events,
            model: HierarchyModel::new(scope, node, Vec::new(), None),
            cards: HashMap::new(),
            pressed: None,
        };
        view.apply(model);
        Ok(view)
    }

    pub fn model(&self) -> &HierarchyModel {
        &self.model
    }

    pub fn card(&self, id: ItemId) -> Option<&DragController> {
        self.cards.get(&id)
    }

    pub fn has_drag_machines(&self) -> bool {
        !self.cards.is_empty()
    }

    /// Plain click path; also the only interaction offered in token views.
    pub fn activate(&self, id: ItemId) -> Option<ItemAction> {
        self.model.find(id).map(Item::primary_action)
    }

    pub async fn navigate(&mut self, target: NavTarget) -> Result<(), VaultError> {
        let node = match target {
            NavTarget::Home => None,
            NavTarget::Node(id) => Some(id),
        };
        let scope = self.model.scope().clone();
        let model = load(self.port.as_ref(), self.notifier.as_ref(), &scope, node).await?;
        self.apply(model);
        Ok(())
    }

    pub fn handle(&mut self, event: InteractionEvent) -> Option<ViewUpdate> {
        match event {
            InteractionEvent::PointerDown {
                item,
                pointer,
                origin,
            } => {
                let card = self.cards.get_mut(&item)?;
                let outcome = card.pointer_down(pointer, origin);
                if outcome == DragOutcome::PressStarted {
                    self.pressed = Some(item);
                }
                Some(ViewUpdate::Card { item, outcome })
            }
            InteractionEvent::PointerMove { pointer } => {
                let item = self.pressed?;
                let outcome = self.cards.get_mut(&item)?.pointer_move(pointer);
                if outcome == DragOutcome::Aborted {
                    self.pressed = None;
                }
                Some(ViewUpdate::Card { item, outcome })
            }
            InteractionEvent::PointerUp { pointer } => {
                let item = self.pressed.take()?;
                let outcome = self.cards.get_mut(&item)?.pointer_up(pointer);
                if let DragOutcome::Commit { item, target } = outcome {
                    self.spawn_commit(item, target);
                }
                Some(ViewUpdate::Card { item, outcome })
            }
            InteractionEvent::Timer(fire) => {
                let outcome = self
                    .cards
                    .get_mut(&fire.item)?
                    .timer_fired(fire.kind, fire.press);
                if outcome == DragOutcome::ShowOverlay && self.pressed == Some(fire.item) {
                    self.pressed = None;
                }
                Some(ViewUpdate::Card {
                    item: fire.item,
                    outcome,
                })
            }
            InteractionEvent::CommitResolved {
                item,
                target,
                result,
            } => self.on_commit_resolved(item, target, result),
            InteractionEvent::Reloaded(Ok(model)) => {
                if model.container() != self.model.container() {
                    tracing::debug!(
                        stale = ?model.container(),
                        current = ?self.model.container(),
                        "stale_reload_dropped"
                    );
                    return None;
                }
                self.apply(model);
                Some(ViewUpdate::Reloaded)
            }
            InteractionEvent::Reloaded(Err(e)) => {
                tracing::warn!(error = %e, "view_reload_failed");
                self.notifier
                    .notify(Notification::error("Failed to fetch items"));
                None
            }
        }
    }

    pub fn dismiss_overlay(&mut self, id: ItemId) {
        if let Some(card) = self.cards.get_mut(&id) {
            card.dismiss_overlay();
        }
    }

    fn on_commit_resolved(
        &mut self,
        item: ItemId,
        target: ItemId,
        result: Result<MoveCommitted, MoveError>,
    ) -> Option<ViewUpdate> {
        let outcome = self
            .cards
            .get_mut(&item)
            .map(|card| card.commit_resolved(result.is_ok()))
            .unwrap_or(DragOutcome::Ignored);
        match result {
            Ok(MoveCommitted {
                refreshed: Some(model),
            }) if model.container() == self.model.container() => self.apply(model),
            // The user navigated away while the move was in flight.
            Ok(MoveCommitted { refreshed: Some(_) }) => self.spawn_reload(),
            Ok(MoveCommitted { refreshed: None }) => self.spawn_reload(),
            // Something was deleted meanwhile: re-read the container.
            Err(MoveError::NotFound) => self.spawn_reload(),
            Err(e) => {
                tracing::debug!(error = %e, item_id = item, target, "move_reverted");
            }
        }
        Some(ViewUpdate::Card { item, outcome })
    }

    fn apply(&mut self, model: HierarchyModel) {
        self.drag.set_drop_ancestors(model.drop_ancestors());
        let mut cards = std::mem::take(&mut self.cards);
        let scope = model.scope().clone();
        for item in model.items() {
            let card = match cards.remove(&item.id) {
                Some(mut existing) => {
                    existing.set_item(item.clone());
                    Some(existing)
                }
                None => DragController::attach(item.clone(), &scope, self.drag.clone()),
            };
            if let Some(card) = card {
                self.cards.insert(item.id, card);
            }
        }
        // Remaining controllers belong to items that left the container.
        drop(cards);
        if self.pressed.is_some_and(|id| !self.cards.contains_key(&id)) {
            self.pressed = None;
        }
        self.model = model;
    }

    fn spawn_commit(&self, item: ItemId, target: ItemId) {
        let port = self.port.clone();
        let notifier = self.notifier.clone();
        let current = self.model.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = MoveItem {
                port: port.as_ref(),
                notifier: notifier.as_ref(),
            }
            .execute(&current, item, target)
            .await;
            if events
                .send(InteractionEvent::CommitResolved {
                    item,
                    target,
                    result,
                })
                .is_err()
            {
                tracing::debug!(item_id = item, "view_closed_before_commit_resolved");
            }
        });
    }

    fn spawn_reload(&self) {
        let port = self.port.clone();
        let current = self.model.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = LoadHierarchy {
                port: port.as_ref(),
                scope: current.scope(),
            }
            .load(current.container())
            .await;
            if events.send(InteractionEvent::Reloaded(result)).is_err() {
                tracing::debug!("view_closed_before_reload");
            }
        });
    }
}

async fn load(
    port: &dyn ItemsPort,
    notifier: &dyn Notifier,
    scope: &AccessScope,
    node: Option<ItemId>,
) -> Result<HierarchyModel, VaultError> {
    let res = LoadHierarchy { port, scope }.load(node).await;
    if let Err(e) = &res {
        tracing::warn!(error = %e, container = ?node, "view_load_failed");
        notifier.notify(Notification::error("Failed to fetch items"));
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::drag::DragPhase;
    use crate::application::drag::testing::Harness;
    use crate::application::ports::press_timer::TimerKind;
    use crate::application::ports::spatial_query::HitTarget;
    use crate::application::use_cases::testing::RecordingNotifier;
    use crate::domain::items::item::ItemType;
    use crate::infrastructure::memory::InMemoryVault;

    struct Fixture {
        vault: Arc<InMemoryVault>,
        notifier: Arc<RecordingNotifier>,
        harness: Harness,
        tx: mpsc::UnboundedSender<InteractionEvent>,
        rx: mpsc::UnboundedReceiver<InteractionEvent>,
    }

    impl Fixture {
        fn new(vault: InMemoryVault) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                vault: Arc::new(vault),
                notifier: Arc::new(RecordingNotifier::default()),
                harness: Harness::new(),
                tx,
                rx,
            }
        }

        async fn open(&self, scope: AccessScope, node: Option<ItemId>) -> VaultView {
            VaultView::open(
                self.vault.clone(),
                self.notifier.clone(),
                self.harness.ctx.clone(),
                self.tx.clone(),
                scope,
                node,
            )
            .await
            .unwrap()
        }
    }

    fn pick_up(f: &Fixture, view: &mut VaultView, item: ItemId) {
        view.handle(InteractionEvent::PointerDown {
            item,
            pointer: Point::new(10.0, 10.0),
            origin: Point::new(0.0, 0.0),
        });
        let press = f.harness.timer.last_press(item);
        let update = view.handle(InteractionEvent::Timer(TimerFire {
            item,
            kind: TimerKind::Drag,
            press,
        }));
        assert!(matches!(
            update,
            Some(ViewUpdate::Card {
                outcome: DragOutcome::DragStarted { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn dragging_a_link_onto_a_group_moves_it() {
        let vault = InMemoryVault::new();
        let group = vault.seed_group("Work", None).await;
        let link = vault.seed_link("Docs", "https://example.com", None).await;
        let mut f = Fixture::new(vault);
        let mut view = f.open(AccessScope::full(), None).await;
        assert!(view.card(link).is_some());

        pick_up(&f, &mut view, link);
        f.harness.spatial.set(vec![HitTarget::Card {
            id: group,
            item_type: ItemType::Group,
        }]);
        view.handle(InteractionEvent::PointerMove {
            pointer: Point::new(200.0, 40.0),
        });
        let up = view.handle(InteractionEvent::PointerUp {
            pointer: Point::new(200.0, 40.0),
        });
        assert_eq!(
            up,
            Some(ViewUpdate::Card {
                item: link,
                outcome: DragOutcome::Commit {
                    item: link,
                    target: group
                }
            })
        );
        assert_eq!(view.card(link).unwrap().phase(), DragPhase::Committing);
        // Pointer tracking keeps working while the commit is in flight.
        assert!(view
            .handle(InteractionEvent::PointerMove {
                pointer: Point::new(1.0, 1.0)
            })
            .is_none());

        let resolved = f.rx.recv().await.unwrap();
        view.handle(resolved);
        assert!(!view.model().contains(link));
        assert!(view.card(link).is_none());
        assert_eq!(f.harness.listeners.attached(), 0);

        view.navigate(NavTarget::Node(group)).await.unwrap();
        assert!(view.model().contains(link));
    }

    #[tokio::test]
    async fn restricted_view_has_no_drag_machine() {
        let vault = InMemoryVault::new();
        let shared = vault.seed_group("Shared", None).await;
        let link = vault.seed_link("Docs", "https://example.com", Some(shared)).await;
        vault.seed_group("Inner", Some(shared)).await;
        let token = vault.issue_token(shared).await;
        let f = Fixture::new(vault);
        let mut view = f.open(AccessScope::restricted(shared, token), Some(shared)).await;

        assert!(!view.has_drag_machines());
        let down = view.handle(InteractionEvent::PointerDown {
            item: link,
            pointer: Point::new(10.0, 10.0),
            origin: Point::default(),
        });
        assert!(down.is_none());
        assert!(view
            .handle(InteractionEvent::PointerUp {
                pointer: Point::new(10.0, 10.0)
            })
            .is_none());
        assert_eq!(
            view.activate(link),
            Some(ItemAction::OpenLink("https://example.com".into()))
        );
        assert_eq!(f.harness.timer.live(), 0);
        assert_eq!(f.vault.move_calls(), 0);
        assert!(view
            .model()
            .breadcrumb()
            .iter()
            .all(|c| c.target != NavTarget::Home));
    }

    #[tokio::test]
    async fn failed_commit_returns_item_and_reloads() {
        let vault = InMemoryVault::new();
        let group = vault.seed_group("Work", None).await;
        let link = vault.seed_link("Docs", "https://example.com", None).await;
        let mut f = Fixture::new(vault);
        let mut view = f.open(AccessScope::full(), None).await;

        pick_up(&f, &mut view, link);
        f.harness.spatial.set(vec![HitTarget::Card {
            id: group,
            item_type: ItemType::Group,
        }]);
        view.handle(InteractionEvent::PointerMove {
            pointer: Point::new(200.0, 40.0),
        });
        // Target disappears before the commit reaches the server.
        f.vault.remove(group).await;
        view.handle(InteractionEvent::PointerUp {
            pointer: Point::new(200.0, 40.0),
        });

        let resolved = f.rx.recv().await.unwrap();
        assert_eq!(
            view.handle(resolved),
            Some(ViewUpdate::Card {
                item: link,
                outcome: DragOutcome::ReturnToOrigin
            })
        );
        assert_eq!(view.card(link).unwrap().phase(), DragPhase::Idle);
        assert_eq!(f.notifier.errors(), 1);

        let reloaded = f.rx.recv().await.unwrap();
        assert_eq!(view.handle(reloaded), Some(ViewUpdate::Reloaded));
        assert!(!view.model().contains(group));
        assert!(view.model().contains(link));
    }

    #[tokio::test]
    async fn release_without_drag_selects_group_navigation() {
        let vault = InMemoryVault::new();
        let group = vault.seed_group("Work", None).await;
        let f = Fixture::new(vault);
        let mut view = f.open(AccessScope::full(), None).await;
        view.handle(InteractionEvent::PointerDown {
            item: group,
            pointer: Point::new(3.0, 3.0),
            origin: Point::default(),
        });
        let up = view.handle(InteractionEvent::PointerUp {
            pointer: Point::new(3.0, 3.0),
        });
        assert_eq!(
            up,
            Some(ViewUpdate::Card {
                item: group,
                outcome: DragOutcome::Select(ItemAction::OpenGroup(group))
            })
        );
        assert_eq!(f.vault.move_calls(), 0);
    }

    #[tokio::test]
    async fn navigating_during_commit_keeps_the_new_container() {
        let vault = InMemoryVault::new();
        let group = vault.seed_group("Work", None).await;
        let other = vault.seed_group("Other", None).await;
        vault.seed_copy("Note", "x", Some(other)).await;
        let link = vault.seed_link("Docs", "https://example.com", None).await;
        let mut f = Fixture::new(vault);
        let mut view = f.open(AccessScope::full(), None).await;

        pick_up(&f, &mut view, link);
        f.harness.spatial.set(vec![HitTarget::Card {
            id: group,
            item_type: ItemType::Group,
        }]);
        view.handle(InteractionEvent::PointerMove {
            pointer: Point::new(200.0, 40.0),
        });
        view.handle(InteractionEvent::PointerUp {
            pointer: Point::new(200.0, 40.0),
        });
        view.navigate(NavTarget::Node(other)).await.unwrap();
        assert_eq!(view.model().container(), Some(other));

        let resolved = f.rx.recv().await.unwrap();
        assert!(matches!(
            resolved,
            InteractionEvent::CommitResolved { result: Ok(_), .. }
        ));
        view.handle(resolved);
        assert_eq!(view.model().container(), Some(other));
        assert_eq!(view.model().items().len(), 1);

        // The follow-up refetch is for the container now on screen.
        let reloaded = f.rx.recv().await.unwrap();
        assert_eq!(view.handle(reloaded), Some(ViewUpdate::Reloaded));
        assert_eq!(view.model().container(), Some(other));
        assert_eq!(f.vault.parent_of(link).await, Some(group));
    }

    #[tokio::test]
    async fn reload_for_a_previous_container_is_dropped() {
        let vault = InMemoryVault::new();
        let group = vault.seed_group("Work", None).await;
        vault.seed_link("Docs", "https://example.com", None).await;
        let f = Fixture::new(vault);
        let mut view = f.open(AccessScope::full(), None).await;
        let root = view.model().clone();

        view.navigate(NavTarget::Node(group)).await.unwrap();
        assert_eq!(view.handle(InteractionEvent::Reloaded(Ok(root))), None);
        assert_eq!(view.model().container(), Some(group));
    }
}
