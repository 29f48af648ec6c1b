use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use super::command::Verb;

/// Every message that crosses the HUD/game boundary, with typed payloads.
/// The original design funneled these through a process-global stringly
/// typed channel; here each side holds a [`Subscription`] it drains on its
/// own event-loop turn.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// HUD -> game: a verb button was pressed.
    VerbClicked { verb: Verb },
    /// Game -> HUD: a registered object was clicked on the stage.
    ObjectClicked { object_name: String },
    /// HUD -> game: the player submitted a free-text command.
    CommandSubmitted { command: String },
    /// Game -> HUD: a level finished (the HUD uses level 3 for the paywall).
    LevelComplete { level: u32 },
    /// HUD -> game: the subscription flag was just set.
    UserSubscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubscriberId(u64);

struct SubscriberSlot {
    id: SubscriberId,
    queue: Rc<RefCell<VecDeque<GameEvent>>>,
}

#[derive(Default)]
struct BusInner {
    subscribers: Vec<SubscriberSlot>,
    next_id: u64,
}

/// Single-threaded publish/subscribe channel. Cloning the bus clones a
/// handle to the same channel; events are delivered to subscriber queues
/// in registration order and consumed pull-style.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. Dropping the returned handle
    /// unsubscribes it, so teardown cannot leak listeners.
    pub fn subscribe(&self) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriberId(inner.next_id);
        inner.next_id = inner.next_id.saturating_add(1);
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        inner.subscribers.push(SubscriberSlot {
            id,
            queue: Rc::clone(&queue),
        });
        Subscription {
            id,
            queue,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Clones the event into every live subscriber queue, in registration
    /// order.
    pub fn publish(&self, event: GameEvent) {
        let inner = self.inner.borrow();
        for slot in &inner.subscribers {
            slot.queue.borrow_mut().push_back(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// A live subscriber of an [`EventBus`]. Events accumulate in publish
/// order until drained by the owner.
pub struct Subscription {
    id: SubscriberId,
    queue: Rc<RefCell<VecDeque<GameEvent>>>,
    bus: Weak<RefCell<BusInner>>,
}

impl Subscription {
    /// Removes and returns the oldest pending event, if any.
    pub fn next(&self) -> Option<GameEvent> {
        self.queue.borrow_mut().pop_front()
    }

    /// Removes and returns all pending events in publish order.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner
                .borrow_mut()
                .subscribers
                .retain(|slot| slot.id != self.id);
        }
    }
}
