use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::Rc;

use crate::*;

/// Why a game ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EndReason {
    Cleared,
    MineHit,
    Timeout,
}

/// Final picture of a finished game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameEnd {
    pub won: bool,
    pub reason: EndReason,
    pub triggering_cell: Option<Coord2>,
    /// Payload of the mine that ended the game, for the loss popup.
    pub triggering_payload: Option<MinePayload>,
    pub mines: Vec<MineDisplay>,
}

/// Immutable records emitted by a session for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    NewGame { config: GameConfig },
    CellRevealed { coords: Coord2, content: CellContent },
    CellFlagged { coords: Coord2, flagged: bool },
    /// Mines minus flags, never below zero.
    MineCounterUpdated(CellCount),
    HintsUpdated(u8),
    /// Seconds remaining, `None` when the timer is off.
    TimerUpdated(Option<u32>),
    ConfigClamped(ConfigClamp),
    AssetsDegraded { requested: usize, received: usize },
    GameEnded(GameEnd),
}

pub type Callback<T> = Rc<dyn Fn(&T)>;
pub type SubscriptionId = u64;

struct Channel<T: Debug> {
    listeners: RefCell<BTreeMap<SubscriptionId, Callback<T>>>,
    next_id: Cell<SubscriptionId>,
}

/// Sending half, held by the session.
pub struct EventEmitter<T: Debug> {
    channel: Rc<Channel<T>>,
}

/// Receiving half, handed to renderers.
pub struct EventObserver<T: Debug> {
    channel: Rc<Channel<T>>,
}

impl<T: Debug> Clone for EventObserver<T> {
    fn clone(&self) -> Self {
        Self {
            channel: Rc::clone(&self.channel),
        }
    }
}

pub fn channel<T: Debug>() -> (EventEmitter<T>, EventObserver<T>) {
    let channel = Rc::new(Channel {
        listeners: RefCell::new(BTreeMap::new()),
        next_id: Cell::new(0),
    });
    (
        EventEmitter {
            channel: Rc::clone(&channel),
        },
        EventObserver { channel },
    )
}

impl<T: Debug> EventEmitter<T> {
    /// Delivers `data` to every listener in subscription order.
    pub fn emit(&self, data: &T) {
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<_> = self.channel.listeners.borrow().values().cloned().collect();
        log::trace!(
            target: "events",
            "Emitting event to {} listeners: {:?}",
            listeners.len(),
            data
        );
        for listener in listeners {
            listener(data);
        }
    }

    pub fn observer(&self) -> EventObserver<T> {
        EventObserver {
            channel: Rc::clone(&self.channel),
        }
    }
}

impl<T: Debug> EventObserver<T> {
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + 'static,
    {
        let id = self.channel.next_id.get();
        self.channel.next_id.set(id + 1);
        self.channel.listeners.borrow_mut().insert(id, Rc::new(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.channel.listeners.borrow_mut().remove(&id).is_some()
    }
}

/// Subscribes a listener that appends every event to a shared log.
pub fn record_events<T>(observer: &EventObserver<T>) -> Rc<RefCell<Vec<T>>>
where
    T: Clone + Debug + 'static,
{
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    observer.subscribe(move |event: &T| sink.borrow_mut().push(event.clone()));
    log
}
