use crate::input::events::{EventKind, MapServiceEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Event listener callback type
pub type EventCallback = Arc<dyn Fn(&MapServiceEvent) + Send + Sync>;

struct Listener {
    id: u64,
    kind: Option<EventKind>,
    callback: EventCallback,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<Listener>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Listener registry for [`MapServiceEvent`]s
///
/// Callbacks run on the emitting thread, after the registry lock has been
/// released, so a callback may subscribe, unsubscribe or emit again.
#[derive(Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Listeners>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of event
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&MapServiceEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(callback))
    }

    /// Register a listener for every event
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MapServiceEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(callback))
    }

    fn register(&self, kind: Option<EventKind>, callback: EventCallback) -> Subscription {
        let mut listeners = lock(&self.listeners);
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push(Listener { id, kind, callback });
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver an event to every matching listener, returns how many were called
    pub fn emit(&self, event: &MapServiceEvent) -> usize {
        let kind = event.kind();
        let callbacks: Vec<EventCallback> = lock(&self.listeners)
            .entries
            .iter()
            .filter(|listener| listener.kind.map_or(true, |k| k == kind))
            .map(|listener| listener.callback.clone())
            .collect();

        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    pub fn remove(&self, id: u64) -> bool {
        remove_listener(&self.listeners, id)
    }

    /// Drop every listener
    pub fn clear(&self) {
        lock(&self.listeners).entries.clear();
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }
}

fn remove_listener(listeners: &Mutex<Listeners>, id: u64) -> bool {
    let mut listeners = lock(listeners);
    let before = listeners.entries.len();
    listeners.entries.retain(|listener| listener.id != id);
    listeners.entries.len() != before
}

/// Handle to a registered listener; dropping it unregisters the listener
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unregister now
    pub fn dispose(self) {}

    /// Keep the listener registered for the lifetime of the bus
    pub fn forget(mut self) {
        self.listeners = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            remove_listener(&listeners, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
