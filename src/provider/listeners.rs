use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::{EventHandler, ListenerId, ProviderEvent, WalletEventKind};

/// Registered event listeners of a provider
#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, WalletEventKind, EventHandler)>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: WalletEventKind, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, kind, handler));
        id
    }

    pub fn remove(&self, kind: WalletEventKind, id: ListenerId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(eid, ekind, _)| !(*eid == id && *ekind == kind));
        entries.len() != before
    }

    pub fn count(&self, kind: WalletEventKind) -> usize {
        self.lock().iter().filter(|(_, k, _)| *k == kind).count()
    }

    pub fn total(&self) -> usize {
        self.lock().len()
    }

    /// Invoke every handler registered for the event's kind, returning how many ran
    pub fn emit(&self, event: &ProviderEvent) -> usize {
        // Handlers run outside the lock so they may add or remove listeners
        let handlers: Vec<EventHandler> = self
            .lock()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind())
            .map(|(_, _, handler)| handler.clone())
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, WalletEventKind, EventHandler)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
