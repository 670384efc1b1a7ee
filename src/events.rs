//! Wallet event plumbing
//!
//! Provider listeners only forward raw events into a queue; the
//! [`ConnectionManager`](crate::connection::ConnectionManager) drains the queue
//! and applies the events to the registry. Application-level changes are
//! published as [`WalletSignal`]s.
//!
//! Each forwarded event is tagged with the generation of the subscription that
//! received it. Removing listeners starts a new generation, so events queued
//! before a disconnect or a provider switch are dropped unread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::Address;
use tokio::sync::mpsc;

use crate::provider::{Eip1193Provider, ListenerId, ProviderEvent, WalletEventKind};
use crate::registry::NetworkInfo;

/// Application-level wallet notifications
#[derive(Debug, Clone, PartialEq)]
pub enum WalletSignal {
    Connected(Address),
    Disconnected,
    AccountChanged(Address),
    ChainChanged(NetworkInfo),
}

struct Subscription {
    provider: Arc<dyn Eip1193Provider>,
    ids: Vec<(WalletEventKind, ListenerId)>,
}

/// Owns the listeners installed on the active provider
pub struct EventManager {
    sender: mpsc::UnboundedSender<(u64, ProviderEvent)>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<(u64, ProviderEvent)>>,
    generation: AtomicU64,
    subscription: Mutex<Option<Subscription>>,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            generation: AtomicU64::new(0),
            subscription: Mutex::new(None),
        }
    }

    /// Subscribe to all four wallet events on `provider`
    ///
    /// Existing listeners are removed first, so repeated installs leave exactly
    /// one listener per event kind.
    pub fn install(&self, provider: &Arc<dyn Eip1193Provider>) {
        self.remove();
        let generation = self.generation.load(Ordering::SeqCst);

        let ids = WalletEventKind::ALL
            .iter()
            .map(|kind| {
                let sender = self.sender.clone();
                let id = provider.on(
                    *kind,
                    Arc::new(move |event: &ProviderEvent| {
                        // Receiver lives as long as the manager
                        let _ = sender.send((generation, event.clone()));
                    }),
                );
                (*kind, id)
            })
            .collect();

        log::debug!("Installed wallet event listeners");
        *self.lock() = Some(Subscription {
            provider: provider.clone(),
            ids,
        });
    }

    /// Remove the installed listeners, if any, and invalidate queued events
    pub fn remove(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(subscription) = self.lock().take() {
            for (kind, id) in subscription.ids {
                if !subscription.provider.remove_listener(kind, id) {
                    log::warn!("Listener for {} was already gone", kind);
                }
            }
            log::debug!("Removed wallet event listeners");
        }
    }

    pub fn installed_count(&self) -> usize {
        self.lock().as_ref().map_or(0, |s| s.ids.len())
    }

    /// Wait for the next event from the current subscription
    pub async fn next_event(&self) -> Option<ProviderEvent> {
        let mut receiver = self.receiver.lock().await;
        loop {
            let (generation, event) = receiver.recv().await?;
            if self.is_current(generation) {
                return Some(event);
            }
            log::debug!("Dropping stale {} event", event.kind());
        }
    }

    /// Take every current event queued so far without waiting
    pub async fn drain(&self) -> Vec<ProviderEvent> {
        let mut receiver = self.receiver.lock().await;
        let mut events = Vec::new();
        while let Ok((generation, event)) = receiver.try_recv() {
            if self.is_current(generation) {
                events.push(event);
            } else {
                log::debug!("Dropping stale {} event", event.kind());
            }
        }
        events
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockWallet;

    #[tokio::test]
    async fn test_repeated_install_keeps_one_listener_per_kind() {
        let wallet = Arc::new(MockWallet::metamask());
        let provider: Arc<dyn Eip1193Provider> = wallet.clone();
        let events = EventManager::new();

        for _ in 0..3 {
            events.install(&provider);
        }
        for kind in WalletEventKind::ALL {
            assert_eq!(wallet.listener_count(kind), 1);
        }

        assert_eq!(wallet.emit(ProviderEvent::ChainChanged("0x89".into())), 1);
        assert_eq!(
            events.drain().await,
            vec![ProviderEvent::ChainChanged("0x89".into())]
        );
    }

    #[tokio::test]
    async fn test_remove_detaches_from_provider() {
        let wallet = Arc::new(MockWallet::metamask());
        let provider: Arc<dyn Eip1193Provider> = wallet.clone();
        let events = EventManager::new();

        events.install(&provider);
        assert_eq!(events.installed_count(), 4);
        events.remove();
        events.remove();

        assert_eq!(events.installed_count(), 0);
        assert_eq!(wallet.emit(ProviderEvent::Disconnect(None)), 0);
        assert!(events.drain().await.is_empty());
    }

    #[tokio::test]
    async fn test_events_queued_before_remove_are_dropped() {
        let wallet = Arc::new(MockWallet::metamask());
        let provider: Arc<dyn Eip1193Provider> = wallet.clone();
        let events = EventManager::new();

        events.install(&provider);
        wallet.emit(ProviderEvent::ChainChanged("0x1".into()));
        events.remove();
        assert!(events.drain().await.is_empty());

        // Reinstalling does not revive them either
        events.install(&provider);
        wallet.emit(ProviderEvent::ChainChanged("0x2".into()));
        events.install(&provider);
        wallet.emit(ProviderEvent::ChainChanged("0x89".into()));
        assert_eq!(
            events.drain().await,
            vec![ProviderEvent::ChainChanged("0x89".into())]
        );
    }
}
