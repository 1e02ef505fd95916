//! Peer registry: roster reconciliation with an identity-preserving
//! session-proxy cache.
//!
//! Every roster broadcast is reconciled against the cache: proxies for
//! peers that are still listed are reused unchanged (same `Arc`), proxies
//! for new peers are created exactly once, and the externally visible
//! roster/proxy pair is swapped atomically so readers never observe a
//! half-updated list.
//!
//! Entries for peers absent from the latest roster are kept by default;
//! `prune_stale` opts into dropping them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::connection::MessageSender;
use crate::handlers::PendingRequests;
use crate::peer::Peer;
use crate::session::{SelfId, SessionProxy};

struct RegistryInner {
    /// Proxy cache keyed by peer id. Survives roster refreshes.
    cache: HashMap<String, Arc<SessionProxy>>,
    /// Latest roster, replaced wholesale on each broadcast.
    roster: Vec<Peer>,
    /// Externally visible proxy list for the latest roster.
    proxies: Vec<Arc<SessionProxy>>,
}

/// Reconciles server-pushed rosters against local session proxies.
pub struct PeerRegistry {
    inner: Mutex<RegistryInner>,
    self_id: SelfId,
    sender: MessageSender,
    pending: PendingRequests,
    request_timeout: Duration,
    prune_stale: bool,
}

impl PeerRegistry {
    pub(crate) fn new(
        sender: MessageSender,
        pending: PendingRequests,
        request_timeout: Duration,
        prune_stale: bool,
    ) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                cache: HashMap::new(),
                roster: Vec::new(),
                proxies: Vec::new(),
            }),
            self_id: SelfId::default(),
            sender,
            pending,
            request_timeout,
            prune_stale,
        }
    }

    /// Apply a roster broadcast.
    ///
    /// Updates the self id when the roster names it, reuses cached proxies
    /// for peers still present, creates one proxy per new peer, and swaps
    /// the visible roster and proxy list in one step. A roster without a
    /// self entry leaves the previously known self id unchanged; an empty
    /// roster empties the proxy list but not the cache.
    pub fn reconcile(&self, peers: &[Peer]) {
        if let Some(own) = peers.iter().find(|p| p.is_self) {
            self.self_id.set(&own.id);
        }

        let mut inner = self.inner.lock().unwrap();

        let mut proxies = Vec::with_capacity(peers.len());
        for peer in peers.iter().filter(|p| !p.is_self) {
            let proxy = match inner.cache.get(&peer.id) {
                Some(existing) => existing.clone(),
                None => {
                    let created = Arc::new(SessionProxy::new(
                        peer.clone(),
                        self.self_id.clone(),
                        self.sender.clone(),
                        self.pending.clone(),
                        self.request_timeout,
                    ));
                    inner.cache.insert(peer.id.clone(), created.clone());
                    tracing::debug!(peer_id = %peer.id, "session proxy created");
                    created
                }
            };
            proxies.push(proxy);
        }

        if self.prune_stale {
            let before = inner.cache.len();
            inner
                .cache
                .retain(|id, _| peers.iter().any(|p| p.id == *id));
            let dropped = before - inner.cache.len();
            if dropped > 0 {
                tracing::debug!(dropped, "pruned stale session proxies");
            }
        }

        inner.roster = peers.to_vec();
        inner.proxies = proxies;
    }

    /// Latest roster snapshot.
    pub fn roster(&self) -> Vec<Peer> {
        self.inner.lock().unwrap().roster.clone()
    }

    /// Proxies for the latest roster's non-self peers.
    pub fn proxies(&self) -> Vec<Arc<SessionProxy>> {
        self.inner.lock().unwrap().proxies.clone()
    }

    /// Look up a cached proxy by peer id.
    pub fn proxy(&self, peer_id: &str) -> Option<Arc<SessionProxy>> {
        self.inner.lock().unwrap().cache.get(peer_id).cloned()
    }

    /// This client's own roster id, once a roster has revealed it.
    pub fn self_id(&self) -> Option<String> {
        self.self_id.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(prune: bool) -> PeerRegistry {
        PeerRegistry::new(
            MessageSender::new(),
            PendingRequests::new(),
            Duration::from_secs(5),
            prune,
        )
    }

    #[test]
    fn test_proxy_identity_preserved_across_refreshes() {
        let registry = registry(false);

        registry.reconcile(&[Peer::new("me", true), Peer::new("p1", false)]);
        let before = registry.proxy("p1").unwrap();

        registry.reconcile(&[
            Peer::new("me", true),
            Peer::new("p1", false),
            Peer::new("p2", false),
        ]);
        let after = registry.proxy("p1").unwrap();

        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(registry.proxies().len(), 2);
    }

    #[test]
    fn test_new_peer_gets_exactly_one_proxy() {
        let registry = registry(false);

        registry.reconcile(&[Peer::new("q", false)]);
        let first = registry.proxy("q").unwrap();

        registry.reconcile(&[Peer::new("q", false)]);
        let second = registry.proxy("q").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.proxies().len(), 1);
    }

    #[test]
    fn test_self_entry_sets_self_id() {
        let registry = registry(false);
        assert_eq!(registry.self_id(), None);

        registry.reconcile(&[Peer::new("me", true), Peer::new("p1", false)]);
        assert_eq!(registry.self_id(), Some("me".to_string()));

        // No self proxy is ever created.
        assert!(registry.proxy("me").is_none());
    }

    #[test]
    fn test_roster_without_self_keeps_known_id() {
        let registry = registry(false);
        registry.reconcile(&[Peer::new("me", true)]);

        registry.reconcile(&[Peer::new("p1", false)]);
        assert_eq!(registry.self_id(), Some("me".to_string()));
    }

    #[test]
    fn test_empty_roster_clears_proxies_not_cache() {
        let registry = registry(false);
        registry.reconcile(&[Peer::new("p1", false)]);
        let cached = registry.proxy("p1").unwrap();

        registry.reconcile(&[]);

        assert!(registry.proxies().is_empty());
        assert!(registry.roster().is_empty());
        // Cache kept: the same proxy comes back if the peer reappears.
        let reappeared = {
            registry.reconcile(&[Peer::new("p1", false)]);
            registry.proxy("p1").unwrap()
        };
        assert!(Arc::ptr_eq(&cached, &reappeared));
    }

    #[test]
    fn test_prune_drops_absent_peers() {
        let registry = registry(true);
        registry.reconcile(&[Peer::new("p1", false), Peer::new("p2", false)]);
        let old = registry.proxy("p2").unwrap();

        registry.reconcile(&[Peer::new("p1", false)]);
        assert!(registry.proxy("p2").is_none());

        // After pruning, a returning peer gets a fresh proxy.
        registry.reconcile(&[Peer::new("p1", false), Peer::new("p2", false)]);
        let fresh = registry.proxy("p2").unwrap();
        assert!(!Arc::ptr_eq(&old, &fresh));
    }

    #[test]
    fn test_roster_snapshot_is_raw_peer_list() {
        let registry = registry(false);
        let peers = vec![Peer::new("me", true), Peer::new("p1", false)];
        registry.reconcile(&peers);

        assert_eq!(registry.roster(), peers);
    }
}
