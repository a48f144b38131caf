//! Keyed Dependency Graph
//!
//! This module defines the dependency graph that connects reactive sources
//! to the computations that read them. Unlike a plain signal, a store has
//! many independently trackable slots, so edges are keyed: a subscriber
//! depends on `(target, key)` pairs, not on whole targets.
//!
//! The graph maintains a reverse index from subscriber to its edge set so
//! that removing a subscriber costs O(its own subscriptions) rather than a
//! scan of every bucket in the graph.

use std::collections::{HashMap, HashSet};

use crate::reactive::subscriber::{SubscriberId, TargetId};

/// The slot of a reactive target that a dependency edge is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepKey {
    /// The single value slot of a signal cell or computed value.
    Value,

    /// A named property of a map store.
    Prop(String),

    /// A positional element of a list store.
    Index(usize),

    /// The structural bucket of a store. Iteration-shaped reads (length,
    /// key listing, snapshots) subscribe here; key insertion and removal
    /// notify it in addition to the specific slot.
    Iterate,
}

impl DepKey {
    /// Build a property key from anything string-like.
    pub fn prop(name: impl Into<String>) -> Self {
        DepKey::Prop(name.into())
    }
}

/// The dependency graph: which subscribers depend on which slots.
#[derive(Debug, Default)]
pub struct DepGraph {
    /// Forward edges: target -> key -> subscribers of that slot.
    buckets: HashMap<TargetId, HashMap<DepKey, HashSet<SubscriberId>>>,

    /// Reverse edges: subscriber -> every (target, key) it subscribed to.
    reverse: HashMap<SubscriberId, HashSet<(TargetId, DepKey)>>,
}

impl DepGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Record that `subscriber` depends on `(target, key)`.
    ///
    /// Set semantics: adding the same edge twice is a no-op, so a
    /// computation that reads the same slot repeatedly within one run is
    /// subscribed exactly once.
    pub fn track(&mut self, target: TargetId, key: DepKey, subscriber: SubscriberId) {
        let inserted = self
            .buckets
            .entry(target)
            .or_default()
            .entry(key.clone())
            .or_default()
            .insert(subscriber);

        if inserted {
            self.reverse
                .entry(subscriber)
                .or_default()
                .insert((target, key));
        }
    }

    /// Collect the deduplicated set of subscribers of the given slots.
    ///
    /// Callers pass several keys at once for structural mutations (the
    /// specific slot plus the `Iterate` bucket); the union is returned with
    /// each subscriber appearing once.
    pub fn collect(&self, target: TargetId, keys: &[DepKey]) -> Vec<SubscriberId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        if let Some(by_key) = self.buckets.get(&target) {
            for key in keys {
                if let Some(subs) = by_key.get(key) {
                    for sub in subs {
                        if seen.insert(*sub) {
                            out.push(*sub);
                        }
                    }
                }
            }
        }

        out
    }

    /// Remove every edge of the given subscriber.
    ///
    /// This is the stop/re-track primitive: O(subscriptions of the
    /// subscriber), not O(all graph entries).
    pub fn remove_subscriber(&mut self, subscriber: SubscriberId) {
        let Some(edges) = self.reverse.remove(&subscriber) else {
            return;
        };

        for (target, key) in edges {
            let mut target_empty = false;
            if let Some(by_key) = self.buckets.get_mut(&target) {
                if let Some(subs) = by_key.get_mut(&key) {
                    subs.remove(&subscriber);
                    if subs.is_empty() {
                        by_key.remove(&key);
                    }
                }
                target_empty = by_key.is_empty();
            }
            if target_empty {
                self.buckets.remove(&target);
            }
        }
    }

    /// Number of slots the given subscriber is currently subscribed to.
    pub fn subscription_count(&self, subscriber: SubscriberId) -> usize {
        self.reverse.get(&subscriber).map_or(0, |edges| edges.len())
    }

    /// Number of subscribers attached to a specific slot.
    pub fn subscriber_count(&self, target: TargetId, key: &DepKey) -> usize {
        self.buckets
            .get(&target)
            .and_then(|by_key| by_key.get(key))
            .map_or(0, |subs| subs.len())
    }

    /// Total number of targets with at least one live edge.
    pub fn target_count(&self) -> usize {
        self.buckets.len()
    }
}
