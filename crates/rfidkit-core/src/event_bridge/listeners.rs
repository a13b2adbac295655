//! Listener registry keyed by event category.

use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use super::events::EventCategory;
use crate::types::Listener;

/// Subscription handle returned by `ScannerBridge::on`
///
/// Every registration gets a fresh id, so registering the same closure twice
/// yields two independently removable subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

struct Registration {
    id: SubscriptionId,
    listener: Listener,
}

/// Ordered listener lists per category
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    by_category: HashMap<EventCategory, Vec<Registration>>,
}

impl ListenerRegistry {
    /// Append a listener, creating the category list if absent
    pub fn add(&mut self, category: EventCategory, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.by_category
            .entry(category)
            .or_default()
            .push(Registration { id, listener });
        id
    }

    /// Remove one registration; false if it is not registered under `category`
    pub fn remove(&mut self, category: EventCategory, id: SubscriptionId) -> bool {
        let Some(list) = self.by_category.get_mut(&category) else {
            return false;
        };
        match list.iter().position(|registration| registration.id == id) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every listener of `category`, returning how many were removed
    pub fn clear(&mut self, category: EventCategory) -> usize {
        self.by_category
            .remove(&category)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, category: EventCategory, id: SubscriptionId) -> bool {
        self.by_category
            .get(&category)
            .is_some_and(|list| list.iter().any(|registration| registration.id == id))
    }

    pub fn count(&self, category: EventCategory) -> usize {
        self.by_category.get(&category).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    /// Clone out the listeners of `category` in registration order
    pub fn snapshot(&self, category: EventCategory) -> Vec<(SubscriptionId, Listener)> {
        self.by_category
            .get(&category)
            .map(|list| {
                list.iter()
                    .map(|registration| (registration.id, registration.listener.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
