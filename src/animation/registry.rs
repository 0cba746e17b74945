//! Set of markers that are currently bouncing
//!
//! Insertion order is activation order. The registry only tracks membership
//! and exclusivity; stopping the markers it evicts is the caller's job.

use crate::layers::marker::MarkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegistryEntry {
    marker: MarkerId,
    exclusive: bool,
}

#[derive(Debug, Default, Clone)]
pub struct BouncingRegistry {
    entries: Vec<RegistryEntry>,
}

impl BouncingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `marker` and returns the markers evicted to make room.
    ///
    /// An exclusive marker empties the registry first. A non-exclusive one
    /// only evicts a currently registered exclusive marker.
    pub fn add(&mut self, marker: MarkerId, exclusive: bool) -> Vec<MarkerId> {
        let mut evicted = Vec::new();
        self.entries.retain(|entry| {
            let keep = entry.marker != marker && !exclusive && !entry.exclusive;
            if !keep && entry.marker != marker {
                evicted.push(entry.marker);
            }
            keep
        });
        self.entries.push(RegistryEntry { marker, exclusive });
        evicted
    }

    /// Removes `marker`; returns whether it was registered
    pub fn remove(&mut self, marker: MarkerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.marker != marker);
        self.entries.len() != before
    }

    pub fn contains(&self, marker: MarkerId) -> bool {
        self.entries.iter().any(|entry| entry.marker == marker)
    }

    /// Registered markers in activation order
    pub fn markers(&self) -> Vec<MarkerId> {
        self.entries.iter().map(|entry| entry.marker).collect()
    }

    /// Empties the registry, returning its markers in activation order
    pub fn drain(&mut self) -> Vec<MarkerId> {
        self.entries.drain(..).map(|entry| entry.marker).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_exclusive_markers_coexist() {
        let mut registry = BouncingRegistry::new();
        assert!(registry.add(MarkerId(1), false).is_empty());
        assert!(registry.add(MarkerId(2), false).is_empty());
        assert_eq!(registry.markers(), vec![MarkerId(1), MarkerId(2)]);
    }

    #[test]
    fn test_exclusive_add_clears_registry() {
        let mut registry = BouncingRegistry::new();
        registry.add(MarkerId(1), false);
        registry.add(MarkerId(2), false);

        let evicted = registry.add(MarkerId(3), true);
        assert_eq!(evicted, vec![MarkerId(1), MarkerId(2)]);
        assert_eq!(registry.markers(), vec![MarkerId(3)]);
    }

    #[test]
    fn test_non_exclusive_add_evicts_exclusive_marker() {
        let mut registry = BouncingRegistry::new();
        registry.add(MarkerId(1), true);

        let evicted = registry.add(MarkerId(2), false);
        assert_eq!(evicted, vec![MarkerId(1)]);
        assert_eq!(registry.markers(), vec![MarkerId(2)]);
    }

    #[test]
    fn test_marker_appears_once() {
        let mut registry = BouncingRegistry::new();
        registry.add(MarkerId(1), false);
        registry.add(MarkerId(2), false);

        assert!(registry.add(MarkerId(1), false).is_empty());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.markers(), vec![MarkerId(2), MarkerId(1)]);
    }

    #[test]
    fn test_remove_and_drain() {
        let mut registry = BouncingRegistry::new();
        registry.add(MarkerId(1), false);
        registry.add(MarkerId(2), false);

        assert!(registry.remove(MarkerId(1)));
        assert!(!registry.remove(MarkerId(1)));
        assert!(registry.contains(MarkerId(2)));

        registry.add(MarkerId(3), false);
        assert_eq!(registry.drain(), vec![MarkerId(2), MarkerId(3)]);
        assert!(registry.is_empty());
    }
}
