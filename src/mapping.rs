//! Per-run legacy-id to UUID mapping table.
//!
//! Each migrator returns the mappings for its own table; the orchestrator
//! folds them into a new `IdentityMappings` value and hands it to the next
//! step. Nothing here is shared or global: a run owns its mappings and drops
//! them when it finishes.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::identity::EntityKind;

/// Mappings produced by a single table migrator.
pub type KindMappings = HashMap<i64, Uuid>;

/// Immutable set of legacy-id mappings accumulated during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMappings {
    by_kind: BTreeMap<EntityKind, KindMappings>,
}

impl IdentityMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new value with `mappings` recorded for `kind`.
    ///
    /// Existing entries for `kind` are merged; later values win.
    pub fn with(mut self, kind: EntityKind, mappings: KindMappings) -> Self {
        self.by_kind.entry(kind).or_default().extend(mappings);
        self
    }

    /// Resolve a legacy id of the given kind.
    pub fn resolve(&self, kind: EntityKind, legacy_id: i64) -> Option<Uuid> {
        self.by_kind
            .get(&kind)
            .and_then(|m| m.get(&legacy_id))
            .copied()
    }

    /// Whether a migrator for `kind` has contributed to this set.
    pub fn contains_kind(&self, kind: EntityKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// The mapping table for one kind (empty if none was recorded).
    pub fn for_kind(&self, kind: EntityKind) -> KindMappings {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }

    /// Number of mapped rows for one kind.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.by_kind.get(&kind).map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(|m| m.is_empty())
    }
}
