//! # Selection — one selector per object type

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::selector::{ObjectType, Selector};

/// Maps each [`ObjectType`] to at most one [`Selector`].
///
/// Encodes as `{"devices": .., "sensors": ..}` with keys in type order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    selectors: BTreeMap<ObjectType, Selector>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selector for `object_type`. A selector already present for
    /// that type is replaced, not merged; combine with [`Selector::and`]
    /// first if both should apply.
    pub fn add(mut self, object_type: ObjectType, selector: Selector) -> Self {
        self.selectors.insert(object_type, selector);
        self
    }

    /// Shorthand for `Selection::new().add(Devices, selector)`.
    pub fn devices(selector: Selector) -> Self {
        Self::new().add(ObjectType::Devices, selector)
    }

    pub fn get(&self, object_type: ObjectType) -> Option<&Selector> {
        self.selectors.get(&object_type)
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectType, &Selector)> {
        self.selectors.iter().map(|(t, s)| (*t, s))
    }
}
