// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Snapshot-based box collection.
//!
//! [`BoxList`] is an immutable, cheaply clonable snapshot. Every mutation
//! returns a new snapshot and leaves the receiver untouched, so observers
//! can detect changes by reference with [`BoxList::ptr_eq`]. Insertion
//! order is z-order: later boxes are drawn on top and hit first.

use crate::models::annotation::{BoundingBox, BoxId};
use crate::util::geometry::NormRect;
use std::sync::Arc;

/// Partial update of a box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxPatch {
    pub rect: Option<NormRect>,
    pub label: Option<String>,
}

impl BoxPatch {
    pub fn rect(rect: NormRect) -> Self {
        Self {
            rect: Some(rect),
            label: None,
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            rect: None,
            label: Some(label.into()),
        }
    }
}

/// An ordered snapshot of the boxes of one image.
#[derive(Debug, Clone, Default)]
pub struct BoxList {
    boxes: Arc<Vec<BoundingBox>>,
}

impl BoxList {
    pub fn new(boxes: Vec<BoundingBox>) -> Self {
        Self {
            boxes: Arc::new(boxes),
        }
    }

    /// All boxes in insertion (z-) order.
    pub fn all(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, id: BoxId) -> Option<&BoundingBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.get(id).is_some()
    }

    /// Whether both lists are the very same snapshot.
    pub fn ptr_eq(&self, other: &BoxList) -> bool {
        Arc::ptr_eq(&self.boxes, &other.boxes)
    }

    /// Append a box on top of the others.
    pub fn add(&self, bbox: BoundingBox) -> Self {
        let mut boxes = Vec::with_capacity(self.boxes.len() + 1);
        boxes.extend(self.boxes.iter().cloned());
        boxes.push(bbox);
        Self::new(boxes)
    }

    /// Apply `patch` to the box with `id`. Unknown ids return this snapshot.
    pub fn update(&self, id: BoxId, patch: &BoxPatch) -> Self {
        let Some(index) = self.boxes.iter().position(|b| b.id == id) else {
            log::debug!("Update of unknown box {} ignored", id);
            return self.clone();
        };

        let mut boxes = self.boxes.as_ref().clone();
        let target = &mut boxes[index];
        if let Some(rect) = patch.rect {
            target.set_rect(rect);
        }
        if let Some(label) = &patch.label {
            target.label = label.clone();
        }
        Self::new(boxes)
    }

    /// Remove the box with `id`. Unknown ids return this snapshot.
    pub fn remove(&self, id: BoxId) -> Self {
        if !self.contains(id) {
            log::debug!("Removal of unknown box {} ignored", id);
            return self.clone();
        }

        Self::new(self.boxes.iter().filter(|b| b.id != id).cloned().collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundingBox> {
        self.boxes.iter()
    }

    pub fn to_vec(&self) -> Vec<BoundingBox> {
        self.boxes.as_ref().clone()
    }
}

impl PartialEq for BoxList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.boxes == other.boxes
    }
}

impl From<Vec<BoundingBox>> for BoxList {
    fn from(boxes: Vec<BoundingBox>) -> Self {
        Self::new(boxes)
    }
}

impl<'a> IntoIterator for &'a BoxList {
    type Item = &'a BoundingBox;
    type IntoIter = std::slice::Iter<'a, BoundingBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (BoxList, BoxId, BoxId) {
        let a = BoundingBox::new(NormRect::new(0.1, 0.1, 0.2, 0.2), "car");
        let b = BoundingBox::new(NormRect::new(0.5, 0.5, 0.2, 0.2), "person");
        let (ida, idb) = (a.id, b.id);
        (BoxList::new(vec![a, b]), ida, idb)
    }

    #[test]
    fn test_add_returns_new_snapshot() {
        let (list, _, _) = sample();
        let added = list.add(BoundingBox::new(NormRect::new(0.0, 0.0, 0.1, 0.1), "car"));

        assert_eq!(list.len(), 2);
        assert_eq!(added.len(), 3);
        assert!(!added.ptr_eq(&list));
        assert_eq!(added.all()[2].label, "car");
    }

    #[test]
    fn test_update_patches_only_target() {
        let (list, a, b) = sample();
        let updated = list.update(b, &BoxPatch::label("bicycle"));

        assert_eq!(updated.get(b).unwrap().label, "bicycle");
        assert_eq!(updated.get(a), list.get(a));
        assert_eq!(list.get(b).unwrap().label, "person");

        let moved = updated.update(a, &BoxPatch::rect(NormRect::new(0.3, 0.3, 0.1, 0.1)));
        assert_eq!(moved.get(a).unwrap().rect(), NormRect::new(0.3, 0.3, 0.1, 0.1));
        assert_eq!(moved.get(a).unwrap().label, "car");
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let (list, _, _) = sample();
        let stranger = BoxId::new();

        assert!(list.update(stranger, &BoxPatch::label("x")).ptr_eq(&list));
        assert!(list.remove(stranger).ptr_eq(&list));
    }

    #[test]
    fn test_remove_keeps_order() {
        let (list, a, b) = sample();
        let c = BoundingBox::new(NormRect::new(0.0, 0.0, 0.1, 0.1), "car");
        let idc = c.id;
        let list = list.add(c);

        let removed = list.remove(b);
        let ids: Vec<BoxId> = removed.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![a, idc]);
    }
}
