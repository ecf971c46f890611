// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label vocabulary and the active label.

use serde::{Deserialize, Serialize};

/// The ordered label vocabulary of a project plus the label new boxes get.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelSet {
    labels: Vec<String>,
    active: Option<usize>,
}

impl LabelSet {
    /// Create a label set. The active label is `default` when it is part of
    /// the vocabulary, otherwise the first label.
    pub fn new(labels: Vec<String>, default: Option<&str>) -> Self {
        let active = default
            .and_then(|d| labels.iter().position(|l| l == d))
            .or(if labels.is_empty() { None } else { Some(0) });
        Self { labels, active }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The active label, or an empty string for an empty vocabulary.
    pub fn active(&self) -> &str {
        self.active
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Make `label` active. Labels outside the vocabulary are rejected.
    pub fn set_active(&mut self, label: &str) -> bool {
        match self.index_of(label) {
            Some(index) => {
                self.active = Some(index);
                true
            }
            None => {
                log::warn!("Ignoring unknown label '{}'", label);
                false
            }
        }
    }

    /// Make the label at `index` active.
    pub fn set_active_index(&mut self, index: usize) -> bool {
        if index < self.labels.len() {
            self.active = Some(index);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["car".into(), "person".into(), "bicycle".into()]
    }

    #[test]
    fn test_default_label_selected() {
        let set = LabelSet::new(labels(), Some("person"));
        assert_eq!(set.active(), "person");

        let fallback = LabelSet::new(labels(), Some("truck"));
        assert_eq!(fallback.active(), "car");
    }

    #[test]
    fn test_empty_vocabulary() {
        let mut set = LabelSet::new(Vec::new(), None);
        assert_eq!(set.active(), "");
        assert!(!set.set_active("car"));
        assert!(!set.set_active_index(0));
    }

    #[test]
    fn test_set_active_rejects_unknown() {
        let mut set = LabelSet::new(labels(), None);
        assert!(set.set_active("bicycle"));
        assert_eq!(set.active(), "bicycle");
        assert!(!set.set_active("truck"));
        assert_eq!(set.active(), "bicycle");
        assert_eq!(set.index_of("person"), Some(1));
    }
}
