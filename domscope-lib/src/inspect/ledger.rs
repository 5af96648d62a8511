//! The change ledger: per-element overlay of live CSS edits.
//!
//! Edits are keyed by node id so the ledger never owns the DOM node;
//! a weak handle is kept per bucket for the live inline-style side
//! effects and for sweeping entries whose nodes are gone. Invariant:
//! every recorded property is simultaneously applied as an inline
//! override on its element, so ledger and DOM never drift.

use crate::dom::dom_tree::{self, Node, NodeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

/// One edited property. `original` stays pinned to the value seen on
/// the first edit; `current` follows every subsequent edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub property: String,
    pub original: String,
    pub current: String,
}

#[derive(Debug, Default)]
struct ElementBucket {
    node: Weak<RefCell<Node>>,
    records: BTreeMap<String, ChangeRecord>,
}

/// All live edits for one inspector instance. Cleared only on
/// teardown, never by rule re-rendering.
#[derive(Debug, Default)]
pub struct ChangeLedger {
    buckets: HashMap<NodeId, ElementBucket>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edit and applies it to the element's inline style in
    /// the same call. The first edit of a property pins its original
    /// value; later edits only move `current`.
    pub fn record_change(
        &mut self,
        element: &Rc<RefCell<Node>>,
        property: &str,
        original_value: &str,
        new_value: &str,
    ) {
        let Some(id) = dom_tree::node_id(element) else {
            return;
        };
        let bucket = self.buckets.entry(id).or_insert_with(|| ElementBucket {
            node: Rc::downgrade(element),
            records: BTreeMap::new(),
        });
        bucket
            .records
            .entry(property.to_string())
            .and_modify(|record| record.current = new_value.to_string())
            .or_insert_with(|| ChangeRecord {
                property: property.to_string(),
                original: original_value.to_string(),
                current: new_value.to_string(),
            });

        if let Node::Element(ref mut elem) = *element.borrow_mut() {
            elem.set_inline_style(property, new_value);
        }
    }

    /// Removes the live inline override and the record; drops the
    /// element's bucket when it becomes empty. Unknown elements or
    /// properties are a no-op, never an error.
    pub fn reset_property(&mut self, element: &Rc<RefCell<Node>>, property: &str) {
        let Some(id) = dom_tree::node_id(element) else {
            return;
        };
        let Some(bucket) = self.buckets.get_mut(&id) else {
            return;
        };
        if bucket.records.remove(property).is_none() {
            return;
        }
        if let Node::Element(ref mut elem) = *element.borrow_mut() {
            elem.remove_inline_style(property);
        }
        if bucket.records.is_empty() {
            self.buckets.remove(&id);
        }
    }

    pub fn has_changed(&self, id: NodeId, property: &str) -> bool {
        self.record(id, property).is_some()
    }

    pub fn current_value(&self, id: NodeId, property: &str) -> Option<&str> {
        self.record(id, property).map(|r| r.current.as_str())
    }

    pub fn original_value(&self, id: NodeId, property: &str) -> Option<&str> {
        self.record(id, property).map(|r| r.original.as_str())
    }

    fn record(&self, id: NodeId, property: &str) -> Option<&ChangeRecord> {
        self.buckets.get(&id)?.records.get(property)
    }

    /// All records for one element, in property-name order.
    pub fn changes_for(&self, id: NodeId) -> Vec<&ChangeRecord> {
        self.buckets
            .get(&id)
            .map(|bucket| bucket.records.values().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drops buckets whose DOM nodes no longer exist.
    pub fn sweep(&mut self) {
        self.buckets
            .retain(|_, bucket| bucket.node.upgrade().is_some());
    }
}
