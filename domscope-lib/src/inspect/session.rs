//! The inspector session: one explicitly constructed engine instance
//! per loaded document, owning the change ledger, the activation
//! state, and the current selection.

use crate::dom::dom_tree::{self, Document, Node, NodeId};
use crate::error::Error;
use crate::inspect::capture::{Clipboard, Rasterizer};
use crate::inspect::ledger::ChangeLedger;
use crate::inspect::present::{self, DisplayModel};
use crate::inspect::rules::{MatchOutcome, RuleMatcher};
use crate::inspect::snapshot::{self, SnapshotInput};
use crate::parser::dom_indices::DomIndices;
use crate::parser::html::parse_document;
use crate::style::css_matcher::{self, ComputedStyle};
use crate::style::owned_css::SheetRegistry;
use crate::style::sheet::collect_document_sheets;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub const VERSION: &str = "2.0.0";

/// The current selection: a weak back-reference plus the cached
/// ancestor chain. Replaced wholesale on every new selection.
#[derive(Debug)]
pub struct InspectionTarget {
    pub id: NodeId,
    node: Weak<RefCell<Node>>,
    pub ancestors: Vec<Weak<RefCell<Node>>>,
}

impl InspectionTarget {
    fn new(node: &Rc<RefCell<Node>>) -> Option<Self> {
        Some(InspectionTarget {
            id: dom_tree::node_id(node)?,
            node: Rc::downgrade(node),
            ancestors: dom_tree::ancestors(node)
                .iter()
                .map(Rc::downgrade)
                .collect(),
        })
    }

    pub fn upgrade(&self) -> Option<Rc<RefCell<Node>>> {
        self.node.upgrade()
    }
}

pub struct InspectorSession {
    document: Document,
    indices: DomIndices,
    registry: SheetRegistry,
    computed: HashMap<NodeId, ComputedStyle>,
    ledger: ChangeLedger,
    active: bool,
    target: Option<InspectionTarget>,
    /// Overlay chrome visibility, hidden only during capture.
    chrome_visible: Cell<bool>,
}

impl InspectorSession {
    /// Parses the page, collects its stylesheets, and resolves the
    /// cascade. The session starts inactive with nothing selected.
    pub fn load(html: &str) -> Self {
        let document = parse_document(html);
        let mut registry = SheetRegistry::new();
        collect_document_sheets(&document, &mut registry);
        if registry.blocked_count() > 0 {
            log::debug!(
                "{} of {} stylesheets are not accessible",
                registry.blocked_count(),
                registry.blocked_count() + registry.accessible_count()
            );
        }
        let indices = DomIndices::build(&document);
        let computed = css_matcher::compute_document_styles(&document, &registry);
        InspectorSession {
            document,
            indices,
            registry,
            computed,
            ledger: ChangeLedger::new(),
            active: false,
            target: None,
            chrome_visible: Cell::new(true),
        }
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enable(&mut self) {
        if !self.active {
            log::info!("inspector enabled");
        }
        self.active = true;
    }

    pub fn disable(&mut self) {
        if self.active {
            log::info!("inspector disabled");
        }
        self.active = false;
    }

    /// Flips activation and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &SheetRegistry {
        &self.registry
    }

    pub fn target(&self) -> Option<&InspectionTarget> {
        self.target.as_ref()
    }

    /// Selects the first element matching the selector and activates
    /// the inspector. On no match returns false and leaves the current
    /// selection untouched.
    pub fn select_element(&mut self, selector: &str) -> bool {
        match css_matcher::query_selector(&self.indices, selector) {
            Some(node) => match InspectionTarget::new(&node) {
                Some(target) => {
                    self.target = Some(target);
                    self.enable();
                    true
                }
                None => false,
            },
            None => {
                log::debug!("selector matched no element: {}", selector);
                false
            }
        }
    }

    fn selected_node(&self) -> Result<Rc<RefCell<Node>>, Error> {
        self.target
            .as_ref()
            .and_then(InspectionTarget::upgrade)
            .ok_or(Error::NoSelection)
    }

    /// Runs rule matching for the current selection.
    pub fn inspect(&self) -> Result<MatchOutcome, Error> {
        let node = self.selected_node()?;
        let matcher = RuleMatcher::new(&self.registry, &self.computed);
        Ok(matcher.match_rules(&node))
    }

    /// The panel-ready display model for the current selection.
    pub fn display(&self) -> Result<DisplayModel, Error> {
        let outcome = self.inspect()?;
        let id = self.target.as_ref().map(|t| t.id).unwrap_or_default();
        Ok(present::render(&outcome, &self.ledger, id))
    }

    /// Applies a live edit to the selected element. The first edit of
    /// a property pins the pre-edit value as its original.
    pub fn edit_property(&mut self, property: &str, new_value: &str) -> Result<(), Error> {
        let node = self.selected_node()?;
        let id = dom_tree::node_id(&node).unwrap_or_default();
        let original = self
            .ledger
            .original_value(id, property)
            .map(str::to_string)
            .or_else(|| {
                self.computed
                    .get(&id)
                    .and_then(|style| style.get(property))
                    .map(str::to_string)
            })
            .unwrap_or_default();
        self.ledger
            .record_change(&node, property, &original, new_value);
        self.computed = css_matcher::compute_document_styles(&self.document, &self.registry);
        Ok(())
    }

    /// Removes the live override for one property; the authored
    /// cascade takes over again.
    pub fn reset_property(&mut self, property: &str) -> Result<(), Error> {
        let node = self.selected_node()?;
        self.ledger.reset_property(&node, property);
        self.computed = css_matcher::compute_document_styles(&self.document, &self.registry);
        Ok(())
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    /// Builds the snapshot document for the current selection.
    pub fn snapshot(&self, user_request: Option<&str>) -> Result<String, Error> {
        let node = self.selected_node()?;
        let outcome = self.inspect()?;
        let id = dom_tree::node_id(&node).unwrap_or_default();
        Ok(snapshot::format_snapshot(&SnapshotInput {
            element: &node,
            outcome: &outcome,
            ledger: &self.ledger,
            computed: self.computed.get(&id),
            blocked_sheets: self.registry.blocked_count(),
            user_request,
        }))
    }

    /// Writes the snapshot for the current selection to the clipboard.
    pub fn copy_snapshot(
        &self,
        clipboard: &mut dyn Clipboard,
        user_request: Option<&str>,
    ) -> Result<(), Error> {
        let text = self.snapshot(user_request)?;
        clipboard.write_text(&text)
    }

    pub fn chrome_visible(&self) -> bool {
        self.chrome_visible.get()
    }

    /// Captures the page with the overlay chrome hidden, writing the
    /// PNG to the clipboard. The chrome is restored on every exit
    /// path, including capture failure.
    pub fn capture_screenshot(
        &self,
        rasterizer: &dyn Rasterizer,
        clipboard: &mut dyn Clipboard,
    ) -> Result<Vec<u8>, Error> {
        let _guard = ChromeGuard::hide(&self.chrome_visible);
        let png = rasterizer.capture()?;
        clipboard.write_image(&png)?;
        Ok(png)
    }

    /// Drops ledger entries whose elements no longer exist.
    pub fn sweep_ledger(&mut self) {
        self.ledger.sweep();
    }
}

struct ChromeGuard<'a> {
    visible: &'a Cell<bool>,
}

impl<'a> ChromeGuard<'a> {
    fn hide(visible: &'a Cell<bool>) -> Self {
        visible.set(false);
        ChromeGuard { visible }
    }
}

impl Drop for ChromeGuard<'_> {
    fn drop(&mut self) {
        self.visible.set(true);
    }
}
