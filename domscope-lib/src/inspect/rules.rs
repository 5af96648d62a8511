//! Rule discovery: which style declarations apply to an element, and
//! in what display order.
//!
//! Four sources feed the result: the element's own inline style, the
//! accessible stylesheet rules, inheritable properties found on
//! ancestors, and a small set of essential computed properties. Each
//! source becomes one or more [`RuleGroup`]s tagged with provenance.

use crate::dom::dom_tree::{self, Node, NodeId};
use crate::inspect::specificity::{compute_specificity, INLINE_SPECIFICITY};
use crate::style::css_matcher::{element_matches, ComputedStyle, INHERITABLE_PROPERTIES};
use crate::style::owned_css::{SheetRegistry, StyleProperty};
use crate::style::shorthand;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Origin category of one matched rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Inline,
    Stylesheet,
    Inherited,
    Computed,
}

/// One coherent, displayable block of styling. Built fresh on every
/// inspection request and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    /// Human-readable heading, e.g. `.card` or `Inherited from div.card`.
    pub selector_label: String,
    pub properties: Vec<StyleProperty>,
    pub specificity: u32,
    pub provenance: Provenance,
}

/// Result of a matching pass. An element with no matched rules and no
/// meaningful computed properties yields the explicit `NoRules`
/// sentinel instead of an empty list.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Rules(Vec<RuleGroup>),
    NoRules,
}

impl MatchOutcome {
    pub fn groups(&self) -> &[RuleGroup] {
        match self {
            MatchOutcome::Rules(groups) => groups,
            MatchOutcome::NoRules => &[],
        }
    }
}

/// Ancestor levels examined for inherited properties.
const MAX_INHERITANCE_DEPTH: usize = 10;

/// Computed properties worth surfacing even when nothing declares them.
const ESSENTIAL_COMPUTED: &[&str] = &["display", "position", "z-index", "overflow", "box-sizing"];

pub struct RuleMatcher<'a> {
    registry: &'a SheetRegistry,
    computed: &'a HashMap<NodeId, ComputedStyle>,
}

impl<'a> RuleMatcher<'a> {
    pub fn new(
        registry: &'a SheetRegistry,
        computed: &'a HashMap<NodeId, ComputedStyle>,
    ) -> Self {
        RuleMatcher { registry, computed }
    }

    /// Collects every rule group applying to the element and orders
    /// them for display: inline first, then stylesheet groups by
    /// descending specificity, then inherited, then computed. On a
    /// fully blocked page (no inline and no stylesheet groups at all)
    /// the computed groups move ahead of the inherited ones, since
    /// they are then the most reliable information available.
    pub fn match_rules(&self, element: &Rc<RefCell<Node>>) -> MatchOutcome {
        let mut groups = Vec::new();

        if let Some(inline) = self.inline_group(element) {
            groups.push(inline);
        }
        groups.extend(self.stylesheet_groups(element));

        let mut covered: HashSet<String> = groups
            .iter()
            .flat_map(|g| g.properties.iter().map(|p| p.name.clone()))
            .collect();

        groups.extend(self.inherited_groups(element, &mut covered));

        if let Some(computed) = self.computed_group(element, &covered) {
            groups.push(computed);
        }

        if groups.is_empty() {
            return MatchOutcome::NoRules;
        }

        let has_direct = groups
            .iter()
            .any(|g| matches!(g.provenance, Provenance::Inline | Provenance::Stylesheet));
        groups.sort_by(|a, b| {
            let rank = |g: &RuleGroup| match g.provenance {
                Provenance::Inline => 0,
                Provenance::Stylesheet => 1,
                Provenance::Inherited => {
                    if has_direct {
                        2
                    } else {
                        3
                    }
                }
                Provenance::Computed => {
                    if has_direct {
                        3
                    } else {
                        2
                    }
                }
            };
            rank(a)
                .cmp(&rank(b))
                .then(b.specificity.cmp(&a.specificity))
        });

        MatchOutcome::Rules(groups)
    }

    fn inline_group(&self, element: &Rc<RefCell<Node>>) -> Option<RuleGroup> {
        let properties: Vec<StyleProperty> = dom_tree::with_element(element, |elem| {
            elem.inline_styles()
                .into_iter()
                .map(|(name, value)| StyleProperty::new(name, value))
                .collect()
        })?;
        if properties.is_empty() {
            return None;
        }
        Some(RuleGroup {
            selector_label: "inline styles".to_string(),
            properties,
            specificity: INLINE_SPECIFICITY,
            provenance: Provenance::Inline,
        })
    }

    fn stylesheet_groups(&self, element: &Rc<RefCell<Node>>) -> Vec<RuleGroup> {
        let mut groups = Vec::new();
        for rule in self.registry.accessible_rules() {
            let selector_text = rule.selector_text();
            if !element_matches(element, &selector_text) {
                continue;
            }
            let longhands: Vec<StyleProperty> = rule
                .declarations
                .iter()
                .map(|d| StyleProperty::new(d.property.clone(), d.value.clone()))
                .collect();
            let properties = shorthand::reconstruct(&longhands);
            if properties.is_empty() {
                continue;
            }
            groups.push(RuleGroup {
                selector_label: selector_text.clone(),
                specificity: compute_specificity(&selector_text),
                properties,
                provenance: Provenance::Stylesheet,
            });
        }
        groups
    }

    /// Walks the ancestor chain collecting inheritable properties that
    /// no closer rule already covers. Nearest ancestor wins: once a
    /// property is claimed at one level it is excluded farther up.
    fn inherited_groups(
        &self,
        element: &Rc<RefCell<Node>>,
        covered: &mut HashSet<String>,
    ) -> Vec<RuleGroup> {
        let mut groups = Vec::new();
        for ancestor in dom_tree::ancestors(element)
            .into_iter()
            .take(MAX_INHERITANCE_DEPTH)
        {
            let is_html = dom_tree::with_element(&ancestor, |e| e.tag.eq_ignore_ascii_case("html"))
                .unwrap_or(false);
            if is_html {
                break;
            }
            let properties = self.ancestor_inheritable_properties(&ancestor, covered);
            if properties.is_empty() {
                continue;
            }
            for prop in &properties {
                covered.insert(prop.name.clone());
            }
            let label = dom_tree::with_element(&ancestor, |e| e.selector_label())
                .unwrap_or_default();
            groups.push(RuleGroup {
                selector_label: format!("Inherited from {}", label),
                properties,
                specificity: 0,
                provenance: Provenance::Inherited,
            });
        }
        groups
    }

    fn ancestor_inheritable_properties(
        &self,
        ancestor: &Rc<RefCell<Node>>,
        covered: &HashSet<String>,
    ) -> Vec<StyleProperty> {
        let mut properties = Vec::new();
        let mut seen = HashSet::new();
        let inheritable =
            |name: &str| INHERITABLE_PROPERTIES.contains(&name) && !covered.contains(name);

        for rule in self.registry.accessible_rules() {
            if !element_matches(ancestor, &rule.selector_text()) {
                continue;
            }
            let longhands: Vec<StyleProperty> = rule
                .declarations
                .iter()
                .map(|d| StyleProperty::new(d.property.clone(), d.value.clone()))
                .collect();
            for prop in shorthand::reconstruct(&longhands) {
                if inheritable(&prop.name) && seen.insert(prop.name.clone()) {
                    properties.push(prop);
                }
            }
        }

        dom_tree::with_element(ancestor, |elem| {
            for (name, value) in elem.inline_styles() {
                if inheritable(&name) && seen.insert(name.clone()) {
                    properties.push(StyleProperty::new(name, value));
                }
            }
        });

        properties
    }

    fn computed_group(
        &self,
        element: &Rc<RefCell<Node>>,
        covered: &HashSet<String>,
    ) -> Option<RuleGroup> {
        let id = dom_tree::node_id(element)?;
        let style = self.computed.get(&id)?;
        let properties: Vec<StyleProperty> = ESSENTIAL_COMPUTED
            .iter()
            .filter(|name| !covered.contains(**name))
            .filter_map(|name| {
                style
                    .get(name)
                    .filter(|value| is_meaningful_value(name, value))
                    .map(|value| StyleProperty::new(*name, value))
            })
            .collect();
        if properties.is_empty() {
            return None;
        }
        Some(RuleGroup {
            selector_label: "computed styles".to_string(),
            properties,
            specificity: 0,
            provenance: Provenance::Computed,
        })
    }
}

/// Suppresses default/no-op computed values so they do not clutter
/// output: generic defaults, zero box-model values, the default font
/// weight, transparent backgrounds.
pub fn is_meaningful_value(property: &str, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if matches!(value, "none" | "auto" | "normal" | "initial") {
        return false;
    }
    if matches!(value, "0" | "0px") {
        return false;
    }
    if property == "font-weight" && value == "400" {
        return false;
    }
    if property.starts_with("background") && matches!(value, "transparent" | "rgba(0, 0, 0, 0)") {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom_indices::DomIndices;
    use crate::parser::html::parse_document;
    use crate::style::css_matcher::{compute_document_styles, query_selector};
    use crate::style::owned_css::SheetOrigin;
    use crate::style::sheet::collect_document_sheets;
    use pretty_assertions::assert_eq;

    struct Fixture {
        document: dom_tree::Document,
        registry: SheetRegistry,
        computed: HashMap<NodeId, ComputedStyle>,
    }

    fn fixture(html: &str) -> Fixture {
        let document = parse_document(html);
        let mut registry = SheetRegistry::new();
        collect_document_sheets(&document, &mut registry);
        let computed = compute_document_styles(&document, &registry);
        Fixture {
            document,
            registry,
            computed,
        }
    }

    fn target(fixture: &Fixture, selector: &str) -> Rc<RefCell<Node>> {
        let indices = DomIndices::build(&fixture.document);
        query_selector(&indices, selector).expect("target element")
    }

    #[test]
    fn inline_group_always_comes_first() {
        let fx = fixture(
            r#"<style>#card { color: blue; } .panel { padding-top: 1px; }</style>
               <div id="card" class="panel" style="color: red">x</div>"#,
        );
        let element = target(&fx, "#card");
        let matcher = RuleMatcher::new(&fx.registry, &fx.computed);
        let outcome = matcher.match_rules(&element);

        let groups = outcome.groups();
        assert_eq!(groups[0].provenance, Provenance::Inline);
        assert_eq!(groups[0].selector_label, "inline styles");
        assert_eq!(groups[0].properties, vec![StyleProperty::new("color", "red")]);
    }

    #[test]
    fn stylesheet_groups_order_by_descending_specificity() {
        let fx = fixture(
            r#"<style>div { color: blue; } #card { color: red; } .panel { color: green; }</style>
               <div id="card" class="panel">x</div>"#,
        );
        let element = target(&fx, "#card");
        let matcher = RuleMatcher::new(&fx.registry, &fx.computed);
        let outcome = matcher.match_rules(&element);

        let sheet_labels: Vec<String> = outcome
            .groups()
            .iter()
            .filter(|g| g.provenance == Provenance::Stylesheet)
            .map(|g| g.selector_label.clone())
            .collect();
        assert_eq!(sheet_labels, vec!["#card", ".panel", "div"]);
    }

    #[test]
    fn inherited_never_precedes_stylesheet_groups() {
        let fx = fixture(
            r#"<style>.outer { color: maroon; } p { margin-top: 2px; }</style>
               <div class="outer"><p>x</p></div>"#,
        );
        let element = target(&fx, "p");
        let matcher = RuleMatcher::new(&fx.registry, &fx.computed);
        let outcome = matcher.match_rules(&element);

        let ranks: Vec<Provenance> = outcome.groups().iter().map(|g| g.provenance).collect();
        let sheet_pos = ranks.iter().position(|p| *p == Provenance::Stylesheet);
        let inherited_pos = ranks.iter().position(|p| *p == Provenance::Inherited);
        assert!(sheet_pos.unwrap() < inherited_pos.unwrap());
    }

    #[test]
    fn nearest_ancestor_wins_inheritance() {
        let fx = fixture(
            r#"<style>.outer { color: maroon; } .inner { color: teal; }</style>
               <div class="outer"><div class="inner"><p>x</p></div></div>"#,
        );
        let element = target(&fx, "p");
        let matcher = RuleMatcher::new(&fx.registry, &fx.computed);
        let outcome = matcher.match_rules(&element);

        let inherited: Vec<&RuleGroup> = outcome
            .groups()
            .iter()
            .filter(|g| g.provenance == Provenance::Inherited)
            .collect();
        assert_eq!(inherited.len(), 1);
        assert_eq!(inherited[0].selector_label, "Inherited from div.inner");
        assert_eq!(
            inherited[0].properties,
            vec![StyleProperty::new("color", "teal")]
        );
    }

    #[test]
    fn list_style_is_reported_as_inherited() {
        let fx = fixture(r#"<ul style="list-style-type: square"><li>x</li></ul>"#);
        let element = target(&fx, "li");
        let matcher = RuleMatcher::new(&fx.registry, &fx.computed);
        let outcome = matcher.match_rules(&element);

        let inherited = outcome
            .groups()
            .iter()
            .find(|g| g.provenance == Provenance::Inherited)
            .expect("inherited group present");
        assert_eq!(inherited.selector_label, "Inherited from ul");
        assert!(inherited
            .properties
            .iter()
            .any(|p| p.name == "list-style-type" && p.value == "square"));
    }

    #[test]
    fn blocked_page_promotes_computed_over_inherited() {
        let fx = {
            let document = parse_document(
                r#"<div style="color: olive"><p>x</p></div>"#,
            );
            let mut registry = SheetRegistry::new();
            registry.register_blocked(SheetOrigin::Linked {
                href: "https://cdn.example/app.css".into(),
            });
            let computed = compute_document_styles(&document, &registry);
            Fixture {
                document,
                registry,
                computed,
            }
        };
        let element = target(&fx, "p");
        let matcher = RuleMatcher::new(&fx.registry, &fx.computed);
        let outcome = matcher.match_rules(&element);

        let ranks: Vec<Provenance> = outcome.groups().iter().map(|g| g.provenance).collect();
        let computed_pos = ranks.iter().position(|p| *p == Provenance::Computed);
        let inherited_pos = ranks.iter().position(|p| *p == Provenance::Inherited);
        assert!(computed_pos.unwrap() < inherited_pos.unwrap());
    }

    #[test]
    fn blocked_sheet_still_yields_inline_and_computed() {
        let document =
            parse_document(r#"<div id="card" class="panel" style="color: red">x</div>"#);
        let mut registry = SheetRegistry::new();
        registry.register_blocked(SheetOrigin::Linked {
            href: "https://cdn.example/app.css".into(),
        });
        let mut computed = compute_document_styles(&document, &registry);
        let indices = DomIndices::build(&document);
        let element = query_selector(&indices, "#card").unwrap();
        let id = dom_tree::node_id(&element).unwrap();
        // The page still renders with the blocked sheet applied, so the
        // resolved style can carry values no accessible rule explains.
        computed
            .get_mut(&id)
            .unwrap()
            .properties
            .insert("display".to_string(), "flex".to_string());

        let matcher = RuleMatcher::new(&registry, &computed);
        let outcome = matcher.match_rules(&element);

        let groups = outcome.groups();
        assert_eq!(groups[0].provenance, Provenance::Inline);
        assert!(groups[0]
            .properties
            .contains(&StyleProperty::new("color", "red")));
        let computed_group = groups
            .iter()
            .find(|g| g.provenance == Provenance::Computed)
            .expect("computed group present");
        assert!(computed_group
            .properties
            .contains(&StyleProperty::new("display", "flex")));
    }

    #[test]
    fn computed_group_supplies_display_when_uncovered() {
        let fx = fixture("<section>x</section>");
        let element = target(&fx, "section");
        let matcher = RuleMatcher::new(&fx.registry, &fx.computed);
        let outcome = matcher.match_rules(&element);

        let computed: Vec<&RuleGroup> = outcome
            .groups()
            .iter()
            .filter(|g| g.provenance == Provenance::Computed)
            .collect();
        assert_eq!(computed.len(), 1);
        assert!(computed[0]
            .properties
            .contains(&StyleProperty::new("display", "block")));
    }

    #[test]
    fn meaningful_filter_drops_defaults() {
        assert!(!is_meaningful_value("display", "none"));
        assert!(!is_meaningful_value("z-index", "auto"));
        assert!(!is_meaningful_value("font-weight", "400"));
        assert!(!is_meaningful_value("margin-top", "0px"));
        assert!(!is_meaningful_value("background-color", "rgba(0, 0, 0, 0)"));
        assert!(is_meaningful_value("display", "flex"));
        assert!(is_meaningful_value("font-weight", "700"));
    }
}
