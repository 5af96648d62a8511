//! Selector parsing, matching, and the document cascade.
//!
//! Selectors are parsed into compound/complex structures and matched
//! right-to-left against the DOM using parent and sibling pointers.
//! `compute_document_styles` runs the full cascade over a sheet
//! registry and produces a computed-style map keyed by node id.

use crate::dom::dom_tree::{self, ElementNode, Node, NodeId};
use crate::parser::dom_indices::DomIndices;
use crate::style::owned_css::{OwnedDeclaration, SheetRegistry};
use crate::style::shorthand;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// One attribute condition. `operator: None` means existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>,
    pub value: Option<String>,
}

/// A compound selector: optional tag, id, classes, attribute conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: HashSet<String>,
    pub attributes: Vec<AttributeSelector>,
    pub universal: bool,
}

impl CompoundSelector {
    /// A compound with no recognizable parts matches nothing. This is
    /// what a malformed selector string parses to.
    pub fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }
}

/// A complex selector: the key compound (rightmost) plus ancestor
/// parts with their combinators, stored in right-to-left order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Parses one selector (no commas); falls back to treating the whole
/// string as a single compound when complex parsing yields nothing.
pub fn parse_selector(selector: &str) -> ComplexSelector {
    parse_complex_selector(selector).unwrap_or_else(|| ComplexSelector {
        key: parse_compound_selector(selector),
        ancestors: Vec::new(),
    })
}

/// Parses a compound selector string, e.g.
/// `div.red#header[disabled][data-type~="main"]`.
pub fn parse_compound_selector(selector: &str) -> CompoundSelector {
    let mut compound = CompoundSelector::default();
    let mut chars = selector.trim().chars().peekable();
    let mut buffer = String::new();

    if let Some(&ch) = chars.peek() {
        if ch.is_alphabetic() || ch == '*' {
            while let Some(&ch) = chars.peek() {
                if ch == '#' || ch == '.' || ch == '[' {
                    break;
                }
                buffer.push(ch);
                chars.next();
            }
            if buffer == "*" {
                compound.universal = true;
            } else if !buffer.is_empty() {
                compound.tag = Some(buffer.clone());
            }
            buffer.clear();
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                read_name(&mut chars, &mut buffer);
                if !buffer.is_empty() {
                    compound.id = Some(buffer.clone());
                }
                buffer.clear();
            }
            '.' => {
                read_name(&mut chars, &mut buffer);
                if !buffer.is_empty() {
                    compound.classes.insert(buffer.clone());
                }
                buffer.clear();
            }
            '[' => {
                if let Some(attr) = parse_attribute_selector(&mut chars) {
                    compound.attributes.push(attr);
                }
            }
            _ => {}
        }
    }

    compound
}

fn read_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, buffer: &mut String) {
    while let Some(&ch) = chars.peek() {
        if ch == '.' || ch == '#' || ch == '[' {
            break;
        }
        buffer.push(ch);
        chars.next();
    }
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }
}

/// Parses one `[...]` attribute condition, the opening bracket already
/// consumed. Returns `None` when no attribute name is found.
fn parse_attribute_selector(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Option<AttributeSelector> {
    let mut attr_name = String::new();
    let mut operator: Option<AttributeOperator> = None;
    let mut attr_value: Option<String> = None;

    skip_whitespace(chars);
    while let Some(&ch) = chars.peek() {
        if ch == '='
            || ch == ']'
            || ch == '~'
            || ch == '^'
            || ch == '$'
            || ch == '*'
            || ch.is_whitespace()
        {
            break;
        }
        attr_name.push(ch);
        chars.next();
    }
    skip_whitespace(chars);

    if let Some(&ch) = chars.peek() {
        if ch == '=' || ch == '~' || ch == '^' || ch == '$' || ch == '*' {
            let mut op_str = String::new();
            op_str.push(ch);
            chars.next();
            if let Some(&'=') = chars.peek() {
                op_str.push('=');
                chars.next();
            }
            operator = match op_str.as_str() {
                "=" => Some(AttributeOperator::Exact),
                "~=" => Some(AttributeOperator::Includes),
                "^=" => Some(AttributeOperator::Prefix),
                "$=" => Some(AttributeOperator::Suffix),
                "*=" => Some(AttributeOperator::Substring),
                _ => None,
            };
            skip_whitespace(chars);

            let quote = chars.peek().copied().filter(|&c| c == '"' || c == '\'');
            let mut value_buf = String::new();
            if let Some(q) = quote {
                chars.next();
                for ch in chars.by_ref() {
                    if ch == q {
                        break;
                    }
                    value_buf.push(ch);
                }
            } else {
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || ch == ']' {
                        break;
                    }
                    value_buf.push(ch);
                    chars.next();
                }
            }
            attr_value = Some(value_buf);
        }
    }

    for ch in chars.by_ref() {
        if ch == ']' {
            break;
        }
    }

    if attr_name.is_empty() {
        None
    } else {
        Some(AttributeSelector {
            name: attr_name,
            operator,
            value: attr_value,
        })
    }
}

/// Parses a complex selector (e.g. `div.red > p#header + span.foo`).
/// Combinator tokens are expected to be whitespace-separated.
pub fn parse_complex_selector(selector: &str) -> Option<ComplexSelector> {
    let tokens: Vec<&str> = selector.split_whitespace().collect();
    let mut iter = tokens.into_iter();
    let mut key = parse_compound_selector(iter.next()?);
    let mut ancestors = Vec::new();

    while let Some(token) = iter.next() {
        let combinator = match token {
            ">" => Combinator::Child,
            "+" => Combinator::AdjacentSibling,
            "~" => Combinator::GeneralSibling,
            _ => Combinator::Descendant,
        };
        let compound_token = if matches!(token, ">" | "+" | "~") {
            iter.next().unwrap_or(token)
        } else {
            token
        };
        ancestors.push((combinator, key));
        key = parse_compound_selector(compound_token);
    }
    ancestors.reverse();
    Some(ComplexSelector { key, ancestors })
}

/// Specificity of a compound as (ids, classes + attributes, tags).
pub fn compute_specificity(compound: &CompoundSelector) -> (u32, u32, u32) {
    let id_count = u32::from(compound.id.is_some());
    let class_count = compound.classes.len() as u32 + compound.attributes.len() as u32;
    let tag_count = u32::from(compound.tag.is_some());
    (id_count, class_count, tag_count)
}

/// Specificity of a complex selector, key and ancestors summed.
pub fn compute_complex_specificity(selector: &ComplexSelector) -> (u32, u32, u32) {
    let mut spec = compute_specificity(&selector.key);
    for (_, comp) in &selector.ancestors {
        let anc = compute_specificity(comp);
        spec.0 += anc.0;
        spec.1 += anc.1;
        spec.2 += anc.2;
    }
    spec
}

/// True if the element satisfies every part of the compound.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if compound.is_empty() {
        return false;
    }
    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(ref id_val) = compound.id {
        if elem.id_attr() != Some(id_val.as_str()) {
            return false;
        }
    }
    for class in &compound.classes {
        if !elem.has_class(class) {
            return false;
        }
    }
    for attr_sel in &compound.attributes {
        let Some(actual_val) = elem.attr(&attr_sel.name) else {
            return false;
        };
        if let Some(expected) = &attr_sel.value {
            let matched = match attr_sel.operator {
                Some(AttributeOperator::Exact) => actual_val == expected,
                Some(AttributeOperator::Includes) => {
                    actual_val.split_whitespace().any(|word| word == expected)
                }
                Some(AttributeOperator::Prefix) => actual_val.starts_with(expected.as_str()),
                Some(AttributeOperator::Suffix) => actual_val.ends_with(expected.as_str()),
                Some(AttributeOperator::Substring) => actual_val.contains(expected.as_str()),
                None => true,
            };
            if !matched {
                return false;
            }
        }
    }
    true
}

/// Matches a complex selector against a candidate node, walking
/// right-to-left through parent and sibling pointers.
pub fn matches_complex_selector(candidate: &Rc<RefCell<Node>>, complex: &ComplexSelector) -> bool {
    let key_matches =
        dom_tree::with_element(candidate, |elem| matches_compound(elem, &complex.key));
    if key_matches != Some(true) {
        return false;
    }

    let mut current_node = Rc::clone(candidate);
    for (combinator, compound) in &complex.ancestors {
        let next = match combinator {
            Combinator::Child => dom_tree::parent_of(&current_node).filter(|p| {
                dom_tree::with_element(p, |e| matches_compound(e, compound)) == Some(true)
            }),
            Combinator::Descendant => {
                dom_tree::ancestors(&current_node).into_iter().find(|a| {
                    dom_tree::with_element(a, |e| matches_compound(e, compound)) == Some(true)
                })
            }
            Combinator::AdjacentSibling => prev_sibling(&current_node).filter(|s| {
                dom_tree::with_element(s, |e| matches_compound(e, compound)) == Some(true)
            }),
            Combinator::GeneralSibling => {
                let mut found = None;
                let mut current = prev_sibling(&current_node);
                while let Some(sib) = current {
                    if dom_tree::with_element(&sib, |e| matches_compound(e, compound))
                        == Some(true)
                    {
                        found = Some(sib);
                        break;
                    }
                    current = prev_sibling(&sib);
                }
                found
            }
        };
        match next {
            Some(node) => current_node = node,
            None => return false,
        }
    }
    true
}

fn prev_sibling(node: &Rc<RefCell<Node>>) -> Option<Rc<RefCell<Node>>> {
    dom_tree::with_element(node, |elem| {
        elem.prev_sibling.as_ref().and_then(std::rc::Weak::upgrade)
    })
    .flatten()
}

/// True if the node matches any part of a comma-separated selector
/// list. Malformed parts match nothing, so a garbage selector returns
/// false rather than erroring.
pub fn element_matches(node: &Rc<RefCell<Node>>, selector_list: &str) -> bool {
    selector_list
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .any(|part| matches_complex_selector(node, &parse_selector(part)))
}

/// First element in document order matching the selector list.
pub fn query_selector(indices: &DomIndices, selector_list: &str) -> Option<Rc<RefCell<Node>>> {
    query_selector_all(indices, selector_list).into_iter().next()
}

/// Every element in document order matching the selector list. Each
/// part's key compound narrows the search through the document indices
/// before full right-to-left matching runs.
pub fn query_selector_all(indices: &DomIndices, selector_list: &str) -> Vec<Rc<RefCell<Node>>> {
    let parts: Vec<ComplexSelector> = selector_list
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_selector)
        .collect();

    let mut matched: HashSet<NodeId> = HashSet::new();
    for part in &parts {
        let key = &part.key;
        let candidates = indices.candidates(
            key.id.as_deref(),
            key.classes.iter().next().map(String::as_str),
            key.tag.as_deref(),
        );
        for node in candidates {
            let Some(id) = dom_tree::node_id(&node) else {
                continue;
            };
            if !matched.contains(&id) && matches_complex_selector(&node, part) {
                matched.insert(id);
            }
        }
    }

    indices
        .all_elements
        .iter()
        .filter(|node| dom_tree::node_id(node).is_some_and(|id| matched.contains(&id)))
        .map(Rc::clone)
        .collect()
}

/// Properties that pass from parent to child when the child does not
/// set them itself.
pub const INHERITABLE_PROPERTIES: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "font-variant",
    "line-height",
    "text-align",
    "text-decoration",
    "text-transform",
    "text-indent",
    "letter-spacing",
    "word-spacing",
    "list-style",
    "list-style-type",
    "list-style-position",
    "list-style-image",
    "cursor",
    "visibility",
    "white-space",
    "direction",
    "quotes",
    "orphans",
    "widows",
    "caption-side",
    "border-collapse",
    "border-spacing",
    "empty-cells",
    "table-layout",
];

/// Final set of properties one element resolves to after the cascade.
#[derive(Debug, Clone, Default)]
pub struct ComputedStyle {
    pub properties: HashMap<String, String>,
}

impl ComputedStyle {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }
}

struct CascadeRule<'a> {
    specificity: (u32, u32, u32),
    source_order: u32,
    declarations: &'a [OwnedDeclaration],
}

/// Runs the cascade for the whole document. For every element the
/// matched rules are sorted by specificity then source order and folded
/// into a property map, shorthands expanding as they land. Normal
/// declarations are overridden by the inline style attribute;
/// `!important` declarations are applied last and win over inline.
/// Inheritable properties fall back to the parent's computed value, and
/// tag-level display defaults fill in where no rule set one.
pub fn compute_document_styles(
    document: &dom_tree::Document,
    registry: &SheetRegistry,
) -> HashMap<NodeId, ComputedStyle> {
    let mut styles = HashMap::new();
    compute_styles_recursive(&document.root, registry, None, &mut styles);
    styles
}

fn compute_styles_recursive(
    node: &Rc<RefCell<Node>>,
    registry: &SheetRegistry,
    parent: Option<&ComputedStyle>,
    styles: &mut HashMap<NodeId, ComputedStyle>,
) {
    let children = match &*node.borrow() {
        Node::DocumentRoot(root) => root.children.clone(),
        Node::Element(elem) => elem.children.clone(),
        Node::Text(_) => return,
    };

    let own_style = dom_tree::node_id(node).map(|id| {
        let style = compute_element_style(node, registry, parent);
        styles.insert(id, style.clone());
        style
    });

    for child in &children {
        compute_styles_recursive(child, registry, own_style.as_ref().or(parent), styles);
    }
}

fn compute_element_style(
    node: &Rc<RefCell<Node>>,
    registry: &SheetRegistry,
    parent: Option<&ComputedStyle>,
) -> ComputedStyle {
    let mut matched: Vec<CascadeRule<'_>> = Vec::new();
    for rule in registry.accessible_rules() {
        for selector_text in &rule.selectors {
            let selector = parse_selector(selector_text);
            if matches_complex_selector(node, &selector) {
                matched.push(CascadeRule {
                    specificity: compute_complex_specificity(&selector),
                    source_order: rule.source_order,
                    declarations: &rule.declarations,
                });
                break;
            }
        }
    }
    matched.sort_by(|a, b| match a.specificity.cmp(&b.specificity) {
        Ordering::Equal => a.source_order.cmp(&b.source_order),
        other => other,
    });

    let mut computed = ComputedStyle::default();
    let mut important: Vec<(String, String)> = Vec::new();
    for rule in &matched {
        for decl in rule.declarations {
            if decl.important {
                important.push((decl.property.clone(), decl.value.clone()));
            } else {
                apply_declaration(&mut computed.properties, &decl.property, &decl.value);
            }
        }
    }

    // Inline style overrides normal sheet declarations.
    dom_tree::with_element(node, |elem| {
        for (property, value) in elem.inline_styles() {
            apply_declaration(&mut computed.properties, &property, &value);
        }
    });

    // !important wins over inline.
    for (property, value) in important {
        apply_declaration(&mut computed.properties, &property, &value);
    }

    if let Some(parent) = parent {
        for prop in INHERITABLE_PROPERTIES {
            if !computed.properties.contains_key(*prop) {
                if let Some(val) = parent.get(prop) {
                    computed
                        .properties
                        .insert((*prop).to_string(), val.to_string());
                }
            }
        }
    }

    dom_tree::with_element(node, |elem| {
        computed
            .properties
            .entry("display".to_string())
            .or_insert_with(|| default_display(&elem.tag).to_string());
    });

    computed
}

fn apply_declaration(properties: &mut HashMap<String, String>, property: &str, value: &str) {
    let expanded = shorthand::expand_declaration(property, value);
    if expanded.is_empty() {
        properties.insert(property.to_string(), value.to_string());
    } else {
        for (name, val) in expanded {
            properties.insert(name, val);
        }
    }
}

/// User-agent display default for a tag.
fn default_display(tag: &str) -> &'static str {
    match tag.to_lowercase().as_str() {
        "a" | "abbr" | "b" | "bdo" | "br" | "button" | "cite" | "code" | "em" | "i" | "img"
        | "input" | "kbd" | "label" | "mark" | "q" | "s" | "samp" | "select" | "small" | "span"
        | "strong" | "sub" | "sup" | "textarea" | "time" | "u" | "var" | "wbr" => "inline",
        "li" => "list-item",
        "table" => "table",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        "script" | "style" | "head" | "link" | "meta" | "title" => "none",
        _ => "block",
    }
}
