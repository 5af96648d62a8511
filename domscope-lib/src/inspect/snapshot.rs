//! The AI snapshot: a structured text report describing one element,
//! its DOM context, applied CSS (with any live edits), and key
//! computed styles. Consumed by a human or an LLM, never machine
//! parsed downstream.

use crate::dom::dom_tree::{self, Node};
use crate::inspect::ledger::ChangeLedger;
use crate::inspect::rules::{is_meaningful_value, MatchOutcome, Provenance};
use crate::style::css_matcher::ComputedStyle;
use crate::style::owned_css::StyleProperty;
use crate::style::shorthand;
use std::cell::RefCell;
use std::rc::Rc;

/// Elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Computed properties most relevant for layout/styling analysis.
const KEY_COMPUTED_PROPERTIES: &[&str] = &[
    "display",
    "position",
    "width",
    "height",
    "margin",
    "padding",
    "border",
    "background",
    "color",
    "font-family",
    "font-size",
    "line-height",
    "text-align",
    "flex-direction",
    "justify-content",
    "align-items",
    "grid-template-columns",
    "grid-template-rows",
    "transform",
    "opacity",
    "z-index",
    "overflow",
];

/// Everything the formatter needs about one inspection.
pub struct SnapshotInput<'a> {
    pub element: &'a Rc<RefCell<Node>>,
    pub outcome: &'a MatchOutcome,
    pub ledger: &'a ChangeLedger,
    pub computed: Option<&'a ComputedStyle>,
    pub blocked_sheets: usize,
    pub user_request: Option<&'a str>,
}

/// `tag#id`, or `tag.first-class`, or the bare tag.
pub fn element_identifier(element: &Rc<RefCell<Node>>) -> String {
    dom_tree::with_element(element, |elem| elem.selector_label()).unwrap_or_default()
}

/// The element's location in the tree: target first with a marker
/// icon, each ancestor one indent level deeper, stopping below the
/// root `<html>` element.
pub fn element_path_text(element: &Rc<RefCell<Node>>) -> String {
    let mut path = vec![element_identifier(element)];
    for ancestor in dom_tree::ancestors(element) {
        let is_html =
            dom_tree::with_element(&ancestor, |e| e.tag.eq_ignore_ascii_case("html"))
                .unwrap_or(false);
        if is_html {
            break;
        }
        path.push(element_identifier(&ancestor));
    }
    path.iter()
        .enumerate()
        .map(|(index, selector)| {
            let icon = if index == 0 { "🎯" } else { "📄" };
            format!("{}{} {}", "  ".repeat(index), icon, selector)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-prints the element's subtree, one node per line.
pub fn element_html(element: &Rc<RefCell<Node>>) -> String {
    let mut output = String::new();
    write_node(element, 0, &mut output);
    output.trim_end().to_string()
}

fn write_node(node: &Rc<RefCell<Node>>, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    match &*node.borrow() {
        Node::DocumentRoot(root) => {
            for child in &root.children {
                write_node(child, depth, output);
            }
        }
        Node::Element(elem) => {
            let tag = elem.tag.to_lowercase();
            let mut attrs: Vec<(&String, &String)> = elem.attributes.iter().collect();
            attrs.sort_by_key(|(name, _)| name.as_str());
            let attr_text: String = attrs
                .iter()
                .map(|(name, value)| format!(" {}=\"{}\"", name, value))
                .collect();
            output.push_str(&format!("{}<{}{}>\n", indent, tag, attr_text));
            for child in &elem.children {
                write_node(child, depth + 1, output);
            }
            if !VOID_ELEMENTS.contains(&tag.as_str()) {
                output.push_str(&format!("{}</{}>\n", indent, tag));
            }
        }
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                output.push_str(&format!("{}{}\n", indent, trimmed));
            }
        }
    }
}

/// Builds the full snapshot document.
pub fn format_snapshot(input: &SnapshotInput<'_>) -> String {
    let identifier = element_identifier(input.element);
    let element_id = dom_tree::node_id(input.element).unwrap_or_default();
    let has_changes = !input.ledger.changes_for(element_id).is_empty();

    let changes_note = if has_changes {
        "\n\n⚠️  This element has been modified with the live CSS editor. The CSS section shows both original and modified values."
    } else {
        ""
    };
    let css_heading = if has_changes {
        "CSS STYLES (WITH MODIFICATIONS)"
    } else {
        "APPLIED CSS STYLES"
    };
    let tag = dom_tree::with_element(input.element, |e| e.tag.to_lowercase()).unwrap_or_default();

    let mut sections = vec![format!(
        "🤖 AI Element Snapshot - {}{}\n\n\
         ## ELEMENT PATH\n{}\n\n\
         ## HTML STRUCTURE\n```html\n{}\n```\n\n\
         ## {}\n```css\n{}\n```\n\n\
         ## KEY COMPUTED STYLES\n```css\n{}\n```",
        identifier,
        changes_note,
        element_path_text(input.element),
        element_html(input.element),
        css_heading,
        css_section(input, element_id, has_changes),
        key_computed_section(input.computed),
    )];

    if let Some(request) = input.user_request {
        sections.push(format!(
            "## USER REQUEST\n{}\n\n## SELECTOR CANDIDATES\n{}",
            request,
            selector_candidates(input.element)
        ));
    }

    sections.push(format!(
        "## GUIDANCE\n\
         - Element Type: {}\n\
         - Identifier: {}\n\
         - Use this information to understand layout and styling, or to debug CSS/HTML issues\n\
         - The element path shows the hierarchy from the selected element up to the document root{}",
        tag,
        identifier,
        if has_changes {
            "\n- Modified values are marked with comments showing original vs current values"
        } else {
            ""
        }
    ));

    sections.join("\n\n")
}

fn css_section(input: &SnapshotInput<'_>, element_id: u64, has_changes: bool) -> String {
    let mut lines = Vec::new();

    if has_changes {
        lines.push("/* ===== CSS CHANGES DETECTED ===== */".to_string());
        lines.push("/* Original vs modified values for this element: */".to_string());
        lines.push(String::new());
        for record in input.ledger.changes_for(element_id) {
            lines.push(format!("/* PROPERTY: {} */", record.property));
            lines.push(format!("/* ORIGINAL: {} */", record.original));
            lines.push(format!("/* MODIFIED: {} */", record.current));
            lines.push(format!("{}: {};", record.property, record.current));
            lines.push(String::new());
        }
        lines.push("/* ===== ORIGINAL CSS STYLES (for reference) ===== */".to_string());
    }

    let mut regular = Vec::new();
    for group in input.outcome.groups() {
        match group.provenance {
            Provenance::Inline => {
                regular.push("/* Inline Styles */".to_string());
                for prop in &group.properties {
                    regular.push(format!("{}: {};", prop.name, prop.value));
                }
                regular.push(String::new());
            }
            Provenance::Stylesheet => {
                regular.push(format!("{} {{", group.selector_label));
                for prop in &group.properties {
                    regular.push(format!("  {}: {};", prop.name, prop.value));
                }
                regular.push("}".to_string());
                regular.push(String::new());
            }
            Provenance::Inherited | Provenance::Computed => {}
        }
    }
    if input.blocked_sheets > 0 {
        regular.push(format!(
            "/* {} stylesheet(s) not accessible due to access restrictions */",
            input.blocked_sheets
        ));
    }
    if regular.iter().all(|l| l.is_empty()) {
        regular = vec!["/* No explicit CSS styles found */".to_string()];
    }

    lines.extend(regular);
    let text = lines.join("\n");
    text.trim_end().to_string()
}

fn key_computed_section(computed: Option<&ComputedStyle>) -> String {
    let mut lines = vec!["/* Key Computed Styles */".to_string()];
    if let Some(style) = computed {
        // The cascade stores box-model shorthands as longhands; fold
        // them back so `margin`/`padding`/`border` stay reportable.
        let mut longhands: Vec<StyleProperty> = style
            .properties
            .iter()
            .map(|(name, value)| StyleProperty::new(name.clone(), value.clone()))
            .collect();
        longhands.sort_by(|a, b| a.name.cmp(&b.name));
        let folded = shorthand::reconstruct(&longhands);
        for property in KEY_COMPUTED_PROPERTIES {
            if let Some(prop) = folded.iter().find(|p| p.name == *property) {
                if is_meaningful_value(property, &prop.value) {
                    lines.push(format!("{}: {};", property, prop.value));
                }
            }
        }
    }
    lines.join("\n")
}

/// Candidate selectors for targeting the element, most specific
/// first, each with a short rationale.
fn selector_candidates(element: &Rc<RefCell<Node>>) -> String {
    let mut lines = Vec::new();
    dom_tree::with_element(element, |elem| {
        let tag = elem.tag.to_lowercase();
        if let Some(id) = elem.id_attr() {
            lines.push(format!(
                "1. `#{}` — unique id, most specific and stable",
                id
            ));
        }
        for class in elem.classes() {
            lines.push(format!(
                "{}. `{}.{}` — tag plus class, may match similar elements",
                lines.len() + 1,
                tag,
                class
            ));
        }
        if let Some((name, value)) = elem
            .attributes
            .iter()
            .find(|(name, _)| !matches!(name.as_str(), "id" | "class" | "style"))
        {
            lines.push(format!(
                "{}. `{}[{}=\"{}\"]` — attribute match, useful when classes are dynamic",
                lines.len() + 1,
                tag,
                name,
                value
            ));
        }
        lines.push(format!(
            "{}. `{}` — bare tag, least specific, matches every {}",
            lines.len() + 1,
            tag,
            tag
        ));

        let best = if let Some(id) = elem.id_attr() {
            format!("#{}", id)
        } else if let Some(class) = elem.first_class() {
            format!("{}.{}", tag, class)
        } else {
            tag.clone()
        };
        lines.push(String::new());
        lines.push("Example rule:".to_string());
        lines.push(format!("```css\n{} {{\n  /* declarations */\n}}\n```", best));
        lines.push(String::new());
        lines.push("Example inline style:".to_string());
        lines.push("```html\nstyle=\"property: value\"\n```".to_string());
    });
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::rules::RuleMatcher;
    use crate::parser::dom_indices::DomIndices;
    use crate::parser::html::parse_document;
    use crate::style::css_matcher::{compute_document_styles, query_selector};
    use crate::style::owned_css::SheetRegistry;
    use crate::style::sheet::collect_document_sheets;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <head><style>.card { color: navy; font-size: 14px; }</style></head>
        <body><div id="wrap" class="outer"><p id="msg" class="card">Hello</p></div></body>
    "#;

    struct Setup {
        document: dom_tree::Document,
        registry: SheetRegistry,
        ledger: ChangeLedger,
    }

    fn setup() -> Setup {
        let document = parse_document(PAGE);
        let mut registry = SheetRegistry::new();
        collect_document_sheets(&document, &mut registry);
        Setup {
            document,
            registry,
            ledger: ChangeLedger::new(),
        }
    }

    fn snapshot_for(setup: &Setup, user_request: Option<&str>) -> String {
        let indices = DomIndices::build(&setup.document);
        let element = query_selector(&indices, "#msg").unwrap();
        let computed = compute_document_styles(&setup.document, &setup.registry);
        let matcher = RuleMatcher::new(&setup.registry, &computed);
        let outcome = matcher.match_rules(&element);
        let id = dom_tree::node_id(&element).unwrap();
        format_snapshot(&SnapshotInput {
            element: &element,
            outcome: &outcome,
            ledger: &setup.ledger,
            computed: computed.get(&id),
            blocked_sheets: setup.registry.blocked_count(),
            user_request,
        })
    }

    #[test]
    fn path_puts_target_first_with_marker() {
        let document = parse_document(PAGE);
        let indices = DomIndices::build(&document);
        let element = query_selector(&indices, "#msg").unwrap();
        let path = element_path_text(&element);
        let lines: Vec<&str> = path.lines().collect();
        assert_eq!(lines[0], "🎯 p#msg");
        assert_eq!(lines[1], "  📄 div#wrap");
        assert_eq!(lines[2], "    📄 body");
    }

    #[test]
    fn snapshot_contains_matched_rule_block() {
        let setup = setup();
        let snapshot = snapshot_for(&setup, None);
        assert!(snapshot.contains("## APPLIED CSS STYLES"));
        assert!(snapshot.contains(".card {"));
        assert!(snapshot.contains("color: navy;"));
        assert!(snapshot.contains("## KEY COMPUTED STYLES"));
        assert!(snapshot.contains("display: block;"));
    }

    #[test]
    fn key_computed_styles_fold_box_model_longhands() {
        let document = parse_document(
            r#"<head><style>p { margin: 12px; padding: 2px 6px; }</style></head>
               <body><p id="m">x</p></body>"#,
        );
        let mut registry = SheetRegistry::new();
        collect_document_sheets(&document, &mut registry);
        let computed = compute_document_styles(&document, &registry);
        let indices = DomIndices::build(&document);
        let element = query_selector(&indices, "#m").unwrap();
        let matcher = RuleMatcher::new(&registry, &computed);
        let outcome = matcher.match_rules(&element);
        let snapshot = format_snapshot(&SnapshotInput {
            element: &element,
            outcome: &outcome,
            ledger: &ChangeLedger::new(),
            computed: computed.get(&dom_tree::node_id(&element).unwrap()),
            blocked_sheets: 0,
            user_request: None,
        });

        let key_section = snapshot
            .split("## KEY COMPUTED STYLES")
            .nth(1)
            .expect("key computed section");
        assert!(key_section.contains("margin: 12px;"));
        assert!(key_section.contains("padding: 2px 6px;"));
    }

    #[test]
    fn edited_property_shows_original_and_modified_markers() {
        let mut setup = setup();
        {
            let indices = DomIndices::build(&setup.document);
            let element = query_selector(&indices, "#msg").unwrap();
            setup
                .ledger
                .record_change(&element, "font-size", "14px", "22px");
        }
        let snapshot = snapshot_for(&setup, None);
        assert!(snapshot.contains("## CSS STYLES (WITH MODIFICATIONS)"));
        assert!(snapshot.contains("/* ORIGINAL: 14px */"));
        assert!(snapshot.contains("/* MODIFIED: 22px */"));
    }

    #[test]
    fn unstyled_element_reports_no_explicit_css() {
        let document = parse_document("<section>plain</section>");
        let registry = SheetRegistry::new();
        let computed = compute_document_styles(&document, &registry);
        let indices = DomIndices::build(&document);
        let element = query_selector(&indices, "section").unwrap();
        let matcher = RuleMatcher::new(&registry, &computed);
        let outcome = matcher.match_rules(&element);
        let snapshot = format_snapshot(&SnapshotInput {
            element: &element,
            outcome: &outcome,
            ledger: &ChangeLedger::new(),
            computed: computed.get(&dom_tree::node_id(&element).unwrap()),
            blocked_sheets: 0,
            user_request: None,
        });
        assert!(snapshot.contains("/* No explicit CSS styles found */"));
    }

    #[test]
    fn user_request_adds_ranked_selector_candidates() {
        let setup = setup();
        let snapshot = snapshot_for(&setup, Some("make the text larger"));
        assert!(snapshot.contains("## USER REQUEST"));
        assert!(snapshot.contains("make the text larger"));
        let id_pos = snapshot.find("`#msg`").expect("id candidate");
        let class_pos = snapshot.find("`p.card`").expect("class candidate");
        let tag_pos = snapshot.rfind("`p` —").expect("tag candidate");
        assert!(id_pos < class_pos);
        assert!(class_pos < tag_pos);
        assert!(snapshot.contains("Example inline style:"));
        assert!(snapshot.contains(r#"style="property: value""#));
    }
}
