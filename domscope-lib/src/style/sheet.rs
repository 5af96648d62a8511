//! Stylesheet parsing and document sheet collection.
//!
//! Raw CSS text is parsed with LightningCSS and converted into the
//! fully-owned rule types in [`owned_css`], so no borrowed lifetimes
//! leak into the rest of the engine. `@media` contents are flattened
//! into the rule list; other at-rules carry no matchable declarations
//! and are skipped.

use crate::dom::dom_tree::{self, Node};
use crate::error::Error;
use crate::style::owned_css::{
    OwnedDeclaration, OwnedRule, OwnedStylesheet, SheetOrigin, SheetRegistry,
};
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{style::StyleRule, CssRule};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use std::cell::RefCell;
use std::rc::Rc;

/// Parses a raw CSS string into a fully-owned stylesheet.
pub fn parse_stylesheet(css_text: &str) -> Result<OwnedStylesheet, Error> {
    let parser_opts = ParserOptions::default();
    let sheet = LightningStyleSheet::parse(css_text, parser_opts)
        .map_err(|e| Error::Css(e.to_string()))?;

    let mut owned_rules = Vec::new();
    for rule in &sheet.rules.0 {
        match rule {
            CssRule::Style(style_rule) => {
                owned_rules.push(convert_style_rule(style_rule)?);
            }
            CssRule::Media(media_rule) => {
                for inner_rule in &media_rule.rules.0 {
                    if let CssRule::Style(sr) = inner_rule {
                        owned_rules.push(convert_style_rule(sr)?);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(OwnedStylesheet { rules: owned_rules })
}

/// Copies a single StyleRule's selectors and declarations into an
/// OwnedRule. Normal and `!important` declarations are combined into
/// one vector, the latter tagged with the `important` flag.
fn convert_style_rule(style_rule: &StyleRule<'_>) -> Result<OwnedRule, Error> {
    let mut selectors_vec = Vec::new();
    for selector in &style_rule.selectors.0 {
        if let Ok(sel_str) = selector.to_css_string(Default::default()) {
            selectors_vec.push(sel_str);
        }
    }

    let block = &style_rule.declarations;
    let mut decls_vec = Vec::new();

    for property in &block.declarations {
        decls_vec.push(convert_declaration(property, false)?);
    }
    for property in &block.important_declarations {
        decls_vec.push(convert_declaration(property, true)?);
    }

    Ok(OwnedRule {
        selectors: selectors_vec,
        declarations: decls_vec,
        source_order: 0,
    })
}

fn convert_declaration(
    property: &lightningcss::properties::Property<'_>,
    important: bool,
) -> Result<OwnedDeclaration, Error> {
    let property_name = property.property_id().name().to_string();
    let property_value = property
        .value_to_css_string(PrinterOptions::default())
        .map_err(|e| Error::Css(e.to_string()))?;
    Ok(OwnedDeclaration {
        property: property_name,
        value: property_value,
        important,
    })
}

/// Walks the document and registers every stylesheet it references:
/// `<style>` element contents are parsed and registered as accessible
/// sheets, `<link rel="stylesheet">` references are registered as
/// blocked since their rules cannot be read without fetching them.
/// A `<style>` block that fails to parse is logged and skipped.
pub fn collect_document_sheets(document: &dom_tree::Document, registry: &mut SheetRegistry) {
    dom_tree::for_each_element(&document.root, &mut |node| {
        let tag = dom_tree::with_element(node, |elem| elem.tag.to_lowercase());
        match tag.as_deref() {
            Some("style") => {
                let css_text = collect_text(node);
                match parse_stylesheet(&css_text) {
                    Ok(sheet) => registry.register(SheetOrigin::StyleElement, sheet),
                    Err(err) => log::warn!("skipping unparseable <style> block: {}", err),
                }
            }
            Some("link") => {
                let href = dom_tree::with_element(node, |elem| {
                    let is_stylesheet = elem
                        .attr("rel")
                        .map(|rel| rel.eq_ignore_ascii_case("stylesheet"))
                        .unwrap_or(false);
                    if is_stylesheet {
                        elem.attr("href").map(str::to_string)
                    } else {
                        None
                    }
                })
                .flatten();
                if let Some(href) = href {
                    log::debug!("stylesheet link registered as blocked: {}", href);
                    registry.register_blocked(SheetOrigin::Linked { href });
                }
            }
            _ => {}
        }
    });
}

fn collect_text(node: &Rc<RefCell<Node>>) -> String {
    let mut text = String::new();
    if let Node::Element(elem) = &*node.borrow() {
        for child in &elem.children {
            if let Node::Text(chunk) = &*child.borrow() {
                text.push_str(chunk);
            }
        }
    }
    text
}
