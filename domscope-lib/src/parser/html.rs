//! HTML parsing into the domscope DOM tree.
//!
//! Uses html5ever as the parser and builds the tree defined in
//! `crate::dom::dom_tree`, assigning every element a stable [`NodeId`]
//! and wiring parent/sibling back-pointers for selector matching.

use crate::dom::dom_tree;
use crate::dom::dom_tree::NodeId;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Parses HTML content into a [`dom_tree::Document`].
pub fn parse_document(html_content: &str) -> dom_tree::Document {
    let sink = DomScopeTreeSink::new();
    html5ever::parse_document(sink, Default::default()).one(html_content.to_string())
}

/// TreeSink building the domscope DOM. Holds the document under
/// construction, the current quirks mode, and the element id counter.
pub struct DomScopeTreeSink {
    document: dom_tree::Document,
    quirks_mode: RefCell<QuirksMode>,
    next_id: RefCell<NodeId>,
}

impl DomScopeTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
            next_id: RefCell::new(1),
        }
    }

    fn allocate_id(&self) -> NodeId {
        let mut next = self.next_id.borrow_mut();
        let id = *next;
        *next += 1;
        id
    }
}

impl Default for DomScopeTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct DomScopeElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for DomScopeElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for DomScopeTreeSink {
    type Handle = Rc<RefCell<dom_tree::Node>>;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = DomScopeElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        log::debug!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        if let dom_tree::Node::Element(ref elem) = *target.borrow() {
            DomScopeElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            }
        } else {
            panic!("elem_name called on non-element node")
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let tag = name.local.to_string();
        let mut element = dom_tree::ElementNode::new(self.allocate_id(), tag, name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        Rc::new(RefCell::new(dom_tree::Node::Element(element)))
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        // Comments carry no style information; an empty text node keeps
        // the tree shape without affecting inspection.
        Rc::new(RefCell::new(dom_tree::Node::Text(String::new())))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        let combined = format!("{} {}", target, data);
        Rc::new(RefCell::new(dom_tree::Node::Text(combined)))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let child_handle = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                Rc::new(RefCell::new(dom_tree::Node::Text(text.to_string())))
            }
        };

        // Wire parent and sibling pointers for element children, then
        // push into the parent's child list.
        let prev_element = {
            let parent_borrow = parent.borrow();
            let children = match &*parent_borrow {
                dom_tree::Node::DocumentRoot(root) => &root.children,
                dom_tree::Node::Element(elem) => &elem.children,
                dom_tree::Node::Text(_) => return,
            };
            children
                .iter()
                .rev()
                .find(|c| matches!(*c.borrow(), dom_tree::Node::Element(_)))
                .cloned()
        };

        if let dom_tree::Node::Element(ref mut child_elem) = *child_handle.borrow_mut() {
            child_elem.parent = Some(Rc::downgrade(parent));
            if let Some(ref prev) = prev_element {
                child_elem.prev_sibling = Some(Rc::downgrade(prev));
            }
        }
        if matches!(*child_handle.borrow(), dom_tree::Node::Element(_)) {
            if let Some(ref prev) = prev_element {
                if let dom_tree::Node::Element(ref mut prev_elem) = *prev.borrow_mut() {
                    prev_elem.next_sibling = Some(child_handle.clone());
                }
            }
        }

        match &mut *parent.borrow_mut() {
            dom_tree::Node::DocumentRoot(root) => root.children.push(child_handle),
            dom_tree::Node::Element(elem) => elem.children.push(child_handle),
            dom_tree::Node::Text(_) => {}
        }
    }

    fn append_based_on_parent_node(
        &self,
        _element: &Self::Handle,
        _prev_element: &Self::Handle,
        _child: NodeOrText<Self::Handle>,
    ) {
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    fn pop(&self, _node: &Self::Handle) {}

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, _sibling: &Self::Handle, _child: NodeOrText<Self::Handle>) {}

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let dom_tree::Node::Element(ref mut elem) = *target.borrow_mut() {
            for attr in attrs {
                let key = attr.name.local.to_string();
                elem.attributes
                    .entry(key)
                    .or_insert_with(|| attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, _target: &Self::Handle) {}

    fn reparent_children(&self, _node: &Self::Handle, _new_parent: &Self::Handle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::{self, Node};
    use pretty_assertions::assert_eq;

    fn collect_structure(node: &Rc<RefCell<Node>>, depth: usize, output: &mut String) {
        match &*node.borrow() {
            Node::DocumentRoot(root) => {
                for child in &root.children {
                    collect_structure(child, depth, output);
                }
            }
            Node::Element(elem) => {
                output.push_str(&format!("{}<{}>\n", "  ".repeat(depth), elem.tag));
                for child in &elem.children {
                    collect_structure(child, depth + 1, output);
                }
            }
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    output.push_str(&format!("{}{}\n", "  ".repeat(depth), trimmed));
                }
            }
        }
    }

    fn structure(html: &str) -> String {
        let document = parse_document(html);
        let mut output = String::new();
        collect_structure(&document.root, 0, &mut output);
        output
    }

    #[test]
    fn basic_structure() {
        let html = r#"<!DOCTYPE html>
            <html><head><title>Test</title></head>
            <body><h1>Hello</h1><p>World</p></body></html>"#;

        let expected = r#"
<html>
  <head>
    <title>
      Test
  <body>
    <h1>
      Hello
    <p>
      World
"#;
        assert_eq!(structure(html).trim(), expected.trim());
    }

    #[test]
    fn element_ids_are_unique_and_stable() {
        let document = parse_document("<div id=a><p>x</p><p>y</p></div>");
        let mut seen = Vec::new();
        dom_tree::for_each_element(&document.root, &mut |node| {
            seen.push(dom_tree::node_id(node).unwrap());
        });
        let mut deduped = seen.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(seen.len(), deduped.len());
    }

    #[test]
    fn sibling_pointers_are_wired() {
        let document = parse_document("<ul><li id=a>1</li><li id=b>2</li></ul>");
        let mut second = None;
        dom_tree::for_each_element(&document.root, &mut |node| {
            if dom_tree::with_element(node, |e| e.id_attr() == Some("b")).unwrap_or(false) {
                second = Some(Rc::clone(node));
            }
        });
        let second = second.expect("second <li> present");
        let prev = dom_tree::with_element(&second, |elem| {
            elem.prev_sibling
                .as_ref()
                .and_then(|weak| weak.upgrade())
                .and_then(|node| dom_tree::with_element(&node, |e| e.selector_label()))
        })
        .flatten();
        assert_eq!(prev.as_deref(), Some("li#a"));
    }

    #[test]
    fn malformed_html_is_recovered() {
        let html = "<div><p>Unclosed<img></div>";
        let expected = r#"
<html>
  <head>
  <body>
    <div>
      <p>
        Unclosed
        <img>
"#;
        assert_eq!(structure(html).trim(), expected.trim());
    }
}
