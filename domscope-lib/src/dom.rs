use html5ever::QualName;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;

    /// Stable per-node identity assigned by the parser. Used wherever the
    /// engine needs to key state by element without owning the node
    /// (change ledger, computed-style map).
    pub type NodeId = u64;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
    }

    #[derive(Debug, Clone)]
    pub struct DocumentRootNode {
        pub children: Vec<Rc<RefCell<Node>>>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub id: NodeId,
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: std::collections::HashMap<String, String>,
        pub children: Vec<Rc<RefCell<Node>>>,
        pub parent: Option<Weak<RefCell<Node>>>,
        pub prev_sibling: Option<Weak<RefCell<Node>>>,
        pub next_sibling: Option<Rc<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Rc<RefCell<Node>>,
        pub doctype: RefCell<Option<Doctype>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl Default for DocumentRootNode {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ElementNode {
        pub fn new(id: NodeId, tag: String, qual_name: QualName) -> Self {
            ElementNode {
                id,
                tag,
                qual_name,
                attributes: std::collections::HashMap::new(),
                children: Vec::new(),
                parent: None,
                prev_sibling: None,
                next_sibling: None,
            }
        }

        pub fn attr(&self, name: &str) -> Option<&str> {
            self.attributes.get(name).map(String::as_str)
        }

        pub fn id_attr(&self) -> Option<&str> {
            self.attr("id")
        }

        pub fn classes(&self) -> Vec<&str> {
            self.attr("class")
                .map(|c| c.split_whitespace().collect())
                .unwrap_or_default()
        }

        pub fn first_class(&self) -> Option<&str> {
            self.classes().first().copied()
        }

        pub fn has_class(&self, class: &str) -> bool {
            self.classes().contains(&class)
        }

        /// Human-readable selector for this element: `tag#id` when an id is
        /// present, otherwise `tag.first-class`, otherwise the bare tag.
        pub fn selector_label(&self) -> String {
            let tag = self.tag.to_lowercase();
            if let Some(id) = self.id_attr() {
                format!("{}#{}", tag, id)
            } else if let Some(class) = self.first_class() {
                format!("{}.{}", tag, class)
            } else {
                tag
            }
        }

        /// Ordered view of the element's inline `style` attribute. The
        /// attribute string is the single source of truth; declaration
        /// order is preserved.
        pub fn inline_styles(&self) -> Vec<(String, String)> {
            parse_style_attribute(self.attr("style").unwrap_or(""))
        }

        pub fn inline_style_value(&self, property: &str) -> Option<String> {
            self.inline_styles()
                .into_iter()
                .find(|(name, _)| name == property)
                .map(|(_, value)| value)
        }

        /// Sets (or overwrites in place) one declaration in the inline
        /// `style` attribute, preserving the order of the existing ones.
        pub fn set_inline_style(&mut self, property: &str, value: &str) {
            let mut decls = self.inline_styles();
            match decls.iter_mut().find(|(name, _)| name == property) {
                Some(entry) => entry.1 = value.to_string(),
                None => decls.push((property.to_string(), value.to_string())),
            }
            self.write_style_attribute(&decls);
        }

        /// Removes one declaration from the inline `style` attribute. The
        /// attribute itself is dropped once no declarations remain.
        pub fn remove_inline_style(&mut self, property: &str) {
            let mut decls = self.inline_styles();
            decls.retain(|(name, _)| name != property);
            if decls.is_empty() {
                self.attributes.remove("style");
            } else {
                self.write_style_attribute(&decls);
            }
        }

        fn write_style_attribute(&mut self, decls: &[(String, String)]) {
            let text = decls
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            self.attributes.insert("style".to_string(), text);
        }
    }

    /// Parses a `style="..."` attribute value into ordered declarations.
    /// Malformed segments (no colon, empty name or value) are skipped.
    pub fn parse_style_attribute(text: &str) -> Vec<(String, String)> {
        text.split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim();
                let value = value.trim();
                if name.is_empty() || value.is_empty() {
                    None
                } else {
                    Some((name.to_string(), value.to_string()))
                }
            })
            .collect()
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
        }
    }

    /// Walks every element in the tree in document order.
    pub fn for_each_element<F>(node: &Rc<RefCell<Node>>, f: &mut F)
    where
        F: FnMut(&Rc<RefCell<Node>>),
    {
        let (is_element, children) = match &*node.borrow() {
            Node::DocumentRoot(root) => (false, root.children.clone()),
            Node::Element(elem) => (true, elem.children.clone()),
            Node::Text(_) => return,
        };
        if is_element {
            f(node);
        }
        for child in &children {
            for_each_element(child, f);
        }
    }

    /// Ancestor chain of an element, nearest first, stopping below the
    /// document root.
    pub fn ancestors(node: &Rc<RefCell<Node>>) -> Vec<Rc<RefCell<Node>>> {
        let mut chain = Vec::new();
        let mut current = parent_of(node);
        while let Some(parent) = current {
            if !matches!(&*parent.borrow(), Node::Element(_)) {
                break;
            }
            chain.push(Rc::clone(&parent));
            current = parent_of(&parent);
        }
        chain
    }

    pub fn parent_of(node: &Rc<RefCell<Node>>) -> Option<Rc<RefCell<Node>>> {
        match &*node.borrow() {
            Node::Element(elem) => elem.parent.as_ref().and_then(Weak::upgrade),
            _ => None,
        }
    }

    /// Runs a closure against the element payload of a node handle.
    /// Returns `None` for non-element nodes.
    pub fn with_element<R>(
        node: &Rc<RefCell<Node>>,
        f: impl FnOnce(&ElementNode) -> R,
    ) -> Option<R> {
        match &*node.borrow() {
            Node::Element(elem) => Some(f(elem)),
            _ => None,
        }
    }

    pub fn node_id(node: &Rc<RefCell<Node>>) -> Option<NodeId> {
        with_element(node, |elem| elem.id)
    }
}
