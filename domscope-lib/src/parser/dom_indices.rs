use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::dom_tree::{self, Document, Node};

/// Document-wide lookup maps used to narrow selector queries before full
/// right-to-left matching. Rebuilt whenever a new document is loaded.
#[derive(Debug, Default)]
pub struct DomIndices {
    /// Maps an element's "id" attribute to the corresponding node. First
    /// occurrence wins, matching browser `getElementById` behavior.
    pub id_map: HashMap<String, Rc<RefCell<Node>>>,
    /// Maps a class name to all nodes carrying that class.
    pub class_map: HashMap<String, Vec<Rc<RefCell<Node>>>>,
    /// Maps a lowercase tag name to all nodes with that tag.
    pub tag_map: HashMap<String, Vec<Rc<RefCell<Node>>>>,
    /// Every element in document order, for selectors the maps cannot
    /// narrow (attribute-only, universal).
    pub all_elements: Vec<Rc<RefCell<Node>>>,
}

impl DomIndices {
    /// Builds the indices for an entire document.
    pub fn build(document: &Document) -> Self {
        let mut indices = DomIndices::default();
        dom_tree::for_each_element(&document.root, &mut |node| {
            indices.index_element(node);
        });
        indices
    }

    fn index_element(&mut self, node: &Rc<RefCell<Node>>) {
        self.all_elements.push(Rc::clone(node));
        dom_tree::with_element(node, |elem| {
            self.tag_map
                .entry(elem.tag.to_lowercase())
                .or_default()
                .push(Rc::clone(node));
            if let Some(id_value) = elem.id_attr() {
                self.id_map
                    .entry(id_value.to_string())
                    .or_insert_with(|| Rc::clone(node));
            }
            for class in elem.classes() {
                self.class_map
                    .entry(class.to_string())
                    .or_default()
                    .push(Rc::clone(node));
            }
        });
    }

    /// Candidate nodes for a selector's key compound, narrowed by id,
    /// then class, then tag. Falls back to all elements.
    pub fn candidates(
        &self,
        id: Option<&str>,
        class: Option<&str>,
        tag: Option<&str>,
    ) -> Vec<Rc<RefCell<Node>>> {
        if let Some(id) = id {
            return self.id_map.get(id).map(|n| vec![Rc::clone(n)]).unwrap_or_default();
        }
        if let Some(class) = class {
            return self.class_map.get(class).cloned().unwrap_or_default();
        }
        if let Some(tag) = tag {
            return self.tag_map.get(&tag.to_lowercase()).cloned().unwrap_or_default();
        }
        self.all_elements.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::parse_document;

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let document = parse_document(r#"<p id="x" class="a">1</p><div id="x">2</div>"#);
        let indices = DomIndices::build(&document);
        let node = indices.id_map.get("x").expect("indexed");
        let tag = dom_tree::with_element(node, |e| e.tag.clone()).unwrap();
        assert_eq!(tag, "p");
    }

    #[test]
    fn candidates_narrow_by_most_selective_key() {
        let document =
            parse_document(r#"<div class="a">1</div><div class="a b">2</div><span>3</span>"#);
        let indices = DomIndices::build(&document);
        assert_eq!(indices.candidates(None, Some("a"), Some("div")).len(), 2);
        assert_eq!(indices.candidates(None, None, Some("span")).len(), 1);
        // html/head/body wrappers are elements too
        assert_eq!(
            indices.candidates(None, None, None).len(),
            indices.all_elements.len()
        );
    }
}
