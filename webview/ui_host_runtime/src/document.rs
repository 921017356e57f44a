//! In-memory rendered tree.
//!
//! Stands in for the web view's element tree: the front-end only ever reads
//! ids and attributes from it and writes text, attributes, classes and values
//! back. Every element gets a fresh [`WidgetId`] when it is created, and ids
//! are never reused, so a widget replaced by fragment injection is a new
//! widget as far as the binder is concerned.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use roxmltree::{Node as XmlNode, ParsingOptions};

use crate::error::{UiError, UiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    elements: HashMap<WidgetId, Element>,
    root: WidgetId,
    next_id: u64,
}

fn parsing_options() -> ParsingOptions {
    ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    }
}

impl Document {
    /// Parse a page shell. The document element becomes the root widget.
    pub fn parse(markup: &str) -> UiResult<Self> {
        let xml = roxmltree::Document::parse_with_options(markup, parsing_options())?;
        let mut document = Self {
            elements: HashMap::new(),
            root: WidgetId(0),
            next_id: 0,
        };
        document.root = document.adopt(None, xml.root_element());
        Ok(document)
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn tag(&self, id: WidgetId) -> Option<&str> {
        self.elements.get(&id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.elements.get(&id).and_then(|el| el.parent)
    }

    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.elements
            .get(&id)
            .map(|el| el.children.as_slice())
            .unwrap_or(&[])
    }

    /// The element itself followed by its ancestors up to the root.
    pub fn ancestors_inclusive(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut chain = Vec::new();
        let mut current = self.contains(id).then_some(id);

        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }

        chain
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id`.
    pub fn walk(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = vec![id];

        while let Some(node) = stack.pop() {
            let Some(el) = self.elements.get(&node) else {
                continue;
            };
            out.push(node);
            stack.extend(el.children.iter().rev().copied());
        }

        out
    }

    pub fn element_by_id(&self, dom_id: &str) -> Option<WidgetId> {
        self.first_with_attr_value("id", dom_id)
    }

    pub fn elements_with_attr(&self, name: &str) -> Vec<WidgetId> {
        self.walk(self.root)
            .into_iter()
            .filter(|id| self.attr(*id, name).is_some())
            .collect()
    }

    pub fn first_with_attr_value(&self, name: &str, value: &str) -> Option<WidgetId> {
        self.walk(self.root)
            .into_iter()
            .find(|id| self.attr(*id, name) == Some(value))
    }

    pub fn first_descendant_with_attr(&self, id: WidgetId, name: &str) -> Option<WidgetId> {
        self.walk(id)
            .into_iter()
            .skip(1)
            .find(|node| self.attr(*node, name).is_some())
    }

    pub fn attr(&self, id: WidgetId, name: &str) -> Option<&str> {
        self.elements
            .get(&id)
            .and_then(|el| el.attrs.get(name))
            .map(String::as_str)
    }

    pub fn set_attr(&mut self, id: WidgetId, name: &str, value: &str) {
        if let Some(el) = self.elements.get_mut(&id) {
            el.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn has_class(&self, id: WidgetId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Add `class` when `on`, remove it otherwise.
    pub fn toggle_class(&mut self, id: WidgetId, class: &str, on: bool) {
        let Some(el) = self.elements.get_mut(&id) else {
            return;
        };

        let mut classes: Vec<String> = el
            .attrs
            .get("class")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);

        match (on, present) {
            (true, false) => classes.push(class.to_string()),
            (false, true) => classes.retain(|c| c != class),
            _ => return,
        }

        if classes.is_empty() {
            el.attrs.remove("class");
        } else {
            el.attrs.insert("class".to_string(), classes.join(" "));
        }
    }

    /// Own text followed by the text of every descendant.
    pub fn text_content(&self, id: WidgetId) -> String {
        let parts: Vec<&str> = self
            .walk(id)
            .into_iter()
            .filter_map(|node| self.elements.get(&node))
            .map(|el| el.text.as_str())
            .filter(|text| !text.is_empty())
            .collect();
        parts.join(" ")
    }

    /// Replace all content of `id` with plain text.
    pub fn set_text(&mut self, id: WidgetId, text: &str) {
        self.clear_children(id);
        if let Some(el) = self.elements.get_mut(&id) {
            el.text = text.to_string();
        }
    }

    /// Current value of a form control, with the same fallbacks a browser
    /// applies before anyone has touched the control.
    pub fn value(&self, id: WidgetId) -> String {
        let Some(el) = self.elements.get(&id) else {
            return String::new();
        };

        if let Some(value) = &el.value {
            return value.clone();
        }

        match el.tag.as_str() {
            "select" => {
                let options = self.option_elements(id);
                options
                    .iter()
                    .find(|option| self.attr(**option, "selected").is_some())
                    .or_else(|| options.first())
                    .map(|option| self.option_value(*option))
                    .unwrap_or_default()
            }
            "textarea" => self.text_content(id),
            _ => el.attrs.get("value").cloned().unwrap_or_default(),
        }
    }

    pub fn set_value(&mut self, id: WidgetId, value: &str) {
        if let Some(el) = self.elements.get_mut(&id) {
            el.value = Some(value.to_string());
        }
    }

    /// Declared option values of a `select`.
    pub fn options(&self, id: WidgetId) -> Vec<String> {
        self.option_elements(id)
            .into_iter()
            .map(|option| self.option_value(option))
            .collect()
    }

    fn option_elements(&self, id: WidgetId) -> Vec<WidgetId> {
        self.walk(id)
            .into_iter()
            .skip(1)
            .filter(|node| self.tag(*node) == Some("option"))
            .collect()
    }

    fn option_value(&self, option: WidgetId) -> String {
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(option))
    }

    /// Replace the content of `id` with parsed markup.
    ///
    /// The markup is parsed before anything is touched, so a parse failure
    /// leaves the region exactly as it was.
    pub fn set_inner_markup(&mut self, id: WidgetId, markup: &str) -> UiResult<()> {
        if !self.contains(id) {
            return Err(UiError::Markup(format!("target {id} is not in the tree")));
        }

        let wrapped = format!("<fragment>{markup}</fragment>");
        let xml = roxmltree::Document::parse_with_options(&wrapped, parsing_options())?;

        self.clear_children(id);
        let (children, text) = self.adopt_children(id, xml.root_element());
        if let Some(el) = self.elements.get_mut(&id) {
            el.children = children;
            el.text = text;
        }

        Ok(())
    }

    /// Append a new element under `parent`. Returns `None` if the parent is
    /// not in the tree.
    pub fn append_element(
        &mut self,
        parent: WidgetId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Option<WidgetId> {
        if !self.contains(parent) {
            return None;
        }

        let id = self.allocate();
        self.elements.insert(
            id,
            Element {
                tag: tag.to_string(),
                attrs: attrs
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
                text: text.to_string(),
                value: None,
                parent: Some(parent),
                children: Vec::new(),
            },
        );

        if let Some(el) = self.elements.get_mut(&parent) {
            el.children.push(id);
        }

        Some(id)
    }

    /// Drop every child of `id` (and their subtrees) plus its own text.
    pub fn clear_children(&mut self, id: WidgetId) {
        let Some(el) = self.elements.get_mut(&id) else {
            return;
        };

        let children = std::mem::take(&mut el.children);
        el.text.clear();

        for child in children {
            self.remove_subtree(child);
        }
    }

    fn remove_subtree(&mut self, id: WidgetId) {
        let mut stack = vec![id];

        while let Some(node) = stack.pop() {
            if let Some(el) = self.elements.remove(&node) {
                stack.extend(el.children);
            }
        }
    }

    fn allocate(&mut self) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        id
    }

    fn adopt(&mut self, parent: Option<WidgetId>, node: XmlNode<'_, '_>) -> WidgetId {
        let id = self.allocate();
        let attrs = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();

        self.elements.insert(
            id,
            Element {
                tag: node.tag_name().name().to_ascii_lowercase(),
                attrs,
                text: String::new(),
                value: None,
                parent,
                children: Vec::new(),
            },
        );

        let (children, text) = self.adopt_children(id, node);
        if let Some(el) = self.elements.get_mut(&id) {
            el.children = children;
            el.text = text;
        }

        id
    }

    fn adopt_children(&mut self, parent: WidgetId, node: XmlNode<'_, '_>) -> (Vec<WidgetId>, String) {
        let mut children = Vec::new();
        let mut text = String::new();

        for child in node.children() {
            if child.is_element() {
                children.push(self.adopt(Some(parent), child));
                continue;
            }

            if !child.is_text() {
                continue;
            }

            if let Some(chunk) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(chunk);
            }
        }

        (children, text)
    }
}
