//! Arena-backed document model for rendered book sections.
//!
//! A rendered section lives in a [`Document`]: a flat arena of nodes addressed
//! by [`NodeId`]. Nodes are never freed. Detaching a node only clears its
//! parent link, so ids carried by mutation records stay valid after removal.
//! Child-list changes are delivered to every [`MutationObserver`] whose root
//! contains the mutated node, in the order they were committed.

mod html;
mod observer;

pub use html::{decode_entities, escape_text};
pub use observer::{MutationObserver, MutationRecord};

use observer::Registration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One rendered section: a `<body>` root plus every node ever created in it.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    observers: Vec<Registration>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let body = Node {
            data: NodeData::Element(ElementData::new("body")),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            observers: Vec::new(),
        }
    }

    /// Build a document whose body holds the parsed `markup`.
    pub fn from_body_html(markup: &str) -> Self {
        let mut doc = Self::new();
        let body = doc.body;
        for child in html::parse_fragment(&mut doc, markup) {
            doc.link(body, child);
        }
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|node| &node.data)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element(element) => Some(element.tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|sibling| *sibling == id)?;
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .find(|sibling| self.tag_name(*sibling).is_some())
    }

    /// Inclusive ancestor test.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    /// Nearest inclusive ancestor with the given tag, stopping at the body.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_element(node, tag) {
                return Some(node);
            }
            if node == self.body {
                return None;
            }
            current = self.parent(node);
        }
        None
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element(element) => element
                .attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(NodeData::Element(element)) = self.nodes.get_mut(id.0).map(|node| &mut node.data)
        else {
            return;
        };
        match element
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => element
                .attrs
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let Some(NodeData::Element(element)) = self.nodes.get_mut(id.0).map(|node| &mut node.data)
        else {
            return false;
        };
        let before = element.attrs.len();
        element.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        element.attrs.len() != before
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|name| name == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.tag_name(id).is_none() || self.has_class(id, class) {
            return;
        }
        let value = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &value);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(existing) = self.attribute(id, "class") else {
            return;
        };
        let value = existing
            .split_ascii_whitespace()
            .filter(|name| *name != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &value);
    }

    /// Descendant elements of `root` with the given tag, in document order.
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.is_element(id, tag) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element(_)) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        html::serialize_children(self, id, &mut out);
        out
    }

    /// Replace every child of `id` with the parsed `markup`, as one mutation.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        if self.tag_name(id).is_none() {
            return;
        }
        let removed = std::mem::take(&mut self.nodes[id.0].children);
        for child in &removed {
            self.nodes[child.0].parent = None;
        }
        let added = html::parse_fragment(self, markup);
        for child in &added {
            self.link(id, *child);
        }
        self.notify(MutationRecord {
            target: id,
            added,
            removed,
        });
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or last). Moving a
    /// node that already has a parent records its removal there first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> bool {
        if self.tag_name(parent).is_none()
            || self.node(child).is_none()
            || self.contains(child, parent)
        {
            return false;
        }
        self.detach(child);
        let siblings = &self.nodes[parent.0].children;
        let position = reference
            .and_then(|reference| siblings.iter().position(|sibling| *sibling == reference))
            .unwrap_or(siblings.len());
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        self.notify(MutationRecord {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        true
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    /// Hoist the children of `id` into its parent at its position and drop
    /// the element itself. Recorded as a single child-list change on the parent.
    pub fn unwrap_element(&mut self, id: NodeId) -> bool {
        if self.tag_name(id).is_none() {
            return false;
        }
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(position) = self.nodes[parent.0]
            .children
            .iter()
            .position(|sibling| *sibling == id)
        else {
            return false;
        };
        let hoisted = std::mem::take(&mut self.nodes[id.0].children);
        for child in &hoisted {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(position..=position, hoisted.iter().copied());
        self.nodes[id.0].parent = None;
        self.notify(MutationRecord {
            target: parent,
            added: hoisted,
            removed: vec![id],
        });
        true
    }

    /// Start observing child-list changes in the subtree rooted at `root`.
    pub fn observe(&mut self, root: NodeId) -> MutationObserver {
        let (registration, observer) = observer::channel(root);
        self.observers.push(registration);
        observer
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        self.nodes[parent.0].children.retain(|sibling| *sibling != child);
        self.nodes[child.0].parent = None;
        self.notify(MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
        });
    }

    /// Attach without recording; only for building detached subtrees.
    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn notify(&mut self, record: MutationRecord) {
        if self.observers.is_empty() || (record.added.is_empty() && record.removed.is_empty()) {
            return;
        }
        let interested: Vec<bool> = self
            .observers
            .iter()
            .map(|registration| self.contains(registration.root(), record.target))
            .collect();
        let mut flags = interested.into_iter();
        self.observers.retain(|registration| {
            let wanted = flags.next().unwrap_or(false);
            !wanted || registration.deliver(record.clone())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_serializes_body_markup() {
        let doc = Document::from_body_html(r#"<p class="a">One &amp; <b>two</b></p><p>x<br>y</p>"#);
        assert_eq!(
            doc.inner_html(doc.body()),
            r#"<p class="a">One &amp; <b>two</b></p><p>x<br>y</p>"#
        );
        assert_eq!(doc.elements_by_tag(doc.body(), "p").len(), 2);
    }

    #[test]
    fn unwrap_hoists_children_in_place() {
        let mut doc = Document::from_body_html("<p>a<font><font>b</font></font>c</p>");
        let p = doc.elements_by_tag(doc.body(), "p")[0];
        let outer = doc.elements_by_tag(p, "font")[0];
        assert!(doc.unwrap_element(outer));
        assert_eq!(doc.inner_html(p), "a<font>b</font>c");
        assert!(!doc.is_connected(outer));
    }

    #[test]
    fn observer_sees_subtree_mutations_until_dropped() {
        let mut doc = Document::from_body_html("<p>a</p>");
        let p = doc.elements_by_tag(doc.body(), "p")[0];
        let mut observer = doc.observe(doc.body());
        doc.set_inner_html(p, "b");
        let records = observer.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, p);
        assert_eq!(records[0].removed.len(), 1);

        drop(observer);
        doc.set_inner_html(p, "c");
        assert!(doc.observers.is_empty());
    }

    #[test]
    fn class_helpers_keep_other_classes() {
        let mut doc = Document::from_body_html(r#"<p class="x">a</p>"#);
        let p = doc.elements_by_tag(doc.body(), "p")[0];
        doc.add_class(p, "notranslate");
        doc.add_class(p, "notranslate");
        assert_eq!(doc.attribute(p, "class"), Some("x notranslate"));
        doc.remove_class(p, "x");
        assert!(doc.has_class(p, "notranslate"));
        assert!(!doc.has_class(p, "x"));
    }

    #[test]
    fn previous_element_sibling_skips_text() {
        let doc = Document::from_body_html("<p>a</p> text <div>b</div>");
        let div = doc.elements_by_tag(doc.body(), "div")[0];
        let p = doc.elements_by_tag(doc.body(), "p")[0];
        assert_eq!(doc.previous_element_sibling(div), Some(p));
        assert_eq!(doc.previous_element_sibling(p), None);
    }
}
