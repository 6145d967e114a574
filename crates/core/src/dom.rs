//! Minimal SVG node tree and serializer.
//!
//! The emitter speaks three verbs: create an element, set an attribute
//! (optionally namespace-qualified), append a child. Appending a node
//! that already has a parent moves it, matching live-DOM semantics.
//! Nodes never attached to the root are simply not serialized.

use std::io::{self, Write};

use crate::error::{RenderError, Result};
use crate::format::pf;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Handle to a node inside an [`SvgDocument`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    name: String,
    /// Attributes in insertion order; setting an existing name replaces
    /// its value in place so serialization stays deterministic.
    attrs: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    text: String,
}

/// An in-memory SVG tree plus its node storage.
#[derive(Debug, Default)]
pub struct SvgDocument {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SvgDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element in the SVG namespace.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
            text: String::new(),
        });
        id
    }

    /// Creates a root `<svg>` container with a viewBox.
    ///
    /// `skip_dimensions` omits the width/height presentation attributes
    /// (used for throwaway pattern sub-canvases).
    pub fn create_svg(&mut self, width: f64, height: f64, skip_dimensions: bool) -> Result<NodeId> {
        if !(width > 0.0) || !(height > 0.0) {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let svg = self.create_element("svg");
        self.set_attr(svg, "version", "1.1");
        if !skip_dimensions {
            self.set_attr(svg, "width", format!("{}px", pf(width)));
            self.set_attr(svg, "height", format!("{}px", pf(height)));
        }
        self.set_attr(svg, "preserveAspectRatio", "none");
        self.set_attr(svg, "viewBox", format!("0 0 {} {}", pf(width), pf(height)));
        Ok(svg)
    }

    /// Marks `id` as the document root for serialization.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Sets an attribute in the null namespace.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let node = &mut self.nodes[id.0];
        if let Some(slot) = node.attrs.iter_mut().find(|(k, _)| k.as_str() == name) {
            slot.1 = value;
        } else {
            node.attrs.push((name.to_string(), value));
        }
    }

    /// Sets a namespace-qualified attribute. The namespace URI is
    /// implied by the prefix of `qualified_name` (`xml:`, `xlink:`),
    /// declared once on the serialized root.
    pub fn set_attr_ns(
        &mut self,
        id: NodeId,
        _ns: &str,
        qualified_name: &str,
        value: impl Into<String>,
    ) {
        self.set_attr(id, qualified_name, value);
    }

    pub fn get_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attrs
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Appends `child` to `parent`, detaching it from any previous
    /// parent first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Removes `child` from `parent`'s child list, leaving it detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.retain(|c| *c != child);
        if self.nodes[child.0].parent == Some(parent) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Detaches and returns the first child of `parent`, if any.
    pub fn take_first_child(&mut self, parent: NodeId) -> Option<NodeId> {
        let children = &mut self.nodes[parent.0].children;
        if children.is_empty() {
            return None;
        }
        let child = children.remove(0);
        self.nodes[child.0].parent = None;
        Some(child)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.0].children.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Appends to a node's text content.
    pub fn append_text(&mut self, id: NodeId, text: &str) {
        self.nodes[id.0].text.push_str(text);
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Finds the first descendant of `id` (depth-first) with the given
    /// element name.
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Option<NodeId> {
        for &child in self.children(id) {
            if self.name(child) == name {
                return Some(child);
            }
            if let Some(found) = self.find_descendant(child, name) {
                return Some(found);
            }
        }
        None
    }

    /// Serializes the tree below the root to `out`.
    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.root {
            Some(root) => self.write_node(root, true, out),
            None => Ok(()),
        }
    }

    /// Serializes a single subtree to `out`. Namespace declarations are
    /// emitted on the top element when it is an `<svg>` root.
    pub fn write_node<W: Write>(&self, id: NodeId, is_root: bool, out: &mut W) -> io::Result<()> {
        let node = &self.nodes[id.0];
        write!(out, "<{}", node.name)?;
        if is_root && node.name == "svg" {
            write!(out, " xmlns=\"{SVG_NS}\" xmlns:xlink=\"{XLINK_NS}\"")?;
        }
        for (name, value) in &node.attrs {
            write!(
                out,
                " {}=\"{}\"",
                name,
                html_escape::encode_quoted_attribute(value)
            )?;
        }
        if node.children.is_empty() && node.text.is_empty() {
            return write!(out, "/>");
        }
        write!(out, ">")?;
        if !node.text.is_empty() {
            write!(out, "{}", html_escape::encode_text(&node.text))?;
        }
        for &child in &node.children {
            self.write_node(child, false, out)?;
        }
        write!(out, "</{}>", node.name)
    }

    /// Serializes the document to a string.
    pub fn to_svg_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write(&mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }
}
