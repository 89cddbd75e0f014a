//! Minimal HTML element tree with escaping.

use std::fmt::Write;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Tag),
    Text(String),
    /// Already rendered markup
    Raw(String),
}

impl Node {
    fn render_into(&self, out: &mut String) {
        match self {
            Node::Element(tag) => tag.render_into(out),
            Node::Text(text) => out.push_str(&escape(text)),
            Node::Raw(html) => out.push_str(html),
        }
    }
}

impl From<Tag> for Node {
    fn from(tag: Tag) -> Self {
        Node::Element(tag)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

const VOID_ELEMENTS: &[&str] = &["br", "img", "input", "meta", "link", "hr"];

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: &'static str,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    styles: Vec<String>,
    children: Vec<Node>,
}

impl Tag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            classes: Vec::new(),
            styles: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    pub fn attr_if(self, cond: bool, name: impl Into<String>, value: impl Into<String>) -> Self {
        if cond {
            self.attr(name, value)
        } else {
            self
        }
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !class.is_empty() && !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.styles.push(style.into());
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn maybe_child(self, node: Option<impl Into<Node>>) -> Self {
        match node {
            Some(node) => self.child(node),
            None => self,
        }
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn raw(mut self, html: impl Into<String>) -> Self {
        self.children.push(Node::Raw(html.into()));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn render_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.name);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&self.classes.join(" ")));
        }
        if !self.styles.is_empty() {
            let _ = write!(out, " style=\"{}\"", escape(&self.styles.join("; ")));
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&self.name) {
            return;
        }

        for child in &self.children {
            child.render_into(out);
        }
        let _ = write!(out, "</{}>", self.name);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

pub fn div() -> Tag {
    Tag::new("div")
}

pub fn span() -> Tag {
    Tag::new("span")
}

pub fn br() -> Tag {
    Tag::new("br")
}

pub fn link(text: impl Into<Node>, href: impl Into<String>) -> Tag {
    Tag::new("a").attr("href", href).child(text)
}

pub fn button(name: &str, label: impl Into<Node>) -> Tag {
    Tag::new("button").attr("type", "button").attr("name", name).child(label)
}

pub fn hidden(name: &str, value: impl Into<String>) -> Tag {
    Tag::new("input").attr("type", "hidden").attr("name", name).attr("value", value)
}

/// Radio button list with the option equal to `selected` checked.
pub fn radio_list(name: &str, selected: i64, options: &[(&str, i64)]) -> Tag {
    let mut list = Tag::new("ul").class("radio-list-control");
    for (i, (label, value)) in options.iter().enumerate() {
        let id = format!("{}_{}", name, i);
        let input = Tag::new("input")
            .attr("type", "radio")
            .attr("id", id.clone())
            .attr("name", name)
            .attr("value", value.to_string())
            .attr_if(*value == selected, "checked", "checked");
        list = list.child(Tag::new("li").child(input).child(Tag::new("label").attr("for", id).child(*label)));
    }
    list
}

pub fn text_box(name: &str, value: &str) -> Tag {
    Tag::new("input")
        .attr("type", "text")
        .attr("id", name.replace(['[', ']'], "_"))
        .attr("name", name)
        .attr("value", value)
}
