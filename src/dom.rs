//! HTML documents backed by `scraper`.
//!
//! Markup is parsed with html5ever into scraper's node tree, edited in
//! place, and serialized back with html5ever's serializer. This covers what
//! the shell and the bootstrap need from a DOM: stripping elements,
//! extracting body text, and re-creating executable nodes so a host
//! renderer runs them after the document is swapped in.

use std::fmt::Write as _;

use ego_tree::NodeId;
use scraper::node::{Doctype, Element, Text};
use scraper::{ElementRef, Html, Node};

/// Elements whose content never reaches the text body.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements rendered on their own lines.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// A parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Serialized doctype, e.g. `<!DOCTYPE html>`.
    pub doctype: Option<String>,
    html: Html,
}

impl Document {
    /// Parses markup the way a browser would, recovering from errors.
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let doctype = html.tree.root().children().find_map(|node| match node.value() {
            Node::Doctype(doctype) => Some(serialize_doctype(doctype)),
            _ => None,
        });
        log::debug!("parsed document with {} nodes", html.tree.values().count());
        Self { doctype, html }
    }

    /// Returns the underlying scraper tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Returns the `head` element.
    pub fn head(&self) -> Option<ElementRef<'_>> {
        self.child_of_root("head")
    }

    /// Returns the `body` element.
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.child_of_root("body")
    }

    fn child_of_root(&self, name: &str) -> Option<ElementRef<'_>> {
        self.html
            .root_element()
            .child_elements()
            .find(|e| e.value().name() == name)
    }

    /// Returns the document title text.
    pub fn title(&self) -> Option<String> {
        self.html
            .root_element()
            .descendent_elements()
            .find(|e| e.value().name() == "title")
            .map(|title| title.text().collect())
    }

    /// Removes every `noscript` element.
    pub fn remove_noscript(&mut self) -> usize {
        let outermost: Vec<NodeId> = self
            .html
            .root_element()
            .descendent_elements()
            .filter(|e| e.value().name() == "noscript")
            .filter(|e| {
                !e.ancestors()
                    .any(|a| a.value().as_element().is_some_and(|p| p.name() == "noscript"))
            })
            .map(|e| e.id())
            .collect();
        for id in &outermost {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
            }
        }
        outermost.len()
    }

    /// Moves `script` and icon `link` elements to the end of their parent.
    ///
    /// Scripts are replaced by fresh elements carrying only `type`, `src`
    /// and their inline text, since a renderer does not run a script node
    /// that is merely moved. Icon links are moved as they are. Returns the
    /// number of re-created scripts.
    pub fn rehome_executable_nodes(&mut self) -> usize {
        let parents: Vec<NodeId> = self
            .html
            .root_element()
            .descendent_elements()
            .filter(|e| !is_executable(e.value()))
            .map(|e| e.id())
            .collect();
        parents
            .into_iter()
            .map(|parent| self.rehome_children(parent))
            .sum()
    }

    fn rehome_children(&mut self, parent: NodeId) -> usize {
        let Some(node) = self.html.tree.get(parent) else {
            return 0;
        };
        let moved: Vec<NodeId> = node
            .children()
            .filter(|child| child.value().as_element().is_some_and(is_executable))
            .map(|child| child.id())
            .collect();

        let mut recreated = 0;
        for id in moved {
            let script = self
                .html
                .tree
                .get(id)
                .and_then(ElementRef::wrap)
                .filter(|e| e.value().name() == "script")
                .map(|e| (recreate_script(e.value()), e.text().collect::<String>()));

            let child = match script {
                Some((element, text)) => {
                    if let Some(mut old) = self.html.tree.get_mut(id) {
                        old.detach();
                    }
                    let mut fresh = self.html.tree.orphan(Node::Element(element));
                    if !text.is_empty() {
                        fresh.append(Node::Text(Text { text: text.into() }));
                    }
                    recreated += 1;
                    fresh.id()
                }
                None => id,
            };
            if let Some(mut parent) = self.html.tree.get_mut(parent) {
                parent.append_id(child);
            }
        }
        recreated
    }

    /// Returns the rendered text of the body, the way a browser lays it out
    /// as plain text.
    ///
    /// `style`, `script`, `noscript` and `template` content is dropped.
    /// Block elements start and end on their own lines, whitespace inside
    /// text collapses, and [`collapse_whitespace`] tidies the result.
    ///
    /// ```
    /// use pagezip::dom::Document;
    ///
    /// let doc = Document::parse("<body><h1>Title</h1><p>Some  text<script>x()</script></p></body>");
    /// assert_eq!(doc.body_text(), "Title\nSome text");
    /// ```
    pub fn body_text(&self) -> String {
        let Some(body) = self.body() else {
            return String::new();
        };
        let mut out = String::new();
        collect_rendered_text(body, false, &mut out);
        collapse_whitespace(&out)
    }

    /// Serializes the document back to markup.
    pub fn to_html(&self) -> String {
        let mut out = self.doctype.clone().unwrap_or_default();
        out.push_str(&self.html.root_element().html());
        out
    }
}

fn is_executable(element: &Element) -> bool {
    match element.name() {
        "script" => true,
        "link" => element.attr("rel").is_some_and(|rel| rel.contains("icon")),
        _ => false,
    }
}

fn recreate_script(original: &Element) -> Element {
    let mut script = original.clone();
    script.attrs.retain(|(name, value)| {
        name.ns.is_empty() && matches!(&*name.local, "type" | "src") && !value.is_empty()
    });
    script
}

fn collect_rendered_text(element: ElementRef<'_>, preformatted: bool, out: &mut String) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }
    let block = BLOCK_ELEMENTS.contains(&name);
    let preformatted = preformatted || name == "pre";
    if block {
        out.push('\n');
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) if preformatted => out.push_str(text),
            Node::Text(text) => {
                // whitespace inside running text renders as single spaces
                let mut last_space = false;
                for c in text.chars() {
                    let space = c.is_whitespace() && c != '\u{a0}';
                    if !(space && last_space) {
                        out.push(if space { ' ' } else { c });
                    }
                    last_space = space;
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_rendered_text(child, preformatted, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push('\n');
    }
}

fn serialize_doctype(doctype: &Doctype) -> String {
    let mut out = format!("<!DOCTYPE {}", doctype.name());
    let public_id = doctype.public_id();
    let system_id = doctype.system_id();
    if !public_id.is_empty() {
        let _ = write!(out, " PUBLIC \"{public_id}\"");
        if !system_id.is_empty() {
            let _ = write!(out, " \"{system_id}\"");
        }
    } else if !system_id.is_empty() {
        let _ = write!(out, " SYSTEM \"{system_id}\"");
    }
    out.push('>');
    out
}

/// Collapses each whitespace run to one character, then trims.
///
/// A run containing a line break becomes `\n`, any other run becomes a
/// space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending: Option<char> = None;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{a0}' {
            pending = match (pending, c) {
                (Some('\n'), _) | (_, '\n') => Some('\n'),
                _ => Some(' '),
            };
        } else {
            if let Some(ws) = pending.take() {
                out.push(ws);
            }
            out.push(c);
        }
    }
    out.trim().to_string()
}

/// Escapes text for use in element content.
pub fn escape_text(text: &str) -> String {
    let mut fragment = Html::new_fragment();
    fragment
        .tree
        .root_mut()
        .append(Node::Text(Text { text: text.to_string().into() }));
    fragment.html()
}
