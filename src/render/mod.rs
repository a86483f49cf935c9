pub mod container;

use quick_xml::escape::escape;
use url::form_urlencoded;

use crate::parse::Item;
use crate::schema::ItemSchema;

pub use container::ResultsContainer;

pub const WATCHABLE_CLASS: &str = "watchable_film_item";
pub const NON_WATCHABLE_CLASS: &str = "non-watchable_film_item";

const VOID_ELEMENTS: [&str; 4] = ["img", "br", "hr", "input"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Minimal element tree used to build result markup.
///
/// Attribute values and text nodes are escaped when serialized, so server
/// supplied strings can never open new elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Counts descendants (and self) with the given tag.
    pub fn count_tag(&self, tag: &str) -> usize {
        let own = usize::from(self.tag == tag);
        own + self
            .children
            .iter()
            .map(|c| match c {
                Node::Element(e) => e.count_tag(tag),
                Node::Text(_) => 0,
            })
            .sum::<usize>()
    }

    pub fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in self.attrs.iter() {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag) {
            return;
        }
        for child in self.children.iter() {
            match child {
                Node::Element(e) => e.write_html(out),
                Node::Text(t) => out.push_str(&escape(t.as_str())),
            }
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }
}

pub fn item_class(item: &Item) -> &'static str {
    if item.watchable {
        WATCHABLE_CLASS
    } else {
        NON_WATCHABLE_CLASS
    }
}

pub fn watch_href(id: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("watch?v={encoded}")
}

pub fn poster_src(item: &Item, schema: &ItemSchema) -> Option<String> {
    if item.poster_path.is_empty() {
        None
    } else {
        Some(format!("{}{}", schema.media_prefix, item.poster_path))
    }
}

/// Builds `<a class=.. href="watch?v=.."><img?><div><p><b>title</b></p><p>label</p></div></a>`.
pub fn item_element(item: &Item, schema: &ItemSchema) -> Element {
    let mut anchor = Element::new("a")
        .attr("class", item_class(item))
        .attr("href", watch_href(&item.id));
    if let Some(src) = poster_src(item, schema) {
        anchor = anchor.child(Element::new("img").attr("src", src));
    }
    let body = Element::new("div")
        .child(Element::new("p").child(Element::new("b").text(item.title.as_str())))
        .child(Element::new("p").text(item.release_label.as_str()));
    anchor.child(body)
}
