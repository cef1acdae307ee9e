//! Captured page model.
//!
//! A [`PageData`] is the already-built resource tree handed to the
//! archiver: serialized markup, title, origin URL, and resources grouped
//! by type. The `frames` group holds nested pages; every other group holds
//! leaf payloads. Group order and entry order are significant because they
//! fix the order of entries in the archive.
//!
//! The serde representation matches the JSON a capture front-end sends:
//!
//! ```json
//! {
//!   "content": "<!doctype html><html>...",
//!   "title": "Example",
//!   "resources": {
//!     "stylesheets": [{ "name": "stylesheet_0.css", "url": "https://example.com/a.css",
//!                       "extension": ".css", "content": "body{}" }],
//!     "images": [{ "name": "images/0.png", "url": "https://example.com/0.png",
//!                  "extension": ".png", "content": [137, 80, 78, 71] }],
//!     "frames": [{ "name": "frames/0/", "url": "https://example.com/f",
//!                  "content": "<html>...", "resources": {} }]
//!   }
//! }
//! ```

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Resource group holding nested pages.
pub const FRAMES: &str = "frames";

/// A captured document with its resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    /// Serialized HTML of the document.
    pub content: String,
    /// Document title.
    #[serde(default)]
    pub title: String,
    /// Origin URL, kept as entry metadata only.
    #[serde(default)]
    pub url: String,
    /// Directory assigned to this page when it is a frame (e.g. `frames/0/`).
    ///
    /// Empty for the root page.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Resources grouped by type, in capture order.
    #[serde(default)]
    pub resources: Resources,
}

impl PageData {
    /// Creates a page from its serialized markup.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the origin URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the frame directory name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a leaf resource to `group`.
    pub fn resource(mut self, group: &str, entry: ResourceEntry) -> Self {
        self.resources.push(group, entry);
        self
    }

    /// Appends a nested frame.
    pub fn frame(mut self, frame: PageData) -> Self {
        self.resources.push_frame(frame);
        self
    }

    /// Counts the entries this page produces in an archive, frames included.
    pub fn entry_count(&self) -> usize {
        1 + self
            .resources
            .iter()
            .map(|(_, group)| match group {
                ResourceGroup::Frames(frames) => frames.iter().map(PageData::entry_count).sum(),
                ResourceGroup::Entries(entries) => entries.len(),
            })
            .sum::<usize>()
    }
}

/// Payload of a leaf resource.
///
/// Text and binary payloads are kept apart because the archive stores
/// them differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceContent {
    /// Naturally textual content (stylesheets, scripts).
    Text(String),
    /// Raw bytes (images, fonts, media).
    Binary(Vec<u8>),
}

impl ResourceContent {
    /// Returns the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns whether the payload is text.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the payload size in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for ResourceContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ResourceContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for ResourceContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// A leaf resource of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Path relative to the owning page's directory.
    pub name: String,
    /// Origin URL, kept as entry metadata only.
    #[serde(default)]
    pub url: String,
    /// Extension with its leading dot, e.g. `.png`.
    #[serde(default)]
    pub extension: String,
    /// Payload.
    pub content: ResourceContent,
}

impl ResourceEntry {
    /// Creates a resource, deriving the extension from `name`.
    ///
    /// ```
    /// use pagezip::page::ResourceEntry;
    ///
    /// let entry = ResourceEntry::new("images/0.png", vec![0x89, b'P', b'N', b'G']);
    /// assert_eq!(entry.extension, ".png");
    /// assert!(!entry.content.is_text());
    /// ```
    pub fn new(name: impl Into<String>, content: impl Into<ResourceContent>) -> Self {
        let name = name.into();
        let file_name = name.rsplit('/').next().unwrap_or(&name);
        let extension = match file_name.rfind('.') {
            Some(0) | None => String::new(),
            Some(dot) => file_name[dot..].to_string(),
        };
        Self {
            name,
            url: String::new(),
            extension,
            content: content.into(),
        }
    }

    /// Sets the origin URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Overrides the extension.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// One resource group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceGroup {
    /// Nested pages (the `frames` group).
    Frames(Vec<PageData>),
    /// Leaf payloads.
    Entries(Vec<ResourceEntry>),
}

impl ResourceGroup {
    /// Returns the number of items in the group.
    pub fn len(&self) -> usize {
        match self {
            Self::Frames(frames) => frames.len(),
            Self::Entries(entries) => entries.len(),
        }
    }

    /// Returns whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resources grouped by type, preserving insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    groups: Vec<(String, ResourceGroup)>,
}

impl Resources {
    /// Creates an empty resource map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a leaf resource to `group`, creating the group if needed.
    ///
    /// Pushing to `frames` with this method is ignored with a warning; use
    /// [`push_frame`](Self::push_frame).
    pub fn push(&mut self, group: &str, entry: ResourceEntry) {
        if group == FRAMES {
            log::warn!("leaf resource {} pushed to the frames group", entry.name);
            return;
        }
        match self.group_mut(group) {
            Some(ResourceGroup::Entries(entries)) => entries.push(entry),
            Some(ResourceGroup::Frames(_)) => {}
            None => self
                .groups
                .push((group.to_string(), ResourceGroup::Entries(vec![entry]))),
        }
    }

    /// Appends a nested frame.
    pub fn push_frame(&mut self, frame: PageData) {
        match self.group_mut(FRAMES) {
            Some(ResourceGroup::Frames(frames)) => frames.push(frame),
            Some(ResourceGroup::Entries(_)) => {}
            None => self
                .groups
                .push((FRAMES.to_string(), ResourceGroup::Frames(vec![frame]))),
        }
    }

    /// Returns the group named `name`.
    pub fn get(&self, name: &str) -> Option<&ResourceGroup> {
        self.groups.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    fn group_mut(&mut self, name: &str) -> Option<&mut ResourceGroup> {
        self.groups
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
    }

    /// Iterates groups in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceGroup)> {
        self.groups.iter().map(|(n, g)| (n.as_str(), g))
    }

    /// Returns the nested frames, if any.
    pub fn frames(&self) -> &[PageData] {
        match self.get(FRAMES) {
            Some(ResourceGroup::Frames(frames)) => frames,
            _ => &[],
        }
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for Resources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (name, group) in &self.groups {
            match group {
                ResourceGroup::Frames(frames) => map.serialize_entry(name, frames)?,
                ResourceGroup::Entries(entries) => map.serialize_entry(name, entries)?,
            }
        }
        map.end()
    }
}

struct ResourcesVisitor;

impl<'de> Visitor<'de> for ResourcesVisitor {
    type Value = Resources;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of resource groups")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Resources, A::Error> {
        let mut groups: Vec<(String, ResourceGroup)> = Vec::new();
        while let Some(name) = access.next_key::<String>()? {
            if groups.iter().any(|(n, _)| *n == name) {
                return Err(de::Error::custom(format!("duplicate resource group {name}")));
            }
            let group = if name == FRAMES {
                ResourceGroup::Frames(access.next_value()?)
            } else {
                ResourceGroup::Entries(access.next_value()?)
            };
            groups.push((name, group));
        }
        Ok(Resources { groups })
    }
}

impl<'de> Deserialize<'de> for Resources {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ResourcesVisitor)
    }
}
