//! AndroidManifest.xml editing
//!
//! The manifest is parsed into a small owned tree. Elements keep their
//! original start tag bytes, so anything the editor does not touch is
//! written back exactly as it was read; text, comments and declarations
//! are carried as raw events.

use crate::error::{MigrateError, MigrateResult};
use crate::layout::ProjectLayout;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Element name of a permission declaration
pub const USES_PERMISSION: &str = "uses-permission";

/// Attribute carrying the permission name
pub const NAME_ATTRIBUTE: &str = "android:name";

/// Permissions the Crosswalk runtime needs, in insertion order
pub const REQUIRED_PERMISSIONS: [&str; 2] = [
    "android.permission.ACCESS_NETWORK_STATE",
    "android.permission.ACCESS_WIFI_STATE",
];

const DEFAULT_INDENT: &str = "\n    ";

/// A node of the manifest tree
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Text, comments, CDATA, declarations and processing instructions
    Raw(Event<'static>),
}

impl Node {
    fn whitespace(text: &str) -> Self {
        Node::Raw(Event::Text(BytesText::from_escaped(text.to_string())))
    }

    /// Whitespace-only text content, if this is such a node
    fn as_whitespace(&self) -> Option<&str> {
        match self {
            Node::Raw(Event::Text(text)) if text.iter().all(u8::is_ascii_whitespace) => {
                std::str::from_utf8(text).ok()
            }
            _ => None,
        }
    }
}

/// An XML element
#[derive(Debug, Clone)]
pub struct Element {
    start: BytesStart<'static>,
    children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    /// Create an empty, self-closing element
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
            self_closing: true,
        }
    }

    /// Append an attribute (the value is escaped)
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.start.push_attribute((key, value));
        self
    }

    /// Qualified element name
    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }

    fn is_named(&self, name: &str) -> bool {
        self.start.name().as_ref() == name.as_bytes()
    }

    /// Unescaped value of an attribute, by qualified name
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.start
            .attributes()
            .with_checks(false)
            .flatten()
            .find(|attr| attr.key.as_ref() == key.as_bytes())
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, skipping text and comments
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Raw(_) => None,
        })
    }

    fn from_start(start: BytesStart<'_>, self_closing: bool) -> MigrateResult<Self> {
        for attr in start.attributes() {
            attr.map_err(MigrateError::document)?;
        }
        Ok(Self {
            start: start.into_owned(),
            children: Vec::new(),
            self_closing,
        })
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> MigrateResult<()> {
        if self.children.is_empty() && self.self_closing {
            writer
                .write_event(Event::Empty(self.start.borrow()))
                .map_err(MigrateError::document)?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(self.start.borrow()))
            .map_err(MigrateError::document)?;
        for child in &self.children {
            write_node(child, writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name())))
            .map_err(MigrateError::document)?;
        Ok(())
    }
}

/// Canonical form of a permission declaration
///
/// Two declarations are the same permission when both the element name and
/// the `android:name` value match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionDecl {
    pub element: String,
    pub name: String,
}

impl PermissionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            element: USES_PERMISSION.to_string(),
            name: name.into(),
        }
    }

    /// Canonical form of an element, if it declares a permission
    pub fn from_element(element: &Element) -> Option<Self> {
        if !element.is_named(USES_PERMISSION) {
            return None;
        }
        element.attribute(NAME_ATTRIBUTE).map(|name| Self {
            element: USES_PERMISSION.to_string(),
            name,
        })
    }

    fn to_element(&self) -> Element {
        Element::new(&self.element).with_attribute(NAME_ATTRIBUTE, &self.name)
    }
}

/// Result of [`ensure_permissions`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionEdit {
    /// Permissions that were appended
    pub added: Vec<String>,
    /// Redundant copies of required permissions that were dropped
    pub removed_duplicates: usize,
}

impl PermissionEdit {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || self.removed_duplicates > 0
    }
}

/// In-memory AndroidManifest.xml
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    nodes: Vec<Node>,
}

impl ManifestDocument {
    /// Parse a manifest from text
    pub fn parse(text: &str) -> MigrateResult<Self> {
        let mut reader = Reader::from_str(text);
        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(MigrateError::document(format!(
                        "parse error at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
            };

            match event {
                Event::Start(start) => stack.push(Element::from_start(start, false)?),
                Event::Empty(start) => {
                    let element = Element::from_start(start, true)?;
                    attach(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| MigrateError::document("unexpected closing tag"))?;
                    attach(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::Eof => break,
                other => attach(&mut stack, &mut nodes, Node::Raw(other.into_owned())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(MigrateError::document(format!(
                "unclosed element <{}>",
                open.name()
            )));
        }

        let document = Self { nodes };
        if document.root().is_none() {
            return Err(MigrateError::document("document has no root element"));
        }
        Ok(document)
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> MigrateResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| MigrateError::filesystem(path, e))?;
        Self::parse(&text)
    }

    /// Serialize and write the manifest
    pub fn save(&self, path: &Path) -> MigrateResult<()> {
        let xml = self.to_xml()?;
        fs::write(path, xml).map_err(|e| MigrateError::filesystem(path, e))
    }

    /// Serialize the document back to text
    pub fn to_xml(&self) -> MigrateResult<String> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(node, &mut writer)?;
        }
        String::from_utf8(writer.into_inner()).map_err(MigrateError::document)
    }

    /// The root element
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Raw(_) => None,
        })
    }

    fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Raw(_) => None,
        })
    }

    /// Permission declarations directly under the root, in document order
    pub fn permissions(&self) -> Vec<PermissionDecl> {
        self.root()
            .map(|root| {
                root.child_elements()
                    .filter_map(PermissionDecl::from_element)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Make sure each required permission is declared exactly once
///
/// Missing declarations are appended after the last existing
/// `uses-permission` (or at the end of the root when there is none), in the
/// order given. Later copies of a required permission are dropped; every
/// other node keeps its position.
pub fn ensure_permissions(
    document: &mut ManifestDocument,
    required: &[&str],
) -> MigrateResult<PermissionEdit> {
    let root = document
        .root_mut()
        .ok_or_else(|| MigrateError::document("document has no root element"))?;

    let tracked: Vec<PermissionDecl> = required.iter().map(|n| PermissionDecl::new(*n)).collect();
    let mut seen: HashSet<PermissionDecl> = HashSet::new();
    let mut edit = PermissionEdit::default();

    let mut kept: Vec<Node> = Vec::with_capacity(root.children.len());
    for node in root.children.drain(..) {
        let duplicate = match &node {
            Node::Element(element) => PermissionDecl::from_element(element)
                .filter(|decl| tracked.contains(decl))
                .is_some_and(|decl| !seen.insert(decl)),
            Node::Raw(_) => false,
        };

        if duplicate {
            // Drop the indentation that preceded the duplicate too
            if kept.last().and_then(Node::as_whitespace).is_some() {
                kept.pop();
            }
            edit.removed_duplicates += 1;
        } else {
            kept.push(node);
        }
    }
    root.children = kept;

    let missing: Vec<&PermissionDecl> = tracked.iter().filter(|d| !seen.contains(*d)).collect();
    if missing.is_empty() {
        return Ok(edit);
    }

    let was_empty = root.children.is_empty();
    let last_permission = root.children.iter().rposition(|node| {
        matches!(node, Node::Element(element) if element.is_named(USES_PERMISSION))
    });

    let (mut position, indent) = match last_permission {
        Some(index) => (index + 1, indent_before(&root.children, index)),
        None => {
            let end = match root.children.last().and_then(Node::as_whitespace) {
                Some(_) => root.children.len() - 1,
                None => root.children.len(),
            };
            let indent = root
                .children
                .iter()
                .position(|node| matches!(node, Node::Element(_)))
                .map(|index| indent_before(&root.children, index))
                .unwrap_or_else(|| DEFAULT_INDENT.to_string());
            (end, indent)
        }
    };

    for decl in missing {
        debug!(permission = %decl.name, "adding permission declaration");
        root.children.insert(position, Node::whitespace(&indent));
        root.children
            .insert(position + 1, Node::Element(decl.to_element()));
        position += 2;
        edit.added.push(decl.name.clone());
    }

    if was_empty {
        root.children.push(Node::whitespace("\n"));
    }

    Ok(edit)
}

/// Read, edit and write back the project's AndroidManifest.xml
pub fn patch_manifest(layout: &ProjectLayout) -> MigrateResult<PermissionEdit> {
    let path = layout.manifest_path();
    let mut document = ManifestDocument::load(&path)?;
    let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS)?;

    if edit.changed() {
        document.save(&path)?;
    } else {
        debug!(path = %path.display(), "manifest already declares required permissions");
    }

    Ok(edit)
}

fn attach(stack: &mut [Element], nodes: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

fn write_node(node: &Node, writer: &mut Writer<Vec<u8>>) -> MigrateResult<()> {
    match node {
        Node::Element(element) => element.write(writer),
        Node::Raw(event) => writer
            .write_event(event.clone())
            .map_err(MigrateError::document),
    }
}

fn indent_before(children: &[Node], index: usize) -> String {
    index
        .checked_sub(1)
        .and_then(|prev| children[prev].as_whitespace())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_INDENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HELLO_MANIFEST: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<manifest android:versionCode="1" package="io.cordova.hellocordova" xmlns:android="http://schemas.android.com/apk/res/android">
    <supports-screens android:anyDensity="true" android:largeScreens="true" />
    <uses-permission android:name="android.permission.INTERNET" />
    <application android:label="@string/app_name">
        <activity android:name="HelloCordova" />
    </application>
    <uses-sdk android:minSdkVersion="10" android:targetSdkVersion="19" />
</manifest>
"#;

    fn names(document: &ManifestDocument) -> Vec<String> {
        document.permissions().into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_round_trip_is_byte_exact() {
        let document = ManifestDocument::parse(HELLO_MANIFEST).unwrap();
        assert_eq!(document.to_xml().unwrap(), HELLO_MANIFEST);
    }

    #[test]
    fn test_root_and_attributes() {
        let document = ManifestDocument::parse(HELLO_MANIFEST).unwrap();
        let root = document.root().unwrap();
        assert_eq!(root.name(), "manifest");
        assert_eq!(
            root.attribute("package").as_deref(),
            Some("io.cordova.hellocordova")
        );
        assert_eq!(root.child_elements().count(), 4);
    }

    #[test]
    fn test_adds_both_after_last_permission() {
        let mut document = ManifestDocument::parse(HELLO_MANIFEST).unwrap();
        let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();

        assert_eq!(edit.added, REQUIRED_PERMISSIONS.to_vec());
        assert_eq!(edit.removed_duplicates, 0);
        assert_eq!(
            names(&document),
            vec![
                "android.permission.INTERNET",
                "android.permission.ACCESS_NETWORK_STATE",
                "android.permission.ACCESS_WIFI_STATE",
            ]
        );

        let xml = document.to_xml().unwrap();
        assert!(xml.contains(
            "<uses-permission android:name=\"android.permission.INTERNET\" />\n    \
             <uses-permission android:name=\"android.permission.ACCESS_NETWORK_STATE\"/>\n    \
             <uses-permission android:name=\"android.permission.ACCESS_WIFI_STATE\"/>\n    \
             <application"
        ));
    }

    #[test]
    fn test_idempotent() {
        let mut document = ManifestDocument::parse(HELLO_MANIFEST).unwrap();
        ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();
        let once = document.to_xml().unwrap();

        let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();
        assert!(!edit.changed());
        assert_eq!(document.to_xml().unwrap(), once);

        // Re-parsing the written output must not change anything either
        let mut reparsed = ManifestDocument::parse(&once).unwrap();
        let edit = ensure_permissions(&mut reparsed, &REQUIRED_PERMISSIONS).unwrap();
        assert!(!edit.changed());
        assert_eq!(reparsed.to_xml().unwrap(), once);
    }

    #[test]
    fn test_adds_only_missing_one() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-permission android:name="android.permission.ACCESS_WIFI_STATE" />
    <application />
</manifest>"#;
        let mut document = ManifestDocument::parse(xml).unwrap();
        let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();

        assert_eq!(edit.added, vec!["android.permission.ACCESS_NETWORK_STATE"]);
        assert_eq!(
            names(&document),
            vec![
                "android.permission.ACCESS_WIFI_STATE",
                "android.permission.ACCESS_NETWORK_STATE",
            ]
        );
    }

    #[test]
    fn test_collection_absent_is_created() {
        let xml = "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\n  <application />\n</manifest>";
        let mut document = ManifestDocument::parse(xml).unwrap();
        let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();

        assert_eq!(edit.added.len(), 2);
        assert_eq!(
            document.to_xml().unwrap(),
            "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\n  \
             <application />\n  \
             <uses-permission android:name=\"android.permission.ACCESS_NETWORK_STATE\"/>\n  \
             <uses-permission android:name=\"android.permission.ACCESS_WIFI_STATE\"/>\n\
             </manifest>"
        );
    }

    #[test]
    fn test_empty_root_element() {
        let mut document = ManifestDocument::parse("<manifest/>").unwrap();
        ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();
        assert_eq!(
            document.to_xml().unwrap(),
            "<manifest>\n    \
             <uses-permission android:name=\"android.permission.ACCESS_NETWORK_STATE\"/>\n    \
             <uses-permission android:name=\"android.permission.ACCESS_WIFI_STATE\"/>\n\
             </manifest>"
        );
    }

    #[test]
    fn test_duplicates_collapsed_to_first() {
        let xml = r#"<manifest>
    <uses-permission android:name="android.permission.ACCESS_NETWORK_STATE" />
    <uses-permission android:name="android.permission.CAMERA" />
    <uses-permission android:name="android.permission.ACCESS_NETWORK_STATE" />
    <uses-permission android:name="android.permission.CAMERA" />
</manifest>"#;
        let mut document = ManifestDocument::parse(xml).unwrap();
        let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();

        assert_eq!(edit.removed_duplicates, 1);
        assert_eq!(edit.added, vec!["android.permission.ACCESS_WIFI_STATE"]);
        // Untracked duplicates are left alone
        assert_eq!(
            names(&document),
            vec![
                "android.permission.ACCESS_NETWORK_STATE",
                "android.permission.CAMERA",
                "android.permission.CAMERA",
                "android.permission.ACCESS_WIFI_STATE",
            ]
        );
        assert!(!document.to_xml().unwrap().contains("\n\n"));
    }

    #[test]
    fn test_nested_permissions_are_not_counted() {
        let xml = r#"<manifest>
    <application>
        <uses-permission android:name="android.permission.ACCESS_NETWORK_STATE" />
    </application>
</manifest>"#;
        let mut document = ManifestDocument::parse(xml).unwrap();
        let edit = ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();
        assert_eq!(edit.added.len(), 2);
    }

    #[test]
    fn test_comments_preserved() {
        let xml = "<manifest>\n    <!-- network -->\n    <uses-permission android:name=\"android.permission.INTERNET\" />\n</manifest>";
        let mut document = ManifestDocument::parse(xml).unwrap();
        ensure_permissions(&mut document, &REQUIRED_PERMISSIONS).unwrap();
        assert!(document.to_xml().unwrap().contains("<!-- network -->"));
    }

    #[test]
    fn test_malformed_document() {
        let err = ManifestDocument::parse("<manifest><application></manifest>").unwrap_err();
        assert!(matches!(err, MigrateError::Document(_)));

        let err = ManifestDocument::parse("<manifest>").unwrap_err();
        assert!(matches!(err, MigrateError::Document(_)));
    }

    #[test]
    fn test_document_without_root() {
        let err = ManifestDocument::parse("<?xml version=\"1.0\"?>\n").unwrap_err();
        assert!(matches!(err, MigrateError::Document(ref m) if m.contains("no root")));
    }

    #[test]
    fn test_permission_decl_equality() {
        let element = Element::new(USES_PERMISSION)
            .with_attribute(NAME_ATTRIBUTE, "android.permission.ACCESS_WIFI_STATE");
        assert_eq!(
            PermissionDecl::from_element(&element),
            Some(PermissionDecl::new("android.permission.ACCESS_WIFI_STATE"))
        );

        let other = Element::new("uses-feature")
            .with_attribute(NAME_ATTRIBUTE, "android.permission.ACCESS_WIFI_STATE");
        assert_eq!(PermissionDecl::from_element(&other), None);
    }

    #[test]
    fn test_patch_manifest_on_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path());
        fs::create_dir_all(layout.platform_dir()).unwrap();
        fs::write(layout.manifest_path(), HELLO_MANIFEST).unwrap();

        let edit = patch_manifest(&layout).unwrap();
        assert_eq!(edit.added.len(), 2);

        let written = fs::read_to_string(layout.manifest_path()).unwrap();
        assert!(written.contains("ACCESS_NETWORK_STATE"));
        assert!(written.contains("ACCESS_WIFI_STATE"));

        let edit = patch_manifest(&layout).unwrap();
        assert!(!edit.changed());
        assert_eq!(fs::read_to_string(layout.manifest_path()).unwrap(), written);
    }

    #[test]
    fn test_patch_manifest_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = patch_manifest(&ProjectLayout::new(temp.path())).unwrap_err();
        assert!(matches!(err, MigrateError::Filesystem { .. }));
    }
}
