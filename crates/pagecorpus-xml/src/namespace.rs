//! PAGE namespace resolution
//!
//! PAGE exporters disagree on namespaces: some declare the schema revision
//! they target, some declare an older or newer one, some bind it to a prefix
//! and some declare nothing. Element lookups go through one ordered chain,
//! first non-empty result wins:
//!
//! 1. the namespace detected on the document (root element namespace, or a
//!    declaration whose URI contains [`PAGE_NAMESPACE_MARKER`]);
//! 2. every known PAGE revision in [`KNOWN_PAGE_NAMESPACES`];
//! 3. no namespace;
//! 4. local tag name only, whatever the namespace.

use roxmltree::{Document, Node};

/// Substring shared by every PAGE namespace URI
pub const PAGE_NAMESPACE_MARKER: &str = "primaresearch.org/PAGE";

/// Published PAGE schema namespaces, oldest first
pub const KNOWN_PAGE_NAMESPACES: [&str; 7] = [
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2009-03-16",
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2010-01-12",
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2010-03-19",
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15",
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2016-07-15",
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2017-07-15",
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15",
];

/// One step of the resolution chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Element in exactly this namespace
    Namespace(&'a str),
    /// Element without namespace
    NoNamespace,
    /// Any element with this local name
    LocalName,
}

impl Lookup<'_> {
    /// True when `node` is an element named `local_name` under this step
    #[must_use]
    pub fn matches(&self, node: &Node<'_, '_>, local_name: &str) -> bool {
        if !node.is_element() || node.tag_name().name() != local_name {
            return false;
        }
        match self {
            Self::Namespace(uri) => node.tag_name().namespace() == Some(*uri),
            Self::NoNamespace => node.tag_name().namespace().is_none(),
            Self::LocalName => true,
        }
    }
}

/// Namespace context of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    detected: Option<String>,
}

impl Namespace {
    /// Detect the namespace of `doc`
    #[must_use]
    pub fn detect(doc: &Document<'_>) -> Self {
        let root = doc.root_element();
        let detected = root
            .tag_name()
            .namespace()
            .or_else(|| {
                root.namespaces()
                    .map(roxmltree::Namespace::uri)
                    .find(|uri| uri.contains(PAGE_NAMESPACE_MARKER))
            })
            .map(str::to_string);
        if let Some(uri) = &detected {
            log::trace!("Detected namespace {uri}");
        }
        Self { detected }
    }

    /// Context with a fixed namespace, or none
    #[inline]
    #[must_use = "creates a namespace context"]
    pub fn new(detected: Option<String>) -> Self {
        Self { detected }
    }

    /// The detected namespace URI
    #[inline]
    #[must_use]
    pub fn detected(&self) -> Option<&str> {
        self.detected.as_deref()
    }

    /// Resolution steps, in order
    pub fn lookups(&self) -> impl Iterator<Item = Lookup<'_>> {
        self.detected
            .as_deref()
            .map(Lookup::Namespace)
            .into_iter()
            .chain(
                KNOWN_PAGE_NAMESPACES
                    .iter()
                    .filter(move |uri| Some(**uri) != self.detected.as_deref())
                    .map(|uri| Lookup::Namespace(*uri)),
            )
            .chain([Lookup::NoNamespace, Lookup::LocalName])
    }
}

/// Descendants of `node` (itself excluded) named `local_name`, in document
/// order, from the first resolution step that finds any
#[must_use]
pub fn find_descendants<'a, 'input>(
    node: Node<'a, 'input>,
    local_name: &str,
    ns: &Namespace,
) -> Vec<Node<'a, 'input>> {
    for lookup in ns.lookups() {
        let found: Vec<_> = node
            .descendants()
            .skip(1)
            .filter(|n| lookup.matches(n, local_name))
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// First descendant of `node` named `local_name`
#[must_use]
pub fn find_first<'a, 'input>(
    node: Node<'a, 'input>,
    local_name: &str,
    ns: &Namespace,
) -> Option<Node<'a, 'input>> {
    ns.lookups()
        .find_map(|lookup| node.descendants().skip(1).find(|n| lookup.matches(n, local_name)))
}

/// Direct children of `node` named `local_name`
#[must_use]
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    local_name: &str,
    ns: &Namespace,
) -> Vec<Node<'a, 'input>> {
    for lookup in ns.lookups() {
        let found: Vec<_> = node.children().filter(|n| lookup.matches(n, local_name)).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Concatenated text content of `node`
#[must_use]
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}
