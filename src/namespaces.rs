//! Qualified names and prefix scopes
//!
//! Every component in a schema set is identified by a [`QName`]. Prefixes
//! written in `type`, `base` and `ref` attributes are resolved through the
//! [`NamespaceContext`] in scope at the element that carries them.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// A namespace URI paired with a local name
///
/// Registry tables are keyed by this pair, so two files may define the same
/// local name in different namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Name in no namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Name in `namespace`
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Namespace as a string slice
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether this name lives in the given namespace
    pub fn in_namespace(&self, namespace: Option<&str>) -> bool {
        self.namespace.as_deref() == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Prefix declarations in scope at one element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    prefixes: IndexMap<Prefix, NamespaceUri>,
    /// Target of unprefixed names
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Scope with no declarations
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `prefix`, replacing any earlier binding
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Bind unprefixed names to `namespace`
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// URI bound to `prefix`; `xml` is always bound
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => Some(crate::XML_NAMESPACE),
            _ => self.prefixes.get(prefix).map(|s| s.as_str()),
        }
    }

    /// Namespace of unprefixed names, if declared
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Iterate over declared prefixes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&Prefix, &NamespaceUri)> {
        self.prefixes.iter()
    }

    /// Whether no prefix or default namespace is declared
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.default_namespace.is_none()
    }

    /// Copy of this scope with the declarations of `inner` layered on top
    pub fn extended(&self, inner: &NamespaceContext) -> NamespaceContext {
        let mut scope = self.clone();
        for (prefix, uri) in inner.iter() {
            scope.add_prefix(prefix.clone(), uri.clone());
        }
        if let Some(default) = inner.get_default_namespace() {
            scope.set_default_namespace(default);
        }
        scope
    }

    /// Prefix → URI table with the default namespace under the empty prefix
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        if let Some(ref default) = self.default_namespace {
            map.insert(String::new(), default.clone());
        }
        for (prefix, uri) in &self.prefixes {
            map.insert(prefix.clone(), uri.clone());
        }
        map
    }

    /// Resolve `prefix:local`, or an unprefixed name against the default namespace
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Namespace(format!("undeclared prefix '{}' in '{}'", prefix, prefixed_name)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }
}
