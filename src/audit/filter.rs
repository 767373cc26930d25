use std::collections::BTreeSet;

/// Namespaces skipped by the audit when the caller does not say otherwise.
pub const DEFAULT_EXCLUDED_NAMESPACES: [&str; 3] =
    ["kube-system", "kube-public", "kube-node-lease"];

/// Namespace names that are never visited. Matching is exact and
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl ExclusionSet {
    /// An empty set; every namespace is audited.
    pub fn none() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.names.contains(namespace)
    }

    pub fn insert(&mut self, namespace: impl Into<String>) {
        self.names.insert(namespace.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        DEFAULT_EXCLUDED_NAMESPACES.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Exact membership test over a slice of names.
pub fn contains_string<S: AsRef<str>>(slice: &[S], needle: &str) -> bool {
    slice.iter().any(|s| s.as_ref() == needle)
}
