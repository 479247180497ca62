use std::fmt;

use crate::error::Result;

/// Reference to one individual of one tree.
///
/// Two references are the same individual exactly when both the tree and the
/// record identifier match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndividualRef {
    tree: String,
    xref: String,
}

impl IndividualRef {
    pub fn new(tree: impl Into<String>, xref: impl Into<String>) -> Self {
        Self {
            tree: tree.into(),
            xref: xref.into(),
        }
    }

    pub fn tree(&self) -> &str {
        &self.tree
    }

    pub fn xref(&self) -> &str {
        &self.xref
    }
}

impl fmt::Display for IndividualRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tree, self.xref)
    }
}

/// The primary father and mother of an individual, either of which may be
/// unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentPair {
    pub father: Option<String>,
    pub mother: Option<String>,
}

impl ParentPair {
    pub fn new(father: Option<String>, mother: Option<String>) -> Self {
        Self { father, mother }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Known parents, father first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.father
            .as_deref()
            .into_iter()
            .chain(self.mother.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.father.is_none() && self.mother.is_none()
    }
}

/// Read access to the parentage data of one tree.
///
/// Implementations must answer `primary_parents` with `None` for a missing
/// parent. Returning an error aborts the whole computation instead of
/// terminating the branch.
pub trait GraphProvider {
    /// Name of the tree the individuals belong to.
    fn tree(&self) -> &str;

    /// Every individual identifier of the tree.
    fn individuals(&self) -> Result<Vec<String>>;

    /// The primary (father, mother) pair of `xref`.
    fn primary_parents(&self, xref: &str) -> Result<ParentPair>;

    /// Whether `xref` is an unconfirmed record excluded from traversal.
    fn is_provisional(&self, xref: &str) -> Result<bool>;

    /// Build a reference to `xref` in this provider's tree.
    fn individual(&self, xref: &str) -> IndividualRef {
        IndividualRef::new(self.tree(), xref)
    }
}

impl<P: GraphProvider + ?Sized> GraphProvider for &P {
    fn tree(&self) -> &str {
        (**self).tree()
    }

    fn individuals(&self) -> Result<Vec<String>> {
        (**self).individuals()
    }

    fn primary_parents(&self, xref: &str) -> Result<ParentPair> {
        (**self).primary_parents(xref)
    }

    fn is_provisional(&self, xref: &str) -> Result<bool> {
        (**self).is_provisional(xref)
    }
}
