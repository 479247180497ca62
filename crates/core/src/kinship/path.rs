use std::fmt;

/// Number of lineage paths folded into one [`LineagePath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Count(u64),
    /// The count no longer fits, or an overflowed count was added to.
    Overflowed,
}

impl Multiplicity {
    pub fn one() -> Self {
        Multiplicity::Count(1)
    }

    /// Sum of two multiplicities, saturating to `Overflowed`.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Multiplicity::Count(a), Multiplicity::Count(b)) => {
                a.checked_add(b).map_or(Multiplicity::Overflowed, Multiplicity::Count)
            }
            _ => Multiplicity::Overflowed,
        }
    }

    pub fn count(self) -> Option<u64> {
        match self {
            Multiplicity::Count(n) => Some(n),
            Multiplicity::Overflowed => None,
        }
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Multiplicity::Count(n) => write!(f, "{}", n),
            Multiplicity::Overflowed => f.write_str("overflow"),
        }
    }
}

/// `multiplicity` lineage paths of length `depth` from a query individual up
/// to the node holding this entry.
///
/// `intermediates` lists one representative path, from the child of the node
/// down to the parent of the query individual. Paths of equal depth are
/// coalesced into a single entry instead of being enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineagePath {
    pub depth: u32,
    pub multiplicity: Multiplicity,
    pub intermediates: Vec<String>,
}

impl LineagePath {
    /// The empty path of a query individual to itself.
    pub fn origin() -> Self {
        Self {
            depth: 0,
            multiplicity: Multiplicity::one(),
            intermediates: Vec::new(),
        }
    }

    /// This path continued one generation up, from the node `through`.
    pub fn extended(&self, through: &str) -> Self {
        let mut intermediates = Vec::with_capacity(self.intermediates.len() + 1);
        if self.depth > 0 {
            intermediates.push(through.to_string());
        }
        intermediates.extend(self.intermediates.iter().cloned());

        Self {
            depth: self.depth + 1,
            multiplicity: self.multiplicity,
            intermediates,
        }
    }
}

/// Insert `path` into a depth-sorted list, coalescing with an entry of the
/// same depth. The existing entry keeps its intermediates.
pub(crate) fn merge_path(paths: &mut Vec<LineagePath>, path: LineagePath) {
    match paths.binary_search_by_key(&path.depth, |p| p.depth) {
        Ok(pos) => {
            let entry = &mut paths[pos];
            entry.multiplicity = entry.multiplicity.combine(path.multiplicity);
        }
        Err(pos) => paths.insert(pos, path),
    }
}
