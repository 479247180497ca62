use std::collections::HashMap;
use std::path::Path;

use log::warn;

use crate::error::{KinshipError, Result};

use super::provider::{GraphProvider, ParentPair};

/// A single pedigree record: individual with optional primary parents.
#[derive(Debug, Clone)]
struct IndividualRecord {
    /// Individual identifier string.
    id: String,
    /// Index of the father in the records vector, or `None` if unknown.
    father: Option<usize>,
    /// Index of the mother in the records vector, or `None` if unknown.
    mother: Option<usize>,
    /// Unconfirmed record, excluded from topology and kinship traversal.
    provisional: bool,
}

/// In-memory pedigree of one tree.
///
/// Individuals are mapped to contiguous 0-based indices in insertion order.
/// Only the primary parent pair is stored. Unknown parents (coded as `"0"`,
/// `"NA"` or empty in input) are represented as `None`.
#[derive(Debug, Clone)]
pub struct Pedigree {
    /// Tree name shared by every individual of the pedigree.
    tree: String,
    records: Vec<IndividualRecord>,
    id_to_index: HashMap<String, usize>,
}

impl Pedigree {
    /// Create an empty pedigree for `tree`.
    pub fn new(tree: impl Into<String>) -> Self {
        Self {
            tree: tree.into(),
            records: Vec::new(),
            id_to_index: HashMap::new(),
        }
    }

    /// Number of individuals in the pedigree, provisional ones included.
    pub fn n_individuals(&self) -> usize {
        self.records.len()
    }

    /// Look up the 0-based index of an individual by its ID string.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// Look up the ID string of an individual by its 0-based index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn id(&self, index: usize) -> &str {
        &self.records[index].id
    }

    /// Father index of the individual at `index`.
    pub fn father(&self, index: usize) -> Option<usize> {
        self.records[index].father
    }

    /// Mother index of the individual at `index`.
    pub fn mother(&self, index: usize) -> Option<usize> {
        self.records[index].mother
    }

    pub fn provisional(&self, index: usize) -> bool {
        self.records[index].provisional
    }

    /// Add an individual to the pedigree.
    ///
    /// Parents must already be present; a parent ID that is not known yet is
    /// dropped with a warning. Use [`Pedigree::from_records`] when children
    /// may precede their parents.
    ///
    /// # Errors
    /// Returns an error if the individual ID already exists.
    pub fn add_individual(
        &mut self,
        id: &str,
        father: Option<&str>,
        mother: Option<&str>,
    ) -> Result<()> {
        if self.id_to_index.contains_key(id) {
            return Err(KinshipError::Pedigree(format!(
                "Duplicate individual ID: '{}'",
                id
            )));
        }

        let index = self.records.len();
        let father = self.resolve_parent(id, father);
        let mother = self.resolve_parent(id, mother);

        self.records.push(IndividualRecord {
            id: id.to_string(),
            father,
            mother,
            provisional: false,
        });
        self.id_to_index.insert(id.to_string(), index);

        Ok(())
    }

    /// Mark an individual as provisional (or confirmed again).
    ///
    /// # Errors
    /// Returns [`KinshipError::IndividualNotFound`] for an unknown ID.
    pub fn set_provisional(&mut self, id: &str, provisional: bool) -> Result<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| KinshipError::IndividualNotFound(id.to_string()))?;
        self.records[index].provisional = provisional;
        Ok(())
    }

    /// Build a pedigree from (individual, father, mother) triples.
    ///
    /// Parent values of `None` indicate unknown parents. Triples may be given
    /// in any order.
    ///
    /// # Errors
    /// Returns an error if duplicate individual IDs are found.
    pub fn from_records(
        tree: impl Into<String>,
        records: &[(String, Option<String>, Option<String>)],
    ) -> Result<Self> {
        let mut ped = Self::new(tree);

        // Register everyone first so parent lookups succeed regardless of
        // input order.
        for (id, _, _) in records {
            if ped.id_to_index.contains_key(id) {
                return Err(KinshipError::Pedigree(format!(
                    "Duplicate individual ID: '{}'",
                    id
                )));
            }
            let index = ped.records.len();
            ped.records.push(IndividualRecord {
                id: id.clone(),
                father: None,
                mother: None,
                provisional: false,
            });
            ped.id_to_index.insert(id.clone(), index);
        }

        for (i, (id, father, mother)) in records.iter().enumerate() {
            ped.records[i].father = ped.resolve_parent(id, father.as_deref());
            ped.records[i].mother = ped.resolve_parent(id, mother.as_deref());
        }

        Ok(ped)
    }

    /// Read a pedigree from a CSV file.
    ///
    /// A header is required. The identifier column is `id` or `individual`,
    /// parents are `father` (or `sire`) and `mother` (or `dam`). An optional
    /// `provisional` column flags unconfirmed records with `1`, `true`, `yes`
    /// or `y`. Unknown parents are coded as `"0"`, `""` or `"NA"`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, columns are missing, or
    /// duplicate IDs are found.
    pub fn from_csv<P: AsRef<Path>>(tree: impl Into<String>, path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();

        let column = |names: &[&str]| -> Result<usize> {
            headers
                .iter()
                .position(|h| names.contains(&h.as_str()))
                .ok_or_else(|| {
                    KinshipError::Pedigree(format!("CSV missing '{}' column", names[0]))
                })
        };

        let id_col = column(&["id", "individual"])?;
        let father_col = column(&["father", "sire"])?;
        let mother_col = column(&["mother", "dam"])?;
        let provisional_col = headers.iter().position(|h| h == "provisional");

        let mut records = Vec::new();
        let mut provisional = Vec::new();

        for result in reader.records() {
            let row = result?;
            let field = |col: usize, name: &str| -> Result<String> {
                row.get(col).map(str::to_string).ok_or_else(|| {
                    KinshipError::Pedigree(format!("Missing {} field in row", name))
                })
            };

            let id = field(id_col, "id")?;
            let father = parse_parent(&field(father_col, "father")?);
            let mother = parse_parent(&field(mother_col, "mother")?);

            if let Some(col) = provisional_col {
                if parse_flag(&field(col, "provisional")?) {
                    provisional.push(id.clone());
                }
            }

            records.push((id, father, mother));
        }

        let mut ped = Self::from_records(tree, &records)?;
        for id in &provisional {
            ped.set_provisional(id, true)?;
        }
        Ok(ped)
    }

    /// Validate the pedigree for consistency.
    ///
    /// Checks that no individual is its own parent and that the father and
    /// mother of an individual are different people. Longer parentage cycles
    /// are reported by the topology builder.
    ///
    /// # Errors
    /// Returns an error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        for (i, rec) in self.records.iter().enumerate() {
            if rec.father == Some(i) {
                return Err(KinshipError::Pedigree(format!(
                    "Individual '{}' is listed as its own father",
                    rec.id
                )));
            }
            if rec.mother == Some(i) {
                return Err(KinshipError::Pedigree(format!(
                    "Individual '{}' is listed as its own mother",
                    rec.id
                )));
            }
            if rec.father.is_some() && rec.father == rec.mother {
                return Err(KinshipError::Pedigree(format!(
                    "Individual '{}' has the same person as father and mother",
                    rec.id
                )));
            }
        }
        Ok(())
    }

    fn resolve_parent(&self, child: &str, parent: Option<&str>) -> Option<usize> {
        let parent = parent?;
        let index = self.id_to_index.get(parent).copied();
        if index.is_none() {
            warn!(
                "tree '{}': parent '{}' of '{}' is not in the pedigree, treating as unknown",
                self.tree, parent, child
            );
        }
        index
    }

    fn record(&self, id: &str) -> Result<&IndividualRecord> {
        self.index_of(id)
            .map(|i| &self.records[i])
            .ok_or_else(|| KinshipError::IndividualNotFound(id.to_string()))
    }
}

impl GraphProvider for Pedigree {
    fn tree(&self) -> &str {
        &self.tree
    }

    fn individuals(&self) -> Result<Vec<String>> {
        Ok(self.records.iter().map(|r| r.id.clone()).collect())
    }

    fn primary_parents(&self, xref: &str) -> Result<ParentPair> {
        let rec = self.record(xref)?;
        Ok(ParentPair::new(
            rec.father.map(|i| self.records[i].id.clone()),
            rec.mother.map(|i| self.records[i].id.clone()),
        ))
    }

    fn is_provisional(&self, xref: &str) -> Result<bool> {
        Ok(self.record(xref)?.provisional)
    }
}

/// Parse a parent string, returning `None` for unknown parents.
///
/// Unknown parents are coded as `"0"`, `""`, `"NA"`, or `"na"`.
fn parse_parent(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "0" || trimmed.eq_ignore_ascii_case("na") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}
