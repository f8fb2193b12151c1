use std::fmt;
use std::str::FromStr;

use crate::error::LineageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Superkingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// Canonical rank order, broad to specific. Defines output column order.
    pub const ALL: [Rank; 7] = [
        Rank::Superkingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Superkingdom => "superkingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Rank {
    type Err = LineageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.as_str() == value)
            .ok_or_else(|| LineageError::UnknownRank(value.to_string()))
    }
}

/// Per-accession lookup result as shown in the progress table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Failed,
    Ok,
}

impl LookupOutcome {
    pub fn from_found(found: bool) -> Self {
        if found {
            LookupOutcome::Ok
        } else {
            LookupOutcome::Failed
        }
    }

    /// Numeric result flag: `1` found, `0` not found.
    pub fn code(&self) -> u8 {
        match self {
            LookupOutcome::Failed => 0,
            LookupOutcome::Ok => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::Failed => "failed",
            LookupOutcome::Ok => "ok",
        }
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
