use serde::Serialize;
use tracing::warn;

use crate::domain::{LookupOutcome, Rank};

/// Emitted by `efetch` when the preceding search produced nothing to fetch.
pub const FETCH_NOT_FOUND: &str = "WebEnv value not found in fetch input";

/// Raw gateway response for one accession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLineage {
    NotFound,
    Lines(Vec<String>),
}

/// One output row: an accession plus a value for every rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageRecord {
    pub accn: String,
    values: [String; 7],
    found: bool,
}

impl LineageRecord {
    pub fn empty(accn: &str) -> Self {
        Self {
            accn: accn.to_string(),
            values: Default::default(),
            found: false,
        }
    }

    pub fn get(&self, rank: Rank) -> &str {
        &self.values[rank.index()]
    }

    pub fn set(&mut self, rank: Rank, value: &str) {
        self.values[rank.index()] = value.to_string();
    }

    pub fn found(&self) -> bool {
        self.found
    }

    pub fn outcome(&self) -> LookupOutcome {
        LookupOutcome::from_found(self.found)
    }

    /// Cells in column order: `accn` then every rank.
    pub fn row(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.accn.as_str()).chain(self.values.iter().map(String::as_str))
    }
}

/// Taxonomic IDs and scientific names derived from the same raw lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineagePair {
    pub taxids: LineageRecord,
    pub names: LineageRecord,
}

impl LineagePair {
    pub fn empty(accn: &str) -> Self {
        Self {
            taxids: LineageRecord::empty(accn),
            names: LineageRecord::empty(accn),
        }
    }

    pub fn found(&self) -> bool {
        self.taxids.found
    }

    pub fn outcome(&self) -> LookupOutcome {
        self.taxids.outcome()
    }

    fn mark_found(&mut self) {
        self.taxids.found = true;
        self.names.found = true;
    }
}

/// A single `origin<TAB>rank<TAB>taxid<TAB>name` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageLine<'a> {
    pub origin: &'a str,
    pub rank: &'a str,
    pub taxid: &'a str,
    pub name: &'a str,
}

pub fn parse_line(line: &str) -> Option<LineageLine<'_>> {
    let mut fields = line.split('\t');
    let parsed = LineageLine {
        origin: fields.next()?,
        rank: fields.next()?,
        taxid: fields.next()?,
        name: fields.next()?,
    };
    if fields.next().is_some() {
        return None;
    }
    Some(parsed)
}

/// Normalizes a raw response into the fixed seven-rank record pair.
///
/// Responses of zero or one line, or starting with the fetch sentinel, count
/// as not found. Ranks outside the fixed set still mark the pair as found but
/// are never stored. Duplicate ranks keep the last value seen. Lines without
/// exactly four tab-separated fields are skipped.
pub fn normalize(accn: &str, raw: &RawLineage) -> LineagePair {
    let mut pair = LineagePair::empty(accn);

    let lines = match raw {
        RawLineage::NotFound => return pair,
        RawLineage::Lines(lines) => lines,
    };
    if lines.len() <= 1 || lines[0] == FETCH_NOT_FOUND {
        return pair;
    }

    for line in lines {
        let Some(parsed) = parse_line(line) else {
            warn!(accn, line = line.as_str(), "skipping malformed lineage line");
            continue;
        };
        if let Ok(rank) = parsed.rank.parse::<Rank>() {
            pair.taxids.set(rank, parsed.taxid);
            pair.names.set(rank, parsed.name);
        }
        pair.mark_found();
    }

    pair
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> RawLineage {
        RawLineage::Lines(raw.iter().map(|line| line.to_string()).collect())
    }

    #[test]
    fn not_found_sentinel_yields_empty_pair() {
        let pair = normalize("ABC123", &RawLineage::NotFound);
        assert!(!pair.found());
        assert_eq!(pair.taxids.row().skip(1).filter(|v| !v.is_empty()).count(), 0);
        assert_eq!(pair.outcome().code(), 0);
    }

    #[test]
    fn single_line_is_not_enough() {
        let pair = normalize("A1", &lines(&["9606\tspecies\t9606\tHomo sapiens"]));
        assert!(!pair.found());
        assert_eq!(pair.names.get(Rank::Species), "");
    }

    #[test]
    fn fetch_sentinel_first_line() {
        let pair = normalize("A1", &lines(&[FETCH_NOT_FOUND, "x\tgenus\t1\tY"]));
        assert!(!pair.found());
    }

    #[test]
    fn duplicate_rank_last_wins() {
        let pair = normalize(
            "A1",
            &lines(&["1\tgenus\t10\tFirst", "1\tgenus\t20\tSecond"]),
        );
        assert_eq!(pair.taxids.get(Rank::Genus), "20");
        assert_eq!(pair.names.get(Rank::Genus), "Second");
    }

    #[test]
    fn unknown_rank_still_marks_found() {
        let pair = normalize(
            "A1",
            &lines(&["1\tkingdom\t33208\tMetazoa", "1\tno rank\t1\troot"]),
        );
        assert!(pair.found());
        assert!(pair.taxids.row().skip(1).all(str::is_empty));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        assert!(parse_line("a\tb\tc").is_none());
        assert!(parse_line("a\tb\tc\td\te").is_none());

        let pair = normalize("A1", &lines(&["garbage", "1\tphylum\t7711\tChordata"]));
        assert!(pair.found());
        assert_eq!(pair.names.get(Rank::Phylum), "Chordata");

        let pair = normalize("A2", &lines(&["garbage", "still garbage"]));
        assert!(!pair.found());
    }
}
