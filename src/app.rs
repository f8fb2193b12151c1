use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::domain::LookupOutcome;
use crate::edirect::TaxonomyGateway;
use crate::error::LineageError;
use crate::lineage::{LineageRecord, normalize};
use crate::table::LineageTables;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub row: usize,
    pub accn: String,
    pub outcome: LookupOutcome,
}

pub trait ProgressSink {
    fn start(&self) {}
    fn event(&self, event: ProgressEvent);
}

/// Records accumulated over one batch, in output row order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub taxids: Vec<LineageRecord>,
    pub names: Vec<LineageRecord>,
}

impl BatchSummary {
    pub fn resolved(&self) -> usize {
        self.taxids.len()
    }

    pub fn failed(&self) -> usize {
        self.processed - self.resolved()
    }
}

pub struct App<G: TaxonomyGateway> {
    gateway: G,
}

impl<G: TaxonomyGateway> App<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Looks up every accession in `input`, one per line, writing found
    /// lineages to `tables` and one progress event per accession to `sink`.
    pub fn run<R, W>(
        &self,
        input: R,
        tables: &mut LineageTables<W>,
        sink: &dyn ProgressSink,
    ) -> Result<BatchSummary, LineageError>
    where
        R: BufRead,
        W: Write,
    {
        let mut summary = BatchSummary::default();
        sink.start();

        for (index, line) in input.split(b'\n').enumerate() {
            let line = line.map_err(|err| LineageError::InputStream(err.to_string()))?;
            let line = String::from_utf8_lossy(&line);
            let accn = line.trim_end();
            let row = index + 1;

            let raw = self.gateway.lookup(accn);
            let pair = normalize(accn, &raw);
            debug!(row, accn, found = pair.found(), "accession processed");

            sink.event(ProgressEvent {
                row,
                accn: accn.to_string(),
                outcome: pair.outcome(),
            });
            summary.processed = row;

            if pair.found() {
                tables.write_pair(&pair)?;
                summary.taxids.push(pair.taxids);
                summary.names.push(pair.names);
            }
        }

        tables.flush()?;
        info!(
            processed = summary.processed,
            resolved = summary.resolved(),
            failed = summary.failed(),
            "batch complete"
        );
        Ok(summary)
    }
}
