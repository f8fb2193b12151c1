use std::fs::File;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::domain::Rank;
use crate::error::LineageError;
use crate::lineage::LineagePair;

pub const TAXIDS_SUFFIX: &str = "taxids.tsv";
pub const NAMES_SUFFIX: &str = "names.tsv";

pub fn header() -> Vec<&'static str> {
    std::iter::once("accn")
        .chain(Rank::ALL.iter().map(Rank::as_str))
        .collect()
}

pub fn output_paths(prefix: &Utf8Path) -> (Utf8PathBuf, Utf8PathBuf) {
    (
        Utf8PathBuf::from(format!("{prefix}.{TAXIDS_SUFFIX}")),
        Utf8PathBuf::from(format!("{prefix}.{NAMES_SUFFIX}")),
    )
}

/// Two TSV streams, one for taxonomic IDs and one for scientific names, that
/// always receive the same header and the same row order.
pub struct LineageTables<W: Write> {
    taxids: Writer<W>,
    names: Writer<W>,
    rows: usize,
}

impl LineageTables<File> {
    pub fn create(prefix: &Utf8Path) -> Result<Self, LineageError> {
        let (taxids_path, names_path) = output_paths(prefix);
        let open = |path: &Utf8Path| {
            File::create(path)
                .map_err(|err| LineageError::OutputWrite(format!("create {path}: {err}")))
        };
        Self::new(open(taxids_path.as_path())?, open(names_path.as_path())?)
    }
}

impl<W: Write> LineageTables<W> {
    /// Wraps both sinks and writes the shared header row.
    pub fn new(taxids: W, names: W) -> Result<Self, LineageError> {
        let mut tables = Self {
            taxids: tsv_writer(taxids),
            names: tsv_writer(names),
            rows: 0,
        };
        let header = header();
        write_record(&mut tables.taxids, &header)?;
        write_record(&mut tables.names, &header)?;
        Ok(tables)
    }

    pub fn write_pair(&mut self, pair: &LineagePair) -> Result<(), LineageError> {
        write_record(&mut self.taxids, pair.taxids.row())?;
        write_record(&mut self.names, pair.names.row())?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<(), LineageError> {
        self.taxids.flush().map_err(write_err)?;
        self.names.flush().map_err(write_err)
    }

    /// Flushes and hands back the underlying sinks.
    pub fn into_inner(self) -> Result<(W, W), LineageError> {
        let taxids = self
            .taxids
            .into_inner()
            .map_err(|err| LineageError::OutputWrite(err.to_string()))?;
        let names = self
            .names
            .into_inner()
            .map_err(|err| LineageError::OutputWrite(err.to_string()))?;
        Ok((taxids, names))
    }
}

fn tsv_writer<W: Write>(sink: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .has_headers(false)
        .from_writer(sink)
}

fn write_record<W, I, T>(writer: &mut Writer<W>, record: I) -> Result<(), LineageError>
where
    W: Write,
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(record)
        .map_err(|err| LineageError::OutputWrite(err.to_string()))
}

fn write_err(err: std::io::Error) -> LineageError {
    LineageError::OutputWrite(err.to_string())
}
