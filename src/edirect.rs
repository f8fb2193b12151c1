use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::LineageError;
use crate::lineage::{FETCH_NOT_FOUND, RawLineage};

/// Emitted by `esearch`/`efetch` when the accession matches nothing.
pub const SEARCH_NOT_FOUND: &str = "WebEnv value not found in search output - WebEnv1";

pub const REQUIRED_TOOLS: [&str; 3] = ["esearch", "efetch", "xtract"];

const KILL_GRACE: Duration = Duration::from_secs(2);
const READ_CHUNK: usize = 8192;

/// Ranks matched by the lineage extraction. `kingdom` is requested but never
/// stored.
const MATCHED_RANKS: [&str; 8] = [
    "superkingdom",
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "genus",
    "species",
];

pub trait TaxonomyGateway {
    /// Resolves an accession to its taxonomy identifier, `None` when it does
    /// not resolve to exactly one.
    fn resolve_identifier(&self, accession: &str) -> Option<String>;

    /// Fetches raw `origin<TAB>rank<TAB>taxid<TAB>name` lines for a taxon.
    fn fetch_lineage(&self, taxid: &str) -> Vec<String>;

    fn lookup(&self, accession: &str) -> RawLineage {
        match self.resolve_identifier(accession) {
            Some(taxid) => RawLineage::Lines(self.fetch_lineage(&taxid)),
            None => RawLineage::NotFound,
        }
    }
}

impl<G: TaxonomyGateway + ?Sized> TaxonomyGateway for &G {
    fn resolve_identifier(&self, accession: &str) -> Option<String> {
        (**self).resolve_identifier(accession)
    }

    fn fetch_lineage(&self, taxid: &str) -> Vec<String> {
        (**self).fetch_lineage(taxid)
    }
}

#[derive(Debug, Clone)]
pub struct EdirectSettings {
    pub timeout: Duration,
    pub nucleotide_db: String,
    pub taxonomy_db: String,
}

impl Default for EdirectSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            nucleotide_db: "nucleotide".to_string(),
            taxonomy_db: "taxonomy".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdirectClient {
    esearch: PathBuf,
    efetch: PathBuf,
    xtract: PathBuf,
    settings: EdirectSettings,
}

impl EdirectClient {
    /// Locates the EDirect suite on `PATH`.
    pub fn new(settings: EdirectSettings) -> Result<Self, LineageError> {
        let [esearch, efetch, xtract] = locate_toolchain()?;
        Ok(Self {
            esearch,
            efetch,
            xtract,
            settings,
        })
    }

    fn taxid_pipeline(&self, accession: &str) -> Vec<Stage> {
        vec![
            Stage::new(
                &self.esearch,
                ["-db", self.settings.nucleotide_db.as_str(), "-query", accession],
            ),
            Stage::new(&self.efetch, ["-format", "docsum"]),
            Stage::new(
                &self.xtract,
                ["-pattern", "DocumentSummary", "-element", "TaxId"],
            ),
        ]
    }

    fn lineage_pipeline(&self, taxid: &str) -> Vec<Stage> {
        vec![
            Stage::new(
                &self.efetch,
                [
                    "-db",
                    self.settings.taxonomy_db.as_str(),
                    "-id",
                    taxid,
                    "-format",
                    "xml",
                ],
            ),
            Stage::new(&self.xtract, lineage_extract_args()),
        ]
    }
}

impl TaxonomyGateway for EdirectClient {
    fn resolve_identifier(&self, accession: &str) -> Option<String> {
        debug!(accession, "resolving taxonomy id");
        let output = run_pipeline(&self.taxid_pipeline(accession), self.settings.timeout);
        parse_taxid(&output)
    }

    fn fetch_lineage(&self, taxid: &str) -> Vec<String> {
        debug!(taxid, "fetching lineage");
        let output = run_pipeline(&self.lineage_pipeline(taxid), self.settings.timeout);
        split_output(&output)
    }
}

/// `xtract` arguments emitting the taxon itself (placeholder `NONE`) followed
/// by every matched lineage node (placeholder `NOT_AVAILABLE`).
pub fn lineage_extract_args() -> Vec<String> {
    let mut args = vec![
        "-pattern", "Taxon", "-tab", "\n", "-sep", "\t", "-def", "NONE", "-TAXID", "TaxId",
        "-element", "&TAXID,Rank,TaxId,ScientificName", "-division", "LineageEx", "-group",
        "Taxon",
    ]
    .into_iter()
    .map(str::to_string)
    .collect::<Vec<_>>();

    for (position, rank) in MATCHED_RANKS.into_iter().enumerate() {
        let keyword = if position == 0 { "-if" } else { "-or" };
        args.extend([keyword, "Rank", "-equals", rank].map(str::to_string));
    }

    args.extend(
        [
            "-tab",
            "\n",
            "-sep",
            "\t",
            "-def",
            "NOT_AVAILABLE",
            "-element",
            "&TAXID,Rank,TaxId,ScientificName",
        ]
        .map(str::to_string),
    );
    args
}

/// Accepts exactly one non-empty line that is not a not-found sentinel.
pub fn parse_taxid(output: &str) -> Option<String> {
    let lines = split_output(output);
    match lines.as_slice() {
        [line] if !line.is_empty() && line != SEARCH_NOT_FOUND && line != FETCH_NOT_FOUND => {
            Some(line.clone())
        }
        _ => None,
    }
}

pub fn split_output(output: &str) -> Vec<String> {
    output.trim_end().lines().map(str::to_string).collect()
}

#[derive(Debug, Clone)]
pub struct Stage {
    program: PathBuf,
    args: Vec<String>,
}

impl Stage {
    pub fn new<I, S>(program: impl AsRef<Path>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            program: program.as_ref().to_path_buf(),
            args: args.into_iter().map(|arg| arg.as_ref().to_string()).collect(),
        }
    }
}

/// Runs `stages` as a pipeline and returns the combined stdout/stderr text.
///
/// Every stage writes stderr into the collected output. When `timeout`
/// expires all stages are killed and whatever was already written is kept.
/// A stage that cannot be spawned yields empty output.
pub fn run_pipeline(stages: &[Stage], timeout: Duration) -> String {
    let deadline = Instant::now() + timeout;
    let (reader, mut children) = match spawn_pipeline(stages) {
        Ok(spawned) => spawned,
        Err(err) => {
            warn!(error = %err, "failed to launch external pipeline");
            return String::new();
        }
    };

    let receiver = stream_chunks(reader);
    let mut collected = Vec::new();
    let mut timed_out = false;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok(chunk) => collected.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                timed_out = true;
                break;
            }
        }
    }

    if timed_out {
        warn!(
            timeout_secs = timeout.as_secs_f64(),
            "external pipeline timed out; killing"
        );
        kill_all(&mut children);
        let grace_deadline = Instant::now() + KILL_GRACE;
        loop {
            let remaining = grace_deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match receiver.recv_timeout(remaining) {
                Ok(chunk) => collected.extend_from_slice(&chunk),
                Err(_) => break,
            }
        }
    }

    reap(&mut children, deadline);
    String::from_utf8_lossy(&collected).into_owned()
}

fn spawn_pipeline(stages: &[Stage]) -> io::Result<(io::PipeReader, Vec<Child>)> {
    let (reader, writer) = io::pipe()?;
    let mut children: Vec<Child> = Vec::with_capacity(stages.len());
    let mut upstream: Option<ChildStdout> = None;

    for (position, stage) in stages.iter().enumerate() {
        let is_last = position + 1 == stages.len();
        let mut cmd = Command::new(&stage.program);
        cmd.args(&stage.args);
        cmd.stdin(match upstream.take() {
            Some(stdout) => Stdio::from(stdout),
            None => Stdio::null(),
        });
        cmd.stderr(writer.try_clone()?);
        if is_last {
            cmd.stdout(writer.try_clone()?);
        } else {
            cmd.stdout(Stdio::piped());
        }

        match cmd.spawn() {
            Ok(mut child) => {
                upstream = child.stdout.take();
                children.push(child);
            }
            Err(err) => {
                kill_all(&mut children);
                reap(&mut children, Instant::now());
                return Err(io::Error::new(
                    err.kind(),
                    format!("{}: {err}", stage.program.display()),
                ));
            }
        }
    }

    Ok((reader, children))
}

fn stream_chunks(mut reader: io::PipeReader) -> Receiver<Vec<u8>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if sender.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    receiver
}

fn kill_all(children: &mut [Child]) {
    for child in children.iter_mut() {
        let _ = child.kill();
    }
}

/// Waits for every stage, killing any still alive past `deadline`.
fn reap(children: &mut [Child], deadline: Instant) {
    for child in children.iter_mut() {
        loop {
            match child.try_wait() {
                Ok(Some(_)) | Err(_) => break,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    break;
                }
                Ok(None) => thread::sleep(Duration::from_millis(20)),
            }
        }
    }
}

/// Resolves every entry of `REQUIRED_TOOLS`, failing on the first one
/// missing from `PATH`.
pub fn locate_toolchain() -> Result<[PathBuf; 3], LineageError> {
    let mut found: [PathBuf; 3] = Default::default();
    for (slot, tool) in found.iter_mut().zip(REQUIRED_TOOLS) {
        *slot = find_in_path(tool).ok_or_else(|| LineageError::MissingTool(tool.to_string()))?;
    }
    Ok(found)
}

pub fn check_toolchain() -> Result<(), LineageError> {
    locate_toolchain().map(|_| ())
}

pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    find_in_dirs(name, std::env::split_paths(&path_var))
}

pub fn find_in_dirs<I>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    for dir in dirs {
        let exe = dir.join(format!("{name}.exe"));
        if exe.is_file() {
            return Some(exe);
        }
        let plain = dir.join(name);
        if plain.is_file() {
            return Some(plain);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxid_requires_exactly_one_line() {
        assert_eq!(parse_taxid("9606\n"), Some("9606".to_string()));
        assert_eq!(parse_taxid(""), None);
        assert_eq!(parse_taxid("9606\n10090\n"), None);
        assert_eq!(parse_taxid(&format!("{SEARCH_NOT_FOUND}\n")), None);
        assert_eq!(parse_taxid(FETCH_NOT_FOUND), None);
    }

    #[test]
    fn extract_args_match_every_rank() {
        let args = lineage_extract_args();
        assert_eq!(args.iter().filter(|arg| *arg == "-equals").count(), 8);
        assert_eq!(args.iter().filter(|arg| *arg == "-if").count(), 1);
        assert!(args.contains(&"kingdom".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("&TAXID,Rank,TaxId,ScientificName"));
    }

    #[test]
    fn split_output_drops_trailing_blank_lines() {
        assert_eq!(split_output("a\tb\n\n\n"), vec!["a\tb".to_string()]);
        assert!(split_output("\n").is_empty());
    }
}
