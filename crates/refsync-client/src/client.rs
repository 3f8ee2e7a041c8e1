//! The synchronization client state machine

use crate::corpus::{ReferenceCorpus, SyncState};
use crate::watcher::DirWatcher;
use refsync_delta::{
    GreedyMatcher, Instruction, InstructionPlanner, Matcher, PlannerConfig, SourceMatch,
};
use refsync_protocol::RemoteStore;
use refsync_types::{Error, Result, TransferStats};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tunables for the synchronization client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Minimum accepted match length for delta encoding, in bytes
    pub min_match_len: usize,
    /// How often the source directory is polled for new files
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_match_len: 32,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_match_len == 0 {
            return Err(Error::config("minimum match length must be positive"));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::config("poll interval must be positive"));
        }
        Ok(())
    }
}

/// Where a file currently is in its synchronization lifecycle.
///
/// `Synced` and `Failed` are terminal for one attempt; a failed file is
/// treated as rediscovered on the next pass, never resumed mid-instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// A new file was found in the source directory
    Discovered,
    /// Matching against the reference corpus and planning instructions
    Planning,
    /// Replaying instructions against the destination store
    Transmitting,
    /// The file is fully synchronized and usable as a reference
    Synced,
    /// Transmission failed; the file awaits a full re-attempt
    Failed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovered => write!(f, "discovered"),
            Self::Planning => write!(f, "planning"),
            Self::Transmitting => write!(f, "transmitting"),
            Self::Synced => write!(f, "synced"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one successful file synchronization
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Stored file name at the destination
    pub name: String,
    /// Correlation id of this synchronization attempt
    pub attempt: Uuid,
    /// Total size of the candidate file in bytes
    pub bytes_total: u64,
    /// Bytes sent as literal data
    pub literal_bytes: u64,
    /// Bytes the destination copied out of files it already held
    pub copied_bytes: u64,
    /// Number of instructions replayed
    pub instructions: u64,
    /// BLAKE3 digest of the candidate content, for transfer logs
    pub digest: String,
}

impl FileReport {
    /// This file's contribution to aggregate transfer statistics
    pub fn stats(&self) -> TransferStats {
        TransferStats {
            files_synced: 1,
            files_failed: 0,
            literal_bytes: self.literal_bytes,
            copied_bytes: self.copied_bytes,
            instructions: self.instructions,
        }
    }
}

/// Watches a source directory and synchronizes every new file to a
/// destination store, delta-encoded against previously synchronized files.
pub struct SyncClient {
    watcher: DirWatcher,
    transport: Arc<dyn RemoteStore>,
    matcher: Box<dyn Matcher>,
    planner: InstructionPlanner,
    corpus: ReferenceCorpus,
    state: SyncState,
    config: SyncConfig,
}

impl SyncClient {
    /// Create a client with default configuration
    pub fn new(source: impl Into<PathBuf>, transport: Arc<dyn RemoteStore>) -> Result<Self> {
        Self::with_config(source, transport, SyncConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(
        source: impl Into<PathBuf>,
        transport: Arc<dyn RemoteStore>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            watcher: DirWatcher::new(source),
            transport,
            matcher: Box::new(GreedyMatcher::new()),
            planner: InstructionPlanner::new(PlannerConfig {
                min_match_len: config.min_match_len,
            }),
            corpus: ReferenceCorpus::new(),
            state: SyncState::new(),
            config,
        })
    }

    /// Replace the matching algorithm.
    ///
    /// The default greedy matcher trades optimality for bounded work; a
    /// caller with different needs can plug in any [`Matcher`] without
    /// affecting planning or transmission.
    pub fn with_matcher(mut self, matcher: Box<dyn Matcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// The client's configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Files already usable as match sources
    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    /// Which source paths have been fully synchronized
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Run one discovery pass: scan the source directory and synchronize
    /// every file not yet synced.
    ///
    /// A file that fails to transmit is logged, counted, and left unsynced;
    /// it will be picked up again by the next pass. Files are processed to
    /// completion one at a time, so a file only ever becomes a reference
    /// after its last byte is stored.
    pub async fn check(&mut self) -> Result<TransferStats> {
        let mut stats = TransferStats::new();
        for path in self.watcher.scan().await? {
            if self.state.is_synced(&path) {
                continue;
            }
            match self.sync_file(&path).await {
                Ok(report) => stats.merge(&report.stats()),
                Err(e) if e.is_retryable() => {
                    stats.files_failed += 1;
                    warn!(
                        "sync of '{}' failed, will re-attempt on a later pass: {}",
                        path.display(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(stats)
    }

    /// Poll the source directory forever, synchronizing new files as they
    /// appear.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "watching {} (poll interval {:?}, min match length {})",
            self.watcher.source().display(),
            self.config.poll_interval,
            self.config.min_match_len
        );
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.check().await {
                Ok(stats) if stats.files_synced > 0 => {
                    info!(
                        "pass synchronized {} files: {} literal bytes, {} copied ({}% saved)",
                        stats.files_synced,
                        stats.literal_bytes,
                        stats.copied_bytes,
                        (stats.savings_ratio() * 100.0).round()
                    );
                }
                Ok(_) => {}
                Err(e) if e.is_retryable() => {
                    warn!("discovery pass failed, retrying on next tick: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Synchronize one file to completion.
    ///
    /// Drives the full lifecycle: read the candidate, plan against the
    /// corpus, replay the plan against the store, and on success register
    /// the file as a reference for everything synchronized after it.
    pub async fn sync_file(&mut self, path: &Path) -> Result<FileReport> {
        let attempt = Uuid::new_v4();
        let name = stored_name(path)?;
        debug!("[{}] {}: '{}'", attempt, SyncPhase::Discovered, name);

        let candidate = fs::read(path).await.map_err(|e| Error::Io {
            message: format!("failed to read source file '{}': {}", path.display(), e),
        })?;

        debug!(
            "[{}] {}: '{}' against {} references",
            attempt,
            SyncPhase::Planning,
            name,
            self.corpus.len()
        );
        let plan = self.plan_candidate(path, &candidate).await?;

        debug!(
            "[{}] {}: '{}' with {} instructions",
            attempt,
            SyncPhase::Transmitting,
            name,
            plan.len()
        );
        let report = match self.transmit(&name, &candidate, &plan, attempt).await {
            Ok(report) => report,
            Err(e) => {
                debug!("[{}] {}: '{}'", attempt, SyncPhase::Failed, name);
                return Err(e);
            }
        };

        self.corpus.push(name.clone(), path);
        self.state.mark_synced(path);
        info!(
            "[{}] {}: '{}' ({} bytes: {} literal, {} copied, digest {})",
            attempt,
            SyncPhase::Synced,
            name,
            report.bytes_total,
            report.literal_bytes,
            report.copied_bytes,
            report.digest
        );
        Ok(report)
    }

    /// Match the candidate against every corpus entry in order and plan the
    /// instruction list.
    ///
    /// The candidate is never matched against itself: a sequence compared
    /// with itself trivially yields the whole file, which would make the
    /// destination copy a file from its own not-yet-written content.
    async fn plan_candidate(
        &self,
        candidate_path: &Path,
        candidate: &[u8],
    ) -> Result<Vec<Instruction>> {
        let mut matches = Vec::new();
        for entry in self.corpus.iter() {
            if entry.path.as_path() == candidate_path {
                continue;
            }
            let reference = fs::read(&entry.path).await.map_err(|e| Error::Io {
                message: format!(
                    "failed to read reference file '{}': {}",
                    entry.path.display(),
                    e
                ),
            })?;
            matches.extend(
                self.matcher
                    .find_matches(candidate, &reference)
                    .into_iter()
                    .map(|range| SourceMatch::new(entry.name.clone(), range)),
            );
        }
        Ok(self.planner.plan(candidate.len(), matches))
    }

    /// Replay a plan strictly in order against the destination store.
    ///
    /// Every attempt starts by resetting the destination file: this clears
    /// partial content left by an interrupted earlier attempt and also
    /// materializes empty candidates, whose plans hold no instructions.
    /// Ordering is load-bearing; append-based reconstruction is position
    /// dependent, so instructions are never reordered or parallelized
    /// within one file.
    async fn transmit(
        &self,
        name: &str,
        candidate: &[u8],
        plan: &[Instruction],
        attempt: Uuid,
    ) -> Result<FileReport> {
        self.transport.reset(name).await?;

        let mut literal_bytes = 0u64;
        let mut copied_bytes = 0u64;
        for instruction in plan {
            match instruction {
                Instruction::Literal { start, len } => {
                    let start = *start as usize;
                    let span = &candidate[start..start + *len as usize];
                    self.transport.append(name, span).await?;
                    literal_bytes += *len;
                }
                Instruction::Reference {
                    len,
                    source,
                    source_start,
                    ..
                } => {
                    self.transport
                        .copy_range(name, source, *source_start, *len)
                        .await?;
                    copied_bytes += *len;
                }
            }
        }

        Ok(FileReport {
            name: name.to_string(),
            attempt,
            bytes_total: candidate.len() as u64,
            literal_bytes,
            copied_bytes,
            instructions: plan.len() as u64,
            digest: blake3::hash(candidate).to_hex().to_string(),
        })
    }
}

/// Destination name for a source path: its final path component.
fn stored_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::sync(format!(
                "source path '{}' has no usable file name",
                path.display()
            ))
        })
}
