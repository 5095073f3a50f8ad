use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dom::ElementTree;
use crate::error::Result;
use crate::fill::fill_model::{FieldMapping, FillConfig, FillReport, FillValue};
use crate::fill::filler::{FieldOutcome, Filler, PendingUpload};
use crate::resolver::{ResolveRequest, Resolver};
use crate::scan::{ActionDescriptor, FieldDescriptor, JobContext, Scanner, extract_job_context};
use crate::trace::{FillTraceEvent, TraceLogger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillState {
    Idle,
    Filling { iteration: u32 },
    Rescanning { iteration: u32 },
    Done,
}

/// What a finished session hands back.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub report: FillReport,
    /// File inputs the resolver asked to upload into.
    pub uploads: Vec<PendingUpload>,
    /// Every descriptor seen by any scan, in discovery order.
    pub descriptors: Vec<FieldDescriptor>,
    pub actions: Vec<ActionDescriptor>,
    pub job: JobContext,
}

/// Scan, resolve, fill, rescan until no new fields appear or the iteration
/// cap is reached.
///
/// ```text
/// Idle -> Filling(1) -> Rescanning(1) -> Filling(2) -> ... -> Done
/// ```
pub struct FillSession<'a> {
    scanner: &'a Scanner,
    resolver: &'a dyn Resolver,
    filler: Filler,
    config: FillConfig,
    tracer: Option<&'a TraceLogger>,

    state: FillState,
    descriptors: Vec<FieldDescriptor>,
    by_id: HashMap<String, usize>,
    known_ids: HashSet<String>,
    actions: Vec<ActionDescriptor>,
    job: JobContext,

    /// Entries to apply in the next Filling pass, in scan order.
    pending: Vec<(String, FillValue)>,
    /// Entries whose field could not be located yet.
    unresolved: FieldMapping,
    /// Ids that have had an outcome other than not-found.
    attempted: HashSet<String>,
    filled_ids: HashSet<String>,
    uploads: Vec<PendingUpload>,
    report: FillReport,
}

impl<'a> FillSession<'a> {
    pub fn new(scanner: &'a Scanner, resolver: &'a dyn Resolver, config: FillConfig) -> Self {
        let filler = Filler::new(&config);
        Self {
            scanner,
            resolver,
            filler,
            config,
            tracer: None,
            state: FillState::Idle,
            descriptors: Vec::new(),
            by_id: HashMap::new(),
            known_ids: HashSet::new(),
            actions: Vec::new(),
            job: JobContext::default(),
            pending: Vec::new(),
            unresolved: FieldMapping::new(),
            attempted: HashSet::new(),
            filled_ids: HashSet::new(),
            uploads: Vec::new(),
            report: FillReport::default(),
        }
    }

    pub fn with_tracer(mut self, tracer: &'a TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_cover_letter(mut self, text: Option<String>) -> Self {
        self.filler = self.filler.with_cover_letter(text);
        self
    }

    pub fn state(&self) -> FillState {
        self.state
    }

    pub fn report(&self) -> &FillReport {
        &self.report
    }

    /// Advance one state. Only resolver failures escape; everything that
    /// goes wrong with a single field lands in the report.
    pub fn step(&mut self, tree: &mut dyn ElementTree) -> Result<FillState> {
        self.state = match self.state {
            FillState::Idle => {
                let scan = self.scanner.scan(tree);
                self.job = extract_job_context(&*tree);
                self.actions = scan.actions.clone();
                info!(fields = scan.fields.len(), actions = scan.actions.len(), "initial scan");

                let request = ResolveRequest {
                    fields: scan.fields.clone(),
                    actions: scan.actions,
                    job: self.job.clone(),
                };
                let mapping = self.resolver.resolve(&request)?;
                let fresh: Vec<String> = scan.fields.iter().map(|f| f.id.clone()).collect();
                self.register(scan.fields);
                self.queue(mapping, &fresh);

                tree.watch_navigation(true);
                FillState::Filling { iteration: 1 }
            }

            FillState::Filling { iteration } => {
                self.report.iterations = iteration;
                info!(iteration, entries = self.pending.len(), "fill pass");
                if self.fill_pass(tree, iteration) {
                    FillState::Done
                } else {
                    FillState::Rescanning { iteration }
                }
            }

            FillState::Rescanning { iteration } => {
                tree.settle(Duration::from_millis(self.config.rescan_delay_ms));
                let fresh = self.scanner.scan_excluding(tree, &self.known_ids);

                if fresh.is_empty() {
                    debug!(iteration, "rescan found no new fields");
                    FillState::Done
                } else if iteration >= self.config.max_iterations {
                    let message = format!(
                        "iteration cap ({}) reached with {} new field(s) still appearing",
                        self.config.max_iterations,
                        fresh.len()
                    );
                    warn!("{}", message);
                    self.report.warnings.push(message);
                    FillState::Done
                } else {
                    info!(iteration, new_fields = fresh.len(), "rescan revealed fields");
                    let request = ResolveRequest {
                        fields: fresh.clone(),
                        actions: self.actions.clone(),
                        job: self.job.clone(),
                    };
                    let mapping = self.resolver.resolve(&request)?;
                    let fresh_ids: Vec<String> = fresh.iter().map(|f| f.id.clone()).collect();
                    self.register(fresh);
                    self.queue(mapping, &fresh_ids);
                    FillState::Filling {
                        iteration: iteration + 1,
                    }
                }
            }

            FillState::Done => FillState::Done,
        };
        Ok(self.state)
    }

    /// Drive the session to `Done`.
    pub fn run(mut self, tree: &mut dyn ElementTree) -> Result<SessionOutcome> {
        while self.step(tree)? != FillState::Done {}
        tree.watch_navigation(false);
        Ok(self.finish())
    }

    fn finish(mut self) -> SessionOutcome {
        self.report.not_found = self
            .unresolved
            .keys()
            .filter(|id| !self.filled_ids.contains(*id))
            .cloned()
            .collect();
        SessionOutcome {
            report: self.report,
            uploads: self.uploads,
            descriptors: self.descriptors,
            actions: self.actions,
            job: self.job,
        }
    }

    // ------------------------------------------------------------------

    fn register(&mut self, fields: Vec<FieldDescriptor>) {
        for field in fields {
            self.known_ids.insert(field.id.clone());
            self.by_id.insert(field.id.clone(), self.descriptors.len());
            self.descriptors.push(field);
        }
    }

    /// Turn a resolver mapping into the next pass's work list.
    ///
    /// Entries for freshly scanned fields go first in scan order, carrying
    /// over earlier unresolved entries for the same ids. Entries for ids
    /// already handled are dropped. Everything still unresolved is retried
    /// by id, name and position.
    fn queue(&mut self, mut mapping: FieldMapping, fresh: &[String]) {
        let mut pending = Vec::new();
        for id in fresh {
            let carried = self.unresolved.remove(id);
            if let Some(value) = mapping.remove(id).or(carried) {
                pending.push((id.clone(), value));
            }
        }
        for (id, value) in mapping {
            if self.filled_ids.contains(&id) || self.attempted.contains(&id) {
                continue;
            }
            self.unresolved.remove(&id);
            pending.push((id, value));
        }
        pending.extend(std::mem::take(&mut self.unresolved));
        self.pending = pending;
    }

    /// Apply the pending entries. Returns true when navigation interrupted
    /// the pass.
    fn fill_pass(&mut self, tree: &mut dyn ElementTree, iteration: u32) -> bool {
        let pending = std::mem::take(&mut self.pending);
        let mut entries = pending.into_iter();

        while let Some((id, value)) = entries.next() {
            if self.filled_ids.contains(&id) {
                debug!(id = %id, "already filled, skipping");
                continue;
            }

            let descriptor = self.by_id.get(&id).map(|idx| &self.descriptors[*idx]);
            let outcome = self.filler.fill_field(tree, &id, descriptor, &value);
            if let Some(tracer) = self.tracer {
                tracer.log(&FillTraceEvent::from_outcome(iteration, &id, &outcome));
            }
            self.record(id, value, outcome);

            if tree.navigation_detected() {
                let remaining: Vec<(String, FillValue)> = entries.by_ref().collect();
                let message = format!(
                    "page navigated during fill pass {}; {} remaining entr{} not applied",
                    iteration,
                    remaining.len(),
                    if remaining.len() == 1 { "y" } else { "ies" }
                );
                warn!("{}", message);
                self.report.warnings.push(message);
                self.report.navigation_interrupted = true;
                for (id, value) in remaining {
                    self.unresolved.insert(id, value);
                }
                return true;
            }
        }
        false
    }

    fn record(&mut self, id: String, value: FillValue, outcome: FieldOutcome) {
        match outcome {
            FieldOutcome::Filled(filled) => {
                debug!(id = %id, method = ?filled.method, "filled");
                self.filled_ids.insert(id.clone());
                self.attempted.insert(id);
                self.report.filled.push(filled);
            }
            FieldOutcome::Skipped(skipped) => {
                debug!(id = %id, reason = skipped.reason.describe(), "skipped");
                self.attempted.insert(id);
                self.report.skipped.push(skipped);
            }
            FieldOutcome::Failed(error) => {
                warn!(id = %id, "fill failed: {}", error.issue);
                self.attempted.insert(id);
                self.report.errors.push(error);
            }
            FieldOutcome::Upload(upload) => {
                debug!(id = %id, file_type = %upload.file_type, "upload queued");
                self.attempted.insert(id);
                self.uploads.push(upload);
            }
            FieldOutcome::NotFound => {
                debug!(id = %id, "field not found");
                self.unresolved.insert(id, value);
            }
        }
    }
}
