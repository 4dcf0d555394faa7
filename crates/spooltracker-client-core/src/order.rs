//! Keeps one panel pinned directly after another in a tree the panel does not own.
//!
//! A single `reconcile` transition is driven by three sources: one immediate
//! attempt, a bounded retry timer, and a structural-mutation watch on a stable
//! ancestor. Position is never cached; every call re-reads the tree.

use serde::Serialize;

use crate::config::PanelConfig;

/// Read/move access to the live document. Methods take `&self` because the
/// host tree is shared and mutated from elsewhere.
pub trait PanelTree {
    type Node;

    fn find(&self, id: &str) -> Option<Self::Node>;

    /// True when `subject` is the node immediately following `anchor`.
    fn is_next_sibling(&self, anchor: &Self::Node, subject: &Self::Node) -> bool;

    fn insert_after(&self, anchor: &Self::Node, subject: &Self::Node) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Immediate,
    RetryTick,
    Mutations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "placement")]
pub enum Placement {
    AnchorMissing,
    SubjectMissing,
    InPlace,
    Moved,
    MoveFailed { reason: String },
}

impl Placement {
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::InPlace | Self::Moved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Unsatisfied,
    Satisfied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDirective {
    /// Already in order; no timer is needed for the initial case.
    Done,
    StartRetryTimer { period_ms: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDirective {
    Continue,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcerPhase {
    Idle,
    Retrying,
    RetryExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnforcerStats {
    pub state: OrderState,
    pub phase: EnforcerPhase,
    pub watching: bool,
    pub retry_ticks: u32,
    pub moves: u32,
    pub mutation_batches: u32,
    pub last_placement: Option<Placement>,
}

#[derive(Debug, Clone)]
pub struct OrderEnforcer {
    anchor_id: String,
    subject_id: String,
    container_id: String,
    retry_period_ms: u32,
    retry_max_ticks: u32,
    state: OrderState,
    phase: EnforcerPhase,
    watching: bool,
    retry_ticks: u32,
    moves: u32,
    mutation_batches: u32,
    last_placement: Option<Placement>,
}

impl OrderEnforcer {
    pub fn new(
        anchor_id: impl Into<String>,
        subject_id: impl Into<String>,
        container_id: impl Into<String>,
    ) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            subject_id: subject_id.into(),
            container_id: container_id.into(),
            retry_period_ms: crate::config::DEFAULT_RETRY_PERIOD_MS,
            retry_max_ticks: crate::config::DEFAULT_RETRY_MAX_TICKS,
            state: OrderState::Unsatisfied,
            phase: EnforcerPhase::Idle,
            watching: false,
            retry_ticks: 0,
            moves: 0,
            mutation_batches: 0,
            last_placement: None,
        }
    }

    pub fn with_retry(mut self, period_ms: u32, max_ticks: u32) -> Self {
        self.retry_period_ms = period_ms;
        self.retry_max_ticks = max_ticks;
        self
    }

    #[must_use]
    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(&config.anchor_id, &config.subject_id, &config.container_id)
            .with_retry(config.retry_period_ms, config.retry_max_ticks)
    }

    #[must_use]
    pub fn state(&self) -> OrderState {
        self.state
    }

    #[must_use]
    pub fn phase(&self) -> EnforcerPhase {
        self.phase
    }

    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    #[must_use]
    pub fn stats(&self) -> EnforcerStats {
        EnforcerStats {
            state: self.state,
            phase: self.phase,
            watching: self.watching,
            retry_ticks: self.retry_ticks,
            moves: self.moves,
            mutation_batches: self.mutation_batches,
            last_placement: self.last_placement.clone(),
        }
    }

    /// The only transition. Touches the tree only when the subject is out of place.
    pub fn reconcile<P: PanelTree>(&mut self, tree: &P, trigger: Trigger) -> Placement {
        let placement = place(tree, &self.anchor_id, &self.subject_id);
        match &placement {
            Placement::AnchorMissing | Placement::SubjectMissing => {
                tracing::trace!(?trigger, ?placement, "order check skipped");
            }
            Placement::InPlace => {}
            Placement::Moved => {
                self.moves = self.moves.saturating_add(1);
                tracing::debug!(
                    ?trigger,
                    anchor = %self.anchor_id,
                    subject = %self.subject_id,
                    "moved panel after anchor"
                );
            }
            Placement::MoveFailed { reason } => {
                tracing::warn!(?trigger, %reason, "panel move failed");
            }
        }
        self.state = if placement.is_satisfied() {
            OrderState::Satisfied
        } else {
            OrderState::Unsatisfied
        };
        self.last_placement = Some(placement.clone());
        placement
    }

    /// Phase one. When it falls short the caller starts the retry timer.
    ///
    /// `Done` skips only the timer: callers still attach the mutation watch at
    /// document load, so a later reinsertion by another plugin is repaired.
    pub fn start<P: PanelTree>(&mut self, tree: &P) -> StartDirective {
        if self.reconcile(tree, Trigger::Immediate).is_satisfied() {
            return StartDirective::Done;
        }
        self.phase = EnforcerPhase::Retrying;
        self.retry_ticks = 0;
        StartDirective::StartRetryTimer {
            period_ms: self.retry_period_ms,
        }
    }

    /// Phase two. Cancels on satisfaction or once the tick cap is reached.
    pub fn on_retry_tick<P: PanelTree>(&mut self, tree: &P) -> TickDirective {
        if self.phase != EnforcerPhase::Retrying {
            return TickDirective::Cancel;
        }
        self.retry_ticks = self.retry_ticks.saturating_add(1);
        let placement = self.reconcile(tree, Trigger::RetryTick);

        if placement.is_satisfied() {
            tracing::debug!(ticks = self.retry_ticks, "panel order settled by retry");
            self.phase = EnforcerPhase::Idle;
            return TickDirective::Cancel;
        }
        if self.retry_ticks >= self.retry_max_ticks {
            tracing::debug!(ticks = self.retry_ticks, "retry window exhausted");
            self.phase = EnforcerPhase::RetryExhausted;
            return TickDirective::Cancel;
        }
        TickDirective::Continue
    }

    /// Phase three begins: returns the id of the container to observe. A retry
    /// timer still running keeps running.
    pub fn on_document_loaded(&mut self) -> &str {
        self.watching = true;
        &self.container_id
    }

    /// Called once per batch of structural mutations for the rest of the page's life.
    pub fn on_mutations<P: PanelTree>(&mut self, tree: &P, records: usize) -> Placement {
        self.mutation_batches = self.mutation_batches.saturating_add(1);
        tracing::trace!(records, "structural mutations observed");
        self.reconcile(tree, Trigger::Mutations)
    }
}

fn place<P: PanelTree>(tree: &P, anchor_id: &str, subject_id: &str) -> Placement {
    let Some(anchor) = tree.find(anchor_id) else {
        return Placement::AnchorMissing;
    };
    let Some(subject) = tree.find(subject_id) else {
        return Placement::SubjectMissing;
    };
    if tree.is_next_sibling(&anchor, &subject) {
        return Placement::InPlace;
    }
    match tree.insert_after(&anchor, &subject) {
        Ok(()) => Placement::Moved,
        Err(reason) => Placement::MoveFailed { reason },
    }
}
