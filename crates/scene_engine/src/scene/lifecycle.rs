//! Component lifecycle state machine
//!
//! Every attached component carries two independent instances of this machine:
//! one advanced by the logic traversal (`on_start` / `on_update` / `on_exit`)
//! and one advanced by the render traversal (`prepare_rendering` / `render` /
//! `exit_rendering`). The two may be out of phase by one traversal.
//!
//! ```text
//! New ──start──▶ Ready ──steady──▶ Ready
//!                  │ removal pending
//!                  ▼
//!            ToBeRemoved ──exit──▶ Removed
//! ```

use std::fmt;

/// Lifecycle state of one machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Just attached, never ticked by this traversal kind
    New,
    /// Steady state
    Ready,
    /// Removal requested; the next step runs the exit hook
    ToBeRemoved,
    /// Terminal; never stepped again
    Removed,
}

/// Which hook a machine must run on its next step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    /// `on_start` / `prepare_rendering`
    Start,
    /// `on_update` / `render`
    Steady,
    /// `on_exit` / `exit_rendering`
    Exit,
    /// Nothing left to run
    Skip,
}

impl LifecycleState {
    /// Hook to run for the current state
    pub fn step(self) -> LifecycleStep {
        match self {
            Self::New => LifecycleStep::Start,
            Self::Ready => LifecycleStep::Steady,
            Self::ToBeRemoved => LifecycleStep::Exit,
            Self::Removed => LifecycleStep::Skip,
        }
    }

    /// State after `step` completed successfully
    ///
    /// A pending removal request takes effect only after the start or steady
    /// hook has run, so the next traversal observes `ToBeRemoved`.
    pub fn after(self, step: LifecycleStep, removal_pending: bool) -> Self {
        match step {
            LifecycleStep::Start | LifecycleStep::Steady if removal_pending => Self::ToBeRemoved,
            LifecycleStep::Start | LifecycleStep::Steady => Self::Ready,
            LifecycleStep::Exit => Self::Removed,
            LifecycleStep::Skip => self,
        }
    }

    /// Whether the machine has reached its terminal state
    pub fn is_terminal(self) -> bool {
        self == Self::Removed
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "NEW",
            Self::Ready => "READY",
            Self::ToBeRemoved => "TO_BE_REMOVED",
            Self::Removed => "REMOVED",
        };
        f.write_str(name)
    }
}

/// The pair of machines owned by one component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    /// Machine advanced by `process`
    pub logic: LifecycleState,
    /// Machine advanced by `render`
    pub render: LifecycleState,
    removal_requested: bool,
    logic_stepped: Option<u64>,
    render_stepped: Option<u64>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Both machines start in `New`
    pub fn new() -> Self {
        Self {
            logic: LifecycleState::New,
            render: LifecycleState::New,
            removal_requested: false,
            logic_stepped: None,
            render_stepped: None,
        }
    }

    /// Mark the component for removal during `frame`. Sticky; applies to both machines.
    ///
    /// A machine that already ran its steady hook in `frame` moves to
    /// `ToBeRemoved` at once, so its exit hook runs in the next frame no matter
    /// where in the frame the request came from.
    pub fn request_removal(&mut self, frame: u64) {
        self.removal_requested = true;
        if self.logic == LifecycleState::Ready && self.logic_stepped == Some(frame) {
            self.logic = LifecycleState::ToBeRemoved;
        }
        if self.render == LifecycleState::Ready && self.render_stepped == Some(frame) {
            self.render = LifecycleState::ToBeRemoved;
        }
    }

    /// Advance the logic machine past `step`, run during `frame`
    pub(crate) fn finish_logic_step(&mut self, step: LifecycleStep, frame: u64) {
        self.logic = self.logic.after(step, self.removal_requested);
        self.logic_stepped = Some(frame);
    }

    /// Advance the render machine past `step`, run during `frame`
    pub(crate) fn finish_render_step(&mut self, step: LifecycleStep, frame: u64) {
        self.render = self.render.after(step, self.removal_requested);
        self.render_stepped = Some(frame);
    }

    /// Whether removal has been requested
    pub fn removal_requested(&self) -> bool {
        self.removal_requested
    }

    /// Drive both machines straight to `Removed` without exit hooks
    pub fn force_remove(&mut self) {
        self.removal_requested = true;
        self.logic = LifecycleState::Removed;
        self.render = LifecycleState::Removed;
    }

    /// Purge only once both exit hooks have fired (or the component was forced out)
    pub fn is_finalized(&self) -> bool {
        self.logic.is_terminal() && self.render.is_terminal()
    }
}
