//! Scenario tests for the scene tree
//!
//! Shared helpers live here: a [`Recorder`] component that journals every
//! hook it receives, and a one-call frame driver.


use std::cell::RefCell;
use std::rc::Rc;

use crate::render::DrawList;
use crate::scene::{Component, ComponentError, Hook, HookResult, LogicContext, RenderContext, SceneTree};

/// Ordered log of `label:hook` entries shared between recorders
#[derive(Debug, Clone, Default)]
pub(super) struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub(super) fn record(&self, label: &str, hook: Hook) {
        self.0.borrow_mut().push(format!("{}:{}", label, hook));
    }

    pub(super) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(super) fn count(&self, label: &str, hook: Hook) -> usize {
        let entry = format!("{}:{}", label, hook);
        self.0.borrow().iter().filter(|e| **e == entry).count()
    }

    /// Entries for one label, hook names only
    pub(super) fn hooks_of(&self, label: &str) -> Vec<String> {
        let prefix = format!("{}:", label);
        self.0
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub(super) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Component that journals each hook call
pub(super) struct Recorder {
    label: &'static str,
    journal: Journal,
    fail_in: Option<Hook>,
    remove_self_on_frame: Option<u64>,
    remove_self_in_render_on_frame: Option<u64>,
}

impl Recorder {
    pub(super) fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            journal: journal.clone(),
            fail_in: None,
            remove_self_on_frame: None,
            remove_self_in_render_on_frame: None,
        }
    }

    pub(super) fn failing_in(mut self, hook: Hook) -> Self {
        self.fail_in = Some(hook);
        self
    }

    pub(super) fn removing_self_on_frame(mut self, frame: u64) -> Self {
        self.remove_self_on_frame = Some(frame);
        self
    }

    pub(super) fn removing_self_in_render_on_frame(mut self, frame: u64) -> Self {
        self.remove_self_in_render_on_frame = Some(frame);
        self
    }

    fn hit(&self, hook: Hook) -> HookResult {
        self.journal.record(self.label, hook);
        if self.fail_in == Some(hook) {
            return Err(ComponentError::failed(format!("{} refused {}", self.label, hook)));
        }
        Ok(())
    }
}

impl Component for Recorder {
    fn on_start(&mut self, _ctx: &mut LogicContext<'_>) -> HookResult {
        self.hit(Hook::Start)
    }

    fn on_update(&mut self, ctx: &mut LogicContext<'_>, _delta_time: f32) -> HookResult {
        if self.remove_self_on_frame == Some(ctx.frame()) {
            ctx.remove_self();
        }
        self.hit(Hook::Update)
    }

    fn on_exit(&mut self, _ctx: &mut LogicContext<'_>) -> HookResult {
        self.hit(Hook::Exit)
    }

    fn prepare_rendering(&mut self, _ctx: &mut RenderContext<'_>) -> HookResult {
        self.hit(Hook::PrepareRendering)
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> HookResult {
        if self.remove_self_in_render_on_frame == Some(ctx.frame()) {
            ctx.remove_self();
        }
        self.hit(Hook::Render)
    }

    fn exit_rendering(&mut self, _ctx: &mut RenderContext<'_>) -> HookResult {
        self.hit(Hook::ExitRendering)
    }
}

/// Run one tick/draw pair, returning the number of draws
pub(super) fn run_frame(tree: &mut SceneTree, draws: &mut DrawList) -> usize {
    crate::foundation::logging::init_for_tests();
    draws.clear();
    tree.tick(0.016).unwrap();
    tree.draw(draws).unwrap()
}
