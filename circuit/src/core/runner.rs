//! Step-by-step interpreter for built schemas.
//!
//! A runner owns its working buffer and per-element counters; the schema is only
//! borrowed. Interactive callers drive it one [`SchemaRunner::run_step`] per
//! animation tick, offline callers use [`SchemaRunner::exec`].

use kurbo::Point;
use thiserror::Error;

use crate::core::schema::{ComponentSchema, ElemAction, SchemaElem};
use crate::core::types::ElemId;

/// Default cap on `run_step` calls per `exec`.
pub const DEFAULT_MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("run on input '{input}' did not reach an output within {limit} steps")]
    StepLimitExceeded { input: String, limit: usize },
}

#[derive(Debug)]
pub struct SchemaRunner<'s> {
    schema: Option<&'s ComponentSchema>,
    current: ElemId,
    input: Vec<u8>,
    buffer: Vec<u8>,
    counters: Vec<u8>,
    last_cond: bool,
    max_steps: usize,
}

impl Default for SchemaRunner<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s> SchemaRunner<'s> {
    pub fn new() -> Self {
        Self {
            schema: None,
            current: 0,
            input: Vec::new(),
            buffer: Vec::with_capacity(16),
            counters: Vec::new(),
            last_cond: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_step_limit(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Point the runner at the schema entry with a fresh copy of `input`.
    ///
    /// Buffers are reused; only counters and the branch memory are reinitialized.
    pub fn reset(&mut self, schema: &'s ComponentSchema, input: &str) {
        self.schema = Some(schema);
        self.current = schema.entry_id();
        self.last_cond = false;

        self.counters.clear();
        self.counters
            .extend(schema.elems().iter().map(|elem| match elem.action {
                ElemAction::Countdown { initial_value } => initial_value,
                _ => 0,
            }));

        self.input.clear();
        self.input.extend_from_slice(input.as_bytes());
        self.buffer.clear();
        self.buffer.extend_from_slice(input.as_bytes());
    }

    /// Process the current element and move the signal.
    ///
    /// Returns the position of the element the signal moved to, or `None` once
    /// the signal sits on an output (or no schema was loaded).
    pub fn run_step(&mut self) -> Option<Point> {
        let schema = self.schema?;
        let elem = &schema.elems()[self.current];
        let branch = match &elem.action {
            ElemAction::Stop => return None,
            ElemAction::Forward => 0,
            ElemAction::Transform(op) => {
                op.apply(&mut self.buffer);
                0
            }
            ElemAction::If(cond) => {
                self.last_cond = cond.eval(&self.buffer, &self.input);
                branch_index(self.last_cond)
            }
            ElemAction::IfNot(cond) => {
                self.last_cond = !cond.eval(&self.buffer, &self.input);
                branch_index(self.last_cond)
            }
            ElemAction::Repeater => branch_index(self.last_cond),
            ElemAction::InvRepeater => branch_index(!self.last_cond),
            ElemAction::Countdown { .. } => {
                let counter = &mut self.counters[elem.id];
                if *counter != 0 {
                    *counter -= 1;
                    0
                } else {
                    1
                }
            }
        };
        let next = follow(elem, branch);
        self.current = next;
        Some(schema.elems()[next].pos)
    }

    /// Reset and run to completion, returning the final buffer.
    pub fn exec(&mut self, schema: &'s ComponentSchema, input: &str) -> Result<String, RunError> {
        self.reset(schema, input);
        let mut steps = 0usize;
        while self.run_step().is_some() {
            steps += 1;
            if steps > self.max_steps {
                return Err(RunError::StepLimitExceeded {
                    input: input.to_string(),
                    limit: self.max_steps,
                });
            }
        }
        Ok(self.value())
    }

    /// Copy of the working buffer.
    pub fn value(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn current(&self) -> Option<&'s SchemaElem> {
        self.schema.map(|schema| &schema.elems()[self.current])
    }

    pub fn last_cond(&self) -> bool {
        self.last_cond
    }

    pub fn is_finished(&self) -> bool {
        self.current()
            .is_none_or(|elem| elem.action == ElemAction::Stop)
    }
}

fn branch_index(cond: bool) -> usize {
    if cond { 0 } else { 1 }
}

fn follow(elem: &SchemaElem, branch: usize) -> ElemId {
    match elem.next.get(branch) {
        Some(&next) => next,
        None => panic!(
            "schema invariant violated: {} at ({}, {}) has no next[{branch}]",
            elem.class, elem.pos.x, elem.pos.y
        ),
    }
}
