//! Puzzle progress over one built schema.
//!
//! The player types inputs; each completed run is classified against the level's
//! keywords. The session never touches the schema, so several sessions can share it.

use std::collections::VecDeque;

use crate::core::runner::{DEFAULT_MAX_STEPS, RunError, SchemaRunner};
use crate::core::schema::ComponentSchema;

/// Number of `input -> output` entries kept in the io log.
pub const IO_LOG_CAPACITY: usize = 3;

/// How a submitted input was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The input was the level's secret keyword.
    Secret { output: String },
    /// The input was a required keyword that had not been decoded yet.
    Decoded {
        index: usize,
        output: String,
        complete: bool,
    },
    /// The output equals the encoded form of keyword `index`.
    Collision { index: usize, output: String },
    Miss { output: String },
}

#[derive(Debug)]
pub struct DecodeSession<'s> {
    schema: &'s ComponentSchema,
    runner: SchemaRunner<'s>,
    max_steps: usize,
    secret_keyword: Option<String>,
    secret_decoded: bool,
    decoded: Vec<bool>,
    io_log: VecDeque<String>,
    saw_collision: bool,
}

impl<'s> DecodeSession<'s> {
    pub fn new(schema: &'s ComponentSchema) -> Self {
        Self {
            schema,
            runner: SchemaRunner::new(),
            max_steps: DEFAULT_MAX_STEPS,
            secret_keyword: None,
            secret_decoded: false,
            decoded: vec![false; schema.required_keywords().len()],
            io_log: VecDeque::with_capacity(IO_LOG_CAPACITY),
            saw_collision: false,
        }
    }

    pub fn with_secret_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.secret_keyword = Some(keyword.into());
        self
    }

    pub fn with_step_limit(mut self, max_steps: usize) -> Self {
        self.runner = self.runner.with_step_limit(max_steps);
        self.max_steps = max_steps;
        self
    }

    /// Run `input` and record the result.
    ///
    /// The secret keyword is checked first, then undecoded required keywords,
    /// then collisions with any encoded keyword.
    pub fn submit(&mut self, input: &str) -> Result<Attempt, RunError> {
        let output = self.runner.exec(self.schema, input)?;

        if self.io_log.len() == IO_LOG_CAPACITY {
            self.io_log.pop_front();
        }
        self.io_log.push_back(format!("{input} -> {output}"));

        if self.secret_keyword.as_deref() == Some(input) {
            self.secret_decoded = true;
            return Ok(Attempt::Secret { output });
        }

        let required = self
            .schema
            .required_keywords()
            .iter()
            .position(|keyword| keyword == input)
            .filter(|&index| !self.decoded[index]);
        if let Some(index) = required {
            self.decoded[index] = true;
            return Ok(Attempt::Decoded {
                index,
                output,
                complete: self.is_complete(),
            });
        }

        if let Some(index) = self
            .schema
            .encoded_keywords()
            .iter()
            .position(|encoded| *encoded == output)
        {
            self.saw_collision = true;
            return Ok(Attempt::Collision { index, output });
        }

        Ok(Attempt::Miss { output })
    }

    /// Run `input` without recording anything.
    pub fn predict(&self, input: &str) -> Result<String, RunError> {
        SchemaRunner::new()
            .with_step_limit(self.max_steps)
            .exec(self.schema, input)
    }

    pub fn schema(&self) -> &'s ComponentSchema {
        self.schema
    }

    pub fn decoded(&self) -> &[bool] {
        &self.decoded
    }

    pub fn num_decoded(&self) -> usize {
        self.decoded.iter().filter(|&&done| done).count()
    }

    pub fn is_complete(&self) -> bool {
        self.decoded.iter().all(|&done| done)
    }

    pub fn secret_decoded(&self) -> bool {
        self.secret_decoded
    }

    pub fn saw_collision(&self) -> bool {
        self.saw_collision
    }

    /// Oldest entry first.
    pub fn io_log(&self) -> impl Iterator<Item = &str> {
        self.io_log.iter().map(String::as_str)
    }
}
