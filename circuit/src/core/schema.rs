//! The built puzzle graph.
//!
//! A `ComponentSchema` owns every element in one flat arena; `next` links are
//! element ids into that arena. Schemas are produced by
//! [`SchemaBuilder`](crate::core::builder::SchemaBuilder) and never mutated after.

use kurbo::Point;

use crate::core::class::ContentTags;
use crate::core::condition::Condition;
use crate::core::runner::{RunError, SchemaRunner};
use crate::core::transform::TransformOp;
use crate::core::types::{ElemExtra, ElemId, ElemKind, Rotation};

/// What the runner does when the signal reaches an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElemAction {
    /// Move on to `next[0]` (input, mux, pipes).
    Forward,
    Transform(TransformOp),
    If(Condition),
    IfNot(Condition),
    /// Branch on the last evaluated condition.
    Repeater,
    /// Branch on the negated last evaluated condition.
    InvRepeater,
    Countdown { initial_value: u8 },
    /// Output: the run ends here.
    Stop,
}

/// One node of the built graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaElem {
    pub id: ElemId,
    pub class: String,
    pub kind: ElemKind,
    pub pos: Point,
    pub rotation: Rotation,
    pub extra: ElemExtra,
    pub action: ElemAction,
    /// Empty for outputs, one entry for linear elements, two for branches
    /// (`next[0]` is the primary / "true" branch).
    pub next: Vec<ElemId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSchema {
    entry: ElemId,
    elems: Vec<SchemaElem>,
    num_keywords: usize,
    keywords: Vec<String>,
    encoded_keywords: Vec<String>,
    tags: ContentTags,
}

impl ComponentSchema {
    pub(crate) fn new(
        entry: ElemId,
        elems: Vec<SchemaElem>,
        num_keywords: usize,
        keywords: Vec<String>,
        tags: ContentTags,
    ) -> Self {
        Self {
            entry,
            elems,
            num_keywords,
            keywords,
            encoded_keywords: Vec::new(),
            tags,
        }
    }

    pub(crate) fn set_encoded_keywords(&mut self, encoded: Vec<String>) {
        self.encoded_keywords = encoded;
    }

    pub fn entry(&self) -> &SchemaElem {
        &self.elems[self.entry]
    }

    pub fn entry_id(&self) -> ElemId {
        self.entry
    }

    pub fn elems(&self) -> &[SchemaElem] {
        &self.elems
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Keywords the player must decode to clear the level.
    pub fn required_keywords(&self) -> &[String] {
        &self.keywords[..self.num_keywords]
    }

    /// Display-only keywords.
    pub fn decoy_keywords(&self) -> &[String] {
        &self.keywords[self.num_keywords..]
    }

    /// Schema output for every keyword, index-aligned with [`Self::keywords`].
    pub fn encoded_keywords(&self) -> &[String] {
        &self.encoded_keywords
    }

    pub fn tags(&self) -> ContentTags {
        self.tags
    }

    /// Condition kinds of every `elem_if` / `elem_ifnot`, in element order.
    pub fn branch_conditions(&self) -> Vec<&'static str> {
        self.elems
            .iter()
            .filter_map(|elem| match &elem.action {
                ElemAction::If(cond) | ElemAction::IfNot(cond) => Some(cond.kind_name()),
                _ => None,
            })
            .collect()
    }

    /// Run the schema on `input` to completion with the default step limit.
    pub fn exec(&self, input: &str) -> Result<String, RunError> {
        SchemaRunner::new().exec(self, input)
    }
}
