//! Geometry-driven graph construction.
//!
//! Level files only place tiles; edges are inferred. Every element is indexed by
//! its grid cell, and each element inspects its four grid neighbours: a neighbour
//! whose output pin meets one of our input pins is incoming, and the reverse is
//! outgoing. Fixed-cardinality kinds are linked first, loose pipes second.

use kurbo::{Point, Vec2};
use thiserror::Error;
use tracing::debug;

use crate::core::class::{BranchClass, ContentTags, ElemClass, is_special};
use crate::core::condition::{Condition, ConditionError};
use crate::core::geometry::{ElemShape, shape_of};
use crate::core::runner::{DEFAULT_MAX_STEPS, RunError, SchemaRunner};
use crate::core::schema::{ComponentSchema, ElemAction, SchemaElem};
use crate::core::template::SchemaTemplate;
use crate::core::types::{ElemExtra, ElemId, ElemKind, ElemRef, Rotation};

pub const NUM_SCHEMA_COLS: usize = 12;
pub const NUM_SCHEMA_ROWS: usize = 8;
pub const NUM_SCHEMA_CELLS: usize = NUM_SCHEMA_COLS * NUM_SCHEMA_ROWS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("{0}: unexpected elem class")]
    UnknownClass(ElemRef),
    #[error("expected at least 1 OUT (output) element, found 0")]
    MissingOutput,
    #[error("expected exactly 1 IN (input) element, found {0}")]
    InputCount(usize),
    #[error("tile size must be at least 1x1, found {width}x{height}")]
    InvalidTileSize { width: f64, height: f64 },
    #[error(
        "{0}: outside of the {cols}x{rows} schema grid",
        cols = NUM_SCHEMA_COLS,
        rows = NUM_SCHEMA_ROWS
    )]
    OutOfGrid(ElemRef),
    #[error("{elem}: grid cell already holds {other}")]
    CellTaken { elem: ElemRef, other: String },
    #[error("{elem}: missing {expected} data")]
    MissingExtra {
        elem: ElemRef,
        expected: &'static str,
    },
    #[error("{elem}: invalid branch condition")]
    InvalidCondition {
        elem: ElemRef,
        source: ConditionError,
    },
    #[error("{elem}: expected {expected} outgoing pipe(s), found {found}")]
    OutgoingCount {
        elem: ElemRef,
        expected: usize,
        found: usize,
    },
    #[error("{elem}: expected at least {expected} incoming pipe(s), found {found}")]
    IncomingCount {
        elem: ElemRef,
        expected: usize,
        found: usize,
    },
    #[error("{0}: unexpected outgoing pipe")]
    UnexpectedOutgoing(ElemRef),
    #[error("{0}: unexpected incoming pipe")]
    UnexpectedIncoming(ElemRef),
    #[error("{0}: invalid combination of outgoing pipes")]
    BranchPipes(ElemRef),
    #[error("{0}: elem is not properly connected")]
    NotConnected(ElemRef),
    #[error("keyword '{keyword}' cannot be encoded")]
    KeywordDiverges { keyword: String, source: RunError },
}

/// Turns a [`SchemaTemplate`] into a validated [`ComponentSchema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder<'t> {
    template: &'t SchemaTemplate,
    offset: Vec2,
    max_steps: usize,
}

impl<'t> SchemaBuilder<'t> {
    /// `offset` is added to every element position (screen placement of the grid).
    pub fn new(offset: Vec2, template: &'t SchemaTemplate) -> Self {
        Self {
            template,
            offset,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Step cap for the runs that precompute encoded keywords.
    pub fn with_step_limit(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn build(&self) -> Result<ComponentSchema, BuildError> {
        debug!(
            elems = self.template.elems.len(),
            keywords = self.template.keywords.len(),
            "building schema"
        );
        let mut graph = Graph::index(self.template, self.offset)?;
        graph.connect()?;
        let mut schema = graph.freeze(self.template);

        let encoded = {
            let mut runner = SchemaRunner::new().with_step_limit(self.max_steps);
            schema
                .keywords()
                .iter()
                .map(|keyword| {
                    runner
                        .exec(&schema, keyword)
                        .map_err(|source| BuildError::KeywordDiverges {
                            keyword: keyword.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        schema.set_encoded_keywords(encoded);

        debug!(
            elems = schema.elems().len(),
            entry = schema.entry_id(),
            "schema built"
        );
        Ok(schema)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Incoming,
    Outgoing,
}

/// Builder-owned element state; `next` is `None` until something links it.
#[derive(Debug)]
struct Draft {
    class_name: String,
    class: ElemClass,
    pos: Point,
    rotation: Rotation,
    extra: ElemExtra,
    action: ElemAction,
    next: Option<Vec<ElemId>>,
}

impl Draft {
    fn elem_ref(&self) -> ElemRef {
        ElemRef::new(self.class_name.clone(), self.pos)
    }

    fn kind(&self) -> ElemKind {
        self.class.kind()
    }

    fn shape(&self) -> ElemShape {
        shape_of(&self.class, self.pos, self.rotation, &self.extra)
    }
}

struct Graph {
    elems: Vec<Draft>,
    cells: [Option<ElemId>; NUM_SCHEMA_CELLS],
    offset: Vec2,
    tile_width: i64,
    tile_height: i64,
    entry: ElemId,
    tags: ContentTags,
}

impl Graph {
    /// Classify every element and index it by grid cell.
    fn index(template: &SchemaTemplate, offset: Vec2) -> Result<Self, BuildError> {
        let (tile_width, tile_height) = (template.tile_width as i64, template.tile_height as i64);
        if tile_width < 1 || tile_height < 1 {
            return Err(BuildError::InvalidTileSize {
                width: template.tile_width,
                height: template.tile_height,
            });
        }

        let mut graph = Self {
            elems: Vec::with_capacity(template.elems.len()),
            cells: [None; NUM_SCHEMA_CELLS],
            offset,
            tile_width,
            tile_height,
            entry: 0,
            tags: ContentTags::default(),
        };

        let mut num_inputs = 0;
        let mut num_outputs = 0;
        for (id, t) in template.elems.iter().enumerate() {
            let pos = t.pos + offset;
            let elem = ElemRef::new(t.class.clone(), pos);
            let class = ElemClass::parse(&t.class)
                .ok_or_else(|| BuildError::UnknownClass(elem.clone()))?;
            graph.tags.record(&t.class);

            let cell = graph
                .cell_at(pos)
                .ok_or_else(|| BuildError::OutOfGrid(elem.clone()))?;
            if let Some(other) = graph.cells[cell] {
                return Err(BuildError::CellTaken {
                    elem,
                    other: graph.elems[other].class_name.clone(),
                });
            }
            graph.cells[cell] = Some(id);

            match class.kind() {
                ElemKind::Input => {
                    graph.entry = id;
                    num_inputs += 1;
                }
                ElemKind::Output => num_outputs += 1,
                _ => {}
            }

            graph.elems.push(Draft {
                class_name: t.class.clone(),
                class,
                pos,
                rotation: t.rotation,
                extra: t.extra.clone(),
                action: resolve_action(class, &t.extra, &elem)?,
                next: None,
            });
        }

        if num_outputs == 0 {
            return Err(BuildError::MissingOutput);
        }
        if num_inputs != 1 {
            return Err(BuildError::InputCount(num_inputs));
        }
        Ok(graph)
    }

    fn row_col(&self, pos: Point) -> (i64, i64) {
        let col = (pos.x - self.offset.x) as i64 / self.tile_width;
        let row = (pos.y - self.offset.y) as i64 / self.tile_height;
        (row, col)
    }

    fn cell_index(row: i64, col: i64) -> Option<usize> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        if row >= NUM_SCHEMA_ROWS || col >= NUM_SCHEMA_COLS {
            return None;
        }
        Some(row * NUM_SCHEMA_COLS + col)
    }

    fn cell_at(&self, pos: Point) -> Option<usize> {
        let (row, col) = self.row_col(pos);
        Self::cell_index(row, col)
    }

    /// Grid neighbours (N, W, E, S) that share a pin with `id`.
    fn links(&self, id: ElemId) -> Vec<(ElemId, Link)> {
        let (row, col) = self.row_col(self.elems[id].pos);
        let shape = self.elems[id].shape();
        [(row - 1, col), (row, col - 1), (row, col + 1), (row + 1, col)]
            .into_iter()
            .filter_map(|(row, col)| Self::cell_index(row, col))
            .filter_map(|cell| self.cells[cell])
            .filter_map(|other| {
                let other_shape = self.elems[other].shape();
                if other_shape.can_connect_to(&shape) {
                    Some((other, Link::Incoming))
                } else if shape.can_connect_to(&other_shape) {
                    Some((other, Link::Outgoing))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Point an upstream element at `target` unless it is already linked.
    fn claim(&mut self, upstream: ElemId, target: ElemId) {
        let next = &mut self.elems[upstream].next;
        if next.is_none() {
            *next = Some(vec![target]);
        }
    }

    fn connect(&mut self) -> Result<(), BuildError> {
        for id in 0..self.elems.len() {
            match self.elems[id].kind() {
                ElemKind::Transform | ElemKind::Mux => self.connect_linear(id, 1, 1)?,
                ElemKind::Output => self.connect_output(id)?,
                ElemKind::Input => self.connect_input(id)?,
                ElemKind::If => self.connect_branch(id)?,
                ElemKind::SimplePipe | ElemKind::PipeConnect2 => {}
            }
        }

        // Pipes already claimed by the element they feed keep that link.
        for id in 0..self.elems.len() {
            if self.elems[id].next.is_some() {
                continue;
            }
            match self.elems[id].kind() {
                ElemKind::SimplePipe => self.connect_linear(id, 1, 1)?,
                ElemKind::PipeConnect2 => self.connect_linear(id, 2, 1)?,
                _ => {}
            }
        }

        for elem in &self.elems {
            if elem.next.is_none() && elem.kind() != ElemKind::Output {
                return Err(BuildError::NotConnected(elem.elem_ref()));
            }
        }
        Ok(())
    }

    fn connect_linear(
        &mut self,
        id: ElemId,
        min_incoming: usize,
        want_outgoing: usize,
    ) -> Result<(), BuildError> {
        let mut next = Vec::with_capacity(want_outgoing);
        let mut num_incoming = 0;
        for (other, link) in self.links(id) {
            match link {
                Link::Incoming => {
                    num_incoming += 1;
                    self.claim(other, id);
                }
                Link::Outgoing => next.push(other),
            }
        }

        let num_outgoing = next.len();
        self.elems[id].next = Some(next);
        if num_outgoing != want_outgoing {
            return Err(BuildError::OutgoingCount {
                elem: self.elems[id].elem_ref(),
                expected: want_outgoing,
                found: num_outgoing,
            });
        }
        if num_incoming < min_incoming {
            return Err(BuildError::IncomingCount {
                elem: self.elems[id].elem_ref(),
                expected: min_incoming,
                found: num_incoming,
            });
        }
        Ok(())
    }

    fn connect_output(&mut self, id: ElemId) -> Result<(), BuildError> {
        let mut num_incoming = 0;
        for (other, link) in self.links(id) {
            if link == Link::Outgoing {
                return Err(BuildError::UnexpectedOutgoing(self.elems[id].elem_ref()));
            }
            num_incoming += 1;
            self.claim(other, id);
        }
        if num_incoming == 0 {
            return Err(BuildError::IncomingCount {
                elem: self.elems[id].elem_ref(),
                expected: 1,
                found: 0,
            });
        }
        Ok(())
    }

    fn connect_input(&mut self, id: ElemId) -> Result<(), BuildError> {
        let mut next = Vec::with_capacity(1);
        for (other, link) in self.links(id) {
            if link == Link::Incoming {
                return Err(BuildError::UnexpectedIncoming(self.elems[id].elem_ref()));
            }
            next.push(other);
        }
        if next.len() != 1 {
            return Err(BuildError::OutgoingCount {
                elem: self.elems[id].elem_ref(),
                expected: 1,
                found: next.len(),
            });
        }
        self.elems[id].next = Some(next);
        Ok(())
    }

    fn connect_branch(&mut self, id: ElemId) -> Result<(), BuildError> {
        let mut primary = None;
        let mut secondary = None;
        let mut num_incoming = 0;
        let mut num_outgoing = 0;
        for (other, link) in self.links(id) {
            match link {
                Link::Incoming => {
                    num_incoming += 1;
                    // A branch always takes over its feeders.
                    self.elems[other].next = Some(vec![id]);
                }
                Link::Outgoing => {
                    num_outgoing += 1;
                    if is_special(&self.elems[other].class_name) {
                        primary = Some(other);
                    } else {
                        secondary = Some(other);
                    }
                }
            }
        }

        let elem = self.elems[id].elem_ref();
        if num_outgoing != 2 {
            return Err(BuildError::OutgoingCount {
                elem,
                expected: 2,
                found: num_outgoing,
            });
        }
        let (Some(primary), Some(secondary)) = (primary, secondary) else {
            return Err(BuildError::BranchPipes(elem));
        };
        if num_incoming < 1 {
            return Err(BuildError::IncomingCount {
                elem,
                expected: 1,
                found: num_incoming,
            });
        }
        self.elems[id].next = Some(vec![primary, secondary]);
        Ok(())
    }

    fn freeze(self, template: &SchemaTemplate) -> ComponentSchema {
        let elems = self
            .elems
            .into_iter()
            .enumerate()
            .map(|(id, draft)| {
                let kind = draft.kind();
                let next = match kind {
                    ElemKind::Output => Vec::new(),
                    _ => draft.next.unwrap_or_default(),
                };
                SchemaElem {
                    id,
                    class: draft.class_name,
                    kind,
                    pos: draft.pos,
                    rotation: draft.rotation,
                    extra: draft.extra,
                    action: draft.action,
                    next,
                }
            })
            .collect();
        let num_keywords = template.num_keywords.min(template.keywords.len());
        ComponentSchema::new(
            self.entry,
            elems,
            num_keywords,
            template.keywords.clone(),
            self.tags,
        )
    }
}

fn resolve_action(
    class: ElemClass,
    extra: &ElemExtra,
    elem: &ElemRef,
) -> Result<ElemAction, BuildError> {
    let condition = || match extra {
        ElemExtra::If(if_extra) => {
            Condition::from_extra(if_extra).map_err(|source| BuildError::InvalidCondition {
                elem: elem.clone(),
                source,
            })
        }
        _ => Err(BuildError::MissingExtra {
            elem: elem.clone(),
            expected: "branch condition",
        }),
    };

    let action = match class {
        ElemClass::Output => ElemAction::Stop,
        ElemClass::Transform(op) => ElemAction::Transform(op),
        ElemClass::Branch(BranchClass::If) => ElemAction::If(condition()?),
        ElemClass::Branch(BranchClass::IfNot) => ElemAction::IfNot(condition()?),
        ElemClass::Branch(BranchClass::Repeater) => ElemAction::Repeater,
        ElemClass::Branch(BranchClass::InvRepeater) => ElemAction::InvRepeater,
        ElemClass::Branch(BranchClass::Countdown) => match extra {
            ElemExtra::Countdown { initial_value } => ElemAction::Countdown {
                initial_value: *initial_value,
            },
            _ => {
                return Err(BuildError::MissingExtra {
                    elem: elem.clone(),
                    expected: "countdown",
                });
            }
        },
        ElemClass::Input
        | ElemClass::Mux
        | ElemClass::Pipe
        | ElemClass::AnglePipe
        | ElemClass::PipeConnect2
        | ElemClass::OtherPipe => ElemAction::Forward,
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::SchemaTemplateElem;
    use crate::test_support::{
        angle_pipe, branch_template, cell_center, countdown, elem, if_elem, pipe,
        rot13_line_template, special_pipe, template,
    };

    fn build(template: &SchemaTemplate) -> Result<ComponentSchema, BuildError> {
        SchemaBuilder::new(Vec2::ZERO, template).build()
    }

    #[test]
    fn builds_linear_rot13_schema() {
        let schema = build(&rot13_line_template()).expect("build");
        assert_eq!(schema.entry().class, "elem_input");
        assert_eq!(schema.entry().kind, ElemKind::Input);
        for elem in schema.elems() {
            if elem.kind == ElemKind::Output {
                assert!(elem.next.is_empty());
            } else {
                assert_eq!(elem.next.len(), 1, "{}", elem.class);
            }
        }
        assert_eq!(schema.exec("hello").expect("exec"), "uryyb");
        assert!(schema.tags().has_rot13);
    }

    #[test]
    fn ids_follow_template_order() {
        let schema = build(&rot13_line_template()).expect("build");
        let ids: Vec<ElemId> = schema.elems().iter().map(|elem| elem.id).collect();
        assert_eq!(ids, (0..schema.elems().len()).collect::<Vec<_>>());
    }

    #[test]
    fn offset_moves_positions_but_not_links() {
        let template = rot13_line_template();
        let offset = Vec2::new(320.0, 64.0);
        let schema = SchemaBuilder::new(offset, &template)
            .build()
            .expect("build");
        assert_eq!(schema.entry().pos, cell_center(0, 0) + offset);
        assert_eq!(schema.exec("abc").expect("exec"), "nop");
    }

    #[test]
    fn encodes_every_keyword() {
        let mut template = rot13_line_template();
        template.keywords = vec!["hello".to_string(), "abc".to_string()];
        template.num_keywords = 1;
        let schema = build(&template).expect("build");
        assert_eq!(schema.encoded_keywords(), ["uryyb", "nop"]);
        assert_eq!(schema.required_keywords(), ["hello"]);
        assert_eq!(schema.decoy_keywords(), ["abc"]);
    }

    #[test]
    fn branch_puts_special_pipe_first() {
        let schema = build(&branch_template("eq", "abc")).expect("build");
        let branch = schema
            .elems()
            .iter()
            .find(|elem| elem.kind == ElemKind::If)
            .expect("branch");
        assert_eq!(branch.next.len(), 2);
        assert_eq!(schema.elems()[branch.next[0]].class, "special_pipe");
        assert_eq!(schema.elems()[branch.next[1]].class, "pipe");

        assert_eq!(schema.exec("abc").expect("exec"), "bcd");
        assert_eq!(schema.exec("xyz").expect("exec"), "xyz");
        assert_eq!(schema.branch_conditions(), vec!["eq"]);
    }

    #[test]
    fn branch_with_one_outgoing_pipe_is_rejected() {
        let template = template(vec![
            elem("elem_input", 0, 0),
            pipe(1, 0, Rotation::Deg0),
            if_elem("elem_if", 2, 0, "len_even", "", 0),
            pipe(3, 0, Rotation::Deg0),
            elem("elem_output", 4, 0),
        ]);
        let err = build(&template).expect_err("one branch only");
        assert_eq!(
            err,
            BuildError::OutgoingCount {
                elem: ElemRef::new("elem_if", cell_center(2, 0)),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn branch_needs_a_special_pipe() {
        let template = template(vec![
            elem("elem_input", 0, 1),
            pipe(1, 1, Rotation::Deg0),
            if_elem("elem_if", 2, 1, "len_even", "", 0),
            pipe(3, 1, Rotation::Deg0),
            elem("elem_output", 4, 1),
            pipe(2, 2, Rotation::Deg90),
            elem("elem_output", 2, 3),
        ]);
        let err = build(&template).expect_err("no special pipe");
        assert_eq!(
            err,
            BuildError::BranchPipes(ElemRef::new("elem_if", cell_center(2, 1)))
        );
    }

    #[test]
    fn rejects_wrong_input_and_output_counts() {
        let no_input = template(vec![elem("elem_output", 0, 0)]);
        assert_eq!(
            build(&no_input).expect_err("no input"),
            BuildError::InputCount(0)
        );

        let two_inputs = template(vec![
            elem("elem_input", 0, 0),
            elem("elem_input", 0, 2),
            elem("elem_output", 4, 4),
        ]);
        assert_eq!(
            build(&two_inputs).expect_err("two inputs"),
            BuildError::InputCount(2)
        );

        let no_output = template(vec![elem("elem_input", 0, 0)]);
        assert_eq!(
            build(&no_output).expect_err("no output"),
            BuildError::MissingOutput
        );
    }

    #[test]
    fn rejects_unknown_classes() {
        let template = template(vec![
            elem("elem_input", 0, 0),
            elem("apply_rot47", 2, 0),
            elem("elem_output", 4, 0),
        ]);
        assert_eq!(
            build(&template).expect_err("unknown"),
            BuildError::UnknownClass(ElemRef::new("apply_rot47", cell_center(2, 0)))
        );
    }

    #[test]
    fn rejects_elements_outside_the_grid_or_stacked() {
        let outside = template(vec![
            elem("elem_input", 0, 0),
            elem("elem_output", NUM_SCHEMA_COLS, 0),
        ]);
        assert!(matches!(
            build(&outside).expect_err("outside"),
            BuildError::OutOfGrid(_)
        ));

        let stacked = template(vec![
            elem("elem_input", 0, 0),
            elem("elem_output", 0, 0),
        ]);
        assert!(matches!(
            build(&stacked).expect_err("stacked"),
            BuildError::CellTaken { .. }
        ));
    }

    #[test]
    fn transform_needs_exactly_one_outgoing_pipe() {
        let template = template(vec![
            elem("elem_input", 0, 1),
            pipe(1, 1, Rotation::Deg0),
            elem("apply_add", 2, 1),
            pipe(3, 1, Rotation::Deg0),
            elem("elem_output", 4, 1),
            pipe(2, 2, Rotation::Deg90),
            elem("elem_output", 2, 3),
        ]);
        assert_eq!(
            build(&template).expect_err("two outgoing"),
            BuildError::OutgoingCount {
                elem: ElemRef::new("apply_add", cell_center(2, 1)),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn dangling_pipe_is_reported() {
        let mut template = rot13_line_template();
        template.elems.push(pipe(8, 6, Rotation::Deg0));
        assert_eq!(
            build(&template).expect_err("dangling"),
            BuildError::OutgoingCount {
                elem: ElemRef::new("pipe", cell_center(8, 6)),
                expected: 1,
                found: 0,
            }
        );
    }

    #[test]
    fn input_must_not_have_incoming_pipes() {
        let template = template(vec![
            pipe(0, 0, Rotation::Deg0),
            elem("elem_input", 1, 0),
            pipe(2, 0, Rotation::Deg0),
            elem("elem_output", 3, 0),
        ]);
        assert_eq!(
            build(&template).expect_err("incoming into input"),
            BuildError::UnexpectedIncoming(ElemRef::new("elem_input", cell_center(1, 0)))
        );
    }

    #[test]
    fn angle_pipes_route_around_corners() {
        // IN -> pipe -> angle (turns down) -> pipe -> OUT
        let template = template(vec![
            elem("elem_input", 0, 0),
            pipe(1, 0, Rotation::Deg0),
            angle_pipe(2, 0, Rotation::Deg0, false),
            elem("apply_reverse", 2, 1),
            pipe(2, 2, Rotation::Deg90),
            elem("elem_output", 2, 3),
        ]);
        let schema = build(&template).expect("build");
        assert_eq!(schema.exec("abc").expect("exec"), "cba");
        assert!(schema.tags().has_shift);
    }

    #[test]
    fn countdown_requires_its_extra_data() {
        let mut broken = countdown(2, 0, 0);
        broken.extra = ElemExtra::None;
        let template = template(vec![
            elem("elem_input", 0, 0),
            broken,
            elem("elem_output", 4, 4),
        ]);
        assert!(matches!(
            build(&template).expect_err("missing extra"),
            BuildError::MissingExtra {
                expected: "countdown",
                ..
            }
        ));
    }

    #[test]
    fn invalid_branch_condition_is_reported() {
        let template = branch_template("contains", "abc");
        let err = build(&template).expect_err("legacy condition name");
        assert!(matches!(err, BuildError::InvalidCondition { .. }));
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("unknown condition kind 'contains'"));
    }

    #[test]
    fn special_pipes_are_plain_pipes_outside_branches() {
        let template = template(vec![
            elem("elem_input", 0, 0),
            special_pipe(1, 0, Rotation::Deg0),
            elem("elem_output", 2, 0),
        ]);
        let schema = build(&template).expect("build");
        assert_eq!(schema.exec("abc").expect("exec"), "abc");
    }

    fn id_at(schema: &ComponentSchema, col: usize, row: usize) -> ElemId {
        schema
            .elems()
            .iter()
            .find(|elem| elem.pos == cell_center(col, row))
            .map(|elem| elem.id)
            .expect("element in cell")
    }

    #[test]
    fn branches_merge_through_a_two_way_connector() {
        // Primary: if -> special -> add -> angle down into the connector.
        // Secondary: if -> down -> along row 4 -> angle up into the connector.
        let template = template(vec![
            elem("elem_input", 0, 2),
            pipe(1, 2, Rotation::Deg0),
            if_elem("elem_if", 2, 2, "eq", "abc", 0),
            special_pipe(3, 2, Rotation::Deg0),
            elem("apply_add", 4, 2),
            angle_pipe(5, 2, Rotation::Deg0, false),
            elem("pipe_connect2", 5, 3),
            pipe(6, 3, Rotation::Deg0),
            elem("elem_output", 7, 3),
            pipe(2, 3, Rotation::Deg90),
            angle_pipe(2, 4, Rotation::Deg270, true),
            pipe(3, 4, Rotation::Deg0),
            pipe(4, 4, Rotation::Deg0),
            angle_pipe(5, 4, Rotation::Deg180, true),
        ]);
        let schema = build(&template).expect("build");

        let connector = id_at(&schema, 5, 3);
        assert_eq!(schema.elems()[connector].kind, ElemKind::PipeConnect2);
        assert_eq!(schema.elems()[connector].next, vec![id_at(&schema, 6, 3)]);
        assert_eq!(schema.elems()[id_at(&schema, 5, 2)].next, vec![connector]);
        assert_eq!(schema.elems()[id_at(&schema, 5, 4)].next, vec![connector]);

        assert_eq!(schema.exec("abc").expect("exec"), "bcd");
        assert_eq!(schema.exec("xyz").expect("exec"), "xyz");
    }

    #[test]
    fn two_way_connector_needs_two_feeders() {
        let template = template(vec![
            elem("elem_input", 0, 0),
            pipe(1, 0, Rotation::Deg0),
            angle_pipe(2, 0, Rotation::Deg0, false),
            elem("pipe_connect2", 2, 1),
            pipe(3, 1, Rotation::Deg0),
            elem("elem_output", 4, 1),
        ]);
        assert_eq!(
            build(&template).expect_err("one feeder"),
            BuildError::IncomingCount {
                elem: ElemRef::new("pipe_connect2", cell_center(2, 1)),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn pipes_claimed_by_their_target_keep_that_link() {
        // The output claims the connector in the first pass, so the
        // connector is never checked for its second feeder.
        let template = template(vec![
            elem("elem_input", 0, 0),
            pipe(1, 0, Rotation::Deg0),
            angle_pipe(2, 0, Rotation::Deg0, false),
            elem("pipe_connect2", 2, 1),
            elem("elem_output", 3, 1),
        ]);
        let schema = build(&template).expect("build");
        assert_eq!(schema.elems()[3].next, vec![4]);
        assert_eq!(schema.exec("abc").expect("exec"), "abc");
    }

    #[test]
    fn mux_is_a_waypoint() {
        let template = template(vec![
            elem("elem_input", 0, 0),
            pipe(1, 0, Rotation::Deg0),
            elem("elem_mux", 2, 0),
            pipe(2, 1, Rotation::Deg90),
            elem("elem_output", 2, 2),
        ]);
        let schema = build(&template).expect("build");
        assert_eq!(schema.elems()[2].kind, ElemKind::Mux);
        assert_eq!(schema.elems()[2].next, vec![3]);
        assert_eq!(schema.elems()[1].next, vec![2]);
        assert_eq!(schema.exec("abc").expect("exec"), "abc");

        let mut forked = template.clone();
        forked.elems.push(pipe(3, 0, Rotation::Deg0));
        forked.elems.push(elem("elem_output", 4, 0));
        assert_eq!(
            build(&forked).expect_err("two ways out"),
            BuildError::OutgoingCount {
                elem: ElemRef::new("elem_mux", cell_center(2, 0)),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn countdown_loop_is_wired_from_geometry() {
        // add -> countdown; the special exit loops back over row 0 into add.
        let template = template(vec![
            elem("elem_input", 0, 1),
            pipe(1, 1, Rotation::Deg0),
            elem("apply_add", 2, 1),
            pipe(3, 1, Rotation::Deg0),
            countdown(4, 1, 2),
            pipe(5, 1, Rotation::Deg0),
            elem("elem_output", 6, 1),
            SchemaTemplateElem {
                class: "special_angle_pipe".to_string(),
                ..angle_pipe(4, 0, Rotation::Deg90, true)
            },
            pipe(3, 0, Rotation::Deg180),
            angle_pipe(2, 0, Rotation::Deg0, true),
        ]);
        let schema = build(&template).expect("build");

        assert_eq!(schema.elems()[4].next, vec![7, 5]);
        assert_eq!(schema.elems()[7].next, vec![8]);
        assert_eq!(schema.elems()[8].next, vec![9]);
        assert_eq!(schema.elems()[9].next, vec![2]);
        assert_eq!(schema.elems()[2].next, vec![3]);

        // Two laps plus the way out: add runs three times, on every exec.
        assert_eq!(schema.exec("abc").expect("exec"), "def");
        assert_eq!(schema.exec("abc").expect("exec"), "def");
    }
}
