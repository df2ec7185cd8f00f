//! Pin geometry: where an element accepts and emits connections.
//!
//! Graph edges are never stored in level files. Two neighbouring elements are
//! linked when an output pin of one lands on an input pin of the other.

use std::f64::consts::{FRAC_PI_2, PI};

use kurbo::{Point, Vec2};

use crate::core::class::ElemClass;
use crate::core::types::{ElemExtra, Rotation};

/// Side of a schema tile in world units.
pub const TILE_EXTENT: f64 = 96.0;
/// Distance from an element's center to each of its pins.
pub const PIN_RADIUS: f64 = TILE_EXTENT / 2.0;
/// Two pins closer than this on both axes are the same point.
pub const PIN_EPSILON: f64 = TILE_EXTENT * 1e-3;

const MAX_PINS: usize = 4;

/// Input and output pins of one element, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElemShape {
    inputs: [Point; MAX_PINS],
    outputs: [Point; MAX_PINS],
    num_inputs: usize,
    num_outputs: usize,
}

impl ElemShape {
    fn directional(inputs: &[Point], outputs: &[Point]) -> Self {
        let mut shape = Self {
            inputs: [Point::ZERO; MAX_PINS],
            outputs: [Point::ZERO; MAX_PINS],
            num_inputs: inputs.len(),
            num_outputs: outputs.len(),
        };
        shape.inputs[..inputs.len()].copy_from_slice(inputs);
        shape.outputs[..outputs.len()].copy_from_slice(outputs);
        shape
    }

    /// Four pins at the cardinal offsets, each usable both ways.
    fn omnidirectional(pos: Point) -> Self {
        let pins = [
            pos + Vec2::new(-PIN_RADIUS, 0.0),
            pos + Vec2::new(PIN_RADIUS, 0.0),
            pos + Vec2::new(0.0, -PIN_RADIUS),
            pos + Vec2::new(0.0, PIN_RADIUS),
        ];
        Self::directional(&pins, &pins)
    }

    pub fn inputs(&self) -> &[Point] {
        &self.inputs[..self.num_inputs]
    }

    pub fn outputs(&self) -> &[Point] {
        &self.outputs[..self.num_outputs]
    }

    /// True if any output pin of `self` coincides with an input pin of `other`.
    pub fn can_connect_to(&self, other: &Self) -> bool {
        self.outputs().iter().any(|&out| {
            other
                .inputs()
                .iter()
                .any(|&input| pins_coincide(out, input))
        })
    }
}

pub fn pins_coincide(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= PIN_EPSILON && (a.y - b.y).abs() <= PIN_EPSILON
}

/// Compute the pins of an element placed at `pos` (its tile center).
pub fn shape_of(class: &ElemClass, pos: Point, rotation: Rotation, extra: &ElemExtra) -> ElemShape {
    let angle = rotation.radians();
    match class {
        // Default orientation: flows left to right.
        ElemClass::Pipe => {
            ElemShape::directional(&[pin(pos, angle - PI)], &[pin(pos, angle)])
        }
        // Default orientation: enters from the left, leaves downwards.
        // A horizontal flip makes it enter from the right instead.
        ElemClass::AnglePipe => {
            let flipped = matches!(
                extra,
                ElemExtra::Angle {
                    flip_horizontally: true
                }
            );
            let start = if flipped { angle + PI } else { angle };
            ElemShape::directional(&[pin(pos, start - PI)], &[pin(pos, angle + FRAC_PI_2)])
        }
        // Default orientation: enters from above and below, leaves to the right.
        ElemClass::PipeConnect2 => ElemShape::directional(
            &[
                pin(pos, angle + FRAC_PI_2 - PI),
                pin(pos, angle - FRAC_PI_2 - PI),
            ],
            &[pin(pos, angle)],
        ),
        _ => ElemShape::omnidirectional(pos),
    }
}

fn pin(pos: Point, angle: f64) -> Point {
    pos + Vec2::from_angle(angle) * PIN_RADIUS
}
