//! Order-independent puzzle description, as decoded from a level file.

use kurbo::Point;

use crate::core::types::{ElemExtra, Rotation};

/// One tile of the puzzle layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTemplateElem {
    pub class: String,
    /// Tile center, already adjusted for the rotation pivot.
    pub pos: Point,
    pub rotation: Rotation,
    pub extra: ElemExtra,
}

/// Free-form sticker text; forwarded untouched to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaHintTemplate {
    pub text: String,
    pub pos: Point,
}

/// A decoded level: elements plus puzzle metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTemplate {
    pub tile_width: f64,
    pub tile_height: f64,
    pub elems: Vec<SchemaTemplateElem>,
    /// The first `num_keywords` entries of `keywords` must be decoded.
    pub num_keywords: usize,
    pub keywords: Vec<String>,
    pub hints: Vec<SchemaHintTemplate>,
}

impl SchemaTemplate {
    pub fn required_keywords(&self) -> &[String] {
        &self.keywords[..self.num_keywords.min(self.keywords.len())]
    }

    pub fn decoy_keywords(&self) -> &[String] {
        &self.keywords[self.num_keywords.min(self.keywords.len())..]
    }
}
