//! Test-only helpers for constructing templates, tilesets and level files.
//!
//! Grid helpers place elements at the center of cell `(col, row)` of a
//! 96x96 grid with no offset.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kurbo::{Point, Vec2};
use serde_json::{Value, json};

use crate::core::class::countdown_initial_value;
use crate::core::geometry::TILE_EXTENT;
use crate::core::template::{SchemaHintTemplate, SchemaTemplate, SchemaTemplateElem};
use crate::core::transform::TransformOp;
use crate::core::types::{ElemExtra, IfExtra, Rotation};
use crate::tiled::{FLIPPED_HORIZONTALLY, Tile, Tileset};

/// `firstgid` used by every generated map.
pub const FIRST_GID: u32 = 1;

pub fn cell_center(col: usize, row: usize) -> Point {
    Point::new(
        col as f64 * TILE_EXTENT + TILE_EXTENT / 2.0,
        row as f64 * TILE_EXTENT + TILE_EXTENT / 2.0,
    )
}

/// Element with the extra data a decoded level would carry for its class.
pub fn elem(class: &str, col: usize, row: usize) -> SchemaTemplateElem {
    let extra = match countdown_initial_value(class) {
        Some(initial_value) => ElemExtra::Countdown { initial_value },
        None => ElemExtra::None,
    };
    SchemaTemplateElem {
        class: class.to_string(),
        pos: cell_center(col, row),
        rotation: Rotation::Deg0,
        extra,
    }
}

pub fn rotated(class: &str, col: usize, row: usize, rotation: Rotation) -> SchemaTemplateElem {
    SchemaTemplateElem {
        rotation,
        ..elem(class, col, row)
    }
}

pub fn pipe(col: usize, row: usize, rotation: Rotation) -> SchemaTemplateElem {
    rotated("pipe", col, row, rotation)
}

pub fn special_pipe(col: usize, row: usize, rotation: Rotation) -> SchemaTemplateElem {
    rotated("special_pipe", col, row, rotation)
}

pub fn angle_pipe(
    col: usize,
    row: usize,
    rotation: Rotation,
    flip_horizontally: bool,
) -> SchemaTemplateElem {
    SchemaTemplateElem {
        extra: ElemExtra::Angle { flip_horizontally },
        ..rotated("angle_pipe", col, row, rotation)
    }
}

pub fn countdown(col: usize, row: usize, initial_value: u8) -> SchemaTemplateElem {
    elem(&format!("elem_countdown{initial_value}"), col, row)
}

pub fn if_elem(
    class: &str,
    col: usize,
    row: usize,
    cond_kind: &str,
    string_arg: &str,
    int_arg: i64,
) -> SchemaTemplateElem {
    SchemaTemplateElem {
        extra: ElemExtra::If(IfExtra {
            cond_kind: cond_kind.to_string(),
            string_arg: string_arg.to_string(),
            int_arg,
        }),
        ..elem(class, col, row)
    }
}

/// Template with 96x96 tiles and no keywords.
pub fn template(elems: Vec<SchemaTemplateElem>) -> SchemaTemplate {
    SchemaTemplate {
        tile_width: TILE_EXTENT,
        tile_height: TILE_EXTENT,
        elems,
        num_keywords: 0,
        keywords: Vec::new(),
        hints: Vec::new(),
    }
}

/// `IN -> pipe -> apply_rot13 -> pipe -> OUT` along row 0.
pub fn rot13_line_template() -> SchemaTemplate {
    template(vec![
        elem("elem_input", 0, 0),
        pipe(1, 0, Rotation::Deg0),
        elem("apply_rot13", 2, 0),
        pipe(3, 0, Rotation::Deg0),
        elem("elem_output", 4, 0),
    ])
}

/// `IN -> elem_if` with the primary branch through `apply_add` and the
/// secondary branch straight down to a second output.
pub fn branch_template(cond_kind: &str, string_arg: &str) -> SchemaTemplate {
    template(vec![
        elem("elem_input", 0, 2),
        pipe(1, 2, Rotation::Deg0),
        if_elem("elem_if", 2, 2, cond_kind, string_arg, 0),
        special_pipe(3, 2, Rotation::Deg0),
        elem("apply_add", 4, 2),
        pipe(5, 2, Rotation::Deg0),
        elem("elem_output", 6, 2),
        pipe(2, 3, Rotation::Deg90),
        elem("elem_output", 2, 4),
    ])
}

/// Every class the engine knows, plus `settings` and `hint`.
pub fn standard_classes() -> Vec<String> {
    let structural = [
        "settings",
        "hint",
        "elem_input",
        "elem_output",
        "elem_mux",
        "elem_if",
        "elem_ifnot",
        "elem_repeater",
        "elem_inv_repeater",
        "elem_countdown0",
        "elem_countdown1",
        "elem_countdown2",
        "elem_countdown3",
        "pipe",
        "special_pipe",
        "angle_pipe",
        "special_angle_pipe",
        "pipe_connect2",
    ];
    structural
        .iter()
        .map(|class| class.to_string())
        .chain(TransformOp::names().map(|name| format!("apply_{name}")))
        .collect()
}

pub fn standard_tileset() -> Tileset {
    Tileset {
        tile_width: TILE_EXTENT,
        tile_height: TILE_EXTENT,
        tiles: standard_classes()
            .into_iter()
            .enumerate()
            .map(|(id, class)| Tile {
                id: id as u32,
                class,
            })
            .collect(),
    }
}

pub fn standard_tileset_json() -> String {
    let tiles: Vec<Value> = standard_classes()
        .iter()
        .enumerate()
        .map(|(id, class)| json!({ "id": id, "type": class }))
        .collect();
    let doc = json!({
        "tilewidth": TILE_EXTENT,
        "tileheight": TILE_EXTENT,
        "tiles": tiles,
    });
    doc.to_string()
}

fn gid_of(tileset: &Tileset, class: &str) -> u32 {
    let tile = tileset
        .tiles
        .iter()
        .find(|tile| tile.class == class)
        .unwrap_or_else(|| panic!("class {class} missing from the test tileset"));
    FIRST_GID + tile.id
}

/// Tiled map JSON that decodes back to `template` against [`standard_tileset`].
pub fn level_json(template: &SchemaTemplate) -> String {
    let tileset = standard_tileset();
    let (w, h) = (template.tile_width, template.tile_height);
    let mut objects: Vec<Value> = Vec::new();

    objects.push(json!({
        "gid": gid_of(&tileset, "settings"),
        "x": 0.0,
        "y": h * 10.0,
        "properties": [
            { "name": "keywords", "type": "string", "value": template.keywords.join("\n") },
            { "name": "num_keywords", "type": "int", "value": template.num_keywords },
        ],
    }));

    for elem in &template.elems {
        let pivot = match elem.rotation {
            Rotation::Deg0 => Vec2::ZERO,
            Rotation::Deg90 => Vec2::new(0.0, h),
            Rotation::Deg180 => Vec2::new(-w, h),
            Rotation::Deg270 => Vec2::new(-w, 0.0),
        };
        let anchor = elem.pos - pivot - Vec2::new(w / 2.0, -h / 2.0);
        let mut gid = gid_of(&tileset, &elem.class);
        let mut properties = Vec::new();
        match &elem.extra {
            ElemExtra::Angle {
                flip_horizontally: true,
            } => gid |= FLIPPED_HORIZONTALLY,
            ElemExtra::If(extra) => {
                properties = vec![
                    json!({ "name": "cond_kind", "type": "string", "value": extra.cond_kind }),
                    json!({ "name": "string_arg", "type": "string", "value": extra.string_arg }),
                    json!({ "name": "int_arg", "type": "int", "value": extra.int_arg }),
                ];
            }
            _ => {}
        }
        objects.push(json!({
            "gid": gid,
            "x": anchor.x,
            "y": anchor.y,
            "rotation": elem.rotation.degrees(),
            "properties": properties,
        }));
    }

    for SchemaHintTemplate { text, pos } in &template.hints {
        objects.push(json!({
            "gid": gid_of(&tileset, "hint"),
            "x": pos.x,
            "y": pos.y,
            "properties": [{ "name": "text", "type": "string", "value": text }],
        }));
    }

    json!({
        "tilesets": [{ "firstgid": FIRST_GID, "source": "schema.tsj" }],
        "layers": [{ "objects": objects }],
    })
    .to_string()
}

/// A level directory on disk with the standard tileset next to it.
pub struct TestLevels {
    dir: tempfile::TempDir,
}

impl TestLevels {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp level dir")?;
        let levels = Self { dir };
        fs::write(levels.tileset_path(), standard_tileset_json()).context("write tileset")?;
        Ok(levels)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn tileset_path(&self) -> PathBuf {
        self.root().join("schema.tsj")
    }

    /// Write `contents` to `<root>/<name>` and return the full path.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn write_template(&self, name: &str, template: &SchemaTemplate) -> Result<PathBuf> {
        self.write(name, &level_json(template))
    }
}

/// `rot13_line_template` with keywords, ready to be written as a level.
pub fn rot13_level(keywords: &[&str], num_keywords: usize) -> SchemaTemplate {
    SchemaTemplate {
        keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        num_keywords,
        ..rot13_line_template()
    }
}
