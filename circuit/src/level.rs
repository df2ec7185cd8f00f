//! Level decoding: Tiled map + tileset to [`SchemaTemplate`], and full validation.

use std::sync::LazyLock;

use kurbo::{Point, Vec2};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::core::builder::{BuildError, SchemaBuilder};
use crate::core::class::countdown_initial_value;
use crate::core::schema::ComponentSchema;
use crate::core::template::{SchemaHintTemplate, SchemaTemplate, SchemaTemplateElem};
use crate::core::types::{ElemExtra, ElemRef, IfExtra, Rotation};
use crate::tiled::{TiledMap, TiledObject, Tileset};

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]+$").unwrap());

const SETTINGS_CLASS: &str = "settings";
const HINT_CLASS: &str = "hint";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("malformed {document} JSON: {source}")]
    Json {
        document: &'static str,
        source: serde_json::Error,
    },
    #[error("{document} does not match its schema: {}", messages.join("; "))]
    Schema {
        document: &'static str,
        messages: Vec<String>,
    },
    #[error("embedded {document} schema is invalid: {message}")]
    InvalidSchema {
        document: &'static str,
        message: String,
    },
    #[error("map has no tileset reference or object layer")]
    MissingLayer,
    #[error("({x}, {y}): gid {gid} does not name a tileset tile")]
    UnknownTile { gid: u32, x: f64, y: f64 },
    #[error("{at}: unsupported rotation {degrees}")]
    UnsupportedRotation { at: ElemRef, degrees: f64 },
    #[error("{0}: found more than one settings element")]
    DuplicateSettings(ElemRef),
    #[error("level has no settings element")]
    MissingSettings,
    #[error("{0}: settings.keywords property is empty")]
    EmptyKeywords(ElemRef),
    #[error("settings.num_keywords must be within 1..={available}, found {found}")]
    KeywordCount { found: i64, available: usize },
    #[error("keyword '{0}' must consist of lowercase a-z letters only")]
    InvalidKeyword(String),
    #[error("{0}: vertical flipping is obsolete")]
    VerticalFlip(ElemRef),
    #[error("{0}: elem_if cond property is empty")]
    MissingCondition(ElemRef),
    #[error("expected exactly 1 IN (input) element, found {0}")]
    InputCount(usize),
}

/// Anything that makes a level file unplayable.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Decode a level file (Tiled map JSON) against `tileset`.
pub fn load_template(
    tileset: &Tileset,
    level_data: &[u8],
) -> Result<SchemaTemplate, TemplateError> {
    let map = TiledMap::from_slice(level_data)?;
    map_to_template(tileset, &map)
}

pub fn map_to_template(tileset: &Tileset, map: &TiledMap) -> Result<SchemaTemplate, TemplateError> {
    let (Some(tileset_ref), Some(layer)) = (map.tilesets.first(), map.layers.first()) else {
        return Err(TemplateError::MissingLayer);
    };
    let (tile_width, tile_height) = (tileset.tile_width, tileset.tile_height);

    let mut elems = Vec::with_capacity(layer.objects.len());
    let mut hints = Vec::new();
    let mut settings: Option<(i64, Vec<String>)> = None;
    let mut num_inputs = 0;

    for object in &layer.objects {
        let tile = object
            .tile_gid()
            .checked_sub(tileset_ref.firstgid)
            .and_then(|id| tileset.tile_by_id(id))
            .ok_or(TemplateError::UnknownTile {
                gid: object.tile_gid(),
                x: object.x,
                y: object.y,
            })?;
        let class = tile.class.as_str();
        let pos = object_center(object, tile_width, tile_height);
        let at = ElemRef::new(class, pos);

        match class {
            SETTINGS_CLASS => {
                if settings.is_some() {
                    return Err(TemplateError::DuplicateSettings(at));
                }
                let all_keywords = object.string_prop("keywords", "").trim();
                if all_keywords.is_empty() {
                    return Err(TemplateError::EmptyKeywords(at));
                }
                let keywords = all_keywords
                    .split('\n')
                    .map(|keyword| keyword.trim().to_string())
                    .collect();
                settings = Some((object.int_prop("num_keywords", 0), keywords));
                continue;
            }
            HINT_CLASS => {
                hints.push(SchemaHintTemplate {
                    text: object.string_prop("text", "").to_string(),
                    pos: Point::new(object.x, object.y),
                });
                continue;
            }
            "elem_input" => num_inputs += 1,
            _ => {}
        }

        let rotation = Rotation::from_degrees(object.rotation).ok_or_else(|| {
            TemplateError::UnsupportedRotation {
                at: at.clone(),
                degrees: object.rotation,
            }
        })?;
        elems.push(SchemaTemplateElem {
            class: class.to_string(),
            pos,
            rotation,
            extra: object_extra(object, class, at)?,
        });
    }

    if num_inputs != 1 {
        return Err(TemplateError::InputCount(num_inputs));
    }
    let (num_keywords, keywords) = settings.ok_or(TemplateError::MissingSettings)?;
    if let Some(bad) = keywords.iter().find(|kw| !KEYWORD_RE.is_match(kw)) {
        return Err(TemplateError::InvalidKeyword(bad.clone()));
    }
    let num_keywords = usize::try_from(num_keywords)
        .ok()
        .filter(|&n| (1..=keywords.len()).contains(&n))
        .ok_or(TemplateError::KeywordCount {
            found: num_keywords,
            available: keywords.len(),
        })?;

    debug!(
        elems = elems.len(),
        hints = hints.len(),
        keywords = keywords.len(),
        num_keywords,
        "decoded level template"
    );
    Ok(SchemaTemplate {
        tile_width,
        tile_height,
        elems,
        num_keywords,
        keywords,
        hints,
    })
}

/// Tile center from Tiled's rotated bottom-left anchor.
fn object_center(object: &TiledObject, tile_width: f64, tile_height: f64) -> Point {
    let pivot = match object.rotation as i64 {
        90 => Vec2::new(0.0, tile_height),
        180 => Vec2::new(-tile_width, tile_height),
        270 => Vec2::new(-tile_width, 0.0),
        _ => Vec2::ZERO,
    };
    Point::new(object.x + tile_width / 2.0, object.y - tile_height / 2.0) + pivot
}

fn object_extra(
    object: &TiledObject,
    class: &str,
    at: ElemRef,
) -> Result<ElemExtra, TemplateError> {
    let extra = match class {
        "angle_pipe" | "special_angle_pipe" => {
            if object.flipped_vertically() {
                return Err(TemplateError::VerticalFlip(at));
            }
            ElemExtra::Angle {
                flip_horizontally: object.flipped_horizontally(),
            }
        }
        "elem_if" | "elem_ifnot" => {
            let cond_kind = object.string_prop("cond_kind", "");
            if cond_kind.is_empty() {
                return Err(TemplateError::MissingCondition(at));
            }
            ElemExtra::If(IfExtra {
                cond_kind: cond_kind.to_string(),
                string_arg: object.string_prop("string_arg", "").to_string(),
                int_arg: object.int_prop("int_arg", 0),
            })
        }
        _ => match countdown_initial_value(class) {
            Some(initial_value) => ElemExtra::Countdown { initial_value },
            None => ElemExtra::None,
        },
    };
    Ok(extra)
}

/// Decode and build a level at the origin, discarding the result.
///
/// `max_steps` caps each keyword-encoding run, as in [`build_level`].
pub fn validate_level(
    tileset: &Tileset,
    level_data: &[u8],
    max_steps: usize,
) -> Result<(), LevelError> {
    build_level(tileset, level_data, max_steps).map(|_| ())
}

/// Decode a level and build its schema at the origin.
pub fn build_level(
    tileset: &Tileset,
    level_data: &[u8],
    max_steps: usize,
) -> Result<ComponentSchema, LevelError> {
    let template = load_template(tileset, level_data)?;
    let schema = SchemaBuilder::new(Vec2::ZERO, &template)
        .with_step_limit(max_steps)
        .build()?;
    Ok(schema)
}
