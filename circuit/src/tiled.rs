//! Tiled JSON documents: tilesets (`.tsj`) and object-layer maps (`.tmj`).
//!
//! Only the fields the level loader reads are modelled. Both documents are
//! checked against an embedded JSON Schema before serde sees them, so shape
//! errors come back as readable messages instead of serde paths.

use jsonschema::validator_for;
use serde::Deserialize;
use serde_json::Value;

use crate::level::TemplateError;

pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
const GID_MASK: u32 = !(FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY);

const MAP_SCHEMA: &str = include_str!("../schemas/tiled_map.schema.json");
const TILESET_SCHEMA: &str = include_str!("../schemas/tiled_tileset.schema.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tileset {
    #[serde(rename = "tilewidth")]
    pub tile_width: f64,
    #[serde(rename = "tileheight")]
    pub tile_height: f64,
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tile {
    pub id: u32,
    /// Tiled 1.9 renamed `type` to `class`; both spellings are accepted.
    #[serde(rename = "class", alias = "type")]
    pub class: String,
}

impl Tileset {
    pub fn from_slice(data: &[u8]) -> Result<Self, TemplateError> {
        parse_validated("tileset", TILESET_SCHEMA, data)
    }

    pub fn tile_by_id(&self, id: u32) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TiledMap {
    pub tilesets: Vec<TilesetRef>,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TilesetRef {
    pub firstgid: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Layer {
    #[serde(default)]
    pub objects: Vec<TiledObject>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TiledObject {
    /// Global tile id with the flip flags in the high bits.
    pub gid: u32,
    /// Bottom-left corner before rotation.
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: Value,
}

impl TiledMap {
    pub fn from_slice(data: &[u8]) -> Result<Self, TemplateError> {
        parse_validated("map", MAP_SCHEMA, data)
    }
}

impl TiledObject {
    /// The gid with flip flags cleared.
    pub fn tile_gid(&self) -> u32 {
        self.gid & GID_MASK
    }

    pub fn flipped_horizontally(&self) -> bool {
        self.gid & FLIPPED_HORIZONTALLY != 0
    }

    pub fn flipped_vertically(&self) -> bool {
        self.gid & FLIPPED_VERTICALLY != 0
    }

    pub fn flipped_diagonally(&self) -> bool {
        self.gid & FLIPPED_DIAGONALLY != 0
    }

    fn prop(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|prop| prop.name == name)
            .map(|prop| &prop.value)
    }

    pub fn string_prop<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.prop(name).and_then(Value::as_str).unwrap_or(default)
    }

    pub fn int_prop(&self, name: &str, default: i64) -> i64 {
        self.prop(name).and_then(Value::as_i64).unwrap_or(default)
    }
}

fn parse_validated<T>(document: &'static str, schema: &str, data: &[u8]) -> Result<T, TemplateError>
where
    T: for<'de> Deserialize<'de>,
{
    let value: Value =
        serde_json::from_slice(data).map_err(|source| TemplateError::Json { document, source })?;
    validate_schema(document, schema, &value)?;
    serde_json::from_value(value).map_err(|source| TemplateError::Json { document, source })
}

fn validate_schema(
    document: &'static str,
    schema: &str,
    value: &Value,
) -> Result<(), TemplateError> {
    let invalid_schema = |message: String| TemplateError::InvalidSchema { document, message };
    let schema_value: Value =
        serde_json::from_str(schema).map_err(|err| invalid_schema(err.to_string()))?;
    let compiled = validator_for(&schema_value).map_err(|err| invalid_schema(err.to_string()))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(TemplateError::Schema { document, messages });
    }
    Ok(())
}
