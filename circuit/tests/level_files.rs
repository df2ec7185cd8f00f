//! Level decoding tests: Tiled map JSON through `load_template` and `validate_level`.

use circuit::core::builder::BuildError;
use circuit::core::runner::DEFAULT_MAX_STEPS;
use circuit::core::types::{ElemExtra, IfExtra, Rotation};
use circuit::level::{LevelError, TemplateError, build_level, load_template, validate_level};
use circuit::test_support::{
    angle_pipe, branch_template, cell_center, countdown, elem, level_json, pipe, rot13_level,
    standard_tileset, template,
};
use circuit::tiled::{FLIPPED_HORIZONTALLY, FLIPPED_VERTICALLY, Tileset};
use kurbo::Point;
use serde_json::{Value, json};

fn gid(tileset: &Tileset, class: &str) -> u32 {
    tileset
        .tiles
        .iter()
        .find(|tile| tile.class == class)
        .map(|tile| tile.id + 1)
        .expect("class in tileset")
}

fn settings(tileset: &Tileset, keywords: &str, num_keywords: i64) -> Value {
    json!({
        "gid": gid(tileset, "settings"),
        "x": 0, "y": 960,
        "properties": [
            { "name": "keywords", "type": "string", "value": keywords },
            { "name": "num_keywords", "type": "int", "value": num_keywords },
        ],
    })
}

fn input(tileset: &Tileset) -> Value {
    json!({ "gid": gid(tileset, "elem_input"), "x": 0, "y": 96 })
}

fn map(objects: Vec<Value>) -> Vec<u8> {
    json!({
        "tilesets": [{ "firstgid": 1 }],
        "layers": [{ "objects": objects }],
    })
    .to_string()
    .into_bytes()
}

fn template_error(data: &[u8]) -> TemplateError {
    load_template(&standard_tileset(), data).expect_err("decode should fail")
}

#[test]
fn decodes_positions_with_rotation_pivots() {
    let tileset = standard_tileset();
    let pipe_gid = gid(&tileset, "pipe");
    let data = map(vec![
        settings(&tileset, "hello", 1),
        input(&tileset),
        json!({ "gid": pipe_gid, "x": 96, "y": 96, "rotation": 0 }),
        json!({ "gid": pipe_gid, "x": 192, "y": 0, "rotation": 90 }),
        json!({ "gid": pipe_gid, "x": 384, "y": 0, "rotation": 180 }),
        json!({ "gid": pipe_gid, "x": 480, "y": 96, "rotation": 270 }),
    ]);
    let template = load_template(&tileset, &data).expect("decode");
    let placed: Vec<(Point, Rotation)> = template
        .elems
        .iter()
        .map(|elem| (elem.pos, elem.rotation))
        .collect();
    assert_eq!(
        placed,
        vec![
            (cell_center(0, 0), Rotation::Deg0),
            (cell_center(1, 0), Rotation::Deg0),
            (cell_center(2, 0), Rotation::Deg90),
            (cell_center(3, 0), Rotation::Deg180),
            (cell_center(4, 0), Rotation::Deg270),
        ]
    );
}

#[test]
fn settings_supply_trimmed_keywords() {
    let tileset = standard_tileset();
    let data = map(vec![
        input(&tileset),
        settings(&tileset, "\n  hello \nworld\n decoy\n", 2),
    ]);
    let template = load_template(&tileset, &data).expect("decode");
    assert_eq!(template.keywords, ["hello", "world", "decoy"]);
    assert_eq!(template.required_keywords(), ["hello", "world"]);
    assert_eq!(template.decoy_keywords(), ["decoy"]);
}

#[test]
fn hints_keep_their_raw_anchor() {
    let tileset = standard_tileset();
    let data = map(vec![
        settings(&tileset, "hello", 1),
        input(&tileset),
        json!({
            "gid": gid(&tileset, "hint"),
            "x": 10.5, "y": 20,
            "properties": [{ "name": "text", "type": "string", "value": "try rot13" }],
        }),
    ]);
    let template = load_template(&tileset, &data).expect("decode");
    assert_eq!(template.hints.len(), 1);
    assert_eq!(template.hints[0].text, "try rot13");
    assert_eq!(template.hints[0].pos, Point::new(10.5, 20.0));
    assert_eq!(template.elems.len(), 1);
}

#[test]
fn settings_errors() {
    let tileset = standard_tileset();

    let twice = map(vec![
        input(&tileset),
        settings(&tileset, "hello", 1),
        settings(&tileset, "world", 1),
    ]);
    assert!(matches!(
        template_error(&twice),
        TemplateError::DuplicateSettings(_)
    ));

    let empty = map(vec![input(&tileset), settings(&tileset, "  \n ", 1)]);
    let err = template_error(&empty);
    let message = err.to_string();
    assert!(message.contains("settings.keywords property is empty"));

    let missing = map(vec![input(&tileset)]);
    assert!(matches!(
        template_error(&missing),
        TemplateError::MissingSettings
    ));

    let too_many = map(vec![input(&tileset), settings(&tileset, "hello", 2)]);
    assert!(matches!(
        template_error(&too_many),
        TemplateError::KeywordCount {
            found: 2,
            available: 1
        }
    ));

    let upper = map(vec![input(&tileset), settings(&tileset, "Hello", 1)]);
    let upper_err = template_error(&upper);
    assert!(matches!(upper_err, TemplateError::InvalidKeyword(k) if k == "Hello"));
}

#[test]
fn angle_pipes_carry_flip_data() {
    let tileset = standard_tileset();
    let angle = gid(&tileset, "angle_pipe");
    let data = map(vec![
        settings(&tileset, "hello", 1),
        input(&tileset),
        json!({ "gid": angle | FLIPPED_HORIZONTALLY, "x": 96, "y": 96 }),
    ]);
    let template = load_template(&tileset, &data).expect("decode");
    assert_eq!(
        template.elems[1].extra,
        ElemExtra::Angle {
            flip_horizontally: true
        }
    );
    assert_eq!(template.elems[1].class, "angle_pipe");

    let vertical = map(vec![
        settings(&tileset, "hello", 1),
        input(&tileset),
        json!({ "gid": angle | FLIPPED_VERTICALLY, "x": 96, "y": 96 }),
    ]);
    let err = template_error(&vertical);
    assert!(err.to_string().contains("vertical flipping is obsolete"));
}

#[test]
fn branch_and_countdown_extras() {
    let tileset = standard_tileset();
    let data = map(vec![
        settings(&tileset, "hello", 1),
        input(&tileset),
        json!({ "gid": gid(&tileset, "elem_countdown2"), "x": 96, "y": 96 }),
        json!({
            "gid": gid(&tileset, "elem_ifnot"),
            "x": 192, "y": 96,
            "properties": [
                { "name": "cond_kind", "type": "string", "value": "len_gt" },
                { "name": "int_arg", "type": "int", "value": 3 },
            ],
        }),
    ]);
    let template = load_template(&tileset, &data).expect("decode");
    assert_eq!(
        template.elems[1].extra,
        ElemExtra::Countdown { initial_value: 2 }
    );
    assert_eq!(
        template.elems[2].extra,
        ElemExtra::If(IfExtra {
            cond_kind: "len_gt".to_string(),
            string_arg: String::new(),
            int_arg: 3,
        })
    );

    let no_cond = map(vec![
        settings(&tileset, "hello", 1),
        input(&tileset),
        json!({ "gid": gid(&tileset, "elem_if"), "x": 96, "y": 96 }),
    ]);
    assert!(matches!(
        template_error(&no_cond),
        TemplateError::MissingCondition(_)
    ));
}

#[test]
fn decode_rejects_unknown_tiles_and_input_counts() {
    let tileset = standard_tileset();
    let unknown = map(vec![
        settings(&tileset, "hello", 1),
        input(&tileset),
        json!({ "gid": 10_000, "x": 96, "y": 96 }),
    ]);
    assert!(matches!(
        template_error(&unknown),
        TemplateError::UnknownTile { gid: 10_000, .. }
    ));

    let no_input = map(vec![settings(&tileset, "hello", 1)]);
    assert!(matches!(
        template_error(&no_input),
        TemplateError::InputCount(0)
    ));

    let odd_rotation = map(vec![
        settings(&tileset, "hello", 1),
        json!({ "gid": gid(&tileset, "elem_input"), "x": 0, "y": 96, "rotation": 45 }),
    ]);
    assert!(matches!(
        template_error(&odd_rotation),
        TemplateError::UnsupportedRotation { .. }
    ));
}

#[test]
fn generated_levels_decode_to_their_template() {
    let original = {
        let mut t = template(vec![
            elem("elem_input", 0, 0),
            pipe(1, 0, Rotation::Deg0),
            angle_pipe(2, 0, Rotation::Deg90, true),
            countdown(3, 1, 3),
            pipe(2, 2, Rotation::Deg270),
        ]);
        t.keywords = vec!["alpha".to_string(), "beta".to_string()];
        t.num_keywords = 1;
        t
    };
    let decoded = load_template(&standard_tileset(), level_json(&original).as_bytes())
        .expect("decode");
    assert_eq!(decoded, original);
}

#[test]
fn validate_level_accepts_playable_levels() {
    let tileset = standard_tileset();
    let rot13 = rot13_level(&["hello"], 1);
    validate_level(&tileset, level_json(&rot13).as_bytes(), DEFAULT_MAX_STEPS)
        .expect("rot13 level");

    let mut branching = branch_template("has_prefix", "ab");
    branching.keywords = vec!["abc".to_string(), "xyz".to_string()];
    branching.num_keywords = 2;
    let schema = build_level(&tileset, level_json(&branching).as_bytes(), 1_000).expect("build");
    assert_eq!(schema.encoded_keywords(), ["bcd", "xyz"]);
}

#[test]
fn validate_level_reports_build_errors() {
    let mut broken = template(vec![elem("elem_input", 0, 0), elem("elem_output", 3, 3)]);
    broken.keywords = vec!["hello".to_string()];
    broken.num_keywords = 1;
    let err = validate_level(
        &standard_tileset(),
        level_json(&broken).as_bytes(),
        DEFAULT_MAX_STEPS,
    )
    .expect_err("input has nowhere to go");
    assert!(matches!(
        err,
        LevelError::Build(BuildError::OutgoingCount {
            expected: 1,
            found: 0,
            ..
        })
    ));
}

#[test]
fn validate_level_reports_template_errors() {
    let err = validate_level(&standard_tileset(), b"[]", DEFAULT_MAX_STEPS).expect_err("not a map");
    assert!(matches!(
        err,
        LevelError::Template(TemplateError::Schema { .. })
    ));
}
