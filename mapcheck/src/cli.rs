//! CLI command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use circuit::core::class::ContentTags;
use circuit::core::runner::{RunError, SchemaRunner};
use circuit::core::schema::ComponentSchema;
use circuit::io::config::{CircuitConfig, load_config};
use circuit::io::levels::{load_tileset_file, read_level_file, scan_custom_levels};
use circuit::level::{build_level, validate_level};
use circuit::tiled::Tileset;
use serde::Serialize;
use tracing::{debug, info};

use crate::exit_codes;

/// Config with relative paths resolved against the config file's directory.
#[derive(Debug)]
pub struct Settings {
    config: CircuitConfig,
    base_dir: PathBuf,
}

impl Settings {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = load_config(config_path)?;
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        debug!(path = %config_path.display(), ?config, "config loaded");
        Ok(Self { config, base_dir })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// `--tileset` wins over the config file.
    fn tileset(&self, flag: Option<&Path>) -> Result<Tileset> {
        let path = match (flag, &self.config.tileset) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(path)) => self.resolve(path),
            (None, None) => {
                bail!("no tileset given (pass --tileset or set `tileset` in the config)")
            }
        };
        load_tileset_file(&path)
    }

    fn max_steps(&self) -> usize {
        self.config.max_steps
    }
}

/// Validate level files, printing one line per broken file to stderr.
pub fn check_levels(settings: &Settings, tileset: Option<&Path>, files: &[PathBuf]) -> Result<i32> {
    let tileset = settings.tileset(tileset)?;
    let mut failed = 0;
    for file in files {
        let checked = read_level_file(file).and_then(|data| {
            validate_level(&tileset, &data, settings.max_steps()).map_err(anyhow::Error::from)
        });
        if let Err(err) = checked {
            failed += 1;
            eprintln!("{:?}: {:#}", file.display().to_string(), err);
        }
    }
    info!(checked = files.len(), failed, "check finished");
    if failed > 0 {
        return Ok(exit_codes::INVALID);
    }
    println!("[OK] all files are good (checked {} files)", files.len());
    Ok(exit_codes::OK)
}

/// Scan a custom-level directory and list what would be offered to players.
pub fn scan_levels(settings: &Settings, tileset: Option<&Path>, dir: Option<&Path>) -> Result<i32> {
    let dir = match (dir, &settings.config.custom_levels_dir) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(dir)) => settings.resolve(dir),
        (None, None) => {
            bail!("no directory given (pass one or set `custom_levels_dir` in the config)")
        }
    };
    let tileset = settings.tileset(tileset)?;
    let scan = scan_custom_levels(&dir, &tileset, settings.max_steps())?;
    for path in &scan.accepted {
        println!("scan: ok {}", path.display());
    }
    for rejected in &scan.rejected {
        eprintln!(
            "scan: rejected {}: {:#}",
            rejected.path.display(),
            rejected.error
        );
    }
    println!(
        "scan: dir={} accepted={} rejected={}",
        dir.display(),
        scan.accepted.len(),
        scan.rejected.len()
    );
    if scan.rejected.is_empty() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::INVALID)
    }
}

fn build(settings: &Settings, tileset: Option<&Path>, file: &Path) -> Result<ComponentSchema> {
    let tileset = settings.tileset(tileset)?;
    let data = read_level_file(file)?;
    build_level(&tileset, &data, settings.max_steps())
        .with_context(|| format!("build {}", file.display()))
}

/// Run a level on `input`; with `trace`, print every visited element.
pub fn run_level(
    settings: &Settings,
    tileset: Option<&Path>,
    file: &Path,
    input: &str,
    trace: bool,
) -> Result<i32> {
    let schema = build(settings, tileset, file)?;
    let max_steps = settings.max_steps();
    if !trace {
        let output = SchemaRunner::new()
            .with_step_limit(max_steps)
            .exec(&schema, input)?;
        println!("{output}");
        return Ok(exit_codes::OK);
    }

    let mut runner = SchemaRunner::new();
    runner.reset(&schema, input);
    let mut steps = 0usize;
    while let Some(pos) = runner.run_step() {
        steps += 1;
        if steps > max_steps {
            return Err(anyhow!(RunError::StepLimitExceeded {
                input: input.to_string(),
                limit: max_steps,
            }));
        }
        let class = runner.current().map_or("", |elem| elem.class.as_str());
        println!(
            "step {steps}: ({}, {}) {class} [{}]",
            pos.x,
            pos.y,
            String::from_utf8_lossy(runner.buffer())
        );
    }
    println!("{}", runner.value());
    Ok(exit_codes::OK)
}

#[derive(Debug, Serialize)]
struct KeywordEntry<'a> {
    keyword: &'a str,
    encoded: &'a str,
    required: bool,
}

#[derive(Debug, Serialize)]
struct KeywordReport<'a> {
    keywords: Vec<KeywordEntry<'a>>,
    conditions: Vec<&'static str>,
    tags: ContentTags,
}

/// Print keywords, their encoded forms and the level's content tags.
pub fn show_keywords(
    settings: &Settings,
    tileset: Option<&Path>,
    file: &Path,
    json: bool,
) -> Result<i32> {
    let schema = build(settings, tileset, file)?;
    let num_required = schema.required_keywords().len();
    let report = KeywordReport {
        keywords: schema
            .keywords()
            .iter()
            .zip(schema.encoded_keywords())
            .enumerate()
            .map(|(i, (keyword, encoded))| KeywordEntry {
                keyword,
                encoded,
                required: i < num_required,
            })
            .collect(),
        conditions: schema.branch_conditions(),
        tags: schema.tags(),
    };

    if json {
        let mut buf = serde_json::to_string_pretty(&report).context("serialize keyword report")?;
        buf.push('\n');
        print!("{buf}");
        return Ok(exit_codes::OK);
    }

    for entry in &report.keywords {
        let label = if entry.required { "required" } else { "decoy" };
        println!("{label}: {} -> {}", entry.keyword, entry.encoded);
    }
    if !report.conditions.is_empty() {
        println!("conditions: {}", report.conditions.join(", "));
    }
    if !report.tags.any() {
        println!("tags: none");
        return Ok(exit_codes::OK);
    }
    let tags = serde_json::to_value(report.tags).context("serialize content tags")?;
    let enabled: Vec<&str> = tags
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(_, value)| value.as_bool() == Some(true))
        .map(|(name, _)| name.as_str())
        .collect();
    println!("tags: {}", enabled.join(", "));
    Ok(exit_codes::OK)
}
