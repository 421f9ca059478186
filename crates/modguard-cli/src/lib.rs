//! modguard command-line front-end
//!
//! Owns input collection, sample cycling and rendering; scoring itself lives
//! in `modguard-classifiers`.

pub mod cli;
pub mod interactive;
pub mod render;
pub mod samples;

pub use cli::*;
pub use render::{render_html, render_json, ConsoleRenderer};
pub use samples::{SampleCursor, SAMPLE_COMMENTS};

use modguard_classifiers::ScorerConfig;
use std::io::{self, Read};
use std::path::Path;

/// Resolve the scorer config from the global flags.
///
/// An explicit `--config` must exist; otherwise the default locations are
/// searched. `--model` and `--vectorizer` win over either.
pub fn build_config(global: &GlobalArgs) -> modguard_core::Result<ScorerConfig> {
    let mut config = match &global.config {
        Some(path) => ScorerConfig::from_file(path)?,
        None => ScorerConfig::discover()?,
    };

    if let Some(model) = &global.model {
        config.model_path = model.clone();
    }
    if let Some(vectorizer) = &global.vectorizer {
        config.vectorizer_path = vectorizer.clone();
    }
    Ok(config)
}

/// Gather the request text for `score`.
///
/// `--text` values come first, then the file (`-` reads stdin). With neither,
/// stdin is read.
pub fn read_comments(text: &[String], file: Option<&Path>) -> io::Result<String> {
    let mut lines: Vec<String> = text.to_vec();

    match file {
        Some(path) if path == Path::new("-") => lines.push(read_stdin()?),
        Some(path) => lines.push(std::fs::read_to_string(path)?),
        None if text.is_empty() => lines.push(read_stdin()?),
        None => {}
    }

    Ok(lines.join("\n"))
}

fn read_stdin() -> io::Result<String> {
    let mut buf = String::new();
    io::stdin().lock().read_to_string(&mut buf)?;
    Ok(buf)
}
