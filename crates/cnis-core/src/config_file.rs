use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub pdf: Option<PdfSection>,
    pub server: Option<ServerSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingSection {
    pub max_input_mb: Option<u64>,
    pub max_lines: Option<usize>,
    pub max_indicator_len: Option<usize>,
    pub foreign_boundaries: Option<bool>,
    pub extra_header_phrases: Option<Vec<String>>,
    pub extra_noise_phrases: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfSection {
    pub footer_exclusion: Option<f32>,
    pub header_exclusion: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub body_limit_mb: Option<usize>,
}

/// Platform config directory path: `<config_dir>/cnis/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cnis").join("config.toml"))
}

/// Load config by cascading CWD `.cnis.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".cnis.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

fn pick<S, T: Clone>(
    overlay: Option<&S>,
    base: Option<&S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bp, op) = (base.parsing.as_ref(), overlay.parsing.as_ref());
    let (bd, od) = (base.pdf.as_ref(), overlay.pdf.as_ref());
    let (bs, os) = (base.server.as_ref(), overlay.server.as_ref());

    ConfigFile {
        parsing: Some(ParsingSection {
            max_input_mb: pick(op, bp, |p| p.max_input_mb),
            max_lines: pick(op, bp, |p| p.max_lines),
            max_indicator_len: pick(op, bp, |p| p.max_indicator_len),
            foreign_boundaries: pick(op, bp, |p| p.foreign_boundaries),
            extra_header_phrases: pick(op, bp, |p| p.extra_header_phrases.clone()),
            extra_noise_phrases: pick(op, bp, |p| p.extra_noise_phrases.clone()),
        }),
        pdf: Some(PdfSection {
            footer_exclusion: pick(od, bd, |p| p.footer_exclusion),
            header_exclusion: pick(od, bd, |p| p.header_exclusion),
        }),
        server: Some(ServerSection {
            bind: pick(os, bs, |s| s.bind.clone()),
            body_limit_mb: pick(os, bs, |s| s.body_limit_mb),
        }),
    }
}
