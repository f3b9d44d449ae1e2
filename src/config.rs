use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "bom-translator.toml";
pub const CONFIG_ENV_VAR: &str = "BOM_TRANSLATOR_CONFIG";
pub const DEFAULT_GLOSSARY_FILE: &str = "WORD LIST.xlsx";
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_EN";
pub const DEFAULT_QA_SUFFIX: &str = "_QA_untranslated";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub glossary: GlossarySection,
    #[serde(default)]
    pub translate: TranslateSection,
    #[serde(default)]
    pub qa: QaSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GlossarySection {
    /// Glossary workbook. Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub path: Option<String>,
    /// Sheet holding the term list (default: first sheet).
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub cn_header: Option<String>,
    #[serde(default)]
    pub en_header: Option<String>,
    /// Optional tie-break column; an empty string disables it.
    #[serde(default)]
    pub priority_header: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TranslateSection {
    #[serde(default)]
    pub only_sheets: Option<Vec<String>>,
    #[serde(default)]
    pub only_columns: Option<Vec<String>>,
    #[serde(default)]
    pub output_suffix: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QaSection {
    #[serde(default)]
    pub suffix: Option<String>,
    /// Write a header-only report when nothing is left untranslated.
    #[serde(default)]
    pub write_empty: Option<bool>,
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn find_default_config(workdir: &Path, filename: &str) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, filename, 8) {
            return Some(p);
        }
    }
    if let Some(p) = find_file_upwards(workdir, filename, 8) {
        return Some(p);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, filename, 10) {
                return Some(p);
            }
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    parse_config(&text).with_context(|| format!("parse config: {}", path.display()))
}

pub fn parse_config(text: &str) -> anyhow::Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(text).context("parse config toml")?;
    Ok(cfg)
}

/// Glossary next to where the tool is run, then next to the executable.
pub fn find_default_glossary() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let candidate = cwd.join(DEFAULT_GLOSSARY_FILE);
    if candidate.exists() {
        return Some(candidate);
    }
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join(DEFAULT_GLOSSARY_FILE);
    candidate.exists().then_some(candidate)
}

pub const DEFAULT_CONFIG_TOML: &str = r#"[glossary]
# Bilingual term list. Relative paths resolve against this file's directory.
path = "WORD LIST.xlsx"
# sheet = "Sheet1"
cn_header = "CN"
en_header = "EN"
# Optional tie-break for terms of equal length (higher wins). Set to "" to ignore.
priority_header = "PRIORITY"

[translate]
# only_sheets = ["BOM"]
# only_columns = ["C", "D"]
output_suffix = "_EN"

[qa]
suffix = "_QA_untranslated"
# When nothing is left untranslated the report is removed; set to true to keep a
# header-only file instead.
write_empty = false
"#;

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILE_NAME);
    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}
