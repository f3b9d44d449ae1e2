use std::path::{Path, PathBuf};

use crate::config::{
    find_default_config, find_default_glossary, load_config, AppConfig, CONFIG_ENV_VAR,
    CONFIG_FILE_NAME, DEFAULT_GLOSSARY_FILE, DEFAULT_OUTPUT_SUFFIX, DEFAULT_QA_SUFFIX,
};
use crate::glossary::GlossarySource;
use crate::pipeline::walker::WalkOptions;

/// Command-line values that win over the config file.
#[derive(Clone, Debug, Default)]
pub struct RunOverrides {
    pub config: Option<PathBuf>,
    pub glossary: Option<PathBuf>,
    pub glossary_sheet: Option<String>,
    pub cn_header: Option<String>,
    pub en_header: Option<String>,
    pub only_sheets: Option<Vec<String>>,
    pub only_columns: Option<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub config_path: Option<PathBuf>,
    pub glossary_path: PathBuf,
    pub glossary_source: GlossarySource,
    pub walk: WalkOptions,
    pub output_suffix: String,
    pub qa_suffix: String,
    pub write_empty_qa: bool,
}

impl RunConfig {
    /// Locate and read the config file (if any), then layer `overrides` on top.
    pub fn from_args(workdir: &Path, overrides: RunOverrides) -> anyhow::Result<Self> {
        let cfg_file = overrides
            .config
            .clone()
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
            .or_else(|| find_default_config(workdir, CONFIG_FILE_NAME));

        let mut file_cfg = AppConfig::default();
        if let Some(p) = cfg_file.as_ref() {
            if p.exists() {
                file_cfg = load_config(p)?;
            } else if overrides.config.is_some() {
                anyhow::bail!("config not found: {}", p.display());
            }
        }
        let cfg_path = cfg_file.filter(|p| p.exists());
        Ok(Self::resolve(cfg_path, file_cfg, overrides))
    }

    pub fn resolve(
        config_path: Option<PathBuf>,
        file_cfg: AppConfig,
        overrides: RunOverrides,
    ) -> Self {
        let cfg_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);

        let glossary_path = overrides
            .glossary
            .or_else(|| {
                file_cfg.glossary.path.as_deref().map(|p| {
                    let p = PathBuf::from(p);
                    match cfg_dir.as_ref() {
                        Some(dir) if p.is_relative() => dir.join(p),
                        _ => p,
                    }
                })
            })
            .or_else(find_default_glossary)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GLOSSARY_FILE));

        let defaults = GlossarySource::default();
        let glossary_source = GlossarySource {
            sheet: overrides
                .glossary_sheet
                .or(file_cfg.glossary.sheet)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            cn_header: overrides
                .cn_header
                .or(file_cfg.glossary.cn_header)
                .unwrap_or(defaults.cn_header),
            en_header: overrides
                .en_header
                .or(file_cfg.glossary.en_header)
                .unwrap_or(defaults.en_header),
            priority_header: match file_cfg.glossary.priority_header {
                Some(h) if h.trim().is_empty() => None,
                Some(h) => Some(h),
                None => defaults.priority_header,
            },
        };

        let only_sheets = overrides.only_sheets.or(file_cfg.translate.only_sheets);
        let only_columns = overrides.only_columns.or(file_cfg.translate.only_columns);
        let walk = WalkOptions::from_lists(only_sheets.as_deref(), only_columns.as_deref());

        Self {
            config_path,
            glossary_path,
            glossary_source,
            walk,
            output_suffix: file_cfg
                .translate
                .output_suffix
                .unwrap_or_else(|| DEFAULT_OUTPUT_SUFFIX.to_string()),
            qa_suffix: file_cfg
                .qa
                .suffix
                .unwrap_or_else(|| DEFAULT_QA_SUFFIX.to_string()),
            write_empty_qa: file_cfg.qa.write_empty.unwrap_or(false),
        }
    }

    /// `<stem><output_suffix>.xlsx` next to the input.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        input.with_file_name(format!("{}{}.xlsx", file_stem(input), self.output_suffix))
    }

    /// `<stem><qa_suffix>.csv` next to the input.
    pub fn qa_path_for(&self, input: &Path) -> PathBuf {
        input.with_file_name(format!("{}{}.csv", file_stem(input), self.qa_suffix))
    }
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn cli_overrides_file_values() {
        let file = parse_config(
            r#"
[glossary]
path = "terms/words.xlsx"
sheet = "Terms"
cn_header = "中文"
priority_header = ""

[translate]
only_columns = ["c"]
output_suffix = "_english"

[qa]
write_empty = true
"#,
        )
        .expect("parse");
        let cfg = RunConfig::resolve(
            Some(PathBuf::from("/work/bom-translator.toml")),
            file,
            RunOverrides {
                en_header: Some("English".into()),
                only_columns: Some(vec!["D,e".into()]),
                ..RunOverrides::default()
            },
        );

        assert_eq!(cfg.glossary_path, PathBuf::from("/work/terms/words.xlsx"));
        assert_eq!(cfg.glossary_source.sheet.as_deref(), Some("Terms"));
        assert_eq!(cfg.glossary_source.cn_header, "中文");
        assert_eq!(cfg.glossary_source.en_header, "English");
        assert_eq!(cfg.glossary_source.priority_header, None);
        let cols: Vec<&str> = cfg
            .walk
            .only_columns
            .as_ref()
            .map(|c| c.iter().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(cols, vec!["D", "E"]);
        assert!(cfg.write_empty_qa);
        assert_eq!(
            cfg.output_path_for(Path::new("/data/BOM 01.xlsx")),
            PathBuf::from("/data/BOM 01_english.xlsx")
        );
    }

    #[test]
    fn defaults_without_config() {
        let cfg = RunConfig::resolve(
            None,
            AppConfig::default(),
            RunOverrides {
                glossary: Some(PathBuf::from("g.xlsx")),
                ..RunOverrides::default()
            },
        );
        assert_eq!(cfg.glossary_path, PathBuf::from("g.xlsx"));
        assert_eq!(cfg.glossary_source.cn_header, "CN");
        assert_eq!(cfg.glossary_source.priority_header.as_deref(), Some("PRIORITY"));
        assert_eq!(cfg.walk, WalkOptions::default());
        assert!(!cfg.write_empty_qa);
        assert_eq!(
            cfg.output_path_for(Path::new("in/bom.xlsx")),
            PathBuf::from("in/bom_EN.xlsx")
        );
        assert_eq!(
            cfg.qa_path_for(Path::new("in/bom.xlsx")),
            PathBuf::from("in/bom_QA_untranslated.csv")
        );
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = RunConfig::from_args(
            dir.path(),
            RunOverrides {
                config: Some(dir.path().join("nope.toml")),
                ..RunOverrides::default()
            },
        );
        assert!(err.is_err());
    }
}
