use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};

use bom_translator::config::init_default_config;
use bom_translator::glossary::load_glossary_xlsx;
use bom_translator::pipeline::{
    translate_batch, DocumentJob, RunConfig, RunOverrides, TranslateSettings,
};
use bom_translator::progress::RunProgress;

const DUPLICATE_SAMPLE: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "bom-translator")]
#[command(
    about = "Glossary-based CN->EN translator for BOM spreadsheets (.xlsx)",
    long_about = None
)]
struct Args {
    /// Generate a default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write the config file to (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite an existing config file when used with --init-config
    #[arg(long)]
    force: bool,

    /// Input .xlsx files (drag-and-drop supported)
    #[arg(value_name = "XLSX")]
    inputs: Vec<PathBuf>,

    /// Output .xlsx (default: <input_stem>_EN.xlsx; single input only)
    #[arg(short, long, value_name = "XLSX")]
    output: Option<PathBuf>,

    /// QA report .csv (default: <input_stem>_QA_untranslated.csv; single input only)
    #[arg(long, value_name = "CSV")]
    qa: Option<PathBuf>,

    /// Glossary .xlsx (default: "WORD LIST.xlsx" in the current dir or next to the executable)
    #[arg(long, value_name = "XLSX")]
    glossary: Option<PathBuf>,

    /// Glossary sheet name (default: first sheet)
    #[arg(long)]
    glossary_sheet: Option<String>,

    /// Glossary header label of the Chinese column (default: CN)
    #[arg(long)]
    cn_col: Option<String>,

    /// Glossary header label of the English column (default: EN)
    #[arg(long)]
    en_col: Option<String>,

    /// Comma separated sheet names to translate (default: all)
    #[arg(long, value_delimiter = ',')]
    only_sheets: Option<Vec<String>>,

    /// Comma separated column letters to translate, e.g. C,D,F (default: all)
    #[arg(long, value_delimiter = ',')]
    only_columns: Option<Vec<String>>,

    /// Config file path (default: search for bom-translator.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bom_translator=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let progress = RunProgress::new(!args.quiet);

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    if args.inputs.is_empty() {
        let mut cmd = Args::command();
        cmd.print_help().context("print help")?;
        eprintln!(
            "\n\nUSAGE:\n  bom-translator <bom.xlsx> [more.xlsx ...]\n\nTIPS:\n  - Put \"WORD LIST.xlsx\" (columns CN / EN) next to the executable, or pass --glossary.\n  - Default config search: bom-translator.toml (upwards), or set BOM_TRANSLATOR_CONFIG.\n"
        );
        return Ok(ExitCode::SUCCESS);
    }
    if args.inputs.len() > 1 && (args.output.is_some() || args.qa.is_some()) {
        return Err(anyhow::anyhow!(
            "-o/--output and --qa can only be used with a single input"
        ));
    }

    let workdir = args.inputs[0]
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let cfg = RunConfig::from_args(
        &workdir,
        RunOverrides {
            config: args.config,
            glossary: args.glossary,
            glossary_sheet: args.glossary_sheet,
            cn_header: args.cn_col,
            en_header: args.en_col,
            only_sheets: args.only_sheets,
            only_columns: args.only_columns,
        },
    )
    .context("build config")?;
    if let Some(p) = cfg.config_path.as_ref() {
        progress.resolved("Config", p);
    }

    progress.resolved("Glossary", &cfg.glossary_path);
    let loaded = load_glossary_xlsx(&cfg.glossary_path, &cfg.glossary_source)
        .with_context(|| format!("load glossary: {}", cfg.glossary_path.display()))?;
    if !loaded.warnings.is_empty() {
        let sample: Vec<&str> = loaded
            .warnings
            .iter()
            .take(DUPLICATE_SAMPLE)
            .map(|w| w.source_term.as_str())
            .collect();
        tracing::warn!(
            count = loaded.warnings.len(),
            sample = ?sample,
            "duplicate glossary keys; the last row of each wins"
        );
    }
    progress.glossary_loaded(loaded.store.len(), loaded.warnings.len());

    let jobs: Vec<DocumentJob> = args
        .inputs
        .iter()
        .map(|input| DocumentJob {
            input: input.clone(),
            output: args
                .output
                .clone()
                .unwrap_or_else(|| cfg.output_path_for(input)),
            qa: args.qa.clone().unwrap_or_else(|| cfg.qa_path_for(input)),
        })
        .collect();

    let settings = TranslateSettings {
        glossary: &loaded.store,
        walk: &cfg.walk,
        write_empty_qa: cfg.write_empty_qa,
    };
    let summary = translate_batch(&jobs, &settings, &progress);

    println!(
        "Done. {} succeeded, {} failed, {} untranslated cells.",
        summary.succeeded.len(),
        summary.failures.len(),
        summary.qa_rows()
    );
    for doc in &summary.succeeded {
        println!(
            "- {} -> {} ({} translated, {} to review)",
            doc.input.display(),
            doc.output.display(),
            doc.stats.translated(),
            doc.qa_rows
        );
    }
    for (name, message) in &summary.failures {
        println!("- FAILED {name}: {message}");
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
