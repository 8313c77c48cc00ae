//! Check Mate CLI
//!
//! The `checkmate` command grades a student submission against a list of
//! teacher-defined requirements.
//!
//! ## Commands
//!
//! - `evaluate`: Grade a submission and export the checklist report
//! - `prompt`: Print the exact prompt that would be sent to the model
//! - `correct`: Ask the model for the fully corrected text
//! - `extract`: Print the text extracted from a `.txt`/`.pdf`/`.docx`/image file

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Level};

use checkmate_core::metrics::METRICS;
use checkmate_core::{
    apply_suggestion, build_evaluation_prompt, render_report_md, render_report_text,
    requirement_lines_from_file, requirements_from_lines, submission_from_file,
    write_report_json, CachedGateway, Evaluator, GatewayConfig, OpenAiGateway, ReportArtifact,
    Requirement, RunContext, RunOutcome, Strictness,
};
use checkmate_extract::{TesseractCli, TextExtractor};

#[derive(Parser)]
#[command(name = "checkmate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Requirement checklist grading for student submissions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a submission against the requirements
    Evaluate {
        #[command(flatten)]
        requirements: RequirementArgs,

        #[command(flatten)]
        submission: SubmissionArgs,

        #[command(flatten)]
        ocr: OcrArgs,

        #[command(flatten)]
        gateway: GatewayArgs,

        /// Rubric severity: 1 lenient, 2 normal, 3 strict
        #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=3))]
        strictness: u8,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Md)]
        format: ReportFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the model and use the rule-based evaluator only
        #[arg(long)]
        offline: bool,

        /// Apply the suggestion for this requirement index to the submission
        #[arg(long = "apply", value_name = "INDEX")]
        apply: Vec<u32>,

        /// Write the revised submission here (stdout when omitted)
        #[arg(long, requires = "apply")]
        revised_output: Option<PathBuf>,

        /// Print the raw model response to stderr
        #[arg(long)]
        show_raw: bool,
    },

    /// Print the evaluation prompt without calling the model
    Prompt {
        #[command(flatten)]
        requirements: RequirementArgs,

        #[command(flatten)]
        submission: SubmissionArgs,

        #[command(flatten)]
        ocr: OcrArgs,

        /// Rubric severity: 1 lenient, 2 normal, 3 strict
        #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=3))]
        strictness: u8,
    },

    /// Ask the model to rewrite the submission with every correction applied
    Correct {
        #[command(flatten)]
        requirements: RequirementArgs,

        #[command(flatten)]
        submission: SubmissionArgs,

        #[command(flatten)]
        ocr: OcrArgs,

        #[command(flatten)]
        gateway: GatewayArgs,

        /// Write the corrected text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract plain text from a submission file
    Extract {
        /// File to read (.txt, .pdf, .docx, .png, .jpg, .jpeg)
        path: PathBuf,

        #[command(flatten)]
        ocr: OcrArgs,

        /// Write the text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = true)]
struct RequirementArgs {
    /// File with one requirement per line
    #[arg(short = 'R', long)]
    requirements_file: Option<PathBuf>,

    /// A single requirement (repeatable, appended after the file's lines)
    #[arg(short = 'r', long = "requirement")]
    requirement: Vec<String>,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
struct SubmissionArgs {
    /// Submission file (.txt, .pdf, .docx or image)
    #[arg(long)]
    submission: Option<PathBuf>,

    /// Submission text given inline
    #[arg(long)]
    text: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct OcrArgs {
    /// Tesseract binary used for image submissions
    #[arg(long, default_value = "tesseract")]
    tesseract: String,

    /// Tesseract language list
    #[arg(long, default_value = "kor+eng")]
    ocr_lang: String,
}

/// Flags layered over what `GatewayConfig::from_env` read from the
/// `CHECKMATE_*` variables; malformed variables are ignored there.
#[derive(Args, Debug, Clone, Default)]
struct GatewayArgs {
    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible endpoint root
    #[arg(long)]
    base_url: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum output tokens
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Extra attempts after a retryable failure
    #[arg(long)]
    retries: Option<u32>,

    /// Cached responses kept in memory (0 disables)
    #[arg(long)]
    cache_capacity: Option<usize>,
}

impl GatewayArgs {
    fn apply(&self, mut config: GatewayConfig) -> GatewayConfig {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(t) = self.temperature {
            config = config.with_temperature(t);
        }
        if let Some(n) = self.max_tokens {
            config = config.with_max_output_tokens(n);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(n) = self.retries {
            config = config.with_retries(n);
        }
        if let Some(n) = self.cache_capacity {
            config = config.with_cache_capacity(n);
        }
        config
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Md,
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    checkmate_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Evaluate {
            requirements,
            submission,
            ocr,
            gateway,
            strictness,
            format,
            output,
            offline,
            apply,
            revised_output,
            show_raw,
        } => {
            let evaluator = build_evaluator(offline, &gateway)?;
            let ctx = build_context(&requirements, &submission, &ocr, strictness)?;
            let opts = EvaluateOptions {
                format,
                output,
                apply,
                revised_output,
                show_raw,
            };
            cmd_evaluate(&evaluator, &ctx, &opts).await
        }
        Commands::Prompt {
            requirements,
            submission,
            ocr,
            strictness,
        } => cmd_prompt(&requirements, &submission, &ocr, strictness),
        Commands::Correct {
            requirements,
            submission,
            ocr,
            gateway,
            output,
        } => {
            let evaluator = build_evaluator(false, &gateway)?;
            let ctx = build_context(&requirements, &submission, &ocr, 2)?;
            cmd_correct(&evaluator, &ctx, output.as_deref()).await
        }
        Commands::Extract { path, ocr, output } => cmd_extract(&path, &ocr, output.as_deref()),
    };

    METRICS.flush();
    result
}

/// Gateway-backed evaluator, or the offline one. A missing API key is fatal
/// unless `offline` is set.
fn build_evaluator(offline: bool, args: &GatewayArgs) -> Result<Evaluator> {
    if offline {
        info!("offline mode: using the rule-based evaluator only");
        return Ok(Evaluator::offline());
    }
    let config = GatewayConfig::from_env()
        .context("model gateway needs OPENAI_API_KEY (or pass --offline)")?;
    let config = args.apply(config);
    debug!(?config, "gateway configured");

    let capacity = config.cache_capacity;
    let gateway = OpenAiGateway::new(config).context("Failed to create HTTP client")?;
    Ok(Evaluator::new(Arc::new(CachedGateway::new(gateway, capacity))))
}

fn build_extractor(ocr: &OcrArgs) -> TextExtractor {
    let engine = TesseractCli::new(&ocr.tesseract, &ocr.ocr_lang);
    if engine.is_available() {
        TextExtractor::new().with_ocr(Box::new(engine))
    } else {
        debug!(binary = %ocr.tesseract, "OCR engine not available");
        TextExtractor::new()
    }
}

fn load_requirements(args: &RequirementArgs) -> Result<Vec<Requirement>> {
    let mut lines = Vec::new();
    if let Some(path) = &args.requirements_file {
        lines.extend(
            requirement_lines_from_file(path).with_context(|| format!("read {:?}", path))?,
        );
    }
    lines.extend(args.requirement.iter().cloned());
    Ok(requirements_from_lines(lines))
}

fn load_submission(args: &SubmissionArgs, ocr: &OcrArgs) -> Result<String> {
    match (&args.text, &args.submission) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => submission_from_file(&build_extractor(ocr), path)
            .with_context(|| format!("extract text from {:?}", path)),
        (None, None) => bail!("either --submission or --text is required"),
    }
}

fn build_context(
    requirements: &RequirementArgs,
    submission: &SubmissionArgs,
    ocr: &OcrArgs,
    strictness: u8,
) -> Result<RunContext> {
    let requirements = load_requirements(requirements)?;
    let submission = load_submission(submission, ocr)?;
    let strictness = Strictness::try_from(strictness)?;
    Ok(RunContext::from_requirements(requirements, submission, strictness)?)
}

fn emit(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{content}"),
    }
    Ok(())
}

struct EvaluateOptions {
    format: ReportFormat,
    output: Option<PathBuf>,
    apply: Vec<u32>,
    revised_output: Option<PathBuf>,
    show_raw: bool,
}

async fn cmd_evaluate(evaluator: &Evaluator, ctx: &RunContext, opts: &EvaluateOptions) -> Result<()> {
    let outcome = evaluator.evaluate(ctx).await?;

    if let Some(cause) = &outcome.fallback {
        if !evaluator.is_offline() {
            warn!(stage = %cause.stage, "model evaluation failed: {}", cause.message);
        }
    }
    if opts.show_raw {
        match &outcome.raw_response {
            Some(raw) => eprintln!("--- raw model response ---\n{raw}\n---"),
            None => eprintln!("(no model response)"),
        }
    }

    let artifact = ReportArtifact::from_outcome(&outcome);
    match (opts.format, &opts.output) {
        (ReportFormat::Json, Some(path)) => {
            write_report_json(path, &artifact)?;
            info!("Wrote {:?}", path);
        }
        (ReportFormat::Json, None) => {
            let content =
                serde_json::to_string_pretty(&artifact).context("serialize report artifact")?;
            println!("{content}");
        }
        (ReportFormat::Md, output) => emit(output.as_deref(), &render_report_md(&artifact))?,
        (ReportFormat::Text, output) => emit(output.as_deref(), &render_report_text(&artifact))?,
    }

    if !opts.apply.is_empty() {
        let revised = revise(&outcome, &ctx.submission, &opts.apply)?;
        emit(opts.revised_output.as_deref(), &revised)?;
    }
    Ok(())
}

/// Apply the suggestions for `indices`, in the given order.
fn revise(outcome: &RunOutcome, submission: &str, indices: &[u32]) -> Result<String> {
    let mut text = submission.to_string();
    for &index in indices {
        let Some(result) = outcome.report.result_for(index) else {
            bail!("no requirement with index {index}");
        };
        if result.suggestion.trim().is_empty() {
            warn!(index, "requirement has no suggestion to apply");
        }
        text = apply_suggestion(&text, index, &result.suggestion);
    }
    Ok(text)
}

fn cmd_prompt(
    requirements: &RequirementArgs,
    submission: &SubmissionArgs,
    ocr: &OcrArgs,
    strictness: u8,
) -> Result<()> {
    let requirements = load_requirements(requirements)?;
    let submission = load_submission(submission, ocr)?;
    let prompt =
        build_evaluation_prompt(&requirements, &submission, Strictness::try_from(strictness)?)?;
    println!("{prompt}");
    Ok(())
}

async fn cmd_correct(evaluator: &Evaluator, ctx: &RunContext, output: Option<&Path>) -> Result<()> {
    let corrected = evaluator
        .correct(ctx)
        .await
        .context("correction request failed")?;
    emit(output, &corrected)
}

fn cmd_extract(path: &Path, ocr: &OcrArgs, output: Option<&Path>) -> Result<()> {
    let text = submission_from_file(&build_extractor(ocr), path)
        .with_context(|| format!("extract text from {:?}", path))?;
    emit(output, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkmate_core::{CheckmateError, ReportSource, VerdictStatus};

    fn offline_opts(format: ReportFormat, output: PathBuf) -> EvaluateOptions {
        EvaluateOptions {
            format,
            output: Some(output),
            apply: Vec::new(),
            revised_output: None,
            show_raw: false,
        }
    }

    #[test]
    fn test_cli_parses_evaluate() {
        let cli = Cli::try_parse_from([
            "checkmate",
            "evaluate",
            "-r",
            "제목 포함",
            "-r",
            "800~1200자",
            "--text",
            "본문",
            "--strictness",
            "3",
            "--format",
            "json",
            "--offline",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate {
                requirements,
                strictness,
                format,
                offline,
                ..
            } => {
                assert_eq!(requirements.requirement.len(), 2);
                assert_eq!(strictness, 3);
                assert_eq!(format, ReportFormat::Json);
                assert!(offline);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_strictness() {
        assert!(Cli::try_parse_from([
            "checkmate", "evaluate", "-r", "x", "--text", "y", "--strictness", "4",
        ])
        .is_err());
    }

    #[test]
    fn test_cli_requires_exactly_one_submission_source() {
        assert!(Cli::try_parse_from(["checkmate", "evaluate", "-r", "x"]).is_err());
        assert!(Cli::try_parse_from([
            "checkmate", "evaluate", "-r", "x", "--text", "y", "--submission", "a.txt",
        ])
        .is_err());
    }

    #[test]
    fn test_gateway_args_override_config() {
        let args = GatewayArgs {
            model: Some("gpt-4o".to_string()),
            timeout_secs: Some(5),
            cache_capacity: Some(0),
            ..GatewayArgs::default()
        };
        let config = args.apply(GatewayConfig::new("sk-test"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.cache_capacity, 0);
        assert_eq!(config.max_output_tokens, 1400);
    }

    #[test]
    fn test_malformed_env_knob_does_not_block_parsing() {
        std::env::set_var("CHECKMATE_TEMPERATURE", "warm");
        let cli = Cli::try_parse_from([
            "checkmate", "evaluate", "-r", "x", "--text", "y", "--offline",
        ]);
        std::env::remove_var("CHECKMATE_TEMPERATURE");

        match cli.unwrap().command {
            Commands::Evaluate { gateway, .. } => assert!(gateway.temperature.is_none()),
            _ => panic!("expected evaluate"),
        }

        let config = GatewayConfig::from_vars(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "CHECKMATE_TEMPERATURE" => Some("warm".to_string()),
            _ => None,
        })
        .unwrap();
        let config = GatewayArgs {
            temperature: Some(0.7),
            ..GatewayArgs::default()
        }
        .apply(config);
        assert_eq!(config.temperature, 0.7);
    }

    #[test]
    fn test_requirements_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reqs.txt");
        std::fs::write(&path, "제목 포함\n\n  환경 문제 \n").unwrap();
        let args = RequirementArgs {
            requirements_file: Some(path),
            requirement: vec!["맞춤법".to_string()],
        };
        let reqs = load_requirements(&args).unwrap();
        let texts: Vec<_> = reqs.iter().map(|r| (r.index, r.text.as_str())).collect();
        assert_eq!(texts, vec![(1, "제목 포함"), (2, "환경 문제"), (3, "맞춤법")]);
    }

    #[test]
    fn test_submission_from_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essay.txt");
        std::fs::write(&path, "학생의 글").unwrap();
        let args = SubmissionArgs {
            submission: Some(path),
            text: None,
        };
        let ocr = OcrArgs {
            tesseract: "checkmate-no-such-binary".to_string(),
            ocr_lang: "kor+eng".to_string(),
        };
        assert_eq!(load_submission(&args, &ocr).unwrap(), "학생의 글");
    }

    #[tokio::test]
    async fn test_offline_evaluate_writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let ctx = RunContext::new("제목 포함\n환경", "환경 보호\n본문", Strictness::Normal).unwrap();

        cmd_evaluate(
            &Evaluator::offline(),
            &ctx,
            &offline_opts(ReportFormat::Json, output.clone()),
        )
        .await
        .unwrap();

        let artifact: ReportArtifact =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(artifact.source, ReportSource::HeuristicFallback);
        assert_eq!(artifact.score, 100);
        assert_eq!(artifact.overall, VerdictStatus::Satisfied);
        assert_eq!(artifact.run_id, ctx.run_id);
        assert!(artifact.fallback.is_some());
    }

    #[tokio::test]
    async fn test_offline_evaluate_applies_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.md");
        let revised = dir.path().join("revised.txt");
        let ctx = RunContext::new("광합성 설명", "오늘의 일기", Strictness::Normal).unwrap();
        let opts = EvaluateOptions {
            apply: vec![1],
            revised_output: Some(revised.clone()),
            ..offline_opts(ReportFormat::Md, report.clone())
        };

        cmd_evaluate(&Evaluator::offline(), &ctx, &opts).await.unwrap();

        let md = std::fs::read_to_string(&report).unwrap();
        assert!(md.contains("### 1. ❌ 광합성 설명"));
        let text = std::fs::read_to_string(&revised).unwrap();
        assert!(text.starts_with("오늘의 일기\n\n/* 수정(조건 1) */\n"));
    }

    #[tokio::test]
    async fn test_revise_rejects_unknown_index() {
        let ctx = RunContext::new("환경", "환경", Strictness::Normal).unwrap();
        let outcome = Evaluator::offline().evaluate(&ctx).await.unwrap();
        assert!(revise(&outcome, &ctx.submission, &[7]).is_err());
    }

    #[test]
    fn test_extract_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pptx");
        std::fs::write(&path, b"PK").unwrap();
        let ocr = OcrArgs {
            tesseract: "checkmate-no-such-binary".to_string(),
            ocr_lang: "kor+eng".to_string(),
        };
        let err = cmd_extract(&path, &ocr, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckmateError>(),
            Some(CheckmateError::Extraction(_))
        ));
    }
}
