use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use teamslog::colors::should_use_colors;
use teamslog::config::ReportConfig;
use teamslog::render::renderer_for;
use teamslog::{
    timestamp, ErrorStrategy, EventPipeline, GroupKey, InputFormat, OutputFormat, PipelineConfig,
    Predicate, Query, RecordReader, Report, ReportError, Severity, SortKey, StarlarkTranslator,
    TranslatorRegistry,
};

const DEFAULT_TITLE: &str = "Teams admin event report";

#[derive(Parser)]
#[command(name = "teamslog")]
#[command(about = "Turn Teams admin event log exports into readable reports")]
#[command(version)]
struct Args {
    /// Export files to read (default: stdin)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Input format
    #[arg(short = 'I', long = "input-format", value_enum)]
    input_format: Option<InputFormat>,

    /// Output format
    #[arg(short = 'F', long = "format", value_enum)]
    format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output")]
    output_file: Option<PathBuf>,

    /// Only events for this user (case-insensitive)
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Only events of this type: exact match on the canonical type (Call,
    /// SignIn, ...) or on the literal type written in the export (CallFailed)
    #[arg(short = 't', long = "event-type")]
    event_type: Option<String>,

    /// Only events at or after this time
    #[arg(long, value_parser = parse_time)]
    from: Option<DateTime<Utc>>,

    /// Only events at or before this time
    #[arg(long, value_parser = parse_time)]
    to: Option<DateTime<Utc>>,

    /// Only events within this long before now (e.g. 24h, 7d)
    #[arg(long, value_parser = humantime::parse_duration, conflicts_with = "from")]
    last: Option<Duration>,

    /// Only events at or above this severity
    #[arg(short = 's', long = "min-severity", value_parser = parse_severity)]
    min_severity: Option<Severity>,

    /// Group events by this attribute
    #[arg(short = 'g', long = "group-by", value_enum)]
    group_by: Option<GroupKey>,

    /// Order events by this attribute
    #[arg(long = "sort-by", value_enum)]
    sort_by: Option<SortKey>,

    /// Include raw fields and normalization diagnostics
    #[arg(short = 'v', long)]
    verbose: bool,

    /// YAML config file (default: $TEAMSLOG_CONFIG)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Starlark translator plugin for an event type
    #[arg(long = "translator", value_name = "TYPE=FILE", action = ArgAction::Append)]
    translators: Vec<String>,

    /// Report title
    #[arg(long)]
    title: Option<String>,

    /// Fail on the first malformed input line instead of keeping it
    #[arg(long)]
    fail_fast: bool,

    /// Disable colored text output
    #[arg(long)]
    no_color: bool,

    /// Debug mode - show processing details
    #[arg(long)]
    debug: bool,
}

fn parse_time(text: &str) -> Result<DateTime<Utc>, String> {
    timestamp::parse_str(text).ok_or_else(|| format!("unrecognized timestamp '{}'", text))
}

fn parse_severity(text: &str) -> Result<Severity, String> {
    text.parse()
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "teamslog: {}: {}",
            record.level().as_str().to_lowercase(),
            record.args()
        )
    });
    builder.init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("teamslog: error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn build_registry(config: &ReportConfig, plugins: &[String]) -> anyhow::Result<TranslatorRegistry> {
    let mut registry = TranslatorRegistry::with_builtins();
    config.register_translators(&mut registry)?;

    for plugin in plugins {
        let (event_type, file) = plugin
            .split_once('=')
            .ok_or_else(|| anyhow!("--translator expects TYPE=FILE, got '{}'", plugin))?;
        let translator = StarlarkTranslator::from_file(Path::new(file))
            .map_err(|e| anyhow!("Failed to compile translator '{}': {}", file, e))?;
        registry.register(event_type, translator)?;
    }
    log::debug!("translators: {}", registry.event_types().join(", "));
    Ok(registry)
}

fn run(args: Args) -> anyhow::Result<i32> {
    let config = ReportConfig::discover(args.config.as_deref())?;
    let defaults = &config.defaults;

    let pipeline_config = PipelineConfig {
        error_strategy: if args.fail_fast {
            ErrorStrategy::FailFast
        } else {
            ErrorStrategy::Skip
        },
        verbose: args.verbose || defaults.verbose.unwrap_or(false),
        input_format: args
            .input_format
            .or(defaults.input_format)
            .unwrap_or_default(),
        output_format: args.format.or(defaults.format).unwrap_or_default(),
        group_by: args.group_by.or(defaults.group_by),
        sort_by: args.sort_by.or(defaults.sort_by).unwrap_or_default(),
    };

    let from = match args.last {
        Some(window) => {
            let window = chrono::Duration::from_std(window)
                .map_err(|e| anyhow!("--last is out of range: {}", e))?;
            Some(Utc::now() - window)
        }
        None => args.from,
    };
    let predicate = Predicate {
        user_id: args.user.clone(),
        event_type: args.event_type.clone(),
        from,
        to: args.to,
        min_severity: args.min_severity,
    };
    predicate.validate()?;

    let registry = build_registry(&config, &args.translators)?;
    let pipeline = EventPipeline::new(Arc::new(registry)).with_severity_map(config.severity_map());

    // Read every input before processing so the report covers all files
    let reader = RecordReader::new(pipeline_config.input_format, pipeline_config.error_strategy);
    let mut records = Vec::new();
    let mut parse_errors = 0;
    if args.files.is_empty() {
        let outcome = reader.read(io::stdin().lock(), None)?;
        parse_errors += outcome.parse_errors;
        records.extend(outcome.records);
    } else {
        for path in &args.files {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
            let outcome = reader
                .read(BufReader::new(file), Some(path.as_path()))
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            parse_errors += outcome.parse_errors;
            records.extend(outcome.records);
        }
    }

    let (events, stats) = pipeline.process_all(records);
    log::debug!("{}", stats.summary_line());
    if parse_errors > 0 {
        log::warn!(
            "{} malformed input entries kept as Unknown events",
            parse_errors
        );
    }

    let query = Query {
        predicate,
        sort: pipeline_config.sort_by,
        group_by: pipeline_config.group_by,
    };
    let result = query.run(&events)?;
    let title = args
        .title
        .clone()
        .or_else(|| defaults.title.clone())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let report = Report::new(title, result);

    let colors = !args.no_color && args.output_file.is_none() && should_use_colors();
    let renderer = renderer_for(pipeline_config.output_format, colors);

    let mut output: Box<dyn Write> = if let Some(output_path) = &args.output_file {
        let file = File::create(output_path).with_context(|| {
            format!("Failed to create output file '{}'", output_path.display())
        })?;
        Box::new(io::BufWriter::new(file))
    } else {
        Box::new(io::BufWriter::new(io::stdout()))
    };

    match renderer.render(&report, pipeline_config.verbose, &mut output) {
        Ok(()) => {}
        // Handle broken pipe gracefully
        Err(ReportError::IoError(e)) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(0),
        Err(e) => return Err(e.into()),
    }
    if let Err(e) = output.flush() {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }

    if report.is_empty() {
        log::info!("no events matched");
        Ok(2)
    } else {
        Ok(0)
    }
}
