use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{info, warn};

use crate::cli::{CheckArgs, Cli, Commands, DiffArgs, HashArgs, PipelineArgs, SessionsArgs, VerifyArgs};
use crate::config::Config;
use crate::consts::{
    DEFAULT_EXTENSIONS, DEFAULT_OUTPUT_DIR, DEFAULT_REQUIRED_FIELDS, SPLIT_EXTENSIONS, SPLIT_FIELDS,
};
use crate::error::AppError;
use crate::integrity::{
    DiffOptions, HashStore, check_splits, compute_missing, diff_dirs, remove_invalid, verify,
};
use crate::output::{
    output_diff_json, output_hash_json, output_run_json, output_sessions_json, output_split_issues_csv,
    output_split_json, output_verify_json, print_diff, print_hash_summary, print_run_summary,
    print_sessions_table, print_split_report, print_verify_report,
};
use crate::pipeline::{FfmpegTools, Orchestrator, PipelineOptions, ProcessedLedger};
use crate::session::{Discovery, FieldPath, PathIndex, filter_complete, parse_fields};
use crate::utils::{DateFilter, parse_date, progress_bar};

/// Presentation flags shared by every handler.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ui {
    pub(crate) use_color: bool,
    pub(crate) progress: bool,
}

impl Ui {
    pub(crate) fn from_cli(cli: &Cli) -> Self {
        Self {
            use_color: cli.use_color(),
            progress: cli.show_progress(),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AppError + '_ {
    move |source| AppError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn required_fields(requested: &[String]) -> Result<Vec<FieldPath>, AppError> {
    if requested.is_empty() {
        parse_fields(DEFAULT_REQUIRED_FIELDS)
    } else {
        parse_fields(requested)
    }
}

fn extensions(config: &Config) -> Vec<String> {
    config
        .pipeline
        .extensions
        .clone()
        .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect())
}

fn require_dirs(dirs: &[PathBuf]) -> Result<(), AppError> {
    match dirs.iter().find(|dir| !dir.is_dir()) {
        Some(missing) => Err(AppError::MissingDirectory {
            path: missing.clone(),
        }),
        None => Ok(()),
    }
}

fn log_unaffiliated(discovery: &Discovery) {
    for file in &discovery.unaffiliated {
        warn!(path = %file.path.display(), reason = ?file.reason, "file not attached to any session");
    }
    if discovery.transient > 0 {
        info!(count = discovery.transient, "ignored scratch files with no session");
    }
}

fn handle_pipeline(args: &PipelineArgs, config: &Config, ui: Ui) -> Result<(), AppError> {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    if output_dir.extension().is_some() {
        return Err(AppError::OutputNotDirectory { path: output_dir });
    }
    let required = required_fields(&args.required)?;
    fs::create_dir_all(&output_dir).map_err(io_error(&output_dir))?;

    let scratch = match &args.scratch_parent {
        Some(parent) => tempfile::Builder::new()
            .prefix("r3curate-")
            .tempdir_in(parent)
            .map_err(io_error(parent))?,
        None => tempfile::Builder::new()
            .prefix("r3curate-")
            .tempdir()
            .map_err(io_error(Path::new("temporary directory")))?,
    };
    info!(scratch = %scratch.path().display(), "created scratch directory");

    let discovery = PathIndex::new(args.root_dir.iter().cloned())
        .with_scratch(scratch.path().to_path_buf())
        .extensions(extensions(config))
        .discover();
    log_unaffiliated(&discovery);

    let outcome = filter_complete(&discovery.sessions, &required);
    info!(dropped = outcome.dropped(), "{}", outcome.summary());

    let ledger_path = output_dir.join(crate::consts::LEDGER_FILE);
    let mut ledger =
        ProcessedLedger::open(&output_dir, args.resume).map_err(io_error(&ledger_path))?;

    let tools = FfmpegTools::new(
        config
            .media
            .ffmpeg
            .clone()
            .unwrap_or_else(|| "ffmpeg".to_string()),
        config.media.split_command.clone(),
    );
    let options = PipelineOptions {
        output_dir: output_dir.clone(),
        scratch_dir: scratch.path().to_path_buf(),
        overwrite: args.overwrite,
        reencode: args.reencode,
    };

    let progress = progress_bar(outcome.usable.len() as u64, "sessions", ui.progress);
    let summary = Orchestrator::new(&tools, &options).run(outcome.usable, &mut ledger, &progress);
    progress.finish_and_clear();
    info!(
        recorded = ledger.recorded().len(),
        ledger = %ledger.path().display(),
        "run finished"
    );

    if args.json {
        println!("{}", output_run_json(&summary));
    } else {
        print_run_summary(&summary, &output_dir, ui.use_color);
    }
    Ok(())
}

fn handle_sessions(args: &SessionsArgs, config: &Config, ui: Ui) -> Result<(), AppError> {
    let required = required_fields(&args.required)?;
    let discovery = PathIndex::new(args.root_dir.iter().cloned())
        .extensions(extensions(config))
        .discover();

    if args.json {
        println!(
            "{}",
            output_sessions_json(&discovery.sessions, &required, &discovery.unaffiliated)
        );
    } else {
        print_sessions_table(
            &discovery.sessions,
            &required,
            &discovery.unaffiliated,
            ui.use_color,
        );
    }
    Ok(())
}

fn integrity_inputs(
    hash_file: Option<&PathBuf>,
    video_dirs: &[PathBuf],
) -> Result<PathBuf, AppError> {
    let hash_file = hash_file.cloned().ok_or(AppError::MissingSetting {
        what: "hash file (--hash-file)",
    })?;
    if video_dirs.is_empty() {
        return Err(AppError::MissingSetting {
            what: "video directory (--video-dir)",
        });
    }
    require_dirs(video_dirs)?;
    Ok(hash_file)
}

fn handle_hash(args: &HashArgs, ui: Ui) -> Result<(), AppError> {
    let hash_file = integrity_inputs(args.hash_file.as_ref(), &args.video_dir)?;
    let mut store = HashStore::open(&hash_file)?;

    let progress = progress_bar(0, "videos", ui.progress);
    let summary = compute_missing(&mut store, &args.video_dir, &progress)?;
    progress.finish_and_clear();

    if args.json {
        println!("{}", output_hash_json(&summary, store.len()));
    } else {
        print_hash_summary(&summary, &hash_file, store.len());
    }
    Ok(())
}

/// Returns whether every tracked video matched.
fn handle_verify(args: &VerifyArgs, ui: Ui) -> Result<bool, AppError> {
    let hash_file = integrity_inputs(args.hash_file.as_ref(), &args.video_dir)?;

    let progress = progress_bar(0, "videos", ui.progress);
    let report = verify(&hash_file, &args.video_dir, &progress)?;
    progress.finish_and_clear();

    if args.json {
        println!("{}", output_verify_json(&report));
    } else {
        print_verify_report(&report, ui.use_color);
    }
    Ok(report.is_intact())
}

fn handle_diff(args: &DiffArgs, ui: Ui) -> Result<(), AppError> {
    let left = args.left.as_ref().ok_or(AppError::MissingSetting {
        what: "left directory",
    })?;
    let right = args.right.as_ref().ok_or(AppError::MissingSetting {
        what: "right directory",
    })?;
    let since = args.since.as_deref().map(parse_date).transpose()?;
    let until = args.until.as_deref().map(parse_date).transpose()?;

    let options = DiffOptions {
        extension: args.ext.clone(),
        dates: DateFilter::new(since, until),
        recursive: args.recursive,
    };
    let diff = diff_dirs(left, right, &options)?;

    if args.json {
        println!("{}", output_diff_json(&diff));
    } else {
        print_diff(&diff, left, right, ui.use_color);
    }
    Ok(())
}

/// Returns whether every checked session had consistent splits.
fn handle_check(args: &CheckArgs, ui: Ui) -> Result<bool, AppError> {
    let required = parse_fields(SPLIT_FIELDS)?;
    let discovery = PathIndex::new(args.root_dir.iter().cloned())
        .extensions(SPLIT_EXTENSIONS)
        .discover();
    log_unaffiliated(&discovery);
    info!(sessions = discovery.sessions.len(), "discovered sessions");

    let outcome = filter_complete(&discovery.sessions, &required);
    info!(dropped = outcome.dropped(), "{}", outcome.summary());

    let progress = progress_bar(outcome.usable.len() as u64, "sessions", ui.progress);
    let report = check_splits(&outcome.usable, &progress);
    progress.finish_and_clear();

    if let Some(path) = &args.output {
        fs::write(path, output_split_issues_csv(&report.issues)).map_err(io_error(path))?;
        info!(path = %path.display(), issues = report.issues.len(), "wrote issues");
    }
    let removed = if args.clean {
        remove_invalid(&outcome.usable, &report)?
    } else {
        Vec::new()
    };

    if args.json {
        println!("{}", output_split_json(&report, &removed));
    } else {
        print_split_report(&report, &removed, ui.use_color);
    }
    Ok(report.is_consistent())
}

/// Dispatch the parsed command. Errors are preconditions; an integrity
/// mismatch or split inconsistency is reported through the exit code instead.
pub(crate) fn run(cli: &Cli, config: &Config) -> Result<ExitCode, AppError> {
    let ui = Ui::from_cli(cli);
    match &cli.command {
        Commands::Pipeline(args) => handle_pipeline(args, config, ui)?,
        Commands::Sessions(args) => handle_sessions(args, config, ui)?,
        Commands::Hash(args) => handle_hash(args, ui)?,
        Commands::Verify(args) => {
            if !handle_verify(args, ui)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Diff(args) => handle_diff(args, ui)?,
        Commands::Check(args) => {
            if !handle_check(args, ui)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
