use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use genrun_core::{RunNotice, RunStats, StopReason, WildcardExpander};
use genrun_engine::{
    Attachment, Command, HeuristicAdapter, Page, RunEvent, RunnerHandle, SimulatedPage,
};
use genrun_logging::{run_info, run_warn};

use crate::cli::RunArgs;
use crate::config::FileConfig;

const DEFAULT_LATENCY_MS: u64 = 2_000;

pub fn execute(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let prompts = collect_prompts(&args)?;
    if prompts.is_empty() {
        bail!("no prompts given; use --prompt, --prompts-file or --template");
    }

    let latency = Duration::from_millis(
        args.latency_ms
            .or(config.simulated_latency_ms)
            .unwrap_or(DEFAULT_LATENCY_MS),
    );
    let sim = SimulatedPage::demo(latency);
    if args.no_complete {
        sim.set_auto_complete(None);
    }
    let page = Page::new(
        Arc::new(sim.clone()),
        Arc::new(HeuristicAdapter::new(config.match_settings())),
    );
    let persistence = config.persist_attachments || !args.attachments.is_empty();
    let mut runner = RunnerHandle::new(config.run_settings(), page, persistence)
        .context("failed to start the run controller")?;

    for path in &args.attachments {
        let attachment = load_attachment(path)?;
        let index = runner.attachments().append(attachment);
        run_info!("attachment {} loaded from {:?}", index, path);
    }

    runner.send(Command::Start {
        prompts,
        looping: args.looping,
    });

    let mut stats = RunStats::default();
    let mut stop_sent = false;
    let mut reason = None;
    while let Some(event) = runner.blocking_recv() {
        let RunEvent::Notice(notice) = event else {
            continue;
        };
        print_notice(&notice);
        match notice {
            RunNotice::Submitted { .. } => stats.submitted += 1,
            RunNotice::Completed { .. } => stats.completed += 1,
            RunNotice::Stalled { .. } => stats.stalled += 1,
            RunNotice::Refilled { .. } => stats.refills += 1,
            RunNotice::StartRejected { reason } => bail!("start rejected: {reason}"),
            RunNotice::Stopped { reason: stopped } => {
                reason = Some(stopped);
                break;
            }
            RunNotice::Started { .. } => {}
        }
        if let Some(limit) = args.max_submissions {
            if !stop_sent && stats.submitted >= limit {
                run_info!("submission limit {} reached; stopping", limit);
                runner.send(Command::Stop);
                stop_sent = true;
            }
        }
    }
    runner.shutdown();

    println!(
        "submitted {} / completed {} / stalled {} / refills {}",
        stats.submitted, stats.completed, stats.stalled, stats.refills
    );
    match reason {
        Some(reason) if reason.is_fatal() => bail!("run stopped: {reason}"),
        Some(_) => Ok(()),
        None => bail!("run controller exited without reporting a stop"),
    }
}

fn collect_prompts(args: &RunArgs) -> Result<Vec<String>> {
    let mut prompts = args.prompts.clone();
    if let Some(path) = &args.prompts_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read prompts from {path:?}"))?;
        prompts.extend(parse_prompt_lines(&text));
    }
    if let Some(template) = &args.template {
        let mut expander = match args.seed {
            Some(seed) => WildcardExpander::with_seed(seed),
            None => WildcardExpander::new(),
        };
        let generated = expander.generate_prompts(template, args.count);
        if generated.len() < args.count {
            run_warn!(
                "template yielded {} distinct prompts of {} requested",
                generated.len(),
                args.count
            );
        }
        prompts.extend(generated);
    }
    Ok(prompts)
}

fn parse_prompt_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

fn load_attachment(path: &Path) -> Result<Attachment> {
    let bytes = fs::read(path).with_context(|| format!("failed to read attachment {path:?}"))?;
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => bail!("{path:?} is not a supported image (png, jpg, webp, gif)"),
    };
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok(Attachment::new(name, mime, bytes))
}

fn print_notice(notice: &RunNotice) {
    let now = Local::now().format("%H:%M:%S");
    let line = match notice {
        RunNotice::Started { prompts, looping } => {
            format!("started: {prompts} prompts{}", if *looping { ", looping" } else { "" })
        }
        RunNotice::StartRejected { reason } => format!("start rejected: {reason}"),
        RunNotice::Submitted { submission_id } => format!("{submission_id} submitted"),
        RunNotice::Completed { submission_id } => format!("{submission_id} completed"),
        RunNotice::Stalled { submission_id } => format!("{submission_id} stalled"),
        RunNotice::Refilled { prompts } => format!("queue refilled with {prompts} prompts"),
        RunNotice::Stopped { reason: StopReason::Drained } => "finished: queue drained".to_string(),
        RunNotice::Stopped { reason } => format!("stopped: {reason}"),
    };
    println!("{now} {line}");
}
