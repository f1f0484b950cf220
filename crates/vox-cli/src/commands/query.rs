//! Query command - ingest local files in-process, then ask one question.

use super::{build_services, format_size, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::warn;
use vox_core::{Document, JobStage, MediaKind};
use vox_ingest::{AskMode, IngestPipeline};
use walkdir::WalkDir;

/// Run the query command.
pub fn run(paths: &[PathBuf], question: &str, mode: &str, top_k: Option<usize>) -> Result<()> {
    let mode = AskMode::from_str(mode)
        .with_context(|| format!("Unknown mode '{}'. Use auto, qa or summary.", mode))?;
    if top_k == Some(0) {
        anyhow::bail!("--top-k must be at least 1");
    }

    let config = load_config()?;
    let files = collect_files(paths);
    if files.is_empty() {
        anyhow::bail!("No supported files found. Supported: pdf, txt, md, mp3, wav, m4a, mp4, mov, mkv...");
    }

    let (pipeline, answers) = build_services(&config)?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(ingest_files(&pipeline, &files))?;
    if pipeline.index().is_empty() {
        anyhow::bail!("Nothing was indexed, so there is nothing to ask about.");
    }

    println!();
    println!("{} {}", "Question:".cyan().bold(), question);
    println!("{}", "─".repeat(70));

    let response = rt
        .block_on(answers.ask(question, mode, top_k))
        .context("Failed to retrieve context")?;

    println!();
    match (&response.answer, &response.degraded_reason) {
        (Some(answer), _) => println!("{}", answer),
        (None, Some(reason)) => println!("{} {}", "No answer:".yellow().bold(), reason),
        (None, None) => println!("{}", "No answer.".yellow()),
    }

    if !response.retrieved_chunks.is_empty() {
        println!();
        println!(
            "{} ({} mode)",
            "Sources".white().bold(),
            response.mode.to_string().dimmed()
        );
        for (i, hit) in response.retrieved_chunks.iter().enumerate() {
            let source = pipeline
                .documents()
                .get(&hit.chunk.document_id)
                .map(|d| d.filename)
                .unwrap_or_else(|| hit.chunk.document_id.clone());
            println!(
                "  [{}] {} {}",
                i + 1,
                source.cyan(),
                format!("({:.3})", hit.score).dimmed()
            );
            println!("      {}", snippet(&hit.chunk.text, 100).dimmed());
        }
    }

    Ok(())
}

/// Expand directories and keep files with a known media kind.
fn collect_files(paths: &[PathBuf]) -> Vec<(PathBuf, MediaKind)> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if let Some(kind) = kind_of(entry.path()) {
                    files.push((entry.path().to_path_buf(), kind));
                }
            }
        } else if let Some(kind) = kind_of(path) {
            files.push((path.clone(), kind));
        } else {
            warn!("Skipping unsupported file {:?}", path);
        }
    }

    files
}

fn kind_of(path: &Path) -> Option<MediaKind> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(MediaKind::from_filename)
}

async fn ingest_files(pipeline: &IngestPipeline, files: &[(PathBuf, MediaKind)]) -> Result<()> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );

    for (path, kind) in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        pb.set_message(filename.clone());

        let payload =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let size = payload.len();
        let job = pipeline.ingest(Document::new(&filename, *kind, payload)).await;

        match (job.stage, job.failure) {
            (JobStage::Ready, _) => pb.println(format!(
                "  {} {} ({})",
                "✓".green(),
                filename,
                format_size(size)
            )),
            (_, Some(failure)) => pb.println(format!(
                "  {} {}: {}",
                "✗".red(),
                filename,
                failure.message
            )),
            (stage, None) => pb.println(format!("  {} {}: {}", "?".yellow(), filename, stage)),
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &flat[..end]),
        None => flat,
    }
}
