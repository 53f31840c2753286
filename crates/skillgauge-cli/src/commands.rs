//! Subcommand implementations
//!
//! Argument handling, output formatting, and exit status only; every
//! decision about scores, risk, and ranking lives in the engine.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use skillgauge_cache::CacheStore;
use skillgauge_engine::{
    build_document, evaluate_all, generate, recommend, BatchAnalysis, BatchOptions, BatchOutcome,
    Candidate, DimensionScorer, Rubric, SecurityScanner,
};
use skillgauge_provider::ProviderService;
use skillgauge_types::{ScoreResult, SkillDocument, TechProfile};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::report;
use crate::{Cli, Command};

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let service = ProviderService::new(config.endpoint());

    match cli.command {
        Command::Evaluate { path, output } => {
            cmd_evaluate(&service, &config, &path, cli.json, output.as_deref()).await
        }
        Command::SecurityScan { path, output } => {
            cmd_security_scan(&service, &config, &path, cli.json, output.as_deref()).await
        }
        Command::Recommend {
            stack,
            project_type,
            notes,
            show_skip,
            min_quality,
            output,
        } => {
            let profile = TechProfile::new(stack, project_type, notes);
            cmd_recommend(
                &service,
                &config,
                profile,
                show_skip,
                min_quality,
                cli.json,
                output.as_deref(),
            )
            .await
        }
        Command::Generate {
            topic,
            stack,
            notes,
            output,
            evaluate,
        } => {
            cmd_generate(&service, &topic, &stack, &notes, evaluate, cli.json, output.as_deref())
                .await
        }
        Command::BatchEvaluate {
            dir,
            limit,
            force,
            concurrency,
        } => cmd_batch_evaluate(&service, &config, &dir, limit, force, concurrency, cli.json).await,
    }
}

/// Read a skill file and build its normalized document; the file stem is the
/// identity key.
fn document_from_path(path: &Path) -> Result<SkillDocument> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let key = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("skill")
        .to_string();
    Ok(build_document(key, content))
}

fn write_output(output: Option<&Path>, rendered: &str) -> Result<()> {
    if let Some(path) = output {
        fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("report saved to {}", path.display());
    }
    Ok(())
}

async fn cmd_evaluate(
    service: &ProviderService,
    config: &Config,
    path: &Path,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let document = document_from_path(path)?;
    info!("evaluating {}", document.key);

    let scorer = DimensionScorer::new(service)?;
    let result = scorer.score(&document).await?;

    // Best effort: a cache outage must not discard a finished evaluation.
    match CacheStore::new(&config.database.path).await {
        Ok(cache) => {
            if let Err(e) = cache.save_document(&document).await {
                warn!("could not cache document: {e}");
            }
            if let Err(e) = cache.save_score(&result).await {
                warn!("could not cache evaluation: {e}");
            }
        }
        Err(e) => warn!("cache unavailable, evaluation not stored: {e}"),
    }

    let rendered = if json {
        serde_json::to_string_pretty(&result)?
    } else {
        report::render_evaluation(document.display_name(), scorer.rubric(), &result)
    };
    println!("{rendered}");
    write_output(output, &rendered)
}

async fn cmd_security_scan(
    service: &ProviderService,
    config: &Config,
    path: &Path,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let document = document_from_path(path)?;
    info!("scanning {}", document.key);

    let scanner = SecurityScanner::new(service);
    let scan = scanner.scan(&document).await?;

    match CacheStore::new(&config.database.path).await {
        Ok(cache) => {
            if let Err(e) = cache.save_scan(&scan).await {
                warn!("could not cache scan: {e}");
            }
        }
        Err(e) => warn!("cache unavailable, scan not stored: {e}"),
    }

    let rendered = if json {
        serde_json::to_string_pretty(&scan)?
    } else {
        report::render_scan(document.display_name(), &scan)
    };
    println!("{rendered}");
    write_output(output, &rendered)
}

async fn cmd_recommend(
    service: &ProviderService,
    config: &Config,
    profile: TechProfile,
    show_skip: bool,
    min_quality: Option<f64>,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let cache = CacheStore::new(&config.database.path).await?;
    let scores = cache.load_scores().await?;
    if scores.is_empty() {
        bail!(
            "no cached evaluations in {}; run `skillgauge batch-evaluate <dir>` first",
            config.database.path
        );
    }

    let mut candidates = Vec::with_capacity(scores.len());
    for score in &scores {
        let title = cache
            .load_document(&score.doc_key)
            .await?
            .and_then(|doc| doc.title);
        candidates.push(Candidate::from_score(score, title.as_deref()));
    }

    info!(
        candidates = candidates.len(),
        "matching cached evaluations against the profile"
    );
    let floor = min_quality.unwrap_or(config.evaluation.min_quality);
    let ranked = recommend(service, &profile, candidates, floor).await?;

    let rendered = if json {
        serde_json::to_string_pretty(&ranked)?
    } else {
        report::render_recommendations(&profile, &ranked, show_skip)
    };
    println!("{rendered}");
    write_output(output, &rendered)
}

async fn cmd_generate(
    service: &ProviderService,
    topic: &str,
    stack: &str,
    notes: &str,
    evaluate: bool,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    info!("generating skill document for '{topic}'");
    let content = generate(service, topic, stack, notes).await?;

    let evaluation = if evaluate {
        let document = build_document(topic, content.clone());
        info!("evaluating the generated document");
        let scorer = DimensionScorer::new(service)?;
        Some((scorer.score(&document).await?, document))
    } else {
        None
    };

    if json {
        let evaluation = evaluation.as_ref().map(|(result, _)| result);
        let payload = serde_json::json!({
            "topic": topic,
            "content": content,
            "evaluation": evaluation,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{content}");
        if let Some((result, document)) = &evaluation {
            let rubric = Rubric::standard()?;
            println!();
            println!(
                "{}",
                report::render_evaluation(document.display_name(), &rubric, result)
            );
        }
    }

    write_output(output, &content)
}

/// Top-level `.md` files in the directory, sorted by name.
fn collect_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("md")
        })
        .collect();
    files.sort();
    Ok(files)
}

async fn cmd_batch_evaluate(
    service: &ProviderService,
    config: &Config,
    dir: &Path,
    limit: Option<usize>,
    force: bool,
    concurrency: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut files = collect_markdown_files(dir)?;
    if files.is_empty() {
        bail!("no .md documents found under {}", dir.display());
    }
    if let Some(limit) = limit {
        files.truncate(limit);
    }

    let cache = CacheStore::new(&config.database.path).await?;
    let already: HashSet<String> = cache
        .load_scores()
        .await?
        .into_iter()
        .map(|result| result.doc_key)
        .collect();

    let mut documents = Vec::new();
    let mut skipped = 0usize;
    for path in &files {
        let document = document_from_path(path)?;
        if !force && already.contains(&document.key) {
            skipped += 1;
            continue;
        }
        cache.save_document(&document).await?;
        documents.push(document);
    }

    if skipped > 0 {
        println!("Skipped {skipped} already-evaluated documents (use --force to redo)");
    }
    if documents.is_empty() {
        println!("Nothing to evaluate.");
        return Ok(());
    }

    // Ctrl+C cancels outstanding work; completed results are kept.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("cancellation requested, keeping completed results");
                cancel.cancel();
            }
        });
    }

    let options = BatchOptions {
        concurrency: concurrency.unwrap_or(config.evaluation.concurrency),
        cancel,
    };
    println!(
        "Evaluating {} documents ({} concurrent calls) ...",
        documents.len(),
        options.concurrency
    );
    let outcomes = evaluate_all(service, &documents, &options).await?;

    let mut failed = 0usize;
    let mut cancelled = 0usize;
    for outcome in &outcomes {
        match &outcome.outcome {
            BatchOutcome::Scored(result) => {
                cache.save_score(result).await?;
                println!(
                    "  {:>5.1}  {:<7}  {}",
                    result.weighted_score,
                    result.verdict.label(),
                    outcome.key
                );
            }
            BatchOutcome::Failed(e) => {
                failed += 1;
                println!("    n/a  unavailable  {}  ({e})", outcome.key);
            }
            BatchOutcome::Cancelled => {
                cancelled += 1;
                println!("    n/a  cancelled    {}", outcome.key);
            }
        }
    }

    // Distribution analysis over everything now in the cache.
    let all = cache.load_scores().await?;
    let refs: Vec<&ScoreResult> = all.iter().collect();
    if let Some(analysis) = BatchAnalysis::from_results(&refs) {
        let rendered = if json {
            serde_json::to_string_pretty(&analysis)?
        } else {
            report::render_analysis(&analysis)
        };
        println!("{rendered}");
    }

    if failed > 0 {
        bail!("{failed} documents could not be scored");
    }
    if cancelled > 0 {
        bail!("batch cancelled with {cancelled} documents unevaluated");
    }
    Ok(())
}
