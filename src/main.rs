mod error;
mod export;
mod model;
mod normalize;
mod settings;
mod stats;
mod validate;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use crate::error::ValidationReport;
use crate::model::SubSkillRow;
use crate::normalize::Normalized;
use crate::settings::Settings;
use crate::validate::Rules;

#[derive(Parser)]
#[command(name = "exam_guide", about = "Validate, normalize and flatten exam skill outlines")]
struct Cli {
    /// Settings file (default: ./exam_guide.{toml,json,yaml} if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an extracted outline against the schema without writing anything
    Validate {
        input: PathBuf,
    },
    /// Validate, assign IDs and write the JSON/CSV/statistics artifacts
    Normalize {
        input: PathBuf,
        /// Output directory (overrides config)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Topic → skill hierarchy with sub-skill counts
    Overview {
        input: PathBuf,
        /// Filter topics by ID or name (case-insensitive substring)
        #[arg(short, long)]
        topic: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Find sub-skills whose text contains a term
    Search {
        input: PathBuf,
        term: String,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let result = run(cli);

    if let Some(report) = result.as_ref().err().and_then(|e| e.downcast_ref::<ValidationReport>()) {
        eprint!("{}", report.lines());
    }
    debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "done");
    result
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    info!(?settings, "settings loaded");
    let rules = settings.rules();

    match cli.command {
        Commands::Validate { input } => {
            let raw = load_raw(&input)?;
            let doc = validate::validate(&raw, &rules)?;
            let skills: usize = doc.topic_areas.iter().map(|t| t.skills.len()).sum();
            let sub_skills: usize = doc
                .topic_areas
                .iter()
                .flat_map(|t| &t.skills)
                .map(|s| s.sub_skills.len())
                .sum();
            println!(
                "Validation passed: {} topics, {} skills, {} sub-skills, {} change log entries.",
                doc.topic_areas.len(),
                skills,
                sub_skills,
                doc.change_log.len()
            );
            Ok(())
        }
        Commands::Normalize { input, out_dir } => {
            let out_dir = out_dir.unwrap_or(settings.out_dir);
            let normalized = run_normalize(&input, &out_dir, &rules)?;
            normalized.statistics.print_summary();
            Ok(())
        }
        Commands::Overview { input, topic, limit } => {
            let normalized = prepare(&input, &rules)?;
            let rows = overview_rows(&normalized, topic.as_deref());
            if rows.is_empty() {
                println!("No topics found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<9} | {:<32} | {:<7} | {:<10} | {:<40} | {:>4} | {:>5}",
                "#", "Topic", "Topic area", "Weight", "Skill", "Skill name", "Subs", "Links"
            );
            println!("{}", "-".repeat(130));

            for (i, r) in rows.iter().take(limit).enumerate() {
                println!(
                    "{:>3} | {:<9} | {:<32} | {:<7} | {:<10} | {:<40} | {:>4} | {:>5}",
                    i + 1,
                    r.topic_id,
                    truncate(&r.topic_area, 32),
                    r.percentage_weight,
                    r.skill_id,
                    truncate(&r.skill, 40),
                    r.sub_skills,
                    r.reference_links
                );
            }

            println!("\n{} of {} skills shown", rows.len().min(limit), rows.len());
            Ok(())
        }
        Commands::Search { input, term, limit } => {
            let normalized = prepare(&input, &rules)?;
            let hits = search(&normalized.sub_skill_rows, &term);
            if hits.is_empty() {
                println!("No sub-skills match \"{}\".", term);
                return Ok(());
            }
            for r in hits.iter().take(limit) {
                println!(
                    "{} | {} | {} | {}",
                    r.sub_skill_id,
                    r.skill_id,
                    r.topic_id,
                    truncate(&r.sub_skill, 80)
                );
                if !r.reference_links.is_empty() {
                    println!("    links: {}", r.reference_links.replace('|', ", "));
                }
            }
            println!("\n{} match(es)", hits.len());
            Ok(())
        }
    }
}

fn load_raw(input: &Path) -> Result<serde_json::Value> {
    info!(path = %input.display(), "loading outline");
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {:?}", input))?;
    serde_json::from_str(&text).with_context(|| format!("{:?} is not valid JSON", input))
}

/// Read, validate and normalize one outline. Nothing is written.
fn prepare(input: &Path, rules: &Rules) -> Result<Normalized> {
    let raw = load_raw(input)?;
    let doc = validate::validate(&raw, rules)?;
    info!("validation passed");
    Ok(normalize::normalize(doc))
}

/// Full batch: artifacts are only written once the whole document is valid.
fn run_normalize(input: &Path, out_dir: &Path, rules: &Rules) -> Result<Normalized> {
    let normalized = prepare(input, rules)?;
    let written = export::write_artifacts(&normalized, out_dir)?;
    for path in &written {
        println!("Saved {}", path.display());
    }
    Ok(normalized)
}

// ── Overview / search ──

struct OverviewRow {
    topic_id: String,
    topic_area: String,
    percentage_weight: String,
    skill_id: String,
    skill: String,
    sub_skills: usize,
    reference_links: usize,
}

fn overview_rows(normalized: &Normalized, topic_filter: Option<&str>) -> Vec<OverviewRow> {
    let filter = topic_filter.map(str::to_lowercase);
    let mut rows = Vec::new();

    for topic in &normalized.document.topic_areas {
        let tid = topic.topic_id.as_deref().unwrap_or_default();
        if let Some(f) = &filter {
            if !tid.to_lowercase().contains(f) && !topic.topic_area.to_lowercase().contains(f) {
                continue;
            }
        }
        for skill in &topic.skills {
            rows.push(OverviewRow {
                topic_id: tid.to_string(),
                topic_area: topic.topic_area.clone(),
                percentage_weight: topic.percentage_weight.clone(),
                skill_id: skill.skill_id.clone().unwrap_or_default(),
                skill: skill.skill.clone(),
                sub_skills: skill.sub_skills.len(),
                reference_links: skill.sub_skills.iter().map(|s| s.reference_links.len()).sum(),
            });
        }
    }
    rows
}

fn search<'a>(rows: &'a [SubSkillRow], term: &str) -> Vec<&'a SubSkillRow> {
    let needle = term.to_lowercase();
    rows.iter()
        .filter(|r| r.sub_skill.to_lowercase().contains(&needle))
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    const SAMPLE: &str = "tests/fixtures/sample_exam.json";
    const MISSING_WEIGHT: &str = "tests/fixtures/missing_weight.json";

    #[test]
    fn missing_weight_writes_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("artifacts");
        let err = run_normalize(Path::new(MISSING_WEIGHT), &out, &Rules::default())
            .err()
            .unwrap();

        let report = err.downcast_ref::<ValidationReport>().unwrap();
        assert_eq!(
            report.errors,
            vec![ValidationError::schema(
                "topic_areas[0].percentage_weight",
                "required field is missing"
            )]
        );
        assert!(!out.exists());
    }

    #[test]
    fn normalize_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let n = run_normalize(Path::new(SAMPLE), dir.path(), &Rules::default()).unwrap();
        assert_eq!(n.sub_skill_rows.len(), 10);
        assert!(dir.path().join(export::SUB_SKILL_CSV).is_file());
    }

    #[test]
    fn unreadable_input() {
        let err = prepare(Path::new("tests/fixtures/absent.json"), &Rules::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn overview_filters_topics() {
        let n = prepare(Path::new(SAMPLE), &Rules::default()).unwrap();
        let all = overview_rows(&n, None);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].sub_skills, 3);
        assert_eq!(all[0].reference_links, 3);

        let generative = overview_rows(&n, Some("GENERATIVE"));
        assert_eq!(generative.len(), 1);
        assert_eq!(generative[0].skill_id, "SKILL-0003");

        let by_id = overview_rows(&n, Some("topic-001"));
        assert_eq!(by_id.len(), 2);
    }

    #[test]
    fn search_is_case_insensitive() {
        let n = prepare(Path::new(SAMPLE), &Rules::default()).unwrap();
        let hits = search(&n.sub_skill_rows, "SELECT THE APPROPRIATE");
        let ids: Vec<_> = hits.iter().map(|r| r.sub_skill_id.as_str()).collect();
        assert_eq!(ids, ["SUBSKILL-00001", "SUBSKILL-00002", "SUBSKILL-00003"]);
        assert!(search(&n.sub_skill_rows, "quantum").is_empty());
    }

    #[test]
    fn truncate_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Plan and manage", 4), "Plan...");
    }
}
