use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::model::{ChangeRow, Document, SubSkillRow};
use crate::normalize::Normalized;
use crate::stats::Statistics;

pub const NORMALIZED_JSON: &str = "validated_data.json";
pub const SUB_SKILL_CSV: &str = "database_ready.csv";
pub const CHANGE_LOG_CSV: &str = "change_log.csv";
pub const STATISTICS_JSON: &str = "statistics.json";

pub const SUB_SKILL_HEADER: [&str; 9] = [
    "sub_skill_id",
    "skill_id",
    "topic_id",
    "topic_area",
    "percentage_weight",
    "skill",
    "sub_skill",
    "reference_links",
    "annotation",
];

pub const CHANGE_LOG_HEADER: [&str; 4] =
    ["change_id", "change_description", "change_date", "change_type"];

pub fn render_json(doc: &Document) -> Result<String> {
    let mut out = serde_json::to_string_pretty(doc)?;
    out.push('\n');
    Ok(out)
}

pub fn render_statistics(stats: &Statistics) -> Result<String> {
    let mut out = serde_json::to_string_pretty(stats)?;
    out.push('\n');
    Ok(out)
}

pub fn render_sub_skill_csv(rows: &[SubSkillRow]) -> Result<Vec<u8>> {
    render_csv(&SUB_SKILL_HEADER, rows)
}

pub fn render_change_log_csv(rows: &[ChangeRow]) -> Result<Vec<u8>> {
    render_csv(&CHANGE_LOG_HEADER, rows)
}

/// Header is written explicitly so an empty table still gets one.
fn render_csv<T: Serialize>(header: &[&str], rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}

/// Render every artifact in memory, then write them all under `out_dir`.
/// Nothing touches the filesystem if rendering fails.
pub fn write_artifacts(normalized: &Normalized, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let artifacts: [(&str, Vec<u8>); 4] = [
        (NORMALIZED_JSON, render_json(&normalized.document)?.into_bytes()),
        (SUB_SKILL_CSV, render_sub_skill_csv(&normalized.sub_skill_rows)?),
        (CHANGE_LOG_CSV, render_change_log_csv(&normalized.change_rows)?),
        (STATISTICS_JSON, render_statistics(&normalized.statistics)?.into_bytes()),
    ];

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    let mut written = Vec::with_capacity(artifacts.len());
    for (name, bytes) in artifacts {
        let path = out_dir.join(name);
        fs::write(&path, &bytes).with_context(|| format!("Failed to write {:?}", path))?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::normalize;
    use crate::validate::{validate, Rules};

    fn sample() -> Normalized {
        let text = std::fs::read_to_string("tests/fixtures/sample_exam.json").unwrap();
        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        normalize(validate(&raw, &Rules::default()).unwrap())
    }

    #[test]
    fn sub_skill_csv_header_and_rows() {
        let n = sample();
        let csv = String::from_utf8(render_sub_skill_csv(&n.sub_skill_rows).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("sub_skill_id,skill_id,topic_id,topic_area,percentage_weight,skill,sub_skill,reference_links,annotation")
        );
        assert_eq!(csv.lines().count(), 11);
        assert!(lines.next().unwrap().starts_with("SUBSKILL-00001,SKILL-0001,TOPIC-001,"));
    }

    #[test]
    fn csv_quotes_commas_and_joins_links() {
        let n = sample();
        let bytes = render_sub_skill_csv(&n.sub_skill_rows).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 10);
        // "Manage, monitor, and secure..." survives the round trip intact.
        assert_eq!(&records[3][5], "Manage, monitor, and secure an Azure AI service");
        assert_eq!(
            &records[0][7],
            "https://learn.microsoft.com/en-us/azure/ai-services/what-are-ai-services|https://learn.microsoft.com/en-us/azure/ai-services/computer-vision/overview"
        );
    }

    #[test]
    fn empty_change_log_still_has_header() {
        let csv = String::from_utf8(render_change_log_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv, "change_id,change_description,change_date,change_type\n");
    }

    #[test]
    fn normalized_json_keeps_non_ascii() {
        let n = sample();
        let out = render_json(&n.document).unwrap();
        assert!(out.contains("20–25%"));
        let back: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(back["topic_areas"][0]["topic_id"], json!("TOPIC-001"));
        assert_eq!(
            back["topic_areas"][1]["skills"][0]["sub_skills"][0]["skill_id"],
            json!("SKILL-0003")
        );
    }

    #[test]
    fn writes_all_four_files() {
        let n = sample();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let written = write_artifacts(&n, &out).unwrap();
        assert_eq!(written.len(), 4);
        for name in [NORMALIZED_JSON, SUB_SKILL_CSV, CHANGE_LOG_CSV, STATISTICS_JSON] {
            assert!(out.join(name).is_file(), "{} missing", name);
        }

        let stats: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(STATISTICS_JSON)).unwrap())
                .unwrap();
        assert_eq!(stats["topics"], 2);
        assert_eq!(stats["skills"], 3);
        assert_eq!(stats["sub_skills"], 10);

        let changes = std::fs::read_to_string(out.join(CHANGE_LOG_CSV)).unwrap();
        assert!(changes.contains("CHANGE-001,"));
    }
}
