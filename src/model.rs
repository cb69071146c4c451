use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Exam outline as produced by the extractor: metadata, the
/// topic → skill → sub-skill tree and an independent change log.
///
/// Every node keeps its unrecognised fields in `extra` so the normalized
/// document has the same shape as the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub metadata: ExamMetadata,
    pub topic_areas: Vec<TopicArea>,
    pub change_log: Vec<ChangeLogEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamMetadata {
    pub exam_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_update_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicArea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    pub topic_area: String,
    pub percentage_weight: String,
    pub skills: Vec<Skill>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    pub skill: String,
    pub sub_skills: Vec<SubSkill>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubSkill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_skill_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    pub sub_skill: String,
    #[serde(default)]
    pub reference_links: Vec<String>,
    #[serde(default)]
    pub annotation: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_id: Option<String>,
    pub change_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_prior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_current: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Flat rows ──

/// One row per sub-skill, denormalized with its ancestors.
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubSkillRow {
    pub sub_skill_id: String,
    pub skill_id: String,
    pub topic_id: String,
    pub topic_area: String,
    pub percentage_weight: String,
    pub skill: String,
    pub sub_skill: String,
    pub reference_links: String,
    pub annotation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRow {
    pub change_id: String,
    pub change_description: String,
    pub change_date: String,
    pub change_type: String,
}
