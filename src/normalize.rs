use tracing::{debug, warn};

use crate::model::{ChangeRow, Document, SubSkillRow};
use crate::stats::{Statistics, TopicStats};

const DEFAULT_CHANGE_TYPE: &str = "Update";
const UNKNOWN_DATE: &str = "Unknown";

// IDs are positional: `n` is the 1-based index in document order.

pub fn topic_id(n: usize) -> String {
    format!("TOPIC-{:03}", n)
}

pub fn skill_id(n: usize) -> String {
    format!("SKILL-{:04}", n)
}

pub fn sub_skill_id(n: usize) -> String {
    format!("SUBSKILL-{:05}", n)
}

pub fn change_id(n: usize) -> String {
    format!("CHANGE-{:03}", n)
}

/// Output of one normalization run.
pub struct Normalized {
    /// Input document with IDs, foreign keys and defaults injected.
    pub document: Document,
    /// One row per sub-skill, in document order.
    pub sub_skill_rows: Vec<SubSkillRow>,
    pub change_rows: Vec<ChangeRow>,
    pub statistics: Statistics,
}

/// Assign IDs in document order and flatten the tree in the same pass.
///
/// The document must already have passed validation; integrity of any
/// foreign keys it carried was checked there. Own IDs carried by the input
/// are overwritten with their positional value.
pub fn normalize(mut doc: Document) -> Normalized {
    let mut rows = Vec::new();
    let mut breakdown = Vec::with_capacity(doc.topic_areas.len());
    let mut skill_n = 0;
    let mut sub_n = 0;

    for (ti, topic) in doc.topic_areas.iter_mut().enumerate() {
        let tid = topic_id(ti + 1);
        assign(&mut topic.topic_id, &tid);

        let mut topic_stats = TopicStats {
            topic_id: tid.clone(),
            topic_area: topic.topic_area.clone(),
            percentage_weight: topic.percentage_weight.clone(),
            skills_count: topic.skills.len(),
            sub_skills_count: 0,
            reference_links_count: 0,
        };

        for skill in topic.skills.iter_mut() {
            skill_n += 1;
            let sid = skill_id(skill_n);
            assign(&mut skill.skill_id, &sid);
            skill.topic_id = Some(tid.clone());

            for sub in skill.sub_skills.iter_mut() {
                sub_n += 1;
                let ssid = sub_skill_id(sub_n);
                assign(&mut sub.sub_skill_id, &ssid);
                sub.skill_id = Some(sid.clone());
                sub.topic_id = Some(tid.clone());

                topic_stats.sub_skills_count += 1;
                topic_stats.reference_links_count += sub.reference_links.len();

                rows.push(SubSkillRow {
                    sub_skill_id: ssid,
                    skill_id: sid.clone(),
                    topic_id: tid.clone(),
                    topic_area: topic.topic_area.clone(),
                    percentage_weight: topic.percentage_weight.clone(),
                    skill: skill.skill.clone(),
                    sub_skill: sub.sub_skill.clone(),
                    reference_links: sub.reference_links.join("|"),
                    annotation: sub.annotation.clone(),
                });
            }
        }

        breakdown.push(topic_stats);
    }

    let default_date = doc
        .metadata
        .exam_update_date
        .clone()
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    let mut change_rows = Vec::with_capacity(doc.change_log.len());
    for (i, change) in doc.change_log.iter_mut().enumerate() {
        let cid = change_id(i + 1);
        assign(&mut change.change_id, &cid);
        let change_type = change
            .change_type
            .get_or_insert_with(|| DEFAULT_CHANGE_TYPE.to_string())
            .clone();
        let change_date = change
            .change_date
            .get_or_insert_with(|| default_date.clone())
            .clone();

        change_rows.push(ChangeRow {
            change_id: cid,
            change_description: change.change_description.clone(),
            change_date,
            change_type,
        });
    }

    debug!(
        topics = breakdown.len(),
        skills = skill_n,
        sub_skills = sub_n,
        changes = change_rows.len(),
        "normalized document"
    );

    Normalized {
        document: doc,
        sub_skill_rows: rows,
        change_rows,
        statistics: Statistics::from_breakdown(breakdown),
    }
}

fn assign(slot: &mut Option<String>, id: &str) {
    if let Some(old) = slot.as_deref() {
        if old != id {
            warn!(old, new = id, "reassigning positional id");
        }
    }
    *slot = Some(id.to_string());
}
