use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStats {
    pub topic_id: String,
    pub topic_area: String,
    pub percentage_weight: String,
    pub skills_count: usize,
    pub sub_skills_count: usize,
    pub reference_links_count: usize,
}

/// Dataset totals plus a per-topic breakdown, written as `statistics.json`.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub topics: usize,
    pub skills: usize,
    pub sub_skills: usize,
    pub reference_links: usize,
    pub topic_breakdown: Vec<TopicStats>,
    pub generated_at: DateTime<Utc>,
}

impl Statistics {
    /// Totals are summed from the breakdown, so they always agree with it.
    pub fn from_breakdown(topic_breakdown: Vec<TopicStats>) -> Self {
        Self {
            topics: topic_breakdown.len(),
            skills: topic_breakdown.iter().map(|t| t.skills_count).sum(),
            sub_skills: topic_breakdown.iter().map(|t| t.sub_skills_count).sum(),
            reference_links: topic_breakdown.iter().map(|t| t.reference_links_count).sum(),
            topic_breakdown,
            generated_at: Utc::now(),
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== STATISTICS ===");
        println!("Topic areas:     {}", self.topics);
        println!("Skills:          {}", self.skills);
        println!("Sub-skills:      {}", self.sub_skills);
        println!("Reference links: {}", self.reference_links);

        println!("\n=== TOPIC BREAKDOWN ===");
        for t in &self.topic_breakdown {
            println!("\n{} {} ({})", t.topic_id, t.topic_area, t.percentage_weight);
            println!("  Skills:     {}", t.skills_count);
            println!("  Sub-skills: {}", t.sub_skills_count);
            println!("  Links:      {}", t.reference_links_count);
        }
    }
}
