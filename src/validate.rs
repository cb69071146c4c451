use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationReport};
use crate::model::Document;
use crate::normalize::{skill_id, topic_id};

static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[-–]\d+%$").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

/// Document-level rules that come from configuration rather than the schema.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    /// Reject documents whose `metadata.exam_code` differs.
    pub expected_exam_code: Option<String>,
}

/// Check `raw` against the outline schema and deserialize it.
///
/// Every violation in the document is collected before returning; the typed
/// [`Document`] is only built once the whole tree is clean.
pub fn validate(raw: &Value, rules: &Rules) -> Result<Document, ValidationReport> {
    let mut v = Validator::default();
    v.document(raw, rules);
    if !v.errors.is_empty() {
        return Err(ValidationReport { errors: v.errors });
    }
    serde_json::from_value(raw.clone()).map_err(|e| ValidationReport {
        errors: vec![ValidationError::schema("$", e.to_string())],
    })
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
    // Running skill counter, mirroring positional ID assignment.
    skills_seen: usize,
}

impl Validator {
    fn document(&mut self, raw: &Value, rules: &Rules) {
        let Some(root) = raw.as_object() else {
            self.errors.push(ValidationError::schema("$", "document must be a JSON object"));
            return;
        };

        match root.get("metadata") {
            None => self.missing("metadata"),
            Some(Value::Object(meta)) => self.metadata(meta, rules),
            Some(_) => self.errors.push(ValidationError::schema("metadata", "must be an object")),
        }

        match root.get("topic_areas") {
            None => self.missing("topic_areas"),
            Some(Value::Array(topics)) if topics.is_empty() => self
                .errors
                .push(ValidationError::schema("topic_areas", "array must not be empty")),
            Some(Value::Array(topics)) => self.topics(topics),
            Some(_) => self
                .errors
                .push(ValidationError::schema("topic_areas", "must be an array")),
        }

        match root.get("change_log") {
            None => self.missing("change_log"),
            Some(Value::Array(changes)) => self.change_log(changes),
            Some(_) => self
                .errors
                .push(ValidationError::schema("change_log", "must be an array")),
        }
    }

    fn metadata(&mut self, meta: &Map<String, Value>, rules: &Rules) {
        let code = self.required_str(meta, "metadata", "exam_code");
        if let (Some(code), Some(expected)) = (code, &rules.expected_exam_code) {
            if code != expected {
                self.errors.push(ValidationError::schema(
                    "metadata.exam_code",
                    format!("expected exam code \"{}\", found \"{}\"", expected, code),
                ));
            }
        }
        for key in [
            "exam_title",
            "extraction_date",
            "exam_update_date",
            "source_url",
            "source_file",
        ] {
            self.optional_str(meta, "metadata", key);
        }
    }

    fn topics(&mut self, topics: &[Value]) {
        let mut names: HashMap<&str, usize> = HashMap::new();

        for (ti, topic) in topics.iter().enumerate() {
            let path = format!("topic_areas[{}]", ti);
            let Some(obj) = self.object(topic, &path) else {
                continue;
            };
            self.optional_str(obj, &path, "topic_id");
            let tid = carried_id(obj, "topic_id").unwrap_or_else(|| topic_id(ti + 1));

            let name = self.required_str(obj, &path, "topic_area");
            if let Some(name) = name {
                self.unique(&mut names, name, ti, &path, "topic_area");
            }
            let label = name
                .map(|n| format!("\"{}\"", n))
                .unwrap_or_else(|| format!("#{}", ti + 1));

            if let Some(weight) = self.required_str(obj, &path, "percentage_weight") {
                if !WEIGHT_RE.is_match(weight) {
                    self.errors.push(ValidationError::format(
                        format!("{}.percentage_weight", path),
                        format!(
                            "percentage_weight \"{}\" of topic {} does not match NN-NN%",
                            weight, label
                        ),
                    ));
                }
            }

            if let Some(skills) = self.required_array(obj, &path, "skills") {
                self.skills(skills, &path, &tid);
            }
        }
    }

    fn skills(&mut self, skills: &[Value], topic_path: &str, tid: &str) {
        let mut names: HashMap<&str, usize> = HashMap::new();

        for (si, skill) in skills.iter().enumerate() {
            let path = format!("{}.skills[{}]", topic_path, si);
            let Some(obj) = self.object(skill, &path) else {
                continue;
            };
            self.skills_seen += 1;
            self.optional_str(obj, &path, "skill_id");
            let sid = carried_id(obj, "skill_id").unwrap_or_else(|| skill_id(self.skills_seen));

            self.foreign_key(obj, &path, "topic_id", tid);

            if let Some(name) = self.required_str(obj, &path, "skill") {
                self.unique(&mut names, name, si, &path, "skill");
            }
            if let Some(subs) = self.required_array(obj, &path, "sub_skills") {
                self.sub_skills(subs, &path, tid, &sid);
            }
        }
    }

    fn sub_skills(&mut self, subs: &[Value], skill_path: &str, tid: &str, sid: &str) {
        let mut texts: HashMap<&str, usize> = HashMap::new();

        for (i, sub) in subs.iter().enumerate() {
            let path = format!("{}.sub_skills[{}]", skill_path, i);
            let Some(obj) = self.object(sub, &path) else {
                continue;
            };
            self.optional_str(obj, &path, "sub_skill_id");
            self.foreign_key(obj, &path, "skill_id", sid);
            self.foreign_key(obj, &path, "topic_id", tid);

            if let Some(text) = self.required_str(obj, &path, "sub_skill") {
                self.unique(&mut texts, text, i, &path, "sub_skill");
            }
            if obj.get("annotation").is_some_and(|a| !a.is_string()) {
                self.errors.push(ValidationError::schema(
                    format!("{}.annotation", path),
                    "must be a string when present",
                ));
            }
            self.reference_links(obj, &path);
        }
    }

    fn reference_links(&mut self, obj: &Map<String, Value>, path: &str) {
        let links = match obj.get("reference_links") {
            None => return,
            Some(Value::Array(links)) => links,
            Some(_) => {
                self.errors.push(ValidationError::schema(
                    format!("{}.reference_links", path),
                    "must be an array of strings",
                ));
                return;
            }
        };
        for (li, link) in links.iter().enumerate() {
            let link_path = format!("{}.reference_links[{}]", path, li);
            match link.as_str() {
                Some(url) if LINK_RE.is_match(url) => {}
                Some(url) => self.errors.push(ValidationError::format(
                    link_path,
                    format!("\"{}\" is not an absolute http(s) URL", url),
                )),
                None => self
                    .errors
                    .push(ValidationError::schema(link_path, "link must be a string")),
            }
        }
    }

    fn change_log(&mut self, changes: &[Value]) {
        let mut entries: HashMap<[Option<&str>; 5], usize> = HashMap::new();

        for (ci, change) in changes.iter().enumerate() {
            let path = format!("change_log[{}]", ci);
            let Some(obj) = self.object(change, &path) else {
                continue;
            };
            for key in ["change_id", "change_date", "change_type", "skill_prior", "skill_current"] {
                self.optional_str(obj, &path, key);
            }
            let Some(desc) = self.required_str(obj, &path, "change_description") else {
                continue;
            };

            // An entry is a duplicate only when every text field matches.
            let text = |key: &str| obj.get(key).and_then(Value::as_str);
            let key = [
                Some(desc),
                text("change_date"),
                text("change_type"),
                text("skill_prior"),
                text("skill_current"),
            ];
            if let Some(first) = entries.get(&key) {
                self.errors.push(ValidationError::integrity(
                    path,
                    format!("duplicate of change log entry {}: \"{}\"", first, desc),
                ));
            } else {
                entries.insert(key, ci);
            }
        }
    }

    // ── Field helpers ──

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.errors.push(ValidationError::schema(path, "must be an object"));
        }
        obj
    }

    fn missing(&mut self, path: &str) {
        self.errors
            .push(ValidationError::schema(path, "required field is missing"));
    }

    fn required_str<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a str> {
        let path = format!("{}.{}", parent, key);
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.missing(&path);
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.errors.push(ValidationError::schema(path, "must be a string"));
                None
            }
        }
    }

    fn optional_str(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some(v) = obj.get(key) {
            if !v.is_string() && !v.is_null() {
                self.errors.push(ValidationError::schema(
                    format!("{}.{}", parent, key),
                    "must be a string when present",
                ));
            }
        }
    }

    fn required_array<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a [Value]> {
        let path = format!("{}.{}", parent, key);
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.missing(&path);
                None
            }
            Some(Value::Array(items)) => Some(items.as_slice()),
            Some(_) => {
                self.errors.push(ValidationError::schema(path, "must be an array"));
                None
            }
        }
    }

    /// A parent reference carried by the input must point at the enclosing
    /// node: its own carried ID if it has one, its positional ID otherwise.
    fn foreign_key(&mut self, obj: &Map<String, Value>, parent: &str, key: &str, expected: &str) {
        let path = format!("{}.{}", parent, key);
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(found)) if found == expected => {}
            Some(Value::String(found)) => self.errors.push(ValidationError::integrity(
                path,
                format!("references {} but the enclosing node is {}", found, expected),
            )),
            Some(_) => self
                .errors
                .push(ValidationError::schema(path, "must be a string when present")),
        }
    }

    fn unique<'a>(
        &mut self,
        seen: &mut HashMap<&'a str, usize>,
        text: &'a str,
        index: usize,
        path: &str,
        key: &str,
    ) {
        if let Some(first) = seen.get(text) {
            self.errors.push(ValidationError::integrity(
                format!("{}.{}", path, key),
                format!("duplicate of entry {} at the same level: \"{}\"", first, text),
            ));
        } else {
            seen.insert(text, index);
        }
    }
}

/// ID a node already carries, e.g. from a previous normalization run.
fn carried_id(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
