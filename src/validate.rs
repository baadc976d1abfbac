//! Input validation for API request bodies.
//!
//! Each entity has a fixed field schema: strings are trimmed and length
//! bounded, numbers may arrive as numeric strings, timestamps must be ISO
//! 8601. Every failing field contributes one message; the messages are
//! joined in field order into a single [`Error::Validation`].
//!
//! Task status accepts natural-language synonyms with three-tier
//! resolution: exact match → synonym lookup → error with suggestion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::task::COMPANY_KINDS;
use crate::model::{
    ContactPatch, DealPatch, NewContact, NewDeal, NewPipeline, NewStage, NewTask, RelatedTo,
    TaskPatch, TaskStatus,
};

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["open", "in_progress", "done"].into_iter().collect());

pub static STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("todo", "open"),
        ("new", "open"),
        ("pending", "open"),
        ("wip", "in_progress"),
        ("started", "in_progress"),
        ("active", "in_progress"),
        ("working", "in_progress"),
        ("complete", "done"),
        ("completed", "done"),
        ("closed", "done"),
        ("finished", "done"),
    ]
    .into_iter()
    .collect()
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

const UPDATE_REQUIRES_FIELD: &str = "Provide at least one field to update.";

/// Normalize a task status via exact match or synonym lookup.
///
/// Returns the canonical status, or an error with the original input
/// and an optional suggestion.
pub fn normalize_status(input: &str) -> std::result::Result<TaskStatus, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if VALID_STATUSES.contains(lower.as_str()) {
        return Ok(TaskStatus::from_stored(&lower));
    }

    // Tier 2: synonym lookup
    if let Some(&canonical) = STATUS_SYNONYMS.get(lower.as_str()) {
        return Ok(TaskStatus::from_stored(canonical));
    }

    // Tier 3: find closest suggestion
    let suggestion = find_closest_match(&lower, &VALID_STATUSES, &STATUS_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // For synonyms, show what it maps to
            best = Some((synonyms.get(v).copied().unwrap_or(v), dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Use single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

// ── Field schema helpers ─────────────────────────────────────

/// Collected validation failures for one request body.
#[derive(Debug, Default)]
struct Issues(Vec<String>);

impl Issues {
    fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.0.join(" ")))
        }
    }
}

/// Length bounds and messages for one string field.
struct Text {
    key: &'static str,
    label: &'static str,
    min: usize,
    max: Option<usize>,
    min_message: Option<&'static str>,
}

impl Text {
    const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            min: 0,
            max: None,
            min_message: None,
        }
    }

    const fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    const fn non_empty(mut self, message: &'static str) -> Self {
        self.min = 1;
        self.min_message = Some(message);
        self
    }

    /// Read, trim and check the field. Absent and `null` read as `None`.
    fn read(&self, obj: &Map<String, Value>, issues: &mut Issues) -> Option<String> {
        let value = match obj.get(self.key) {
            None | Some(Value::Null) => return None,
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => {
                issues.push(format!("{} must be a string.", self.label));
                return None;
            }
        };

        let len = value.chars().count();
        if len < self.min {
            issues.push(self.min_message.map_or_else(
                || format!("{} must contain at least {} character.", self.label, self.min),
                str::to_string,
            ));
            return None;
        }
        if let Some(max) = self.max {
            if len > max {
                issues.push(format!("{} must be shorter than {max} characters.", self.label));
                return None;
            }
        }
        Some(value)
    }

    /// Like [`Text::read`], but a missing value is itself an issue.
    fn require(&self, obj: &Map<String, Value>, issues: &mut Issues) -> Option<String> {
        let present = !matches!(obj.get(self.key), None | Some(Value::Null));
        let value = self.read(obj, issues);
        if !present {
            issues.push(self.min_message.map_or_else(
                || format!("{} is required.", self.label),
                str::to_string,
            ));
        }
        value
    }
}

fn body_object(body: &Value) -> Result<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| Error::Validation("Request body must be a JSON object.".to_string()))
}

fn read_email(obj: &Map<String, Value>, issues: &mut Issues) -> Option<String> {
    let email = Text::new("email", "Email").read(obj, issues)?;
    if EMAIL_RE.is_match(&email) {
        Some(email)
    } else {
        issues.push("Email must be valid.");
        None
    }
}

/// Read a number that may arrive as a numeric string.
fn read_number(
    obj: &Map<String, Value>,
    key: &str,
    label: &str,
    issues: &mut Issues,
) -> Option<f64> {
    let parsed = match obj.get(key) {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Some(n),
        _ => {
            issues.push(format!("{label} must be a number."));
            None
        }
    }
}

fn read_amount(obj: &Map<String, Value>, issues: &mut Issues) -> Option<f64> {
    let amount = read_number(obj, "amount", "Amount", issues)?;
    if amount < 0.0 {
        issues.push("Amount cannot be negative.");
        return None;
    }
    Some(amount)
}

fn read_due_at(obj: &Map<String, Value>, issues: &mut Issues) -> Option<DateTime<Utc>> {
    let raw = Text::new("due_at", "Due date").read(obj, issues)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        Some(dt.with_timezone(&Utc))
    } else {
        issues.push("Due date must be an ISO datetime string.");
        None
    }
}

/// Read `related_type` + `related_id` into a [`RelatedTo`].
///
/// Returns `None` when neither field is present.
fn read_related(obj: &Map<String, Value>, issues: &mut Issues) -> Option<RelatedTo> {
    let kind = Text::new("related_type", "Related type").max(60).read(obj, issues);
    let id = Text::new("related_id", "Related id").max(60).read(obj, issues);

    match (kind, id) {
        (None, None) => None,
        (Some(kind), Some(id)) if !kind.is_empty() && !id.is_empty() => {
            let lower = kind.to_lowercase();
            if !COMPANY_KINDS.contains(&lower.as_str()) && lower != "contact" && lower != "deal" {
                issues.push("Related type must be one of company, contact, deal.");
                return None;
            }
            Some(RelatedTo::from_columns(Some(&kind), Some(&id)))
        }
        (Some(kind), Some(id)) if kind.is_empty() && id.is_empty() => Some(RelatedTo::None),
        _ => {
            issues.push("Related type and related id must be provided together.");
            None
        }
    }
}

fn read_status(obj: &Map<String, Value>, issues: &mut Issues) -> Option<TaskStatus> {
    let raw = Text::new("status", "Status").read(obj, issues)?;
    match normalize_status(&raw) {
        Ok(status) => Some(status),
        Err((input, Some(suggestion))) => {
            issues.push(format!("Unknown status '{input}'. Did you mean '{suggestion}'?"));
            None
        }
        Err((input, None)) => {
            issues.push(format!(
                "Unknown status '{input}'. Status must be one of open, in_progress, done."
            ));
            None
        }
    }
}

// ── Contacts ─────────────────────────────────────────────────

const CONTACT_FIRST_NAME: Text = Text::new("first_name", "First name")
    .non_empty("First name must contain at least 1 character.")
    .max(100);
const CONTACT_LAST_NAME: Text = Text::new("last_name", "Last name")
    .non_empty("Last name must contain at least 1 character.")
    .max(100);
const CONTACT_PHONE: Text = Text::new("phone", "Phone").max(40);
const CONTACT_TITLE: Text = Text::new("title", "Title").max(100);
const CONTACT_ADDRESS: Text = Text::new("address", "Address").max(200);
const COMPANY: Text = Text::new("company", "Company").max(120);
const OWNER: Text = Text::new("owner", "Owner").max(120);

fn read_contact_fields(obj: &Map<String, Value>, issues: &mut Issues) -> ContactPatch {
    ContactPatch {
        first_name: CONTACT_FIRST_NAME.read(obj, issues),
        last_name: CONTACT_LAST_NAME.read(obj, issues),
        email: read_email(obj, issues),
        phone: CONTACT_PHONE.read(obj, issues),
        title: CONTACT_TITLE.read(obj, issues),
        address: CONTACT_ADDRESS.read(obj, issues),
        company: COMPANY.read(obj, issues),
    }
}

/// Validate a contact creation body.
///
/// # Errors
///
/// Returns [`Error::Validation`] if any field is malformed or neither a
/// first nor a last name is given.
pub fn contact_create(body: &Value) -> Result<NewContact> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();
    let fields = read_contact_fields(obj, &mut issues);

    if issues.is_empty() && fields.first_name.is_none() && fields.last_name.is_none() {
        issues.push("Contact needs at least a first or last name.");
    }
    issues.finish()?;

    Ok(NewContact {
        first_name: fields.first_name,
        last_name: fields.last_name,
        email: fields.email,
        phone: fields.phone,
        title: fields.title,
        address: fields.address,
        company: fields.company,
    })
}

/// Validate a contact partial update body.
///
/// # Errors
///
/// Returns [`Error::Validation`] if any field is malformed or no field is given.
pub fn contact_patch(body: &Value) -> Result<ContactPatch> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();
    let patch = read_contact_fields(obj, &mut issues);

    if issues.is_empty() && patch.is_empty() {
        issues.push(UPDATE_REQUIRES_FIELD);
    }
    issues.finish()?;
    Ok(patch)
}

// ── Deals ────────────────────────────────────────────────────

const DEAL_NAME: Text = Text::new("name", "Deal name")
    .non_empty("Deal name is required.")
    .max(140);
const DEAL_PIPELINE: Text = Text::new("pipeline_id", "Pipeline id").non_empty("Pipeline id is required.");
const DEAL_STAGE: Text = Text::new("stage_id", "Stage id").non_empty("Stage id is required.");

/// Validate a deal creation body.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the name is missing or any field is malformed.
pub fn deal_create(body: &Value) -> Result<NewDeal> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();

    let name = DEAL_NAME.require(obj, &mut issues);
    let amount = read_amount(obj, &mut issues);
    let pipeline_id = DEAL_PIPELINE.read(obj, &mut issues);
    let stage_id = DEAL_STAGE.read(obj, &mut issues);
    let company = COMPANY.read(obj, &mut issues);
    let owner = OWNER.read(obj, &mut issues);
    issues.finish()?;

    Ok(NewDeal {
        name: name.unwrap_or_default(),
        amount,
        pipeline_id,
        stage_id,
        company,
        owner,
    })
}

/// Validate a deal partial update body.
///
/// # Errors
///
/// Returns [`Error::Validation`] if any field is malformed or no field is given.
pub fn deal_patch(body: &Value) -> Result<DealPatch> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();

    let patch = DealPatch {
        name: DEAL_NAME.read(obj, &mut issues),
        amount: read_amount(obj, &mut issues),
        pipeline_id: DEAL_PIPELINE.read(obj, &mut issues),
        stage_id: DEAL_STAGE.read(obj, &mut issues),
        company: COMPANY.read(obj, &mut issues),
        owner: OWNER.read(obj, &mut issues),
    };

    if issues.is_empty() && patch.is_empty() {
        issues.push(UPDATE_REQUIRES_FIELD);
    }
    issues.finish()?;
    Ok(patch)
}

// ── Tasks ────────────────────────────────────────────────────

const TASK_SUBJECT: Text = Text::new("subject", "Subject")
    .non_empty("Task needs a subject.")
    .max(180);

/// Validate a task creation body.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the subject is missing or any field is malformed.
pub fn task_create(body: &Value) -> Result<NewTask> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();

    let subject = TASK_SUBJECT.require(obj, &mut issues);
    let due_at = read_due_at(obj, &mut issues);
    let related = read_related(obj, &mut issues);
    let owner = OWNER.read(obj, &mut issues);
    let status = read_status(obj, &mut issues);
    issues.finish()?;

    Ok(NewTask {
        subject: subject.unwrap_or_default(),
        due_at,
        related: related.unwrap_or_default(),
        owner,
        status: status.unwrap_or_default(),
    })
}

/// Validate a task partial update body.
///
/// # Errors
///
/// Returns [`Error::Validation`] if any field is malformed or no field is given.
pub fn task_patch(body: &Value) -> Result<TaskPatch> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();

    let patch = TaskPatch {
        subject: TASK_SUBJECT.read(obj, &mut issues),
        due_at: read_due_at(obj, &mut issues),
        related: read_related(obj, &mut issues),
        owner: OWNER.read(obj, &mut issues),
        status: read_status(obj, &mut issues),
    };

    if issues.is_empty() && patch.is_empty() {
        issues.push(UPDATE_REQUIRES_FIELD);
    }
    issues.finish()?;
    Ok(patch)
}

// ── Pipelines & stages ───────────────────────────────────────

const PIPELINE_NAME: Text = Text::new("name", "Pipeline name")
    .non_empty("Pipeline name is required.")
    .max(120);
const STAGE_NAME: Text = Text::new("name", "Stage name")
    .non_empty("Stage name is required.")
    .max(80);
const STAGE_PIPELINE: Text = Text::new("pipeline_id", "Pipeline id").non_empty("Pipeline id is required.");

fn read_stage(obj: &Map<String, Value>, issues: &mut Issues) -> NewStage {
    let name = STAGE_NAME.require(obj, issues);

    let probability = match read_number(obj, "probability", "Probability", issues) {
        Some(p) if (0.0..=1.0).contains(&p) => p,
        Some(_) => {
            issues.push("Probability must be between 0 and 1.");
            0.0
        }
        None => 0.0,
    };

    let order_index = match obj.get("order_index") {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_i64() {
            Some(n) if n >= 0 => Some(n),
            _ => {
                issues.push("Order index must be a non-negative integer.");
                None
            }
        },
    };

    NewStage {
        name: name.unwrap_or_default(),
        probability,
        order_index,
    }
}

/// Validate a pipeline creation body, with optional inline `stages`.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the name or any stage is malformed.
pub fn pipeline_create(body: &Value) -> Result<NewPipeline> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();

    let name = PIPELINE_NAME.require(obj, &mut issues);
    let stages = match obj.get("stages") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item.as_object() {
                Some(stage) => Some(read_stage(stage, &mut issues)),
                None => {
                    issues.push("Each stage must be an object.");
                    None
                }
            })
            .collect(),
        Some(_) => {
            issues.push("Stages must be an array.");
            Vec::new()
        }
    };
    issues.finish()?;

    Ok(NewPipeline {
        name: name.unwrap_or_default(),
        stages,
    })
}

/// Validate a stage creation body. Returns the target pipeline id and
/// the stage.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the pipeline id, name or probability is malformed.
pub fn stage_create(body: &Value) -> Result<(String, NewStage)> {
    let obj = body_object(body)?;
    let mut issues = Issues::default();

    let pipeline_id = STAGE_PIPELINE.require(obj, &mut issues);
    let stage = read_stage(obj, &mut issues);
    issues.finish()?;

    Ok((pipeline_id.unwrap_or_default(), stage))
}
