use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use hookline_types::{GenerationRequest, Hook, RiskFactor};

const FALLBACK_HOOK_LIMIT: usize = 6;
const FALLBACK_SCORE_MIN: f64 = 70.0;
const FALLBACK_SCORE_MAX: f64 = 90.0;
const VISUAL_TRUNCATE_CHARS: usize = 80;

/// Turn raw model output into hooks. The strict path scans for independent
/// JSON objects; if it yields nothing, the fallback path degrades the text
/// into line-based hooks so a malformed response still produces usable
/// output. An empty return means both paths came up dry and the caller
/// should treat the generation as failed.
pub fn parse_hooks(raw: &str, request: &GenerationRequest, created_at: DateTime<Utc>) -> Vec<Hook> {
    let hooks = strict_hooks(raw, request, created_at);
    if !hooks.is_empty() {
        return hooks;
    }
    debug!("strict parse produced no hooks; degrading to line fallback");
    fallback_hooks(raw, request, created_at)
}

/// Model output as it arrives on the wire: camelCase fields, everything
/// optional. Snake_case aliases tolerate backends that ignore the casing
/// directive.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHook {
    #[serde(alias = "verbal_hook")]
    verbal_hook: Option<String>,
    #[serde(alias = "visual_hook")]
    visual_hook: Option<String>,
    #[serde(alias = "textual_hook")]
    textual_hook: Option<String>,
    framework: Option<String>,
    #[serde(alias = "psychological_driver")]
    psychological_driver: Option<String>,
    category: Option<String>,
    #[serde(alias = "risk_factor")]
    risk_factor: Option<String>,
    score: Option<f64>,
    rationale: Option<String>,
    #[serde(alias = "platform_notes")]
    platform_notes: Option<String>,
}

fn strict_hooks(raw: &str, request: &GenerationRequest, created_at: DateTime<Utc>) -> Vec<Hook> {
    let mut hooks = Vec::new();
    for candidate in scan_json_objects(raw) {
        let parsed: RawHook = match serde_json::from_str(candidate) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("skipping unparseable hook object: {}", err);
                continue;
            }
        };
        match normalize(parsed, request, created_at) {
            Some(hook) => hooks.push(hook),
            None => warn!("skipping hook object missing a mandatory field"),
        }
    }
    hooks
}

fn normalize(
    raw: RawHook,
    request: &GenerationRequest,
    created_at: DateTime<Utc>,
) -> Option<Hook> {
    let verbal_hook = non_empty(raw.verbal_hook)?;
    let visual_hook = non_empty(raw.visual_hook)?;
    let framework = non_empty(raw.framework)?;

    Some(Hook {
        id: Uuid::new_v4(),
        textual_hook: non_empty(raw.textual_hook).unwrap_or_else(|| verbal_hook.clone()),
        psychological_driver: non_empty(raw.psychological_driver)
            .unwrap_or_else(|| "curiosity".to_string()),
        category: non_empty(raw.category).unwrap_or_else(|| "general".to_string()),
        risk_factor: raw
            .risk_factor
            .as_deref()
            .map(RiskFactor::parse_lenient)
            .unwrap_or(RiskFactor::Low),
        score: clamp_score(raw.score.unwrap_or(70.0)),
        rationale: raw.rationale.map(|s| s.trim().to_string()).unwrap_or_default(),
        platform_notes: raw
            .platform_notes
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        verbal_hook,
        visual_hook,
        framework,
        platform: request.platform,
        objective: request.objective,
        topic: request.topic.clone(),
        created_at,
    })
}

/// Find independent top-level JSON objects in free text. Tracks brace depth
/// with string and escape awareness, so hook copy that itself contains
/// braces or quotes does not derail the scan. Unclosed objects are dropped.
fn scan_json_objects(text: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(s) = start.take() {
                            objects.push(&text[s..i + 1]);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    objects
}

fn fallback_hooks(
    raw: &str,
    request: &GenerationRequest,
    created_at: DateTime<Utc>,
) -> Vec<Hook> {
    let mut rng = rand::rng();
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(FALLBACK_HOOK_LIMIT)
        .map(|line| Hook {
            id: Uuid::new_v4(),
            verbal_hook: line.to_string(),
            visual_hook: truncate_chars(line, VISUAL_TRUNCATE_CHARS),
            textual_hook: format!(
                "{} #{} #{}",
                line,
                request.platform.as_str(),
                request.objective.hashtag()
            ),
            framework: "Pattern Interrupt".to_string(),
            psychological_driver: "curiosity".to_string(),
            category: "general".to_string(),
            risk_factor: RiskFactor::Low,
            score: rng.random_range(FALLBACK_SCORE_MIN..FALLBACK_SCORE_MAX),
            rationale: "Synthesized from an unstructured model response.".to_string(),
            platform_notes: String::new(),
            platform: request.platform,
            objective: request.objective,
            topic: request.topic.clone(),
            created_at,
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim().to_string();
        if v.is_empty() { None } else { Some(v) }
    })
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
