use hookline_types::{GenerationRequest, Objective, Personalization, Platform, SafetyLevel};

/// System plus user instruction, plain text, ready for any chat backend.
#[derive(Debug, Clone)]
pub struct LlmPrompt {
    pub system: String,
    pub user: String,
}

/// Assemble the generation prompt. Brand fields default to neutral
/// placeholders; banned terms are forwarded only as an avoid-list, never as
/// content to write about.
pub fn build_prompt(
    request: &GenerationRequest,
    personalization: &Personalization,
    hook_count: usize,
) -> LlmPrompt {
    let system = system_prompt();

    let mut user = String::new();
    user.push_str(&format!(
        "Generate exactly {} hooks for a {} video.\n",
        hook_count,
        request.platform.as_str()
    ));
    user.push_str(&format!(
        "Objective: {}. {}\n",
        request.objective.as_str(),
        objective_guidance(request.objective)
    ));
    user.push_str(&format!(
        "Platform guidance: {}\n",
        platform_guidance(request.platform)
    ));
    user.push_str(&format!("Topic: {}\n", request.topic.trim()));

    user.push_str("\nBrand context:\n");
    user.push_str(&format!(
        "- Brand: {}\n",
        personalization.company.as_deref().unwrap_or("an independent creator")
    ));
    user.push_str(&format!(
        "- Industry: {}\n",
        personalization.industry.as_deref().unwrap_or("general")
    ));
    user.push_str(&format!(
        "- Voice: {}\n",
        personalization
            .brand_voice
            .as_deref()
            .unwrap_or("clear and energetic")
    ));
    user.push_str(&format!(
        "- Audience: {}\n",
        personalization
            .audience
            .as_deref()
            .unwrap_or("a broad general audience")
    ));

    user.push('\n');
    user.push_str(safety_directive(personalization.safety_level()));
    user.push('\n');

    if !personalization.banned_terms.is_empty() {
        user.push_str(&format!(
            "Never use these terms or close variants of them: {}.\n",
            personalization.banned_terms.join(", ")
        ));
    }

    LlmPrompt { system, user }
}

fn system_prompt() -> String {
    "You are a short-form video hook strategist. You write scroll-stopping \
opening moments and return them as strict JSON.\n\
Return one JSON object per hook, each on its own line, with exactly these fields:\n\
- verbalHook (string): the spoken opening line\n\
- visualHook (string): the first on-screen visual direction\n\
- textualHook (string): the caption or on-screen text variant\n\
- framework (string): the named psychological technique behind the hook\n\
- psychologicalDriver (string): the drive it triggers\n\
- category (string): a short lowercase content category\n\
- riskFactor (\"low\" | \"medium\" | \"high\")\n\
- score (number 0-100): estimated engagement potential\n\
- rationale (string): one sentence on why it works\n\
- platformNotes (string): delivery tips for the target platform\n\
Rules:\n\
- Output JSON objects only, no markdown fences and no commentary.\n"
        .to_string()
}

fn platform_guidance(platform: Platform) -> &'static str {
    match platform {
        Platform::Tiktok => {
            "the first second decides the swipe; lead with motion or a bold claim"
        }
        Platform::Instagram => {
            "reels reward a polished first frame and an on-screen text overlay"
        }
        Platform::Youtube => {
            "shorts viewers tolerate a breath more setup but need a clear promise"
        }
    }
}

fn objective_guidance(objective: Objective) -> &'static str {
    match objective {
        Objective::WatchTime => "open a loop the viewer has to stay to close",
        Objective::Shares => "make the viewer look smart or funny for passing it on",
        Objective::Saves => "promise reference value worth keeping",
        Objective::Ctr => "tease the payoff without giving it away",
        Objective::Follows => "signal there is a series worth subscribing to",
    }
}

fn safety_directive(level: SafetyLevel) -> &'static str {
    match level {
        SafetyLevel::Relaxed => {
            "Edgy angles and mild provocation are acceptable; stay within platform policy."
        }
        SafetyLevel::Standard => {
            "Keep claims defensible and avoid shock tactics or misleading framing."
        }
        SafetyLevel::Strict => {
            "Use only conservative, verifiable claims; no controversy, no implied guarantees."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookline_types::{ModelClass, Platform};

    fn request() -> GenerationRequest {
        GenerationRequest {
            user_id: "u1".to_string(),
            platform: Platform::Tiktok,
            objective: Objective::Shares,
            topic: "meal prep for busy weeks".to_string(),
            requested_model_class: Some(ModelClass::Draft),
        }
    }

    #[test]
    fn includes_output_shape_and_hook_count() {
        let prompt = build_prompt(&request(), &Personalization::default(), 6);
        assert!(prompt.system.contains("verbalHook"));
        assert!(prompt.system.contains("riskFactor"));
        assert!(prompt.user.contains("Generate exactly 6 hooks"));
        assert!(prompt.user.contains("tiktok"));
    }

    #[test]
    fn defaults_neutral_placeholders_without_brand_context() {
        let prompt = build_prompt(&request(), &Personalization::default(), 6);
        assert!(prompt.user.contains("an independent creator"));
        assert!(prompt.user.contains("a broad general audience"));
    }

    #[test]
    fn banned_terms_appear_only_as_an_avoid_list() {
        let personalization = Personalization {
            banned_terms: vec!["guaranteed".to_string(), "miracle".to_string()],
            ..Personalization::default()
        };
        let prompt = build_prompt(&request(), &personalization, 6);
        assert!(prompt
            .user
            .contains("Never use these terms or close variants of them: guaranteed, miracle."));
    }

    #[test]
    fn safety_level_changes_the_directive() {
        let strict = Personalization {
            safety: Some(SafetyLevel::Strict),
            ..Personalization::default()
        };
        let prompt = build_prompt(&request(), &strict, 6);
        assert!(prompt.user.contains("no controversy"));
    }
}
