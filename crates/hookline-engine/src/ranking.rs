use std::cmp::Ordering;
use std::collections::HashMap;

use hookline_types::{Hook, Objective, Platform, RankingSummary};

const TOP_VARIANT_COUNT: usize = 3;

/// Score, rank, and aggregate a generated hook set. The top variants are the
/// three highest-scoring hooks; ties keep generation order (stable sort).
pub fn summarize(hooks: &[Hook]) -> RankingSummary {
    let mut ranked: Vec<&Hook> = hooks.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let top_variants = ranked
        .iter()
        .take(TOP_VARIANT_COUNT)
        .map(|hook| (*hook).clone())
        .collect();

    let average_score = if hooks.is_empty() {
        0.0
    } else {
        hooks.iter().map(|hook| hook.score).sum::<f64>() / hooks.len() as f64
    };

    let mut category_distribution: HashMap<String, usize> = HashMap::new();
    for hook in hooks {
        *category_distribution.entry(hook.category.clone()).or_default() += 1;
    }

    RankingSummary {
        top_variants,
        average_score,
        category_distribution,
    }
}

/// One-line strategy digest stored on the generation record.
pub fn strategy_summary(
    platform: Platform,
    objective: Objective,
    total: usize,
    summary: &RankingSummary,
) -> String {
    let dominant = summary
        .category_distribution
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(category, _)| category.as_str())
        .unwrap_or("general");

    format!(
        "{} hooks for {} targeting {}; dominant angle: {}; average score {:.0}/100",
        total,
        platform.as_str(),
        objective.as_str(),
        dominant,
        summary.average_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hookline_types::RiskFactor;
    use uuid::Uuid;

    fn hook(verbal: &str, category: &str, score: f64) -> Hook {
        Hook {
            id: Uuid::new_v4(),
            verbal_hook: verbal.to_string(),
            visual_hook: "visual".to_string(),
            textual_hook: "textual".to_string(),
            framework: "Open Loop".to_string(),
            psychological_driver: "curiosity".to_string(),
            category: category.to_string(),
            risk_factor: RiskFactor::Low,
            score,
            rationale: String::new(),
            platform_notes: String::new(),
            platform: Platform::Tiktok,
            objective: Objective::Shares,
            topic: "topic".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn top_three_by_score_and_mean() {
        let hooks: Vec<Hook> = [10.0, 90.0, 50.0, 70.0, 30.0, 80.0]
            .iter()
            .enumerate()
            .map(|(i, score)| hook(&format!("h{i}"), "general", *score))
            .collect();

        let summary = summarize(&hooks);
        let top: Vec<f64> = summary.top_variants.iter().map(|h| h.score).collect();
        assert_eq!(top, vec![90.0, 80.0, 70.0]);
        assert_eq!(summary.average_score, 55.0);
    }

    #[test]
    fn ties_keep_generation_order() {
        let hooks = vec![
            hook("first", "general", 80.0),
            hook("second", "general", 80.0),
            hook("third", "general", 90.0),
        ];

        let summary = summarize(&hooks);
        assert_eq!(summary.top_variants[0].verbal_hook, "third");
        assert_eq!(summary.top_variants[1].verbal_hook, "first");
        assert_eq!(summary.top_variants[2].verbal_hook, "second");
    }

    #[test]
    fn counts_categories() {
        let hooks = vec![
            hook("a", "question", 50.0),
            hook("b", "question", 60.0),
            hook("c", "challenge", 70.0),
        ];

        let summary = summarize(&hooks);
        assert_eq!(summary.category_distribution.get("question"), Some(&2));
        assert_eq!(summary.category_distribution.get("challenge"), Some(&1));
    }

    #[test]
    fn empty_set_has_zero_average() {
        let summary = summarize(&[]);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.top_variants.is_empty());
    }

    #[test]
    fn strategy_summary_names_the_dominant_category() {
        let hooks = vec![
            hook("a", "question", 50.0),
            hook("b", "question", 60.0),
            hook("c", "challenge", 70.0),
        ];
        let summary = summarize(&hooks);
        let line = strategy_summary(Platform::Tiktok, Objective::Shares, hooks.len(), &summary);
        assert!(line.contains("question"));
        assert!(line.contains("3 hooks"));
        assert!(line.contains("60/100"));
    }
}
