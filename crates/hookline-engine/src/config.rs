use std::env;

use hookline_types::Tier;

/// Per-tier generation caps and the rolling-window length. These numbers are
/// product policy, so they live here as configuration with env overrides
/// rather than as constants at the call sites.
#[derive(Debug, Clone)]
pub struct PolicyLimits {
    pub free_monthly_draft: i64,
    pub starter_monthly_premium: i64,
    pub creator_monthly_premium: i64,
    pub pro_monthly_premium: i64,
    /// `None` means unlimited.
    pub teams_monthly_premium: Option<i64>,
    pub reset_window_days: i64,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self {
            free_monthly_draft: 5,
            starter_monthly_premium: 100,
            creator_monthly_premium: 200,
            pro_monthly_premium: 400,
            teams_monthly_premium: None,
            reset_window_days: 30,
        }
    }
}

impl PolicyLimits {
    /// Monthly premium cap for a paid tier. Free is handled by the policy
    /// before this is consulted.
    pub fn premium_cap(&self, tier: Tier) -> Option<i64> {
        match tier {
            Tier::Free => Some(0),
            Tier::Starter => Some(self.starter_monthly_premium),
            Tier::Creator => Some(self.creator_monthly_premium),
            Tier::Pro => Some(self.pro_monthly_premium),
            Tier::Teams => self.teams_monthly_premium,
        }
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(self.reset_window_days)
    }

    pub fn window_secs(&self) -> i64 {
        self.reset_window_days * 24 * 3600
    }

    pub fn apply_env_overrides(&mut self) {
        override_i64(&mut self.free_monthly_draft, "HOOKLINE_FREE_DRAFT_LIMIT");
        override_i64(
            &mut self.starter_monthly_premium,
            "HOOKLINE_STARTER_PREMIUM_LIMIT",
        );
        override_i64(
            &mut self.creator_monthly_premium,
            "HOOKLINE_CREATOR_PREMIUM_LIMIT",
        );
        override_i64(&mut self.pro_monthly_premium, "HOOKLINE_PRO_PREMIUM_LIMIT");
        override_i64(&mut self.reset_window_days, "HOOKLINE_RESET_WINDOW_DAYS");
    }
}

fn override_i64(slot: &mut i64, var: &str) {
    if let Ok(value) = env::var(var) {
        if let Ok(parsed) = value.parse::<i64>() {
            *slot = parsed;
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub limits: PolicyLimits,
    pub hooks_per_generation: usize,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: PolicyLimits::default(),
            hooks_per_generation: 6,
            temperature: 0.8,
            max_tokens: 2048,
        }
    }
}
