use hookline_types::{ModelClass, ModelSelection, UserEntitlement};

/// Resolve the model class a generation will actually use. Runs strictly
/// after the entitlement policy has approved the request; the resolution
/// rules mirror that policy so the two can never disagree.
pub fn select(entitlement: &UserEntitlement, requested: Option<ModelClass>) -> ModelSelection {
    if !entitlement.on_subscription() {
        let was_downgraded = requested == Some(ModelClass::Premium);
        let justification = if was_downgraded {
            "premium requires an active subscription; serving the draft model".to_string()
        } else {
            "free tier uses the draft model".to_string()
        };
        return ModelSelection {
            model_class: ModelClass::Draft,
            justification,
            was_downgraded,
        };
    }

    match requested {
        Some(ModelClass::Draft) => ModelSelection {
            model_class: ModelClass::Draft,
            justification: "draft model requested".to_string(),
            was_downgraded: false,
        },
        Some(ModelClass::Premium) => ModelSelection {
            model_class: ModelClass::Premium,
            justification: "premium model requested".to_string(),
            was_downgraded: false,
        },
        None => ModelSelection {
            model_class: ModelClass::Premium,
            justification: "active subscription defaults to the premium model".to_string(),
            was_downgraded: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hookline_types::{Personalization, SubscriptionStatus, Tier};

    fn entitlement(tier: Tier, status: SubscriptionStatus) -> UserEntitlement {
        UserEntitlement {
            user_id: "u1".to_string(),
            tier,
            status,
            free_credits: 5,
            used_credits: 0,
            draft_generations_used: 0,
            pro_generations_used: 0,
            period_reset_at: Utc::now(),
            personalization: Personalization::default(),
        }
    }

    #[test]
    fn free_tier_premium_request_downgrades() {
        let ent = entitlement(Tier::Free, SubscriptionStatus::None);
        let selection = select(&ent, Some(ModelClass::Premium));
        assert_eq!(selection.model_class, ModelClass::Draft);
        assert!(selection.was_downgraded);
    }

    #[test]
    fn free_tier_draft_request_is_not_a_downgrade() {
        let ent = entitlement(Tier::Free, SubscriptionStatus::None);
        let selection = select(&ent, Some(ModelClass::Draft));
        assert_eq!(selection.model_class, ModelClass::Draft);
        assert!(!selection.was_downgraded);

        let selection = select(&ent, None);
        assert_eq!(selection.model_class, ModelClass::Draft);
        assert!(!selection.was_downgraded);
    }

    #[test]
    fn paid_tier_honors_explicit_request() {
        let ent = entitlement(Tier::Creator, SubscriptionStatus::Active);
        let selection = select(&ent, Some(ModelClass::Draft));
        assert_eq!(selection.model_class, ModelClass::Draft);
        assert!(!selection.was_downgraded);
    }

    #[test]
    fn paid_tier_defaults_to_premium() {
        let ent = entitlement(Tier::Creator, SubscriptionStatus::Trialing);
        let selection = select(&ent, None);
        assert_eq!(selection.model_class, ModelClass::Premium);
        assert!(!selection.was_downgraded);
    }
}
