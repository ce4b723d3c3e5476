pub mod api;
pub mod error;
pub mod models;

pub use api::{
    AddFavorite, Decision, GenerationRequest, GenerationSuccess, ModelSelection, RankingSummary,
};
pub use error::GenerateError;
pub use models::{
    FavoriteHook, GenerationRecord, Hook, ModelClass, Objective, Personalization, Platform,
    RiskFactor, SafetyLevel, SubscriptionStatus, Tier, UserEntitlement,
};
