//! Static model routing for rewrite requests.
//!
//! Large inputs of high-risk kinds go to the specialized model, everything
//! else to the preferred model. Only the preferred model has a fallback.

use crate::domain::models::{AiConfig, ModelOverrides, TransformationKind};

/// Which configured model a request was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Preferred,
    Specialized,
    Fallback,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preferred => "preferred",
            Self::Specialized => "specialized",
            Self::Fallback => "fallback",
        }
    }
}

/// Result of a routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub model: String,
    pub tier: ModelTier,
}

impl ModelChoice {
    /// Whether a disappointing reply from this model may be retried on the fallback model.
    pub fn may_fall_back(&self) -> bool {
        self.tier == ModelTier::Preferred
    }
}

/// Model names for one job, after applying per-job overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    preferred: String,
    fallback: String,
    specialized: String,
    specialized_threshold_chars: usize,
}

impl ModelSelector {
    pub fn new(
        preferred: impl Into<String>,
        fallback: impl Into<String>,
        specialized: impl Into<String>,
        specialized_threshold_chars: usize,
    ) -> Self {
        Self {
            preferred: preferred.into(),
            fallback: fallback.into(),
            specialized: specialized.into(),
            specialized_threshold_chars,
        }
    }

    pub fn from_config(ai: &AiConfig, overrides: &ModelOverrides) -> Self {
        let pick = |over: &Option<String>, default: &str| {
            over.as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            preferred: pick(&overrides.preferred, &ai.preferred_model),
            fallback: pick(&overrides.fallback, &ai.fallback_model),
            specialized: pick(&overrides.specialized, &ai.specialized_model),
            specialized_threshold_chars: ai.specialized_threshold_chars,
        }
    }

    pub fn select(&self, kind: TransformationKind, code: &str) -> ModelChoice {
        if kind.is_high_risk() && code.chars().count() > self.specialized_threshold_chars {
            return ModelChoice {
                model: self.specialized.clone(),
                tier: ModelTier::Specialized,
            };
        }
        ModelChoice {
            model: self.preferred.clone(),
            tier: ModelTier::Preferred,
        }
    }

    pub fn fallback(&self) -> ModelChoice {
        ModelChoice {
            model: self.fallback.clone(),
            tier: ModelTier::Fallback,
        }
    }
}
