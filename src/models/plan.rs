// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription plan catalogue and per-tier limits.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::SubscriptionTier;

/// Usage limits for a tier. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlanLimits {
    pub max_skills: Option<usize>,
    pub max_goals: Option<usize>,
}

impl PlanLimits {
    /// Whether one more skill fits, given how many exist.
    pub fn allows_another_skill(&self, current: usize) -> bool {
        self.max_skills.map(|max| current < max).unwrap_or(true)
    }

    /// Whether one more goal fits, given how many exist.
    pub fn allows_another_goal(&self, current: usize) -> bool {
        self.max_goals.map(|max| current < max).unwrap_or(true)
    }
}

/// A purchasable plan as shown on the pricing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Plan {
    pub tier: SubscriptionTier,
    pub name: String,
    pub tagline: String,
    /// Monthly price in US cents
    pub price_cents: u32,
    pub limits: PlanLimits,
    pub features: Vec<String>,
}

impl SubscriptionTier {
    pub fn limits(self) -> PlanLimits {
        match self {
            SubscriptionTier::Free => PlanLimits {
                max_skills: Some(5),
                max_goals: Some(3),
            },
            SubscriptionTier::Premium | SubscriptionTier::Pro => PlanLimits {
                max_skills: None,
                max_goals: None,
            },
        }
    }
}

impl Plan {
    /// The full catalogue, cheapest first.
    pub fn catalogue() -> Vec<Plan> {
        [
            SubscriptionTier::Free,
            SubscriptionTier::Premium,
            SubscriptionTier::Pro,
        ]
        .into_iter()
        .map(Plan::for_tier)
        .collect()
    }

    pub fn for_tier(tier: SubscriptionTier) -> Plan {
        let (name, tagline, price_cents, features): (&str, &str, u32, &[&str]) = match tier {
            SubscriptionTier::Free => (
                "Free",
                "Get started with basic features",
                0,
                &[
                    "Track up to 5 skills",
                    "Basic progress tracking",
                    "Set up to 3 goals",
                ],
            ),
            SubscriptionTier::Premium => (
                "Premium",
                "Most popular choice",
                999,
                &[
                    "Track unlimited skills",
                    "Advanced progress tracking",
                    "Set unlimited goals",
                    "Advanced analytics",
                    "Priority support",
                ],
            ),
            SubscriptionTier::Pro => (
                "Pro",
                "For serious learners",
                1999,
                &[
                    "Everything in Premium",
                    "AI-powered recommendations",
                    "Custom learning paths",
                    "Expert community access",
                    "Priority support",
                ],
            ),
        };

        Plan {
            tier,
            name: name.to_string(),
            tagline: tagline.to_string(),
            price_cents,
            limits: tier.limits(),
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }
}
