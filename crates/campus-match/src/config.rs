use chrono::Duration;

use campus_types::models::{Plan, QuotaKind};

/// Per-window ceilings for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub super_likes: u32,
    pub rewinds: u32,
    pub boosts: u32,
}

impl PlanLimits {
    pub fn get(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::SuperLike => self.super_likes,
            QuotaKind::Rewind => self.rewinds,
            QuotaKind::Boost => self.boosts,
        }
    }
}

/// Quota ceilings and timing. Resets are rolling: a counter that is read at
/// or after its `reset_at` is refilled and re-armed `window` from that read.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    pub free: PlanLimits,
    pub premium: PlanLimits,
    pub window: Duration,
    pub boost_duration: Duration,
}

impl QuotaPolicy {
    pub fn limit(&self, plan: Plan, kind: QuotaKind) -> u32 {
        match plan {
            Plan::Free => self.free.get(kind),
            Plan::Premium => self.premium.get(kind),
        }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free: PlanLimits {
                super_likes: 3,
                rewinds: 1,
                boosts: 0,
            },
            premium: PlanLimits {
                super_likes: 5,
                rewinds: 5,
                boosts: 1,
            },
            window: Duration::hours(24),
            boost_duration: Duration::minutes(30),
        }
    }
}
