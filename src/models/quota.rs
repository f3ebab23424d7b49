use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage counters for one generation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaCategory {
    pub used: u32,
    pub remaining: u32,
    pub limit: u32,
}

impl QuotaCategory {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Share of the limit already used, 0-100
    pub fn usage_percentage(&self) -> u8 {
        if self.limit == 0 {
            return 100;
        }
        let pct = (f64::from(self.used) / f64::from(self.limit) * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Which quota a generation draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Ideas,
    Posts,
}

/// Monthly quota snapshot returned by the quota-check operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub ideas: QuotaCategory,
    pub posts: QuotaCategory,
    pub resets_at: DateTime<Utc>,
}

impl QuotaInfo {
    pub fn category(&self, kind: QuotaKind) -> &QuotaCategory {
        match kind {
            QuotaKind::Ideas => &self.ideas,
            QuotaKind::Posts => &self.posts,
        }
    }

    /// Whether `needed` more generations fit in the remaining quota
    pub fn can_generate(&self, kind: QuotaKind, needed: u32) -> bool {
        self.category(kind).remaining >= needed
    }
}
