use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod armory {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FirearmNew {
        pub name: String,
        pub caliber: String,
        /// Rounds fired before tracking began. Defaults to 0.
        pub seed_rounds: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FirearmView {
        pub id: Uuid,
        pub name: String,
        pub caliber: String,
        /// Cumulative rounds fired, seed included.
        pub rounds_fired: i64,
        pub seed_rounds: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FirearmsResponse {
        pub firearms: Vec<FirearmView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LotNew {
        pub label: String,
        pub caliber: String,
        /// Rounds purchased. Must be > 0.
        pub quantity: i64,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub purchased_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LotView {
        pub id: Uuid,
        pub label: String,
        pub caliber: String,
        pub on_hand: i64,
        pub purchased: i64,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub purchased_at: DateTime<FixedOffset>,
    }

    /// Query parameters for listing lots.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LotQuery {
        /// Restrict to one caliber (matched case-insensitively).
        pub caliber: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LotsResponse {
        pub lots: Vec<LotView>,
    }

    /// Result of a recount: how many stored aggregates had drifted and were
    /// rewritten.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecountResponse {
        pub firearms_adjusted: u64,
        pub lots_adjusted: u64,
    }
}

pub mod session {
    use std::collections::BTreeMap;

    use super::*;

    /// One slot's consumption in a new or edited session.
    ///
    /// Exactly one source should be given. When both are present,
    /// `ammunition_id` wins: the named lot is debited with no substitution.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsageNew {
        /// Pin a specific ammunition lot.
        pub ammunition_id: Option<Uuid>,
        /// Draw from this caliber's stock, oldest lot first.
        pub caliber: Option<String>,
        pub rounds: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionNew {
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub location: String,
        pub notes: Option<String>,
        /// Keyed by slot: a firearm id, or `borrowed-<tag>` for an untracked
        /// firearm.
        pub usage: BTreeMap<String, UsageNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionCreated {
        pub id: Uuid,
    }

    /// One failed pre-commit check.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct IssueView {
        /// Offending request field, e.g. `location` or `usage.<slot>`.
        pub field: String,
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionCheckResponse {
        pub issues: Vec<IssueView>,
    }

    /// Query parameters for listing sessions (newest first).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SessionQuery {
        /// Only sessions strictly before this instant.
        pub before: Option<DateTime<FixedOffset>>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionView {
        pub id: Uuid,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub location: String,
        pub notes: Option<String>,
        pub rounds_total: i64,
    }

    /// One realized usage row: which lot covered how many rounds of a slot.
    /// A caliber request that spilled over several lots shows up as several
    /// rows with the same slot.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsageView {
        pub slot: String,
        pub ammunition_id: Uuid,
        pub rounds: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionDetailResponse {
        pub session: SessionView,
        pub usage: Vec<UsageView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionListResponse {
        pub sessions: Vec<SessionView>,
    }
}
