use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

/// One chart point of the public history: a round and each team's score in it.
///
/// Values are per-round scores, not running totals, so consecutive points are
/// not monotonic. Team names are flattened into the object next to `time`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    /// Display name of the round.
    pub time: String,
    pub is_revealed: bool,
    #[serde(flatten)]
    pub scores: IndexMap<String, i64>,
}
