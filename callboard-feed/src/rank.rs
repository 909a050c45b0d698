use crate::types::{RankedToken, RawToken, UNKNOWN_ADDRESS, UNKNOWN_SYMBOL};

/// Calls from channels at or below this win rate (percent) are ignored.
pub const WIN_RATE_THRESHOLD: f64 = 30.0;
/// Length of the ranked list.
pub const TOP_N: usize = 5;

/// Count the calls from channels whose win rate is above the threshold.
pub fn filtered_calls(token: &RawToken) -> usize {
    token
        .channel_calls
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|call| call.win_rate.unwrap_or(0.0) > WIN_RATE_THRESHOLD)
        .count()
}

/// Rank raw tokens: drop those without a qualifying call, order by qualifying
/// calls (descending, ties keep input order), keep the top [`TOP_N`].
pub fn rank_tokens(raw: Vec<RawToken>) -> Vec<RankedToken> {
    let mut ranked: Vec<RankedToken> = raw
        .into_iter()
        .filter_map(|token| {
            let calls = filtered_calls(&token);
            (calls > 0).then(|| RankedToken {
                symbol: token.symbol.unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
                address: token.address.unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
                filtered_calls: calls,
            })
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.filtered_calls.cmp(&a.filtered_calls));
    ranked.truncate(TOP_N);
    ranked
}
