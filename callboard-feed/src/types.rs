use serde::{Deserialize, Serialize};

/// Rendered when the endpoint omits a token's symbol.
pub const UNKNOWN_SYMBOL: &str = "Unknown";
/// Rendered when the endpoint omits a token's address.
pub const UNKNOWN_ADDRESS: &str = "No Address Provided";

/// One element of the "most called" response, as sent on the wire.
///
/// Every field is optional: the endpoint has no published schema, and a
/// record with gaps is still rankable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawToken {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub channel_calls: Option<Vec<ChannelCall>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelCall {
    /// Channel win rate in percent; absent counts as 0.
    #[serde(default)]
    pub win_rate: Option<f64>,
}

/// A token that made the ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedToken {
    pub symbol: String,
    pub address: String,
    /// Channel calls whose win rate is above the threshold.
    pub filtered_calls: usize,
}

impl RankedToken {
    pub fn new(
        symbol: impl Into<String>,
        address: impl Into<String>,
        filtered_calls: usize,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            address: address.into(),
            filtered_calls,
        }
    }
}
