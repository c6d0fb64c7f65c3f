use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::shared::decode::{take_flag, take_int, take_list, take_name, take_string};

/// Body of `GET /stats`. Every field may be missing. Known fields are read
/// leniently: a value that doesn't fit its typed slot stays in `extra`
/// instead of failing the payload, and unknown fields land there too.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<i64>, // unix millis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miners: Option<Vec<Miner>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashrate: Option<i64>,
    #[serde(rename = "hashrate24h", skip_serializing_if = "Option::is_none")]
    pub hashrate_24h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_miners: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_online: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_blocks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_blocks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    // big integer on the wire, kept as raw JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstreams: Option<Vec<Upstream>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatsPayload {
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        Self {
            height: take_int(&mut map, "height"),
            now: take_int(&mut map, "now"),
            miners: take_list(&mut map, "miners", Miner::from_value),
            hashrate: take_int(&mut map, "hashrate"),
            hashrate_24h: take_int(&mut map, "hashrate24h"),
            total_miners: take_int(&mut map, "totalMiners"),
            total_online: take_int(&mut map, "totalOnline"),
            timed_out: take_int(&mut map, "timedOut"),
            valid_blocks: take_int(&mut map, "validBlocks"),
            invalid_blocks: take_int(&mut map, "invalidBlocks"),
            url: take_string(&mut map, "url"),
            diff: map.remove("diff").filter(|v| !v.is_null()),
            upstreams: take_list(&mut map, "upstreams", Upstream::from_value),
            extra: map,
        }
    }
}

/// Anything but a JSON object is rejected; inside the object nothing is.
impl<'de> Deserialize<'de> for StatsPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_map)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Miner {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashrate: Option<i64>,
    #[serde(rename = "hashrate24h", skip_serializing_if = "Option::is_none")]
    pub hashrate_24h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_beat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_shares: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_shares: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_blocks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_blocks: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub warning: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub timeout: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Miner {
    /// Non-object entries become a nameless miner rather than an error.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        Self {
            name: take_name(&mut map, "name"),
            hashrate: take_int(&mut map, "hashrate"),
            hashrate_24h: take_int(&mut map, "hashrate24h"),
            last_beat: take_int(&mut map, "lastBeat"),
            valid_shares: take_int(&mut map, "validShares"),
            invalid_shares: take_int(&mut map, "invalidShares"),
            valid_blocks: take_int(&mut map, "validBlocks"),
            invalid_blocks: take_int(&mut map, "invalidBlocks"),
            ip: take_string(&mut map, "ip"),
            warning: take_flag(&mut map, "warning"),
            timeout: take_flag(&mut map, "timeout"),
            extra: map,
        }
    }
}

impl<'de> Deserialize<'de> for Miner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Upstream {
    pub name: String,
    pub url: String,
    pub sick: bool,
    pub current: bool,
}

impl Upstream {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        Self {
            name: take_name(&mut map, "name"),
            url: take_name(&mut map, "url"),
            sick: take_flag(&mut map, "sick"),
            current: take_flag(&mut map, "current"),
        }
    }
}

impl<'de> Deserialize<'de> for Upstream {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// What the template sees: the payload with miners sorted and, when both
/// `height` and `now` are known, the estimated next epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    #[serde(flatten)]
    pub stats: StatsPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_epoch: Option<i64>,
}
