use crate::shared::types::{Miner, RenderModel, StatsPayload};

/// Blocks per epoch.
pub const EPOCH_LENGTH: i64 = 30_000;
/// Estimated block interval used for the epoch ETA.
pub const SECONDS_PER_BLOCK: f64 = 14.4;

/// Milliseconds until the next epoch boundary at `height`.
pub fn epoch_offset_ms(height: i64) -> i64 {
    let blocks_left = EPOCH_LENGTH - height.rem_euclid(EPOCH_LENGTH);
    ((blocks_left * 1_000) as f64 * SECONDS_PER_BLOCK).round() as i64
}

pub fn next_epoch(height: i64, now: i64) -> i64 {
    now.saturating_add(epoch_offset_ms(height))
}

/// Ascending by name, byte order (== code point order for UTF-8). `sort_by`
/// is stable, so equal names keep their input order.
pub fn sort_miners(miners: &mut [Miner]) {
    miners.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn prepare(mut stats: StatsPayload) -> RenderModel {
    if let Some(miners) = stats.miners.as_mut() {
        sort_miners(miners);
    }
    let next_epoch = match (stats.height, stats.now) {
        (Some(height), Some(now)) => Some(next_epoch(height, now)),
        _ => None,
    };
    if next_epoch.is_some() {
        // ours wins over one sent by the server
        stats.extra.remove("nextEpoch");
    }
    RenderModel { stats, next_epoch }
}
