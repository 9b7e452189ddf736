//! Breaker blocks: invalidated order blocks that flip role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order_blocks::OrderBlock;
use crate::domain::{Candle, Direction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerBlock {
    pub order_block: OrderBlock,
    /// First later bar whose close crossed the block's invalidation boundary.
    pub invalidation_ts: DateTime<Utc>,
    /// Opposite of the source block's direction.
    pub direction: Direction,
}

/// A bullish block breaks when a later close falls below its low; a bearish
/// block when a later close rises above its high.
pub fn classify_breakers(blocks: &[OrderBlock], candles: &[Candle]) -> Vec<BreakerBlock> {
    blocks
        .iter()
        .filter_map(|block| {
            let invalidated = candles
                .iter()
                .filter(|c| c.timestamp > block.timestamp)
                .find(|c| match block.direction {
                    Direction::Bullish => c.close < block.low,
                    Direction::Bearish => c.close > block.high,
                })?;
            Some(BreakerBlock {
                order_block: block.clone(),
                invalidation_ts: invalidated.timestamp,
                direction: block.direction.opposite(),
            })
        })
        .collect()
}
