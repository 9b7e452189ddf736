//! Delta-volume proxy and buy pressure from close-to-close direction.

use crate::domain::Candle;
use crate::stats::rolling_sum;

pub const BUY_PRESSURE_WINDOW: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct MicrostructureSnapshot {
    /// sign(close change) × volume; 0 on the first bar.
    pub delta_volume: Vec<f64>,
    /// Rolling delta sum over rolling volume sum, in [-1, 1]; 0 when undefined.
    pub buy_pressure: Vec<f64>,
}

pub fn compute_microstructure(candles: &[Candle]) -> MicrostructureSnapshot {
    let n = candles.len();
    let volume: Vec<f64> = candles
        .iter()
        .map(|c| if c.volume.is_nan() { 0.0 } else { c.volume })
        .collect();

    let mut delta_volume = vec![0.0; n];
    for i in 1..n {
        let change = candles[i].close - candles[i - 1].close;
        let sign = if change > 0.0 {
            1.0
        } else if change < 0.0 {
            -1.0
        } else {
            0.0
        };
        delta_volume[i] = sign * volume[i];
    }

    let delta_sum = rolling_sum(&delta_volume, BUY_PRESSURE_WINDOW);
    let volume_sum = rolling_sum(&volume, BUY_PRESSURE_WINDOW);
    let buy_pressure = delta_sum
        .iter()
        .zip(&volume_sum)
        .map(|(d, v)| {
            let ratio = d / v;
            if *v == 0.0 || ratio.is_nan() {
                0.0
            } else {
                ratio
            }
        })
        .collect();

    MicrostructureSnapshot {
        delta_volume,
        buy_pressure,
    }
}
