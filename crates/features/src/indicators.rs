//! Rolling indicator math over f64 slices.
//!
//! Every function reads only the tail of its input slice; callers pass the
//! full trailing window and the period. All return NaN when the window is
//! degenerate, which the builder converts into a skip for the instrument.

/// Simple moving average of the last `period` values
pub fn sma(values: &[f64], period: usize) -> f64 {
    if values.len() < period || period == 0 {
        return f64::NAN;
    }
    let tail = &values[values.len() - period..];
    tail.iter().sum::<f64>() / period as f64
}

/// Sample standard deviation of the last `period` values (ddof = 1)
pub fn stddev(values: &[f64], period: usize) -> f64 {
    if values.len() < period || period < 2 {
        return f64::NAN;
    }
    let tail = &values[values.len() - period..];
    let mean = tail.iter().sum::<f64>() / period as f64;
    let var = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
    var.sqrt()
}

/// n-bar close-to-close return
pub fn trailing_return(closes: &[f64], n: usize) -> f64 {
    if closes.len() < n + 1 {
        return f64::NAN;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - n];
    if base == 0.0 {
        return f64::NAN;
    }
    last / base - 1.0
}

/// RSI over the last `period` deltas, rolling-mean gain/loss form
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if closes.len() < period + 1 || period == 0 {
        return f64::NAN;
    }
    let tail = &closes[closes.len() - period - 1..];
    let mut gain = 0.0;
    let mut loss = 0.0;
    for pair in tail.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
    }
    if loss == 0.0 {
        // No down moves in the window: fully overbought
        return 100.0;
    }
    let rs = gain / loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Average true range over the last `period` bars.
/// `highs`/`lows`/`closes` are parallel; needs one extra close for the
/// first bar's previous-close gap.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let len = closes.len();
    if len < period + 1 || highs.len() != len || lows.len() != len || period == 0 {
        return f64::NAN;
    }
    let mut sum = 0.0;
    for i in len - period..len {
        let prev_close = closes[i - 1];
        let tr = (highs[i] - lows[i])
            .max((highs[i] - prev_close).abs())
            .max((lows[i] - prev_close).abs());
        sum += tr;
    }
    sum / period as f64
}

/// Volume-weighted average price over the last `period` bars
pub fn vwap(closes: &[f64], volumes: &[f64], period: usize) -> f64 {
    let len = closes.len();
    if len < period || volumes.len() != len || period == 0 {
        return f64::NAN;
    }
    let mut pv = 0.0;
    let mut vol = 0.0;
    for i in len - period..len {
        pv += closes[i] * volumes[i];
        vol += volumes[i];
    }
    if vol == 0.0 {
        return f64::NAN;
    }
    pv / vol
}
