/// Calculate Simple Moving Average (SMA) over the most recent `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Calculate the fast and slow SMAs in one pass over the same series.
///
/// Either value is `None` when the series is shorter than its window, so a
/// freshly listed pair with fewer candles than the slow window produces
/// `(Some(fast), None)` rather than an error.
pub fn fast_slow_sma(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
) -> (Option<f64>, Option<f64>) {
    (
        calculate_sma(prices, fast_period),
        calculate_sma(prices, slow_period),
    )
}
