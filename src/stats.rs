use anyhow::{anyhow, Result};

//https://rust-lang-nursery.github.io/rust-cookbook/science/mathematics/statistics.html
pub fn mean(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f32>() / data.len() as f32
}

pub fn std_deviation(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let data_mean = mean(data);
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - (*value);
            diff * diff
        })
        .sum::<f32>()
        / data.len() as f32;
    variance.sqrt()
}

/// Generalized-mean norm: `(mean(|v|^p))^(1/p)`.
///
/// This is the reference definition of the robust norm statistic used by the
/// gradient-sparsity features. An all-zero sample has norm 0 for any p > 0.
pub fn mean_norm(data: &[f32], p: f32) -> Result<f64> {
    if data.is_empty() {
        return Err(anyhow!("mean_norm of empty sample"));
    }
    if p <= 0.0 {
        return Err(anyhow!("mean_norm exponent must be positive, got {}", p));
    }
    let p = p as f64;
    let acc: f64 = data
        .iter()
        .map(|v| (v.abs() as f64).powf(p))
        .sum::<f64>()
        / data.len() as f64;
    Ok(acc.powf(1.0 / p))
}

/// Robust spread statistic: the population standard deviation of the sorted
/// sample read at the quantile grid p, 2p, ..., 1.0.
///
/// Reading only a coarse quantile grid makes the spread insensitive to a
/// small number of outliers at either tail.
pub fn quantile_spread(data: &[f32], p: f32) -> Result<f64> {
    if data.is_empty() {
        return Err(anyhow!("quantile_spread of empty sample"));
    }
    if p <= 0.0 || p > 1.0 {
        return Err(anyhow!("quantile_spread grid must be in (0, 1], got {}", p));
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let steps = (1.0 / p).round().max(1.0) as usize;
    let mut samples: Vec<f32> = Vec::with_capacity(steps);
    for i in 1..=steps {
        let q = i as f32 * p;
        let idx = ((q * sorted.len() as f32).ceil() as usize).clamp(1, sorted.len()) - 1;
        samples.push(sorted[idx]);
    }

    Ok(std_deviation(&samples) as f64)
}
