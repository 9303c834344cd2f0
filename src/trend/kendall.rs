//! Kendall's tau-b rank correlation between the time index and the values,
//! with its own p-value. Unlike the Mann-Kendall result it is never floored.

use crate::math::special::two_sided_p_value;
use crate::trend::mann_kendall::tie_groups;
use std::cmp::Ordering;

/// Largest sample for which the exact null distribution is used.
const EXACT_MAX_N: usize = 33;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct KendallTau {
    pub tau: f64,
    pub p: f64,
}

impl KendallTau {
    const UNDEFINED: KendallTau = KendallTau {
        tau: f64::NAN,
        p: f64::NAN,
    };
}

/// Tie terms of one variable: tied pairs, `Σ t(t-1)(t-2)` and
/// `Σ t(t-1)(2t+5)` over groups of size `t > 1`.
struct Ties {
    pairs: u64,
    cubic: f64,
    variance: f64,
}

impl Ties {
    fn of(values: &[f64]) -> Ties {
        let mut ties = Ties {
            pairs: 0,
            cubic: 0.0,
            variance: 0.0,
        };
        for t in tie_groups(values).into_iter().filter(|t| *t > 1) {
            ties.pairs += (t * (t - 1) / 2) as u64;
            let t = t as f64;
            ties.cubic += t * (t - 1.0) * (t - 2.0);
            ties.variance += t * (t - 1.0) * (2.0 * t + 5.0);
        }
        ties
    }
}

/// Tau-b of `(x, y)` and its two-sided p-value.
///
/// The p-value is exact for untied samples of up to 33 points and comes
/// from the tie-corrected normal approximation otherwise. Both are NaN when
/// either variable is constant.
pub(crate) fn kendall_tau(x: &[f64], y: &[f64]) -> KendallTau {
    let n = x.len().min(y.len());
    if n < 2 {
        return KendallTau::UNDEFINED;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let (mut concordant, mut discordant) = (0u64, 0u64);
    for i in 0..n {
        for j in i + 1..n {
            match (x[j].partial_cmp(&x[i]), y[j].partial_cmp(&y[i])) {
                (Some(Ordering::Equal), _) | (_, Some(Ordering::Equal)) => {}
                (Some(a), Some(b)) if a == b => concordant += 1,
                (Some(_), Some(_)) => discordant += 1,
                _ => {}
            }
        }
    }

    let total = (n * (n - 1) / 2) as u64;
    let x_ties = Ties::of(x);
    let y_ties = Ties::of(y);
    if x_ties.pairs == total || y_ties.pairs == total {
        return KendallTau::UNDEFINED;
    }

    let s = concordant as f64 - discordant as f64;
    let untied_pairs = (total - x_ties.pairs) as f64 * (total - y_ties.pairs) as f64;
    let tau = (s / untied_pairs.sqrt()).clamp(-1.0, 1.0);

    let untied = x_ties.pairs == 0 && y_ties.pairs == 0;
    let p = if untied && (n <= EXACT_MAX_N || discordant.min(total - discordant) <= 1) {
        exact_p_value(n, discordant)
    } else {
        let m = (n * (n - 1)) as f64;
        let nf = n as f64;
        let var = (m * (2.0 * nf + 5.0) - x_ties.variance - y_ties.variance) / 18.0
            + 2.0 * x_ties.pairs as f64 * y_ties.pairs as f64 / m
            + x_ties.cubic * y_ties.cubic / (9.0 * m * (nf - 2.0));
        two_sided_p_value(s / var.sqrt())
    };
    KendallTau { tau, p }
}

/// Two-sided p-value of `discordant` inversions among `n` untied points,
/// from the exact permutation distribution.
fn exact_p_value(n: usize, discordant: u64) -> f64 {
    let total = (n * (n.saturating_sub(1)) / 2) as u64;
    let c = discordant.min(total - discordant) as usize;
    if n <= 2 {
        return 1.0;
    }
    match c {
        0 if n < 171 => 2.0 / factorial(n),
        1 if n < 172 => 2.0 / factorial(n - 1),
        0 | 1 => 0.0,
        c if 2 * c as u64 == total => 1.0,
        c => {
            // counts[k]: permutations of j elements with k inversions, k <= c.
            // Past 170! the counts are scaled by 2/j! as they are built.
            let mut counts = vec![0.0; c + 1];
            counts[0] = 1.0;
            counts[1] = 1.0;
            let large = n >= 171;
            for j in 3..=n {
                let mut acc = 0.0;
                for count in counts.iter_mut() {
                    acc += *count;
                    *count = if large { acc / j as f64 } else { acc };
                }
                if j <= c {
                    for k in (j..=c).rev() {
                        counts[k] -= counts[k - j];
                    }
                }
            }
            let sum: f64 = counts.iter().sum();
            let p = if large { sum } else { 2.0 * sum / factorial(n) };
            p.clamp(0.0, 1.0)
        }
    }
}

fn factorial(n: usize) -> f64 {
    (2..=n).map(|k| k as f64).product()
}
