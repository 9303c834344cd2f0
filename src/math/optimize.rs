//! Derivative-free minimisation used by the maximum-likelihood fits.

use log::debug;
use ordered_float::OrderedFloat;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Result of a [`NelderMead::minimize`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder–Mead downhill simplex with the standard coefficients.
///
/// Non-finite objective values (outside a distribution's support, say) are
/// treated as `+inf`, so the simplex is pushed back into the feasible region.
/// The search is fully deterministic: ties between vertices keep their
/// previous order.
#[derive(Debug, Clone, Copy)]
pub struct NelderMead {
    pub max_iterations: usize,
    pub x_tolerance: f64,
    pub f_tolerance: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            x_tolerance: 1e-10,
            f_tolerance: 1e-12,
        }
    }
}

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

impl NelderMead {
    /// Minimises `objective` starting from `start`, with the initial simplex
    /// spanned by `start + steps[i] * e_i`.
    pub fn minimize<F>(&self, objective: F, start: &[f64], steps: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let dim = start.len();
        let eval = |p: &[f64]| {
            let v = objective(p);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };

        let mut simplex: Vec<Vertex> = Vec::with_capacity(dim + 1);
        simplex.push(Vertex {
            point: start.to_vec(),
            value: eval(start),
        });
        for i in 0..dim {
            let mut point = start.to_vec();
            point[i] += steps.get(i).copied().unwrap_or(0.1);
            let value = eval(&point);
            simplex.push(Vertex { point, value });
        }

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.max_iterations {
            simplex.sort_by_key(|v| OrderedFloat(v.value));
            if self.has_converged(&simplex) {
                converged = true;
                break;
            }
            iterations += 1;

            let worst = dim;
            let centroid: Vec<f64> = (0..dim)
                .map(|j| simplex[..worst].iter().map(|v| v.point[j]).sum::<f64>() / dim as f64)
                .collect();
            let towards = |from: &[f64], coefficient: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, x)| c + coefficient * (c - x))
                    .collect()
            };

            let reflected = towards(&simplex[worst].point, REFLECTION);
            let f_reflected = eval(&reflected);

            if f_reflected < simplex[0].value {
                let expanded = towards(&simplex[worst].point, REFLECTION * EXPANSION);
                let f_expanded = eval(&expanded);
                simplex[worst] = if f_expanded < f_reflected {
                    Vertex { point: expanded, value: f_expanded }
                } else {
                    Vertex { point: reflected, value: f_reflected }
                };
                continue;
            }

            if f_reflected < simplex[worst - 1].value {
                simplex[worst] = Vertex { point: reflected, value: f_reflected };
                continue;
            }

            if f_reflected < simplex[worst].value {
                let contracted = towards(&simplex[worst].point, REFLECTION * CONTRACTION);
                let f_contracted = eval(&contracted);
                if f_contracted <= f_reflected {
                    simplex[worst] = Vertex { point: contracted, value: f_contracted };
                    continue;
                }
            } else {
                let contracted = towards(&simplex[worst].point, -CONTRACTION);
                let f_contracted = eval(&contracted);
                if f_contracted < simplex[worst].value {
                    simplex[worst] = Vertex { point: contracted, value: f_contracted };
                    continue;
                }
            }

            let best = simplex[0].point.clone();
            for vertex in simplex.iter_mut().skip(1) {
                for (x, b) in vertex.point.iter_mut().zip(&best) {
                    *x = b + SHRINK * (*x - b);
                }
                vertex.value = eval(&vertex.point);
            }
        }

        simplex.sort_by_key(|v| OrderedFloat(v.value));
        debug!(
            "Nelder-Mead finished after {} iterations (converged: {}, value: {})",
            iterations, converged, simplex[0].value
        );
        let best = simplex.swap_remove(0);
        Minimum {
            point: best.point,
            value: best.value,
            iterations,
            converged,
        }
    }

    fn has_converged(&self, simplex: &[Vertex]) -> bool {
        let best = &simplex[0];
        if !best.value.is_finite() {
            return false;
        }
        simplex[1..].iter().all(|v| {
            (v.value - best.value).abs() <= self.f_tolerance
                && v
                    .point
                    .iter()
                    .zip(&best.point)
                    .all(|(x, b)| (x - b).abs() <= self.x_tolerance)
        })
    }
}
