//! Simulated-annealing warm start.
//!
//! A cheap stochastic search over single-bit flips that finds a good model
//! quickly. Its result seeds the branch-and-bound root so the incumbent is
//! strong from the first node on, which lets the exact search prune earlier.
//!
//! Schedule:
//!
//! - the temperature starts at [`START_TEMPERATURE`] and doubles after every
//!   sweep (`M` steps) until the acceptance rate has exceeded 50% once;
//! - after that it halves at the end of every block of `M * sweeps` steps;
//! - the run stops when a block accepts nothing, or the temperature drops below
//!   [`MIN_TEMPERATURE`];
//! - a first block in which no candidate could be fitted ends the run with a
//!   data error.
//!
//! Models with `k >= n / 2` features are never visited. Flipping off the last
//! feature re-evaluates the current model instead.

use nalgebra::DVector;
use rand::Rng;
use tracing::debug;

use crate::domain::DesignMatrix;
use crate::error::AppError;
use crate::math::Criterion;
use crate::models::Model;
use crate::search::fitter::fit_subset;

pub const START_TEMPERATURE: f64 = 500.0;
pub const MIN_TEMPERATURE: f64 = 1e-12;

/// Best model visited by the annealer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealResult {
    pub selected: Vec<usize>,
    pub coeff: Vec<f64>,
    /// `-criterion`, the same sign convention as the highscore list.
    pub score: f64,
}

impl AnnealResult {
    /// The result as a root model for a search over `num_features` columns.
    pub fn to_model(&self, num_features: usize) -> Option<Model> {
        Model::from_selected(&self.selected, num_features)
    }
}

struct State {
    model: Model,
    coeff: Vec<f64>,
    cost: f64,
}

pub fn anneal<X: DesignMatrix + ?Sized, R: Rng>(
    x: &X,
    y: &[f64],
    sweeps: usize,
    criterion: Criterion,
    rng: &mut R,
) -> Result<AnnealResult, AppError> {
    let (rows, m) = x.dims();
    if m == 0 {
        return Err(AppError::config("Annealing needs at least one feature."));
    }
    if sweeps == 0 {
        return Err(AppError::config("Annealing needs at least one sweep."));
    }
    if y.len() != rows {
        return Err(AppError::config(format!(
            "Target has {} values but the design matrix has {rows} rows.",
            y.len()
        )));
    }
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(AppError::data(format!("Target value in row {row} is not finite.")));
    }
    let y = DVector::from_column_slice(y);
    let max_features = rows / 2;

    let mut model = Model::empty(m);
    model.set(0, true);
    let mut current = State {
        model,
        coeff: Vec::new(),
        cost: f64::INFINITY,
    };
    let mut best: Option<State> = None;

    let mut temperature = START_TEMPERATURE;
    let mut num_accept = 0usize;
    let mut num_steps = 0usize;
    let mut reached_half = false;

    loop {
        let index = rng.gen_range(0..m);
        let mut candidate = current.model.clone();
        candidate.flip(index);
        let k = candidate.num_features();
        if k == 0 {
            candidate = current.model.clone();
        } else if k >= max_features {
            continue;
        }

        let k = candidate.num_features();
        let fit = fit_subset(x, &y, &candidate);
        let accepted = match fit {
            Some(fit) => {
                let cost = criterion.eval(k, rows, fit.rss);
                let u: f64 = rng.r#gen();
                if cost < current.cost || (-(cost - current.cost) / temperature).exp() > u {
                    current = State {
                        model: candidate,
                        coeff: fit.coeff,
                        cost,
                    };
                    if best.as_ref().is_none_or(|b| cost < b.cost) {
                        best = Some(State {
                            model: current.model.clone(),
                            coeff: current.coeff.clone(),
                            cost,
                        });
                    }
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if accepted {
            num_accept += 1;
        }
        num_steps += 1;

        if num_steps % m == 0 {
            reached_half = reached_half || num_accept as f64 / num_steps as f64 > 0.5;
            if !reached_half {
                temperature *= 2.0;
            }
        }

        if num_steps >= m * sweeps {
            let rate = num_accept as f64 / num_steps as f64;
            if num_accept == 0 && (reached_half || best.is_none()) {
                break;
            }
            num_accept = 0;
            num_steps = 0;
            if reached_half {
                temperature *= 0.5;
            }
            if temperature < MIN_TEMPERATURE {
                break;
            }
            debug!(temperature, acceptance = rate, cost = current.cost, "annealing block done");
        }
    }

    let best = best.ok_or_else(|| AppError::data("Annealing could not fit any model."))?;
    Ok(AnnealResult {
        selected: best.model.selected(),
        coeff: best.coeff,
        score: -best.cost,
    })
}
