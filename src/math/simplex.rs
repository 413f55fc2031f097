//! Derivative-free minimization with the Nelder–Mead simplex.
//!
//! Thin wrapper over `argmin`'s `NelderMead`. The starting simplex is the
//! initial guess plus one vertex per dimension with that coordinate scaled by
//! 1.05 (or set to 0.00025 when it is zero).
//!
//! The cost-spread test alone can stop on a simplex that straddles the
//! minimum with equal costs, so the search restarts from the best vertex
//! until a restart no longer moves it.

use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::neldermead::NelderMead;

use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    /// Iteration cap per dimension.
    pub max_iters_per_dim: u64,
    /// Stop once the standard deviation of the simplex costs drops below this.
    pub sd_tolerance: f64,
    /// A restart that moves no coordinate by more than this...
    pub x_tolerance: f64,
    /// ...and lowers the cost by no more than this ends the search.
    pub f_tolerance: f64,
    pub max_restarts: usize,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iters_per_dim: 500,
            sd_tolerance: 1e-12,
            x_tolerance: 1e-6,
            f_tolerance: 1e-12,
            max_restarts: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub params: Vec<f64>,
    pub cost: f64,
    pub iterations: u64,
}

struct Objective<F> {
    f: F,
}

impl<F> CostFunction for Objective<F>
where
    F: Fn(&[f64]) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        let v = (self.f)(param);
        // NaN breaks the simplex ordering; treat it as an infinitely bad vertex.
        Ok(if v.is_nan() { f64::INFINITY } else { v })
    }
}

/// Minimize `f` starting from `initial`.
pub fn minimize<F>(f: F, initial: &[f64], opts: &SimplexOptions) -> Result<Minimum, AppError>
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return Err(AppError::new(2, "Simplex minimization needs at least one parameter."));
    }
    if initial.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(2, "Simplex initial guess must be finite."));
    }

    let max_iters = opts.max_iters_per_dim.max(1) * initial.len() as u64;
    let mut best = run_simplex(&f, initial, opts.sd_tolerance, max_iters)?;
    let mut iterations = best.iterations;
    for _ in 0..opts.max_restarts {
        let next = run_simplex(&f, &best.params, opts.sd_tolerance, max_iters)?;
        iterations += next.iterations;
        let step = best
            .params
            .iter()
            .zip(&next.params)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        let gain = best.cost - next.cost;
        if next.cost <= best.cost {
            best = next;
        }
        if step <= opts.x_tolerance && gain <= opts.f_tolerance {
            break;
        }
    }

    Ok(Minimum { iterations, ..best })
}

fn run_simplex<F>(f: &F, start: &[f64], sd_tolerance: f64, max_iters: u64) -> Result<Minimum, AppError>
where
    F: Fn(&[f64]) -> f64,
{
    let solver = NelderMead::new(initial_simplex(start))
        .with_sd_tolerance(sd_tolerance)
        .map_err(|e| AppError::new(2, format!("Invalid simplex tolerance: {e}")))?;

    let result = Executor::new(Objective { f }, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .map_err(|e| AppError::new(4, format!("Simplex minimization failed: {e}")))?;

    let state = result.state();
    let params = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| AppError::new(4, "Simplex minimization produced no best parameters."))?;
    let cost = state.get_best_cost();
    if !cost.is_finite() {
        return Err(AppError::new(4, "Simplex minimization ended on a non-finite cost."));
    }

    Ok(Minimum {
        params,
        cost,
        iterations: state.get_iter(),
    })
}

fn initial_simplex(x0: &[f64]) -> Vec<Vec<f64>> {
    let mut vertices = Vec::with_capacity(x0.len() + 1);
    vertices.push(x0.to_vec());
    for k in 0..x0.len() {
        let mut v = x0.to_vec();
        v[k] = if v[k] != 0.0 { 1.05 * v[k] } else { 0.00025 };
        vertices.push(v);
    }
    vertices
}
