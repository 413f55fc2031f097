//! Adaptive Gauss–Kronrod quadrature.
//!
//! Each subinterval is integrated with the 15-point Kronrod rule; the embedded
//! 7-point Gauss rule gives the local error estimate. The interval with the
//! largest error is bisected until the total error is below
//! `max(abs_tol, rel_tol * |I|)` or the subinterval budget runs out.

use crate::error::AppError;

const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for the odd Kronrod nodes `XGK[1], XGK[3], XGK[5], XGK[7]`.
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Tolerances for [`integrate`]. Defaults are the usual QUADPACK `qags` ones.
#[derive(Debug, Clone, Copy)]
pub struct QuadOptions {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_intervals: usize,
}

impl Default for QuadOptions {
    fn default() -> Self {
        Self {
            abs_tol: 1.49e-8,
            rel_tol: 1.49e-8,
            max_intervals: 50,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Quadrature {
    pub value: f64,
    pub abs_error: f64,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// Integrate `f` over `[a, b]`.
pub fn integrate<F>(f: F, a: f64, b: f64, opts: &QuadOptions) -> Result<Quadrature, AppError>
where
    F: Fn(f64) -> f64,
{
    if !(a.is_finite() && b.is_finite()) {
        return Err(AppError::new(2, format!("Integration limits must be finite: [{a}, {b}].")));
    }
    if a == b {
        return Ok(Quadrature { value: 0.0, abs_error: 0.0 });
    }
    if b < a {
        let q = integrate(f, b, a, opts)?;
        return Ok(Quadrature { value: -q.value, abs_error: q.abs_error });
    }

    let mut segments = vec![gauss_kronrod(&f, a, b)?];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();
        if error <= opts.abs_tol.max(opts.rel_tol * value.abs()) {
            return Ok(Quadrature { value, abs_error: error });
        }
        if segments.len() >= opts.max_intervals.max(1) {
            return Err(AppError::new(
                4,
                format!(
                    "Quadrature did not converge on [{a}, {b}] within {} subintervals (error estimate {error:.3e}).",
                    opts.max_intervals
                ),
            ));
        }

        let (worst, _) = segments
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.error.partial_cmp(&y.1.error).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| AppError::new(4, "Quadrature lost its segments."))?;
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.a + seg.b);
        segments.push(gauss_kronrod(&f, seg.a, mid)?);
        segments.push(gauss_kronrod(&f, mid, seg.b)?);
    }
}

fn gauss_kronrod<F>(f: &F, a: f64, b: f64) -> Result<Segment, AppError>
where
    F: Fn(f64) -> f64,
{
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = eval_finite(f, center)?;
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];

    for j in 0..7 {
        let dx = half * XGK[j];
        let f1 = eval_finite(f, center - dx)?;
        let f2 = eval_finite(f, center + dx)?;
        kronrod += WGK[j] * (f1 + f2);
        if j % 2 == 1 {
            gauss += WG[j / 2] * (f1 + f2);
        }
    }

    Ok(Segment {
        a,
        b,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}

fn eval_finite<F>(f: &F, x: f64) -> Result<f64, AppError>
where
    F: Fn(f64) -> f64,
{
    let v = f(x);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(AppError::new(4, format!("Integrand is not finite at x={x}.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrates_polynomial_exactly() {
        let q = integrate(|x| x * x, 0.0, 1.0, &QuadOptions::default()).unwrap();
        assert!((q.value - 1.0 / 3.0).abs() < 1e-14);
    }

    #[test]
    fn integrates_sine_and_reversed_limits() {
        let pi = std::f64::consts::PI;
        let q = integrate(f64::sin, 0.0, pi, &QuadOptions::default()).unwrap();
        assert!((q.value - 2.0).abs() < 1e-12);

        let r = integrate(f64::sin, pi, 0.0, &QuadOptions::default()).unwrap();
        assert!((r.value + 2.0).abs() < 1e-12);
    }

    #[test]
    fn peaked_integrand_needs_subdivision() {
        // ∫_0^1 1/sqrt(x + 1e-4) dx = 2 (sqrt(1.0001) - sqrt(1e-4))
        let exact = 2.0 * ((1.0001_f64).sqrt() - 0.01);
        let q = integrate(|x| 1.0 / (x + 1e-4).sqrt(), 0.0, 1.0, &QuadOptions::default()).unwrap();
        assert!((q.value - exact).abs() < 1e-7, "got {}", q.value);
    }

    #[test]
    fn non_finite_integrand_is_an_error() {
        let err = integrate(|x| 1.0 / x, 0.0, 1.0, &QuadOptions::default());
        // The 15-point rule never samples the endpoints, but the singularity
        // cannot be resolved within 50 subintervals.
        assert!(err.is_err());
    }
}
