//! Spherical harmonics and the angular factor of an orbital
//!
//! Y_l^m(θ, φ) = N_lm P_l^|m|(cos θ) e^{imφ}, with the Condon-Shortley phase
//! carried by the associated Legendre function. Negative m follows
//! Y_l^{-m} = (-1)^m conj(Y_l^m).

use std::f64::consts::PI;

/// Complex number for harmonic evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// r * e^(i*theta)
    pub fn from_polar(r: f64, theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self { re: r * c, im: r * s }
    }

    /// |z|^2
    pub fn norm_sq(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    pub fn conj(&self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }
}

impl std::ops::Mul<f64> for Complex {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            re: self.re * rhs,
            im: self.im * rhs,
        }
    }
}

/// Polar angles of a Cartesian point as the sampler uses them.
///
/// θ = acos(z/r) and φ = acos(x/√(x²+y²)). This φ only spans [0, π]: points
/// with y < 0 are folded onto y > 0. On the z axis φ is 0; at the origin both
/// angles are 0.
pub fn polar_angles(x: f64, y: f64, z: f64) -> (f64, f64) {
    let r = (x * x + y * y + z * z).sqrt();
    if r == 0.0 {
        return (0.0, 0.0);
    }
    let theta = (z / r).clamp(-1.0, 1.0).acos();
    let rho = (x * x + y * y).sqrt();
    let phi = if rho > 0.0 {
        (x / rho).clamp(-1.0, 1.0).acos()
    } else {
        0.0
    };
    (theta, phi)
}

/// Y_l^m(θ, φ). Zero when |m| > l.
pub fn spherical_harmonic(l: u32, m: i32, theta: f64, phi: f64) -> Complex {
    let m_abs = m.unsigned_abs();
    if m_abs > l {
        return Complex::ZERO;
    }

    let plm = associated_legendre(l, m_abs, theta.cos());
    let y = Complex::from_polar(spherical_harmonic_norm(l, m_abs) * plm, f64::from(m_abs) * phi);

    if m < 0 {
        let sign = if m_abs % 2 == 1 { -1.0 } else { 1.0 };
        y.conj() * sign
    } else {
        y
    }
}

/// Re Y_l^m(θ, φ)
pub fn real(l: u32, m: i32, theta: f64, phi: f64) -> f64 {
    spherical_harmonic(l, m, theta, phi).re
}

/// Im Y_l^m(θ, φ). Identically zero for m = 0.
pub fn imag(l: u32, m: i32, theta: f64, phi: f64) -> f64 {
    if m == 0 {
        return 0.0;
    }
    spherical_harmonic(l, m, theta, phi).im
}

/// Angular factor for density clouds: the real part for m >= 0, the
/// imaginary part for m < 0. The sampler squares it.
pub fn density(l: u32, m: i32, theta: f64, phi: f64) -> f64 {
    if m >= 0 {
        real(l, m, theta, phi)
    } else {
        imag(l, m, theta, phi)
    }
}

/// Associated Legendre function P_l^m(x), Condon-Shortley phase included,
/// by upward recurrence in l.
fn associated_legendre(l: u32, m: u32, x: f64) -> f64 {
    let somx2 = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();

    // P_m^m = (-1)^m (2m-1)!! (1-x^2)^(m/2)
    let mut pmm = 1.0;
    let mut odd = 1.0;
    for _ in 0..m {
        pmm *= -odd * somx2;
        odd += 2.0;
    }
    if l == m {
        return pmm;
    }

    // P_{m+1}^m = x (2m+1) P_m^m
    let mut pmmp1 = x * f64::from(2 * m + 1) * pmm;
    for ll in (m + 2)..=l {
        let pll = (x * f64::from(2 * ll - 1) * pmmp1 - f64::from(ll + m - 1) * pmm)
            / f64::from(ll - m);
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pmmp1
}

/// sqrt((2l+1)/(4π) * (l-m)!/(l+m)!)
fn spherical_harmonic_norm(l: u32, m: u32) -> f64 {
    // (l-m)!/(l+m)! as a product to stay well-conditioned for larger l.
    let ratio: f64 = ((l - m + 1)..=(l + m)).map(|k| 1.0 / f64::from(k)).product();
    ((2.0 * f64::from(l) + 1.0) / (4.0 * PI) * ratio).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn grid() -> impl Iterator<Item = (f64, f64)> {
        (0..=12).flat_map(|i| (0..=12).map(move |j| (PI * i as f64 / 12.0, PI * j as f64 / 12.0)))
    }

    #[test]
    fn y00_is_constant() {
        let expected = 0.5 * (1.0 / PI).sqrt();
        for (theta, phi) in grid() {
            assert!((real(0, 0, theta, phi) - expected).abs() < EPS);
        }
    }

    #[test]
    fn matches_closed_forms() {
        for (theta, phi) in grid() {
            let (st, ct) = theta.sin_cos();

            let y10 = 0.5 * (3.0 / PI).sqrt() * ct;
            assert!((real(1, 0, theta, phi) - y10).abs() < EPS);

            // Y_1^1 = -1/2 sqrt(3/(2π)) sinθ e^{iφ}
            let a = -0.5 * (3.0 / (2.0 * PI)).sqrt() * st;
            assert!((real(1, 1, theta, phi) - a * phi.cos()).abs() < EPS);
            assert!((imag(1, 1, theta, phi) - a * phi.sin()).abs() < EPS);

            // Y_1^-1 = 1/2 sqrt(3/(2π)) sinθ e^{-iφ}
            let b = 0.5 * (3.0 / (2.0 * PI)).sqrt() * st;
            assert!((real(1, -1, theta, phi) - b * phi.cos()).abs() < EPS);
            assert!((imag(1, -1, theta, phi) + b * phi.sin()).abs() < EPS);

            let y20 = 0.25 * (5.0 / PI).sqrt() * (3.0 * ct * ct - 1.0);
            assert!((real(2, 0, theta, phi) - y20).abs() < EPS);

            // Y_2^2 = 1/4 sqrt(15/(2π)) sin²θ e^{2iφ}
            let c = 0.25 * (15.0 / (2.0 * PI)).sqrt() * st * st;
            assert!((real(2, 2, theta, phi) - c * (2.0 * phi).cos()).abs() < EPS);

            // Y_3^0 = 1/4 sqrt(7/π) (5cos³θ - 3cosθ)
            let y30 = 0.25 * (7.0 / PI).sqrt() * (5.0 * ct * ct * ct - 3.0 * ct);
            assert!((real(3, 0, theta, phi) - y30).abs() < EPS);
        }
    }

    #[test]
    fn imaginary_part_vanishes_for_m_zero() {
        for l in 0..6 {
            for (theta, phi) in grid() {
                assert_eq!(imag(l, 0, theta, phi), 0.0);
            }
        }
    }

    #[test]
    fn negative_m_is_conjugate_up_to_sign() {
        for l in 1..5 {
            for m in 1..=l as i32 {
                let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
                for (theta, phi) in grid() {
                    let pos = spherical_harmonic(l, m, theta, phi);
                    let neg = spherical_harmonic(l, -m, theta, phi);
                    assert!((neg.re - sign * pos.re).abs() < EPS);
                    assert!((neg.im + sign * pos.im).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn sum_rule_holds() {
        // Σ_m |Y_l^m|² = (2l+1)/(4π) for every direction.
        for l in 0..5 {
            let expected = (2.0 * l as f64 + 1.0) / (4.0 * PI);
            for (theta, phi) in grid() {
                let total: f64 = (-(l as i32)..=l as i32)
                    .map(|m| spherical_harmonic(l, m, theta, phi).norm_sq())
                    .sum();
                assert!((total - expected).abs() < 1e-10, "l={l}");
            }
        }
    }

    #[test]
    fn m_beyond_l_is_zero() {
        assert_eq!(spherical_harmonic(1, 2, 0.3, 0.4), Complex::ZERO);
    }

    #[test]
    fn density_picks_part_by_sign_of_m() {
        let (theta, phi) = (0.7, 1.1);
        assert_eq!(density(2, 1, theta, phi), real(2, 1, theta, phi));
        assert_eq!(density(2, -1, theta, phi), imag(2, -1, theta, phi));
    }

    #[test]
    fn polar_angles_fold_negative_y() {
        let (theta, phi) = polar_angles(1.0, 1.0, 0.0);
        assert!((theta - PI / 2.0).abs() < EPS);
        assert!((phi - PI / 4.0).abs() < EPS);

        let (_, folded) = polar_angles(1.0, -1.0, 0.0);
        assert!((folded - PI / 4.0).abs() < EPS);

        let (theta, phi) = polar_angles(0.0, 0.0, -2.0);
        assert!((theta - PI).abs() < EPS);
        assert_eq!(phi, 0.0);
    }
}
