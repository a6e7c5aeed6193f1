//! Rejection-sampling kernel
//!
//! Candidates are drawn uniformly from the cube [-r_max, r_max]³ and accepted
//! with probability proportional to the magnitude of the radial function times
//! the angular factor. Accepted points keep the sign of the amplitude as a
//! color in wavefunction mode.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::cancel::CancelToken;
use crate::config::{Hue, Palette};
use crate::dataset::Dataset;
use crate::error::CloudError;
use crate::harmonics;
use crate::quantum_state::{Component, Mode};
use crate::radial::RadialProfile;

/// One point of the cloud, laid out for direct upload as a GPU instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SamplePoint {
    pub position: Vec3,
    pub color: [f32; 4],
}

impl SamplePoint {
    /// Origin with a fully transparent color. Every slot starts here.
    pub const ZERO: SamplePoint = SamplePoint {
        position: Vec3::ZERO,
        color: [0.0; 4],
    };

    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Result of one call to [`PointSampler::sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Draw {
    Accepted(SamplePoint),
    /// The cancel token was set before a point was accepted.
    Aborted,
}

/// Draws independent points from one orbital's distribution.
///
/// Borrowing the profile keeps the sampler cheap to share across rayon
/// workers; it holds no mutable state.
#[derive(Debug)]
pub struct PointSampler<'a> {
    profile: &'a RadialProfile,
    palette: Palette,
    l: u32,
    m: i32,
    mode: Mode,
    component: Component,
    cube: Uniform<f64>,
    threshold: Uniform<f64>,
}

impl<'a> PointSampler<'a> {
    /// Sampler for magnetic number `m` of `dataset`. `component` only
    /// matters in wavefunction mode.
    pub fn new(
        dataset: &'a Dataset,
        m: i32,
        component: Component,
        palette: Palette,
    ) -> Result<Self, CloudError> {
        let state = dataset.state();
        state.check_m(m)?;

        let profile = dataset.profile();
        let r_max = state.r_max();
        let threshold = match state.mode() {
            Mode::Density => Uniform::new_inclusive(0.0, profile.value_max().max(0.0)),
            Mode::Wavefunction => Uniform::new_inclusive(profile.value_min(), profile.value_max()),
        };

        Ok(Self {
            profile,
            palette,
            l: state.l(),
            m,
            mode: state.mode(),
            component,
            cube: Uniform::new_inclusive(-r_max, r_max),
            threshold,
        })
    }

    /// Rejection-sample until a candidate is accepted or `cancel` is set.
    /// The token is checked before every attempt.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<Draw, CloudError> {
        let imaginary_m0 = self.mode == Mode::Wavefunction
            && self.component == Component::Imaginary
            && self.m == 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(Draw::Aborted);
            }

            let x = self.cube.sample(rng);
            let y = self.cube.sample(rng);
            let z = self.cube.sample(rng);
            let r = (x * x + y * y + z * z).sqrt();

            // Outside the table the amplitude is zero.
            if r < self.profile.r_min() || r > self.profile.r_max() {
                continue;
            }

            let position = Vec3::new(x as f32, y as f32, z as f32);

            // Im Y_l^0 vanishes everywhere, so there is nothing to weight by.
            if imaginary_m0 {
                return Ok(Draw::Accepted(SamplePoint::new(position, self.palette.neutral)));
            }

            let (theta, phi) = harmonics::polar_angles(x, y, z);
            let radial = self.profile.value(r)?;
            let pp = match self.mode {
                Mode::Density => {
                    let angular = harmonics::density(self.l, self.m, theta, phi);
                    radial * angular * angular
                }
                Mode::Wavefunction => {
                    let angular = match self.component {
                        Component::Real => harmonics::real(self.l, self.m, theta, phi),
                        Component::Imaginary => harmonics::imag(self.l, self.m, theta, phi),
                    };
                    radial * angular
                }
            };

            let p = self.threshold.sample(rng);
            if pp.abs() >= p.abs() {
                let color = self.palette.color(self.hue(pp));
                return Ok(Draw::Accepted(SamplePoint::new(position, color)));
            }
        }
    }

    fn hue(&self, amplitude: f64) -> Hue {
        match self.mode {
            Mode::Density => Hue::Neutral,
            Mode::Wavefunction if amplitude > 0.0 => Hue::Positive,
            Mode::Wavefunction if amplitude < 0.0 => Hue::Negative,
            Mode::Wavefunction => Hue::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum_state::QuantumState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// φ(r) = r e^{-r/2} tabulated on [0.05, 20].
    fn wavefunction(n: u32, l: u32) -> Dataset {
        let r: Vec<f64> = (0..400).map(|i| 0.05 + 0.05 * i as f64).collect();
        let v: Vec<f64> = r.iter().map(|x| x * (-x / 2.0).exp()).collect();
        Dataset::new(
            QuantumState::new("Hydrogen", n, l, Mode::Wavefunction).unwrap(),
            RadialProfile::from_samples(r, v).unwrap(),
        )
    }

    fn wf_2p() -> Dataset {
        wavefunction(2, 1)
    }

    fn rho_1s() -> Dataset {
        let r: Vec<f64> = (0..200).map(|i| 0.02 + 0.04 * i as f64).collect();
        let v: Vec<f64> = r.iter().map(|x| x * x * (-2.0 * x).exp()).collect();
        Dataset::new(
            QuantumState::new("Hydrogen", 1, 0, Mode::Density).unwrap(),
            RadialProfile::from_samples(r, v).unwrap(),
        )
    }

    fn draw_many(sampler: &PointSampler<'_>, count: usize) -> Vec<SamplePoint> {
        let mut rng = StdRng::seed_from_u64(7);
        let cancel = CancelToken::new();
        (0..count)
            .map(|_| match sampler.sample(&mut rng, &cancel).unwrap() {
                Draw::Accepted(point) => point,
                Draw::Aborted => panic!("not cancelled"),
            })
            .collect()
    }

    #[test]
    fn density_points_are_neutral_and_inside_support() {
        let dataset = rho_1s();
        let palette = Palette::default();
        let sampler = PointSampler::new(&dataset, 0, Component::Real, palette).unwrap();
        for point in draw_many(&sampler, 500) {
            assert_eq!(point.color, palette.neutral);
            let r = point.position.length() as f64;
            assert!(r >= dataset.profile().r_min() - 1e-5);
            assert!(r <= dataset.profile().r_max() + 1e-5);
        }
    }

    #[test]
    fn wavefunction_with_nonzero_m_shows_both_signs() {
        let dataset = wf_2p();
        let palette = Palette::default();
        let sampler = PointSampler::new(&dataset, 1, Component::Real, palette).unwrap();
        let points = draw_many(&sampler, 400);
        assert!(points.iter().any(|p| p.color == palette.positive));
        assert!(points.iter().any(|p| p.color == palette.negative));
    }

    #[test]
    fn imaginary_p_lobes_share_one_sign() {
        // φ is folded into [0, π], where Im Y_1^{±1} ∝ -sin θ sin φ never
        // turns positive; points still land on both sides of y = 0.
        let dataset = wf_2p();
        let palette = Palette::default();
        for m in [1, -1] {
            let sampler = PointSampler::new(&dataset, m, Component::Imaginary, palette).unwrap();
            let points = draw_many(&sampler, 400);
            assert!(points.iter().all(|p| p.color == palette.negative), "m={m}");
            assert!(points.iter().any(|p| p.position.y < 0.0), "m={m}");
            assert!(points.iter().any(|p| p.position.y > 0.0), "m={m}");
        }
    }

    #[test]
    fn imaginary_with_m2_shows_both_signs() {
        // Im Y_2^2 ∝ sin 2φ changes sign inside [0, π].
        let dataset = wavefunction(3, 2);
        let palette = Palette::default();
        let sampler = PointSampler::new(&dataset, 2, Component::Imaginary, palette).unwrap();
        let points = draw_many(&sampler, 400);
        assert!(points.iter().any(|p| p.color == palette.positive));
        assert!(points.iter().any(|p| p.color == palette.negative));
    }

    #[test]
    fn imaginary_m0_accepts_first_candidate_in_support() {
        let dataset = wf_2p();
        let palette = Palette::default();
        let sampler = PointSampler::new(&dataset, 0, Component::Imaginary, palette).unwrap();
        for point in draw_many(&sampler, 200) {
            assert_eq!(point.color, palette.neutral);
            assert!(point.position.length() as f64 <= dataset.profile().r_max() + 1e-5);
        }
    }

    #[test]
    fn cancelled_token_aborts_without_drawing() {
        let dataset = wf_2p();
        let sampler = PointSampler::new(&dataset, 0, Component::Real, Palette::default()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sampler.sample(&mut rng, &cancel).unwrap(), Draw::Aborted);
    }

    #[test]
    fn rejects_m_outside_l() {
        let dataset = wf_2p();
        assert!(matches!(
            PointSampler::new(&dataset, 2, Component::Real, Palette::default()),
            Err(CloudError::InvalidQuantumNumber { m: Some(2), .. })
        ));
    }

    #[test]
    fn sample_point_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SamplePoint>(), 28);
        assert_eq!(bytemuck::bytes_of(&SamplePoint::ZERO), &[0u8; 28][..]);
    }
}
