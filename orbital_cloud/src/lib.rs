//! Orbital Cloud
//!
//! Point-cloud pictures of atomic orbitals. A radial density ρ(r) or radial
//! wavefunction φ(r) is read from a tabulated data file, combined with a
//! spherical harmonic, and rejection-sampled into a cloud of colored points:
//!
//! - **Density** files (`rho_*`) give clouds following ρ(r)·Y², one color
//! - **Wavefunction** files (`wf_*`) give clouds following |φ(r)·Y| with the
//!   sign of the amplitude shown as color
//!
//! Sampling runs on a background thread that fans out over rayon and can be
//! cancelled at any time; see [`controller`].

pub mod error;
pub mod config;
pub mod radial;
pub mod quantum_state;
pub mod harmonics;
pub mod dataset;
pub mod cancel;
pub mod sampler;
pub mod cloud;
pub mod controller;
pub mod session;

pub use cancel::CancelToken;
pub use cloud::{
    CloudBuilder, CloudParams, FillOutcome, FillReport, Generation, PointCloudBuffer, RedrawRequest,
};
pub use config::{CloudConfig, Hue, Palette, SamplingConfig, ViewerConfig};
pub use controller::{ControllerState, RecomputeController};
pub use dataset::Dataset;
pub use error::CloudError;
pub use quantum_state::{Component, Mode, OrbitalChoice, QuantumState};
pub use radial::RadialProfile;
pub use sampler::{Draw, PointSampler, SamplePoint};
pub use session::Session;
