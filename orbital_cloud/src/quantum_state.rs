//! Quantum numbers and the data-file naming scheme
//!
//! Data files are named `<kind>_<element>_<n><l-letter>...`, e.g.
//! `rho_H_1s.csv` (electron density of hydrogen 1s) or `wf_He_2p.csv`
//! (radial wavefunction of helium 2p). Everything the sampler needs to know
//! about the orbital besides the radial table comes from that name.

use std::fmt;
use std::path::Path;

use crate::error::CloudError;

/// What the radial table holds, and therefore how the cloud is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// ρ(r): the cloud follows |ψ|², points carry no sign.
    Density,
    /// φ(r): the cloud follows |ψ| and points are colored by the sign of ψ.
    Wavefunction,
}

impl Mode {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "rho" => Some(Self::Density),
            "wf" => Some(Self::Wavefunction),
            _ => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Density => "Electron density",
            Self::Wavefunction => "Wavefunction",
        }
    }
}

/// Which part of the complex spherical harmonic a wavefunction cloud shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Component {
    #[default]
    Real,
    Imaginary,
}

/// Azimuthal letters in order of l.
const ORBITAL_LETTERS: [char; 5] = ['s', 'p', 'd', 'f', 'g'];

/// Element symbols the file names may use, with display names.
const ELEMENTS: [(&str, &str); 10] = [
    ("H", "Hydrogen"),
    ("He", "Helium"),
    ("Li", "Lithium"),
    ("Be", "Beryllium"),
    ("B", "Boron"),
    ("C", "Carbon"),
    ("N", "Nitrogen"),
    ("O", "Oxygen"),
    ("F", "Fluorine"),
    ("Ne", "Neon"),
];

/// A named real orbital offered for selection, e.g. `2px` with m = 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrbitalChoice {
    pub label: String,
    pub m: i32,
}

/// Quantum numbers of a loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumState {
    atom_name: String,
    n: u32,
    l: u32,
    mode: Mode,
}

impl QuantumState {
    /// Validate and build a state. Requires n > l.
    pub fn new(
        atom_name: impl Into<String>,
        n: u32,
        l: u32,
        mode: Mode,
    ) -> Result<Self, CloudError> {
        if l >= n {
            return Err(CloudError::InvalidQuantumNumber { n, l, m: None });
        }
        if mode == Mode::Wavefunction && l as usize >= ORBITAL_LETTERS.len() - 1 {
            return Err(CloudError::UnsupportedOrbital { l });
        }
        Ok(Self {
            atom_name: atom_name.into(),
            n,
            l,
            mode,
        })
    }

    /// Parse the quantum numbers encoded in a data file name.
    pub fn from_file_name(path: impl AsRef<Path>) -> Result<Self, CloudError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let tokens: Vec<&str> = stem.split('_').filter(|t| !t.is_empty()).collect();
        if tokens.len() < 3 {
            return Err(CloudError::parse(
                &name,
                "file name must look like <rho|wf>_<element>_<n><orbital>",
            ));
        }

        let mode = Mode::from_token(tokens[0]).ok_or_else(|| {
            CloudError::parse(
                &name,
                format!("unknown data kind '{}' (expected rho or wf)", tokens[0]),
            )
        })?;

        let atom_name = ELEMENTS
            .iter()
            .find(|(symbol, _)| *symbol == tokens[1])
            .map(|(_, atom)| *atom)
            .ok_or_else(|| CloudError::parse(&name, format!("unknown element '{}'", tokens[1])))?;

        let orbital = tokens[2];
        let digits_end = orbital
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(orbital.len());
        let n: u32 = orbital[..digits_end].parse().map_err(|_| {
            CloudError::parse(
                &name,
                format!("'{orbital}' does not start with a principal quantum number"),
            )
        })?;
        let letter = orbital[digits_end..].chars().next().ok_or_else(|| {
            CloudError::parse(&name, format!("'{orbital}' has no orbital letter"))
        })?;
        let l = ORBITAL_LETTERS
            .iter()
            .position(|&c| c == letter)
            .ok_or_else(|| CloudError::parse(&name, format!("unknown orbital letter '{letter}'")))?
            as u32;

        Self::new(atom_name, n, l, mode)
    }

    pub fn atom_name(&self) -> &str {
        &self.atom_name
    }

    /// Principal quantum number.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Azimuthal quantum number.
    pub fn l(&self) -> u32 {
        self.l
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Half-width of the sampling cube. An empirical fit that keeps the
    /// appreciable-probability region of shell n inside the cube.
    pub fn r_max(&self) -> f64 {
        r_max_for(self.n)
    }

    /// Orbital label such as `1s` or `3d`.
    pub fn orbital_label(&self) -> String {
        format!("{}{}", self.n, ORBITAL_LETTERS[self.l as usize])
    }

    /// Window title, e.g. "Electron density in Hydrogen for 1s orbital".
    pub fn title(&self) -> String {
        format!(
            "{} in {} for {} orbital",
            self.mode.describe(),
            self.atom_name,
            self.orbital_label()
        )
    }

    /// Whether `m` is an allowed magnetic quantum number for this state.
    pub fn check_m(&self, m: i32) -> Result<(), CloudError> {
        if m.unsigned_abs() > self.l {
            return Err(CloudError::InvalidQuantumNumber {
                n: self.n,
                l: self.l,
                m: Some(m),
            });
        }
        Ok(())
    }

    /// Named real orbitals for this l, in menu order.
    pub fn orbital_choices(&self) -> Result<Vec<OrbitalChoice>, CloudError> {
        let suffixes: &[(&str, i32)] = match self.l {
            0 => &[("", 0)],
            1 => &[("x", 1), ("y", -1), ("z", 0)],
            2 => &[("xy", -2), ("yz", -1), ("zx", 1), ("x^2-y^2", 2), ("z^2", 0)],
            3 => &[
                ("xz^2", 1),
                ("yz^2", -1),
                ("z(x^2-y^2)", 2),
                ("xyz", -2),
                ("x(x^2-3y^2)", 3),
                ("y(3x^2-y^2)", -3),
                ("z^2", 0),
            ],
            l => return Err(CloudError::UnsupportedOrbital { l }),
        };

        let base = self.orbital_label();
        Ok(suffixes
            .iter()
            .map(|(suffix, m)| OrbitalChoice {
                label: format!("{base}{suffix}"),
                m: *m,
            })
            .collect())
    }
}

impl fmt::Display for QuantumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({:?})", self.atom_name, self.orbital_label(), self.mode)
    }
}

/// Sampling cube half-width for principal quantum number `n`.
pub fn r_max_for(n: u32) -> f64 {
    let n = f64::from(n);
    (2.3622 * n + 3.3340) * n + 1.3228
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_bound_state() {
        for n in 1..=7 {
            for l in 0..n.min(4) {
                let state = QuantumState::new("Hydrogen", n, l, Mode::Wavefunction).unwrap();
                assert_eq!((state.n(), state.l()), (n, l));
            }
        }
    }

    #[test]
    fn rejects_l_not_below_n() {
        for n in 0..5 {
            for l in n..n + 3 {
                assert!(matches!(
                    QuantumState::new("Hydrogen", n, l, Mode::Density),
                    Err(CloudError::InvalidQuantumNumber { .. })
                ));
            }
        }
    }

    #[test]
    fn parses_density_file_name() {
        let state = QuantumState::from_file_name("data/rho_H_1s.csv").unwrap();
        assert_eq!(state.atom_name(), "Hydrogen");
        assert_eq!((state.n(), state.l()), (1, 0));
        assert_eq!(state.mode(), Mode::Density);
        assert_eq!(state.title(), "Electron density in Hydrogen for 1s orbital");
    }

    #[test]
    fn parses_wavefunction_file_name_with_suffix() {
        let state = QuantumState::from_file_name("wf_He_3d_lda.csv").unwrap();
        assert_eq!(state.atom_name(), "Helium");
        assert_eq!((state.n(), state.l()), (3, 2));
        assert_eq!(state.mode(), Mode::Wavefunction);
        assert_eq!(state.orbital_label(), "3d");
    }

    #[test]
    fn multi_digit_principal_number() {
        let state = QuantumState::from_file_name("rho_H_10f.csv").unwrap();
        assert_eq!((state.n(), state.l()), (10, 3));
    }

    #[test]
    fn bad_names_are_parse_errors() {
        for name in [
            "H_1s.csv",
            "xx_H_1s.csv",
            "rho_Xx_1s.csv",
            "rho_H_s.csv",
            "rho_H_1.csv",
            "rho_H_2h.csv",
        ] {
            assert!(
                matches!(QuantumState::from_file_name(name), Err(CloudError::Parse { .. })),
                "{name}"
            );
        }
    }

    #[test]
    fn impossible_orbital_in_name() {
        assert!(matches!(
            QuantumState::from_file_name("rho_H_1p.csv"),
            Err(CloudError::InvalidQuantumNumber { n: 1, l: 1, .. })
        ));
    }

    #[test]
    fn g_wavefunction_is_unsupported() {
        assert!(matches!(
            QuantumState::from_file_name("wf_H_5g.csv"),
            Err(CloudError::UnsupportedOrbital { l: 4 })
        ));
        let density = QuantumState::from_file_name("rho_H_5g.csv").unwrap();
        assert!(matches!(
            density.orbital_choices(),
            Err(CloudError::UnsupportedOrbital { l: 4 })
        ));
    }

    #[test]
    fn r_max_polynomial() {
        assert!((r_max_for(1) - 7.019).abs() < 1e-9);
        assert!((r_max_for(2) - 17.4396).abs() < 1e-9);
    }

    #[test]
    fn choices_cover_every_m_once() {
        for l in 0..4 {
            let state = QuantumState::new("Hydrogen", 4, l, Mode::Density).unwrap();
            let mut ms: Vec<i32> = state.orbital_choices().unwrap().iter().map(|c| c.m).collect();
            ms.sort_unstable();
            let expected: Vec<i32> = (-(l as i32)..=l as i32).collect();
            assert_eq!(ms, expected);
        }
    }

    #[test]
    fn p_choices_are_labelled() {
        let state = QuantumState::new("Hydrogen", 2, 1, Mode::Wavefunction).unwrap();
        let labels: Vec<String> = state
            .orbital_choices()
            .unwrap()
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, ["2px", "2py", "2pz"]);
    }

    #[test]
    fn m_must_fit_l() {
        let state = QuantumState::new("Hydrogen", 3, 1, Mode::Wavefunction).unwrap();
        assert!(state.check_m(-1).is_ok());
        assert!(matches!(
            state.check_m(2),
            Err(CloudError::InvalidQuantumNumber { m: Some(2), .. })
        ));
    }
}
