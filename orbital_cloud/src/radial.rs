//! Tabulated radial functions
//!
//! A radial profile is a two-column `r,value` table (electron density ρ(r) or a
//! radial wavefunction φ(r)) turned into a continuous curve with a natural
//! cubic spline. The spline interpolates: it passes through every row exactly.

use std::path::Path;

use crate::error::CloudError;

/// Natural cubic spline through strictly increasing knots.
///
/// Second derivatives are pinned to zero at both ends. With only two knots
/// this degenerates to linear interpolation.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative of the interpolant at each knot.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Build the spline. Callers guarantee `x.len() == y.len() >= 2` and that
    /// `x` is strictly increasing.
    fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        let n = x.len();
        let mut m = vec![0.0; n];

        if n > 2 {
            // Tridiagonal system for the interior second derivatives,
            // solved with the Thomas algorithm.
            let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
            let interior = n - 2;
            let mut diag = vec![0.0; interior];
            let mut upper = vec![0.0; interior];
            let mut rhs = vec![0.0; interior];

            for k in 0..interior {
                let i = k + 1;
                diag[k] = 2.0 * (h[i - 1] + h[i]);
                upper[k] = h[i];
                rhs[k] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
            }

            for k in 1..interior {
                let lower = h[k];
                let w = lower / diag[k - 1];
                diag[k] -= w * upper[k - 1];
                rhs[k] -= w * rhs[k - 1];
            }

            m[interior] = rhs[interior - 1] / diag[interior - 1];
            for k in (0..interior - 1).rev() {
                m[k + 1] = (rhs[k] - upper[k] * m[k + 2]) / diag[k];
            }
        }

        Self { x, y, m }
    }

    /// Evaluate inside `[x[0], x[last]]`. Out-of-range arguments are the
    /// caller's responsibility.
    fn eval(&self, t: f64) -> f64 {
        let last = self.x.len() - 1;
        // Index of the interval [x[i], x[i + 1]] containing t.
        let i = self.x.partition_point(|&xi| xi <= t).clamp(1, last) - 1;

        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let h = x1 - x0;
        let a = x1 - t;
        let b = t - x0;

        m0 * a * a * a / (6.0 * h)
            + m1 * b * b * b / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }
}

/// Radial function interpolated from a tabulated data file.
#[derive(Debug, Clone)]
pub struct RadialProfile {
    spline: CubicSpline,
    value_min: f64,
    value_max: f64,
}

impl RadialProfile {
    /// Load a comma-separated `r,value` table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CloudError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| CloudError::io_at(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let profile = Self::parse(&name, &content)?;
        log::info!(
            "loaded radial profile {name}: {} rows, r in [{}, {}]",
            profile.len(),
            profile.r_min(),
            profile.r_max()
        );
        Ok(profile)
    }

    /// Parse table text. `source_name` is only used in error messages.
    pub fn parse(source_name: &str, content: &str) -> Result<Self, CloudError> {
        let content = content.trim_start_matches('\u{feff}').trim_end();
        if content.is_empty() {
            return Err(CloudError::parse(source_name, "data file is empty"));
        }

        let mut r_mesh = Vec::new();
        let mut values = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
            if tokens.len() != 2 {
                return Err(CloudError::parse_at(
                    source_name,
                    line_no,
                    format!("expected 2 comma-separated values, found {}", tokens.len()),
                ));
            }

            let parse_number = |token: &str| {
                token.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                    CloudError::parse_at(source_name, line_no, format!("'{token}' is not a number"))
                })
            };
            r_mesh.push(parse_number(tokens[0])?);
            values.push(parse_number(tokens[1])?);
        }

        Self::from_samples(r_mesh, values)
            .map_err(|e| match e {
                CloudError::Parse { message, line, .. } => CloudError::Parse {
                    source_name: source_name.to_owned(),
                    line,
                    message,
                },
                other => other,
            })
    }

    /// Build a profile from in-memory samples.
    pub fn from_samples(r_mesh: Vec<f64>, values: Vec<f64>) -> Result<Self, CloudError> {
        const NAME: &str = "radial table";

        if r_mesh.len() != values.len() {
            return Err(CloudError::parse(
                NAME,
                format!("{} radii but {} values", r_mesh.len(), values.len()),
            ));
        }
        if r_mesh.len() < 2 {
            return Err(CloudError::parse(NAME, "at least two rows are required"));
        }
        if let Some(pos) = r_mesh
            .iter()
            .zip(&values)
            .position(|(r, v)| !r.is_finite() || !v.is_finite())
        {
            return Err(CloudError::parse_at(NAME, pos + 1, "non-finite value"));
        }
        if let Some(pos) = r_mesh.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CloudError::parse_at(
                NAME,
                pos + 2,
                format!(
                    "r must be strictly increasing ({} after {})",
                    r_mesh[pos + 1],
                    r_mesh[pos]
                ),
            ));
        }

        let value_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let value_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            spline: CubicSpline::new(r_mesh, values),
            value_min,
            value_max,
        })
    }

    /// Interpolated value at `r`.
    pub fn value(&self, r: f64) -> Result<f64, CloudError> {
        if !(self.r_min()..=self.r_max()).contains(&r) {
            return Err(CloudError::OutOfRange {
                r,
                r_min: self.r_min(),
                r_max: self.r_max(),
            });
        }
        Ok(self.spline.eval(r))
    }

    pub fn r_min(&self) -> f64 {
        self.spline.x[0]
    }

    pub fn r_max(&self) -> f64 {
        self.spline.x[self.spline.x.len() - 1]
    }

    /// Smallest tabulated value.
    pub fn value_min(&self) -> f64 {
        self.value_min
    }

    /// Largest tabulated value.
    pub fn value_max(&self) -> f64 {
        self.value_max
    }

    /// Number of tabulated rows.
    pub fn len(&self) -> usize {
        self.spline.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spline.x.is_empty()
    }

    /// Tabulated radii.
    pub fn r_mesh(&self) -> &[f64] {
        &self.spline.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogen_like() -> RadialProfile {
        RadialProfile::from_samples(vec![0.1, 1.0, 2.0, 5.0], vec![0.0, 1.0, 0.5, 0.0]).unwrap()
    }

    #[test]
    fn interpolates_exactly_at_knots() {
        let profile = hydrogen_like();
        for (&r, &v) in [0.1, 1.0, 2.0, 5.0].iter().zip(&[0.0, 1.0, 0.5, 0.0]) {
            assert!((profile.value(r).unwrap() - v).abs() < 1e-12, "r={r}");
        }
    }

    #[test]
    fn reproduces_linear_data() {
        let r: Vec<f64> = (0..10).map(|i| 0.5 * i as f64).collect();
        let v: Vec<f64> = r.iter().map(|x| 3.0 * x - 1.0).collect();
        let profile = RadialProfile::from_samples(r, v).unwrap();
        assert!((profile.value(1.3).unwrap() - 2.9).abs() < 1e-12);
        assert!((profile.value(4.1).unwrap() - 11.3).abs() < 1e-12);
    }

    #[test]
    fn tracks_smooth_function_between_knots() {
        let r: Vec<f64> = (0..=60).map(|i| 0.05 + 0.1 * i as f64).collect();
        let v: Vec<f64> = r.iter().map(|x| x * x * (-x).exp()).collect();
        let profile = RadialProfile::from_samples(r, v).unwrap();
        let t = 2.37;
        assert!((profile.value(t).unwrap() - t * t * (-t as f64).exp()).abs() < 1e-3);
    }

    #[test]
    fn two_rows_are_linear() {
        let profile = RadialProfile::from_samples(vec![1.0, 3.0], vec![2.0, 6.0]).unwrap();
        assert!((profile.value(2.0).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn reports_range_and_extrema() {
        let profile =
            RadialProfile::from_samples(vec![0.2, 1.0, 3.0], vec![0.4, -0.7, 0.1]).unwrap();
        assert_eq!(profile.r_min(), 0.2);
        assert_eq!(profile.r_max(), 3.0);
        assert_eq!(profile.value_min(), -0.7);
        assert_eq!(profile.value_max(), 0.4);
        assert_eq!(profile.len(), 3);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let profile = hydrogen_like();
        assert!(matches!(profile.value(0.05), Err(CloudError::OutOfRange { .. })));
        assert!(matches!(profile.value(5.01), Err(CloudError::OutOfRange { .. })));
    }

    #[test]
    fn empty_content_is_a_parse_error() {
        assert!(matches!(
            RadialProfile::parse("empty.csv", ""),
            Err(CloudError::Parse { .. })
        ));
        assert!(matches!(
            RadialProfile::parse("blank.csv", "\n  \n"),
            Err(CloudError::Parse { .. })
        ));
    }

    #[test]
    fn wrong_column_count_is_a_parse_error() {
        let err = RadialProfile::parse("bad.csv", "0.1,0.0\n1.0,1.0,2.0\n").unwrap_err();
        assert!(matches!(err, CloudError::Parse { line: Some(2), .. }), "{err}");

        let err = RadialProfile::parse("bad.csv", "0.1 0.0\n1.0,1.0\n").unwrap_err();
        assert!(matches!(err, CloudError::Parse { line: Some(1), .. }), "{err}");
    }

    #[test]
    fn non_numeric_token_is_a_parse_error() {
        let err = RadialProfile::parse("bad.csv", "0.1,0.0\n1.0,abc\n").unwrap_err();
        assert!(matches!(err, CloudError::Parse { line: Some(2), .. }), "{err}");
    }

    #[test]
    fn decreasing_radius_is_rejected() {
        let err = RadialProfile::parse("bad.csv", "0.1,0.0\n2.0,1.0\n1.0,0.5\n").unwrap_err();
        assert!(matches!(err, CloudError::Parse { line: Some(3), .. }), "{err}");
    }

    #[test]
    fn tolerates_crlf_and_trailing_newlines() {
        let profile =
            RadialProfile::parse("ok.csv", "0.1, 0.0\r\n1.0 ,1.0\r\n2.0,0.5\r\n\r\n").unwrap();
        assert_eq!(profile.len(), 3);
        assert!((profile.value(1.0).unwrap() - 1.0).abs() < 1e-12);
    }
}
