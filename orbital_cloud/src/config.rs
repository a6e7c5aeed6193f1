//! Runtime configuration with TOML file support.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[palette]` or a single sampling knob is enough.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CloudError;

/// File looked up in the working directory when no override is given.
pub const DEFAULT_CONFIG_FILE: &str = "orbital_cloud.toml";

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV_VAR: &str = "ORBITAL_CLOUD_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CloudConfig {
    pub sampling: SamplingConfig,
    pub palette: Palette,
    pub viewer: ViewerConfig,
}

/// Point-buffer sizing and the sampling thread pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Upper bound for the point-count slider.
    pub max_points: usize,
    /// Points drawn for a freshly loaded file.
    pub initial_points: usize,
    /// Fixed base seed; a fresh random seed per fill when absent.
    pub seed: Option<u64>,
    /// Size of a dedicated rayon pool; the global pool when absent.
    pub worker_threads: Option<usize>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_points: 1_000_000,
            initial_points: 80_000,
            seed: None,
            worker_threads: None,
        }
    }
}

/// Point colors (RGBA).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Palette {
    /// ψ > 0
    pub positive: [f32; 4],
    /// ψ < 0
    pub negative: [f32; 4],
    /// Density clouds and zero amplitude
    pub neutral: [f32; 4],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            positive: [0.8, 0.0, 0.8, 1.0],
            negative: [0.0, 0.8, 0.8, 1.0],
            neutral: [0.25, 0.55, 1.0, 1.0],
        }
    }
}

/// Hue a sample point was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hue {
    Positive,
    Negative,
    Neutral,
}

impl Palette {
    pub fn color(&self, hue: Hue) -> [f32; 4] {
        match hue {
            Hue::Positive => self.positive,
            Hue::Negative => self.negative,
            Hue::Neutral => self.neutral,
        }
    }

    /// Which hue a color is, if it is one of the palette's.
    pub fn classify(&self, color: [f32; 4]) -> Option<Hue> {
        [Hue::Positive, Hue::Negative, Hue::Neutral]
            .into_iter()
            .find(|&hue| self.color(hue) == color)
    }
}

/// Window and camera settings for the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    /// Billboard half-size as a fraction of the sampling radius.
    pub point_scale: f32,
    /// Camera distance as a multiple of the sampling radius.
    pub magnification: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
            point_scale: 0.004,
            magnification: 1.2,
        }
    }
}

impl CloudConfig {
    /// Load from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, CloudError> {
        let content = std::fs::read_to_string(path).map_err(|e| CloudError::io_at(path, e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| CloudError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), CloudError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CloudError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CloudError::io_at(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| CloudError::io_at(path, e))
    }

    /// Config file to use: `$ORBITAL_CLOUD_CONFIG`, else `orbital_cloud.toml`
    /// in the working directory if it exists.
    pub fn locate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }

    /// Load the located config file, or defaults when there is none.
    pub fn load_or_default() -> Result<Self, CloudError> {
        match Self::locate() {
            Some(path) => {
                log::info!("reading config from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), CloudError> {
        if self.sampling.initial_points > self.sampling.max_points {
            return Err(CloudError::Config(format!(
                "initial_points ({}) exceeds max_points ({})",
                self.sampling.initial_points, self.sampling.max_points
            )));
        }
        if self.sampling.worker_threads == Some(0) {
            return Err(CloudError::Config("worker_threads must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let config = CloudConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: CloudConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let text = r"
[sampling]
seed = 42
";
        let config: CloudConfig = toml::from_str(text).unwrap();
        assert_eq!(config.sampling.seed, Some(42));
        assert_eq!(config.sampling.max_points, 1_000_000);
        assert_eq!(config.palette, Palette::default());
        assert_eq!(config.viewer.width, 1280);
    }

    #[test]
    fn load_rejects_inconsistent_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[sampling]\nmax_points = 10\ninitial_points = 20\n").unwrap();
        assert!(matches!(CloudConfig::load(&path), Err(CloudError::Config(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cloud.toml");
        let mut config = CloudConfig::default();
        config.sampling.worker_threads = Some(2);
        config.save(&path).unwrap();
        assert_eq!(CloudConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn palette_classifies_its_own_colors() {
        let palette = Palette::default();
        assert_eq!(palette.classify(palette.negative), Some(Hue::Negative));
        assert_eq!(palette.classify([0.0; 4]), None);
    }
}
