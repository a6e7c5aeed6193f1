//! A loaded data file: quantum numbers from its name, radial table from its rows.

use std::path::{Path, PathBuf};

use crate::error::CloudError;
use crate::quantum_state::QuantumState;
use crate::radial::RadialProfile;

/// Immutable once loaded; shared between the UI thread and sampling workers.
#[derive(Debug, Clone)]
pub struct Dataset {
    state: QuantumState,
    profile: RadialProfile,
    source: Option<PathBuf>,
}

impl Dataset {
    pub fn new(state: QuantumState, profile: RadialProfile) -> Self {
        Self {
            state,
            profile,
            source: None,
        }
    }

    /// Load `path`. The name is checked before the file is read, so a
    /// misnamed file fails fast without touching the disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CloudError> {
        let path = path.as_ref();
        let state = QuantumState::from_file_name(path)?;
        let profile = RadialProfile::load(path)?;
        log::info!("loaded {state} from {}", path.display());
        Ok(Self {
            state,
            profile,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn state(&self) -> &QuantumState {
        &self.state
    }

    pub fn profile(&self) -> &RadialProfile {
        &self.profile
    }

    /// File this dataset came from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
