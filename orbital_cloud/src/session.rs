//! Application context: the loaded dataset, the user's selections and the
//! recompute controller driving the cloud.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cloud::{CloudBuilder, CloudParams, FillReport, PointCloudBuffer, RedrawRequest};
use crate::config::CloudConfig;
use crate::controller::{ControllerState, RecomputeController};
use crate::dataset::Dataset;
use crate::error::CloudError;
use crate::quantum_state::{Component, Mode, OrbitalChoice};

pub struct Session {
    config: CloudConfig,
    dataset: Arc<Dataset>,
    choices: Vec<OrbitalChoice>,
    selected: usize,
    component: Component,
    point_count: usize,
    controller: RecomputeController,
}

impl Session {
    /// Load `path` and start drawing its first orbital.
    pub fn open(path: impl AsRef<Path>, config: CloudConfig) -> Result<Self, CloudError> {
        let (dataset, choices) = load_dataset(path.as_ref())?;
        let builder = CloudBuilder::new(&config.sampling, config.palette)?;
        let controller = RecomputeController::new(builder, config.sampling.max_points);
        let point_count = config.sampling.initial_points.min(config.sampling.max_points);

        let mut session = Self {
            config,
            dataset,
            choices,
            selected: 0,
            component: Component::Real,
            point_count,
            controller,
        };
        session.redraw()?;
        Ok(session)
    }

    /// Switch to another data file. On error nothing changes: the previous
    /// dataset, selection and cloud stay as they were.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), CloudError> {
        let (dataset, choices) = load_dataset(path.as_ref())?;
        self.dataset = dataset;
        self.choices = choices;
        self.selected = 0;
        self.component = Component::Real;
        self.redraw()
    }

    /// Redraw with the current selections.
    pub fn redraw(&mut self) -> Result<(), CloudError> {
        let request = RedrawRequest {
            dataset: Arc::clone(&self.dataset),
            params: self.params(),
        };
        self.controller.request_redraw(request).map(|_| ())
    }

    /// Select the orbital at `index` in [`choices`](Self::choices).
    pub fn select_orbital(&mut self, index: usize) -> Result<(), CloudError> {
        let choice = self.choices.get(index).ok_or_else(|| {
            let state = self.dataset.state();
            CloudError::InvalidQuantumNumber {
                n: state.n(),
                l: state.l(),
                m: None,
            }
        })?;
        self.dataset.state().check_m(choice.m)?;
        if index != self.selected {
            self.selected = index;
            self.redraw()?;
        }
        Ok(())
    }

    pub fn set_component(&mut self, component: Component) -> Result<(), CloudError> {
        if component != self.component {
            self.component = component;
            if self.mode() == Mode::Wavefunction {
                self.redraw()?;
            }
        }
        Ok(())
    }

    /// Clamped to `max_points`.
    pub fn set_point_count(&mut self, count: usize) -> Result<(), CloudError> {
        let count = count.min(self.config.sampling.max_points);
        if count != self.point_count {
            self.point_count = count;
            self.redraw()?;
        }
        Ok(())
    }

    /// Stop the current draw, keeping the last finished cloud.
    pub fn stop(&mut self) -> Result<(), CloudError> {
        self.controller.stop()
    }

    /// Pick up a finished cloud. Call once per frame.
    pub fn poll(&mut self) -> Result<Option<u64>, CloudError> {
        self.controller.poll()
    }

    /// Block until the running draw finishes.
    pub fn wait(&mut self) -> Result<Option<FillReport>, CloudError> {
        self.controller.wait()
    }

    /// Cancel and join the worker. Also done on drop.
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }

    pub fn ready(&self) -> Option<Arc<PointCloudBuffer>> {
        self.controller.ready()
    }

    pub fn params(&self) -> CloudParams {
        CloudParams {
            m: self.choices[self.selected].m,
            component: self.component,
            point_count: self.point_count,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn mode(&self) -> Mode {
        self.dataset.state().mode()
    }

    pub fn choices(&self) -> &[OrbitalChoice] {
        &self.choices
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_choice(&self) -> &OrbitalChoice {
        &self.choices[self.selected]
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn title(&self) -> String {
        self.dataset.state().title()
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Calculation time: live while running, else that of the last fill.
    pub fn calculation_time(&self) -> Option<Duration> {
        self.controller
            .running_for()
            .or_else(|| self.controller.last_report().map(|r| r.elapsed))
    }

    pub fn threads(&self) -> usize {
        self.controller.threads()
    }
}

fn load_dataset(path: &Path) -> Result<(Arc<Dataset>, Vec<OrbitalChoice>), CloudError> {
    let dataset = Dataset::load(path)?;
    let choices = dataset.state().orbital_choices()?;
    Ok((Arc::new(dataset), choices))
}
