//! End-to-end sampling from data files on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use orbital_cloud::{
    CancelToken, CloudBuilder, CloudParams, Component, Dataset, FillOutcome, Generation, Hue,
    Palette, PointCloudBuffer, RedrawRequest, SamplingConfig,
};

fn write(dir: &Path, name: &str, rows: &[(f64, f64)]) -> PathBuf {
    let path = dir.join(name);
    let text: String = rows.iter().map(|(r, v)| format!("{r},{v}\n")).collect();
    std::fs::write(&path, text).unwrap();
    path
}

fn fill(
    dataset: Dataset,
    m: i32,
    component: Component,
    point_count: usize,
    seed: u64,
) -> PointCloudBuffer {
    let config = SamplingConfig {
        seed: Some(seed),
        worker_threads: Some(4),
        ..SamplingConfig::default()
    };
    let builder = CloudBuilder::new(&config, Palette::default()).unwrap();
    let request = RedrawRequest {
        dataset: Arc::new(dataset),
        params: CloudParams {
            m,
            component,
            point_count,
        },
    };
    let mut buffer = PointCloudBuffer::default();
    let report = builder.fill(&mut buffer, &request, 1, &CancelToken::new()).unwrap();
    assert_eq!(report.outcome, FillOutcome::Complete);
    buffer
}

#[test]
fn coarse_1s_density_stays_inside_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "rho_H_1s.csv",
        &[(0.1, 0.0), (1.0, 1.0), (2.0, 0.5), (5.0, 0.0)],
    );
    let dataset = Dataset::load(&path).unwrap();
    let r_max = dataset.state().r_max();

    let cloud = fill(dataset, 0, Component::Real, 1000, 42);
    assert_eq!(cloud.len(), 1000);
    assert_eq!(cloud.generation(), Generation::Ready);

    let palette = Palette::default();
    for point in cloud.points() {
        let r = point.position.length() as f64;
        assert!(r <= r_max);
        assert!(r <= 5.0 + 1e-5);
        assert_eq!(palette.classify(point.color), Some(Hue::Neutral));
    }
}

#[test]
fn p_orbital_m0_lobes_are_balanced() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<(f64, f64)> = (0..300)
        .map(|i| {
            let r = 0.05 + 0.05 * i as f64;
            (r, r * (-r / 2.0).exp())
        })
        .collect();
    let path = write(dir.path(), "wf_H_2p.csv", &rows);

    let cloud = fill(Dataset::load(&path).unwrap(), 0, Component::Real, 4000, 7);
    let palette = Palette::default();
    let positive = cloud.points().iter().filter(|p| p.color == palette.positive).count();
    let negative = cloud.points().iter().filter(|p| p.color == palette.negative).count();

    assert_eq!(positive + negative, 4000);
    let ratio = positive as f64 / negative as f64;
    assert!((0.8..1.25).contains(&ratio), "positive={positive} negative={negative}");

    // Y_1^0 ∝ cos θ: the positive lobe is the upper half space.
    for point in cloud.points() {
        if point.color == palette.positive {
            assert!(point.position.z >= 0.0);
        } else {
            assert!(point.position.z <= 0.0);
        }
    }
}

#[test]
fn imaginary_part_of_m0_is_uniform_shell() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "wf_H_2p.csv", &[(1.0, 0.3), (2.0, 0.4), (3.0, 0.1)]);

    let cloud = fill(Dataset::load(&path).unwrap(), 0, Component::Imaginary, 500, 3);
    let palette = Palette::default();
    for point in cloud.points() {
        let r = point.position.length() as f64;
        assert!((1.0 - 1e-5..=3.0 + 1e-5).contains(&r));
        assert_eq!(point.color, palette.neutral);
    }
}
