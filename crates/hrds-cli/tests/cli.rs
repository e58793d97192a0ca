//! Runs the `hrds` binary against rasters in a temporary directory.

use hrds_raster::{write_geotiff, GeoTransform};
use std::path::Path;
use std::process::Command;

fn write_uniform(path: &Path, x0: f64, y0: f64, size: u32, value: f32) {
    let transform = GeoTransform::new(x0, y0 + size as f64 * 10.0, 10.0, 10.0);
    write_geotiff(path, &vec![value; (size * size) as usize], size, size, transform, None)
        .expect("Failed to write raster");
}

fn setup(dir: &Path) -> std::path::PathBuf {
    write_uniform(&dir.join("base.tif"), -100.0, -100.0, 40, 100.0);
    write_uniform(&dir.join("survey.tif"), 0.0, 0.0, 11, 50.0);
    let config = dir.join("stack.yaml");
    std::fs::write(
        &config,
        "base: { path: base.tif }\nrasters:\n  - { path: survey.tif, distance: 50.0 }\n",
    )
    .unwrap();
    config
}

fn values(stdout: &[u8]) -> Vec<f64> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| l.split_whitespace().nth(2).unwrap().parse().unwrap())
        .collect()
}

#[test]
fn test_query_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_hrds"))
        .args(["query", "-c"])
        .arg(&config)
        .args(["25,55", "55,55", "200,-50"])
        .output()
        .expect("Failed to run hrds");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let v = values(&output.stdout);
    assert_eq!(v.len(), 3);
    assert!((v[0] - 80.0).abs() < 1e-4);
    assert_eq!(v[1], 50.0);
    assert_eq!(v[2], 100.0);
}

#[test]
fn test_sample_command_reports_failures_as_nan() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let input = dir.path().join("points.txt");
    let out = dir.path().join("values.txt");
    std::fs::write(&input, "# x y\n55 55\n5000 5000\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_hrds"))
        .args(["sample", "-c"])
        .arg(&config)
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .status()
        .expect("Failed to run hrds");
    assert!(status.success());

    let v = values(&std::fs::read(&out).unwrap());
    assert_eq!(v[0], 50.0);
    assert!(v[1].is_nan());
}

#[test]
fn test_buffer_command() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());

    let status = Command::new(env!("CARGO_BIN_EXE_hrds"))
        .arg("buffer")
        .arg(dir.path().join("survey.tif"))
        .args(["-d", "50"])
        .status()
        .expect("Failed to run hrds");
    assert!(status.success());
    assert!(dir.path().join("survey_buffer.tif").exists());
}

#[test]
fn test_bad_config_count_fails() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());
    let config = dir.path().join("bad.yaml");
    std::fs::write(
        &config,
        "base: { path: base.tif }\nrasters:\n  - { path: survey.tif }\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_hrds"))
        .args(["query", "-c"])
        .arg(&config)
        .arg("1,1")
        .output()
        .expect("Failed to run hrds");
    assert!(!output.status.success());
}
