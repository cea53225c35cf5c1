//! Command-level tests, driving the commands as `main` does.

use pimwalk_cli::commands::config::config_path;
use pimwalk_cli::{ImageCommand, RunCommand, load_configuration};
use pimwalk_cli::commands::run::print_report;
use pimwalk_common::{KernelId, PimConfig, Scaling};
use pimwalk_host::{RoundTimer, RunReport, VerificationReport};
use serial_test::serial;

fn small_config() -> PimConfig {
    let mut cfg = PimConfig::default();
    cfg.system.accelerators = 2;
    cfg.system.tasklets = 4;
    cfg.system.block_size = 256;
    cfg.run.input_size = 200;
    cfg.run.warmup = 0;
    cfg.run.reps = 1;
    cfg
}

#[test]
fn run_flags_override_config() {
    let cmd = RunCommand {
        kernel: Some(KernelId::EdgeScan),
        accelerators: Some(3),
        scaling: Some(Scaling::Weak),
        seed: Some(11),
        ..RunCommand::default()
    };
    let cfg = cmd.apply(&small_config()).unwrap();
    assert_eq!(cfg.run.kernel, KernelId::EdgeScan);
    assert_eq!(cfg.system.accelerators, 3);
    assert_eq!(cfg.run.total_size(cfg.system.accelerators), 600);
    assert_eq!(cfg.run.seed, 11);
    assert_eq!(cfg.system.tasklets, 4);
}

#[test]
fn run_flags_are_validated() {
    let cmd = RunCommand { block_size: Some(24), ..RunCommand::default() };
    let err = cmd.apply(&small_config()).unwrap_err();
    assert!(format!("{err:#}").contains("power of two"), "{err:#}");
}

#[test]
fn run_every_kernel_passes_verification() {
    for kernel in KernelId::ALL {
        let cmd = RunCommand { kernel: Some(kernel), ..RunCommand::default() };
        let cfg = cmd.apply(&small_config()).unwrap();
        let report = cmd.run(&cfg).unwrap();
        assert!(report.passed(), "{kernel}: {}", report.verification);
        assert_eq!(report.walk.is_some(), kernel.is_walk());
    }
}

#[test]
fn execute_returns_success_exit_code() {
    let code = RunCommand::default().execute(&small_config()).unwrap();
    assert_eq!(code, pimwalk_cli::EXIT_SUCCESS);
}

fn report_with(verification: VerificationReport) -> RunReport {
    RunReport {
        kernel: KernelId::VectorAdd,
        accelerators: 2,
        tasklets: 4,
        elements: 8,
        timing: RoundTimer::new(0).report(1),
        verification,
        walk: None,
    }
}

#[test]
fn mismatch_maps_to_verification_exit_code() {
    let failed = VerificationReport { total: 8, mismatches: 1, first_mismatch: Some(3) };
    assert_eq!(print_report(&report_with(failed)), pimwalk_cli::EXIT_VERIFICATION_FAILED);

    let passed = VerificationReport { total: 8, mismatches: 0, first_mismatch: None };
    assert_eq!(print_report(&report_with(passed)), pimwalk_cli::EXIT_SUCCESS);
}

#[test]
fn image_written_then_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pimwalk.bin");
    let cfg = small_config();
    ImageCommand { output: path.clone(), tasklets: None }.execute(&cfg).unwrap();

    let cmd = RunCommand { binary: Some(path), ..RunCommand::default() };
    assert!(cmd.run(&cfg).unwrap().passed());
}

#[test]
fn image_for_other_tasklet_count_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pimwalk.bin");
    let cfg = small_config();
    ImageCommand { output: path.clone(), tasklets: Some(8) }.execute(&cfg).unwrap();

    let cmd = RunCommand { binary: Some(path), ..RunCommand::default() };
    let err = cmd.run(&cfg).unwrap_err();
    assert!(format!("{err:#}").contains("built for 8 tasklet(s)"), "{err:#}");
}

#[test]
fn missing_binary_is_fatal() {
    let cmd = RunCommand { binary: Some("/nonexistent/pimwalk.bin".into()), ..RunCommand::default() };
    assert!(cmd.run(&small_config()).is_err());
}

#[test]
#[serial(pimwalk_env)]
fn explicit_config_file_is_loaded() {
    temp_env::with_vars([("PIMWALK_ACCELERATORS", None::<&str>), ("PIMWALK_KERNEL", None)], || {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[system]\naccelerators = 7\n[run]\nkernel = \"edge-reduce\"\n").unwrap();

        assert_eq!(config_path(Some(&path)), Some(path.clone()));
        let cfg = load_configuration(Some(&path)).unwrap();
        assert_eq!(cfg.system.accelerators, 7);
        assert_eq!(cfg.run.kernel, KernelId::EdgeReduce);
    });
}

#[test]
#[serial(pimwalk_env)]
fn environment_overrides_file() {
    temp_env::with_vars([("PIMWALK_ACCELERATORS", Some("5"))], || {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[system]\naccelerators = 7\n").unwrap();
        assert_eq!(load_configuration(Some(&path)).unwrap().system.accelerators, 5);
    });
}

#[test]
fn malformed_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[system\naccelerators = ").unwrap();
    let err = load_configuration(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load configuration"));
}
