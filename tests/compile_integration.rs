//! End-to-end tests: experiment YAML in, assembled PISM invocation out.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use pismlaunch::compile::{compile, CompileError};
use pismlaunch::config::ExperimentConfig;
use pismlaunch::config_loader;
use pismlaunch::dataset::{DatasetStore, JsonDatasetStore, ParamDataset};
use pismlaunch::diagnostics::CapturedDiagnostics;

/// Template with the override keys the example experiments use.
fn write_template(dir: &Path) -> std::path::PathBuf {
    let mut attributes = BTreeMap::new();
    attributes.insert("frontal_melt.given.period".to_string(), serde_json::json!(1));
    attributes.insert("atmosphere_given_period".to_string(), serde_json::json!(1));
    attributes.insert("surface.pdd.factor_ice".to_string(), serde_json::json!(0.008));
    let template = ParamDataset::new(attributes);

    let path = dir.join("pism_config.nc");
    JsonDatasetStore.write(&template, &path).unwrap();
    path
}

/// A full experiment configuration, close to what a real setup looks like.
fn example_config(template: &Path, config_dir: &Path) -> ExperimentConfig {
    let yaml = format!(
        r#"
general:
  nyear: 10
pism:
  executable: "/work/pism/bin/pismr"
  config_file: "{template}"
  thisrun_config_dir: "{config_dir}"
  current_year: 2000
  couplers:
    ocean:
      pik: {{}}
    atmosphere:
      given:
        files:
          atmosphere_given_file: "/data/bar.nc"
        kv_pairs:
          - atmosphere_given_period: 1
      lapse_rate: {{}}
  kv_pairs:
    sia_e: 2.0
  flags:
    - kill_icebergs
  overrides_kv_pairs:
    "frontal_melt.given.period": 3
  input_in_work:
    input: "/run/work/input_restart.nc"
  restart_out_in_workdir:
    restart: "restart_2010.nc"
  output_files:
    ts_file: "ts_2000-2010.nc"
    ex_file: "ex_2000-2010.nc"
  ts_vars: [dt, volume_glacierized]
  ex_vars: [thk, velsurf_mag]
  ts_times: "yearly"
  ex_times: "0:10:1000"
  output_size: "medium"
"#,
        template = template.display(),
        config_dir = config_dir.display(),
    );
    serde_yaml::from_str(&yaml).unwrap()
}

#[test]
fn test_full_compilation() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let mut config = example_config(&template, dir.path());
    let mut diag = CapturedDiagnostics::new();

    let target = config.resolve_target("pism").unwrap();
    compile(target, &JsonDatasetStore, &mut diag).unwrap();

    let section = &config.components["pism"];
    let opts = &section.pism_command_line_opts;
    for expected in [
        "-ocean pik",
        "-atmosphere given,lapse_rate",
        "-atmosphere_given_file bar.nc",
        "-atmosphere_given_period 1",
        "-sia_e 2.0",
        "-kill_icebergs",
        "-pism_override pism_overrides.nc",
    ] {
        assert!(
            opts.contains(&expected.to_string()),
            "missing option fragment: {expected}"
        );
    }

    // forcing bookkeeping for the staged atmosphere file
    assert_eq!(
        section.forcing_sources["atmosphere_given_file"],
        "/data/bar.nc"
    );
    assert_eq!(section.forcing_in_work["atmosphere_given_file"], "bar.nc");

    // the generated overrides dataset holds exactly the requested override
    let overrides_path = dir.path().join("pism_overrides.nc");
    let written = JsonDatasetStore.open(&overrides_path).unwrap();
    assert_eq!(written.attributes.len(), 1);
    assert_eq!(
        written.attributes["frontal_melt.given.period"],
        serde_json::json!(3)
    );

    // assembled command carries the fixed positional arguments
    let command = section.execution_command.as_deref().unwrap();
    assert!(command.starts_with("/work/pism/bin/pismr -i input_restart.nc -ys 2000 -y 10"));
    assert!(command.contains("-ts_file ts_2000-2010.nc"));
    assert!(command.contains("-ts_vars dt,volume_glacierized"));
    assert!(command.contains("-extra_vars thk,velsurf_mag"));
    assert!(command.ends_with("-o restart_2010.nc -o_size medium -options_left"));
    assert!(diag.contains("PISM will be run like this:"));
}

#[test]
fn test_command_is_deterministic_across_compilations() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());

    let mut first = example_config(&template, dir.path());
    let mut second = example_config(&template, dir.path());
    let mut diag = CapturedDiagnostics::new();

    compile(first.resolve_target("pism").unwrap(), &JsonDatasetStore, &mut diag).unwrap();
    compile(second.resolve_target("pism").unwrap(), &JsonDatasetStore, &mut diag).unwrap();

    assert_eq!(
        first.components["pism"].execution_command,
        second.components["pism"].execution_command
    );
}

#[test]
fn test_duplicate_fragments_collapse_in_command() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let mut config = example_config(&template, dir.path());

    // the same flag both globally and under a coupler model
    {
        let section = config.components.get_mut("pism").unwrap();
        section
            .pism_command_line_opts
            .push("-kill_icebergs".to_string());
    }
    let mut diag = CapturedDiagnostics::new();

    compile(config.resolve_target("pism").unwrap(), &JsonDatasetStore, &mut diag).unwrap();

    let command = config.components["pism"]
        .execution_command
        .as_deref()
        .unwrap();
    assert_eq!(command.matches("-kill_icebergs").count(), 1);
    assert_eq!(command.matches("-ocean pik").count(), 1);
    assert_eq!(command.matches("-pism_override").count(), 1);
}

#[test]
fn test_bad_coupler_category_fails_whole_compilation() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let mut config = example_config(&template, dir.path());

    {
        let section = config.components.get_mut("pism").unwrap();
        let couplers = section.couplers.as_mut().unwrap();
        couplers.insert(
            serde_yaml::Value::from("lala"),
            serde_yaml::from_str("{pik: {}}").unwrap(),
        );
    }
    let mut diag = CapturedDiagnostics::new();

    let err = compile(config.resolve_target("pism").unwrap(), &JsonDatasetStore, &mut diag)
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownCouplerCategory(c) if c == "lala"));
    assert!(diag.contains("lala"));
    assert!(config.components["pism"].execution_command.is_none());
}

#[test]
fn test_unknown_override_key_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let mut config = example_config(&template, dir.path());

    {
        let section = config.components.get_mut("pism").unwrap();
        section.overrides_kv_pairs = Some(serde_yaml::from_str("{no.such.key: 1}").unwrap());
    }
    let mut diag = CapturedDiagnostics::new();

    let err = compile(config.resolve_target("pism").unwrap(), &JsonDatasetStore, &mut diag)
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownOverrideKey(k) if k == "no.such.key"));
    assert!(!dir.path().join("pism_overrides.nc").exists());
}

#[test]
fn test_supplied_overrides_file_passes_through_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let mut config = example_config(&template, dir.path());

    {
        let section = config.components.get_mut("pism").unwrap();
        section.overrides_file = Some("/pool/overrides/my_overrides.nc".to_string());
        section.overrides_kv_pairs = None;
    }
    let mut diag = CapturedDiagnostics::new();

    compile(config.resolve_target("pism").unwrap(), &JsonDatasetStore, &mut diag).unwrap();

    // nothing generated, the supplied path is registered as-is
    assert!(!dir.path().join("pism_overrides.nc").exists());
    let section = &config.components["pism"];
    assert_eq!(
        section.config_sources["pism_overrides"],
        "/pool/overrides/my_overrides.nc"
    );
    assert!(section
        .pism_command_line_opts
        .contains(&"-pism_override my_overrides.nc".to_string()));
}

#[test]
fn test_compiled_config_round_trips_through_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let mut config = example_config(&template, dir.path());
    let mut diag = CapturedDiagnostics::new();

    compile(config.resolve_target("pism").unwrap(), &JsonDatasetStore, &mut diag).unwrap();

    let mut out_file = tempfile::NamedTempFile::new().unwrap();
    config_loader::write_config(&config, out_file.path()).unwrap();
    out_file.flush().unwrap();

    let reread = config_loader::load_config(out_file.path()).unwrap();
    assert_eq!(
        reread.components["pism"].execution_command,
        config.components["pism"].execution_command
    );
    assert_eq!(
        reread.components["pism"].forcing_sources,
        config.components["pism"].forcing_sources
    );
}
