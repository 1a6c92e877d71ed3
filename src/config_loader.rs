use crate::config::ExperimentConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse an experiment configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<ExperimentConfig> {
    info!("Loading experiment configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open experiment file '{}'", config_path.display()))?;

    let config: ExperimentConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse experiment file '{}'", config_path.display()))?;

    info!(
        "Found component sections: {}",
        config.components.keys().cloned().collect::<Vec<_>>().join(", ")
    );

    Ok(config)
}

/// Write a (possibly compiled) experiment configuration back out as YAML
pub fn write_config(config: &ExperimentConfig, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .wrap_err_with(|| format!("Failed to create output file '{}'", output_path.display()))?;

    serde_yaml::to_writer(file, config)
        .wrap_err_with(|| format!("Failed to write configuration to '{}'", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_experiment_config() {
        let yaml = r#"
general:
  nyear: 10
pism:
  executable: "/work/pism/bin/pismr"
  couplers:
    ocean:
      pik: {}
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.general.nyear, 10);
        assert!(config.components.contains_key("pism"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Path::new("/no/such/experiment.yaml")).is_err());
    }

    #[test]
    fn test_write_round_trip() {
        let yaml = r#"
general:
  nyear: 10
pism:
  executable: "/work/pism/bin/pismr"
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();
        let config = load_config(temp_file.path()).unwrap();

        let out_file = NamedTempFile::new().unwrap();
        write_config(&config, out_file.path()).unwrap();

        let reread = load_config(out_file.path()).unwrap();
        assert_eq!(reread.general.nyear, 10);
        assert_eq!(reread.components["pism"].executable, "/work/pism/bin/pismr");
    }
}
