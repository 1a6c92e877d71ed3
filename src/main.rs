use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use pismlaunch::compile::compile;
use pismlaunch::config_loader;
use pismlaunch::dataset::JsonDatasetStore;
use pismlaunch::diagnostics::LogDiagnostics;

/// Configuration utility for launching PISM ice-sheet simulations in coupled experiments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the experiment configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Name of the component section to compile
    #[arg(long, default_value = "pism")]
    component: String,

    /// Where to write the compiled configuration (YAML); omit to only print
    /// the assembled command
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting PismLaunch configuration compiler");
    info!("Configuration file: {:?}", args.config);
    info!("Target component: {}", args.component);

    // Load the experiment configuration
    let mut config = config_loader::load_config(&args.config)?;

    // Resolve the target section once, then run the compiler pipeline.
    // Any compile error propagates out of main and terminates the process
    // with a non-zero exit status; a half-compiled configuration must
    // never reach the launch step.
    let target = config.resolve_target(&args.component)?;
    compile(target, &JsonDatasetStore, &mut LogDiagnostics)?;

    if let Some(command) = config
        .components
        .get(&args.component)
        .and_then(|section| section.execution_command.as_deref())
    {
        println!("{}", command);
    }

    if let Some(output) = &args.output {
        config_loader::write_config(&config, output)?;
        info!("Compiled configuration written to: {:?}", output);
    }

    info!("Configuration compilation completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(&["pismlaunch", "--config", "experiment.yaml"]);

        assert_eq!(args.config, PathBuf::from("experiment.yaml"));
        assert_eq!(args.component, "pism");
        assert_eq!(args.output, None);
    }

    #[test]
    fn test_component_override() {
        let args = Args::parse_from(&[
            "pismlaunch",
            "--config",
            "experiment.yaml",
            "--component",
            "pism_nhem",
            "--output",
            "compiled.yaml",
        ]);

        assert_eq!(args.component, "pism_nhem");
        assert_eq!(args.output, Some(PathBuf::from("compiled.yaml")));
    }
}
