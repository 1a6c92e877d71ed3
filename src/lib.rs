//! # PismLaunch - Configuration utility for PISM ice-sheet simulation launches
//!
//! This library compiles a user-authored experiment configuration into the
//! exact command-line invocation and auxiliary input files needed to launch
//! the PISM ice-sheet model inside a coupled-model workflow.
//!
//! ## Overview
//!
//! A PISM run is driven by a long command line: forcing-model selectors for
//! the ocean, surface and atmosphere couplers, per-model forcing files and
//! parameters, a runtime parameter-overrides file, and the input/output and
//! year-range arguments. Writing that command by hand is error prone; an
//! incorrect invocation surfaces only hours into the downstream simulation.
//! PismLaunch takes the experiment YAML as the single source of truth and
//! derives everything else from it.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Type-safe experiment configuration structures and the
//!   resolved compilation target
//! - `config_loader`: Experiment file loading and writing
//! - `compile`: The configuration-to-invocation compiler pipeline
//!   (coupler assembly, option rendering, overrides generation, command
//!   assembly)
//! - `dataset`: Parameter-dataset access for the overrides template and
//!   the generated overrides file
//! - `diagnostics`: Injected diagnostics sink used by every compiler stage
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pismlaunch::compile::compile;
//! use pismlaunch::config_loader;
//! use pismlaunch::dataset::JsonDatasetStore;
//! use pismlaunch::diagnostics::LogDiagnostics;
//!
//! let mut config = config_loader::load_config("experiment.yaml".as_ref())?;
//! let target = config.resolve_target("pism")?;
//! compile(target, &JsonDatasetStore, &mut LogDiagnostics)?;
//!
//! // The pism section now carries `execution_command` plus the forcing and
//! // config file bookkeeping the surrounding workflow stages files from.
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! Experiment files use YAML with one section per model component plus a
//! shared `general` section:
//!
//! ```yaml
//! general:
//!   nyear: 10
//!
//! pism:
//!   executable: "/work/pism/bin/pismr"
//!   couplers:
//!     ocean:
//!       pik: {}
//!     atmosphere:
//!       given:
//!         files:
//!           atmosphere_given_file: "/pool/forcing/bar.nc"
//!         kv_pairs:
//!           - atmosphere_given_period: 1
//!       lapse_rate: {}
//!   flags:
//!     - kill_icebergs
//!   overrides_kv_pairs:
//!     "frontal_melt.given.period": 3
//! ```
//!
//! ## Error Handling
//!
//! Compiler stages return typed `CompileError` values; nothing in the
//! library terminates the process. The `pismlaunch` binary reports the
//! diagnostic and exits non-zero, which keeps the fail-fast behavior the
//! surrounding workflow relies on while leaving library callers in charge
//! of their own process lifecycle.

pub mod compile;
pub mod config;
pub mod config_loader;
pub mod dataset;
pub mod diagnostics;

pub use compile::{compile, CompileError};
