use crate::compile::CompileError;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level experiment configuration that mirrors the YAML file.
///
/// One experiment file carries a shared `general` section plus one section
/// per model component (`pism`, or hemisphere variants like `pism_nhem`).
/// The compiler reads and extends exactly one component section; which one
/// is decided once, up front, through [`ExperimentConfig::resolve_target`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Shared run parameters
    pub general: GeneralSection,
    /// Named model component sections
    #[serde(flatten)]
    pub components: BTreeMap<String, PismSection>,
}

impl ExperimentConfig {
    /// Select the component section the compiler operates on.
    ///
    /// Selection happens exactly once; every compiler stage afterwards
    /// receives the resolved handle instead of looking sections up by name.
    pub fn resolve_target(&mut self, name: &str) -> Result<CompileTarget<'_>, CompileError> {
        let Self { general, components } = self;
        let section = components
            .get_mut(name)
            .ok_or_else(|| CompileError::UnknownComponent(name.to_string()))?;
        Ok(CompileTarget {
            section,
            general: &*general,
        })
    }
}

/// One resolved compilation target: the component section the compiler
/// mutates plus the shared general section it reads.
#[derive(Debug)]
pub struct CompileTarget<'a> {
    pub section: &'a mut PismSection,
    pub general: &'a GeneralSection,
}

/// Shared run parameters read by every component compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    /// Run length in years
    pub nyear: i64,
    /// Keys belonging to other pipeline stages; carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The PISM component section: everything the compiler reads, plus the
/// bookkeeping it writes for downstream staging and launch steps.
///
/// The three `forcing_*` maps (and likewise the three `config_*` maps) are
/// parallel, keyed by file tag. They must always agree on their key sets,
/// so they are only ever mutated through [`PismSection::register_forcing_file`]
/// and [`PismSection::register_config_file`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PismSection {
    /// Declared couplers: category -> model name -> model options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub couplers: Option<Mapping>,

    /// Global key-value options, outside any coupler. Either a mapping or
    /// a list of single-entry mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kv_pairs: Option<Value>,

    /// Global boolean flags, outside any coupler
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Runtime parameter overrides. Same two authoring shapes as `kv_pairs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides_kv_pairs: Option<Value>,

    /// Pre-built overrides file; set this to skip overrides generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides_file: Option<String>,

    /// Parameter template to validate override keys against; defaults to
    /// the one shipped in `model_dir`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,

    /// PISM installation directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,

    /// Per-run configuration directory the generated overrides file lands in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thisrun_config_dir: Option<String>,

    /// Accumulated command-line fragments. Append-only; duplicates are
    /// tolerated here and collapsed at final assembly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pism_command_line_opts: Vec<String>,

    /// Forcing file bookkeeping: tag -> logical name (the tag itself)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub forcing_files: BTreeMap<String, String>,
    /// Forcing file bookkeeping: tag -> source path
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub forcing_sources: BTreeMap<String, String>,
    /// Forcing file bookkeeping: tag -> file name inside the run directory
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub forcing_in_work: BTreeMap<String, String>,

    /// Config file bookkeeping: tag -> logical name (the tag itself)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config_files: BTreeMap<String, String>,
    /// Config file bookkeeping: tag -> source path
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config_sources: BTreeMap<String, String>,
    /// Config file bookkeeping: tag -> file name inside the run directory
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config_in_work: BTreeMap<String, String>,

    /// Path to the PISM executable
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub executable: String,

    /// Input restart file as staged in the work directory, keyed `input`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input_in_work: BTreeMap<String, String>,

    /// Restart output path, keyed `restart`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub restart_out_in_workdir: BTreeMap<String, String>,

    /// Diagnostic output files, keyed `ts_file` and `ex_file`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_files: BTreeMap<String, String>,

    /// Variables written to the scalar time-series output
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ts_vars: Vec<String>,
    /// Variables written to the spatial diagnostics output
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ex_vars: Vec<String>,
    /// Time specification for the scalar time-series output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_times: Option<String>,
    /// Time specification for the spatial diagnostics output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ex_times: Option<String>,
    /// Output verbosity class passed as `-o_size`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_size: Option<String>,
    /// Start year of this leg of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_year: Option<i64>,

    /// The assembled invocation, written by the command assembler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_command: Option<String>,

    /// Keys belonging to other pipeline stages; carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PismSection {
    /// Register a forcing file under its tag.
    ///
    /// The three parallel forcing maps move together; never insert into
    /// one of them directly.
    pub fn register_forcing_file(&mut self, tag: &str, source: &str) {
        self.forcing_files.insert(tag.to_string(), tag.to_string());
        self.forcing_sources.insert(tag.to_string(), source.to_string());
        self.forcing_in_work.insert(tag.to_string(), basename(source));
    }

    /// Register a generated or supplied configuration file under its tag.
    ///
    /// Same joint-update rule as [`PismSection::register_forcing_file`].
    pub fn register_config_file(&mut self, tag: &str, source: &str) {
        self.config_files.insert(tag.to_string(), tag.to_string());
        self.config_sources.insert(tag.to_string(), source.to_string());
        self.config_in_work.insert(tag.to_string(), basename(source));
    }
}

/// Options bundle for one chosen coupler model. All three keys are
/// optional; an empty bundle still marks the model as chosen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Forcing files: file tag -> source path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Mapping>,
    /// Key-value options, as a mapping or a list of single-entry mappings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kv_pairs: Option<Value>,
    /// Boolean flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
}

impl ModelOptions {
    pub fn is_empty(&self) -> bool {
        self.files.is_none() && self.kv_pairs.is_none() && self.flags.is_none()
    }
}

/// Final path component of `path`, the name a staged file carries inside
/// the run directory. Falls back to the input unchanged when there is no
/// final component to take.
pub fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
