//! The configuration-to-invocation compiler.
//!
//! Four stages run in a fixed order over one resolved component section:
//!
//! 1. `couplers`: validate the declared coupler categories and render each
//!    chosen model's files, key-value pairs and flags, plus the per-category
//!    selector fragment
//! 2. `options`: render the section's global key-value pairs and flags
//! 3. `overrides`: produce (or pass through) the runtime parameter
//!    overrides file and register it
//! 4. `command`: collapse the accumulated fragments into the final
//!    invocation string
//!
//! Every stage appends to the section's `pism_command_line_opts`; later
//! stages see what earlier stages wrote. The first error aborts the whole
//! compilation: a half-compiled section would launch a wrong and very
//! expensive simulation, so there is no partial-success path.

pub mod command;
pub mod couplers;
pub mod options;
pub mod overrides;

use crate::config::CompileTarget;
use crate::dataset::{DatasetError, DatasetStore};
use crate::diagnostics::Diagnostics;
use std::path::PathBuf;
use thiserror::Error;

/// Compilation errors. Each variant names the offending configuration
/// value so the user can fix the experiment file without re-running at a
/// higher verbosity.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("no component section named '{0}' in the experiment configuration")]
    UnknownComponent(String),

    #[error("'{0}' is not a coupler type; valid types are ocean, surface and atmosphere")]
    UnknownCouplerCategory(String),

    #[error("coupler category '{category}' must map model names to their options, found {found}")]
    MalformedCoupler {
        category: String,
        found: &'static str,
    },

    #[error("invalid options for coupler model '{model}': {source}")]
    InvalidModelOptions {
        model: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("'{context}' must be a mapping or a list of mappings, found {found}")]
    MalformedKvEntry {
        context: String,
        found: &'static str,
    },

    #[error("value for '{key}' cannot be rendered on a command line")]
    NonScalarValue { key: String },

    #[error("unknown PISM configuration key: {0}")]
    UnknownOverrideKey(String),

    #[error("unable to open the PISM config template at {path:?}")]
    TemplateUnavailable {
        path: PathBuf,
        #[source]
        source: DatasetError,
    },

    #[error("unable to write the overrides file to {path:?}")]
    OverridesWrite {
        path: PathBuf,
        #[source]
        source: DatasetError,
    },

    #[error("missing required configuration field '{0}'")]
    MissingField(&'static str),
}

/// Run the full compiler pipeline over one resolved target.
///
/// Mutates the target section in place: on success it carries the
/// assembled `execution_command`, the accumulated command-line options and
/// the forcing/config file bookkeeping the surrounding workflow stages
/// files from.
pub fn compile(
    target: CompileTarget<'_>,
    store: &dyn DatasetStore,
    diag: &mut dyn Diagnostics,
) -> Result<(), CompileError> {
    let CompileTarget { section, general } = target;
    couplers::set_couplers(section, diag)?;
    options::set_kv_pairs(section)?;
    options::set_flags(section);
    overrides::write_overrides_file(section, store, diag)?;
    command::assemble_command(section, general, diag)?;
    Ok(())
}
