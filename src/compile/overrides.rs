//! Runtime parameter overrides.
//!
//! PISM reads a `pism_overrides.nc` dataset at startup whose attributes
//! supersede its compiled-in defaults. This stage either passes a
//! user-supplied overrides file through, or generates one: the template
//! parameter dataset (a user-specified `config_file`, or the one shipped
//! under `model_dir`) defines the universe of valid keys, and the generated
//! dataset carries exactly the requested overrides and nothing else.
//!
//! Supplying an overrides file and extending it with `overrides_kv_pairs`
//! at the same time is not supported; the supplied file wins and no
//! generation happens.

use crate::compile::options::{key_str, normalize_kv, scalar_str};
use crate::compile::CompileError;
use crate::config::{basename, PismSection};
use crate::dataset::DatasetStore;
use crate::diagnostics::{Diagnostics, Severity};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Tag under which the overrides file is registered for staging.
const OVERRIDES_TAG: &str = "pism_overrides";

/// File name of the generated overrides dataset inside the per-run
/// configuration directory.
const OVERRIDES_FILE_NAME: &str = "pism_overrides.nc";

/// Template location relative to the PISM installation directory.
const DEFAULT_TEMPLATE: &str = "share/pism/pism_config.nc";

/// Produce the overrides file this run will load, register it in the
/// config-file bookkeeping and append the `-pism_override` option.
pub fn write_overrides_file(
    section: &mut PismSection,
    store: &dyn DatasetStore,
    diag: &mut dyn Diagnostics,
) -> Result<(), CompileError> {
    let source = match section.overrides_file.clone() {
        Some(path) => {
            diag.report(
                Severity::Info,
                &format!("Using specified pism_overrides {}", path),
            );
            path
        }
        None => generate_overrides(section, store, diag)?,
    };

    section.register_config_file(OVERRIDES_TAG, &source);
    section
        .pism_command_line_opts
        .push(format!("-pism_override {}", basename(&source)));
    Ok(())
}

/// Generate a fresh overrides dataset from the template.
///
/// Every requested key must exist in the template's attribute set; the
/// first unknown key aborts the compilation before anything is written.
fn generate_overrides(
    section: &mut PismSection,
    store: &dyn DatasetStore,
    diag: &mut dyn Diagnostics,
) -> Result<String, CompileError> {
    let template_path = template_path(section)?;
    let mut template = match store.open(&template_path) {
        Ok(dataset) => dataset,
        Err(source) => {
            diag.report(
                Severity::Error,
                "Unable to open the default PISM config file, sorry!",
            );
            diag.report(Severity::Error, "Was looking here:");
            diag.report(Severity::Error, &template_path.display().to_string());
            return Err(CompileError::TemplateUnavailable {
                path: template_path,
                source,
            });
        }
    };

    let mut staged = BTreeMap::new();
    if let Some(kv) = section.overrides_kv_pairs.clone() {
        let pairs = normalize_kv(&kv, "overrides_kv_pairs")?;
        for (key, value) in &pairs {
            let key = key_str(key, "overrides_kv_pairs")?;
            diag.report(
                Severity::Debug,
                &format!("Overrides file: {} {}", key, scalar_str(&key, value)?),
            );
            if !template.has_attr(&key) {
                diag.report(
                    Severity::Error,
                    &format!("Unknown PISM configuration key: {}", key),
                );
                return Err(CompileError::UnknownOverrideKey(key));
            }
            diag.report(
                Severity::Info,
                &format!(
                    "The pism_overrides.nc file will contain {}: {}",
                    key,
                    scalar_str(&key, value)?
                ),
            );
            staged.insert(key.clone(), attr_value(&key, value)?);
        }
    }

    template.set_attrs(staged);
    diag.report(Severity::Info, "Writing a new pism_overrides.nc file!");

    let config_dir = section
        .thisrun_config_dir
        .as_deref()
        .ok_or(CompileError::MissingField("thisrun_config_dir"))?;
    let out_path = Path::new(config_dir).join(OVERRIDES_FILE_NAME);
    store
        .write(&template, &out_path)
        .map_err(|source| CompileError::OverridesWrite {
            path: out_path.clone(),
            source,
        })?;
    Ok(out_path.to_string_lossy().into_owned())
}

/// Where to look for the parameter template.
fn template_path(section: &PismSection) -> Result<PathBuf, CompileError> {
    if let Some(config_file) = &section.config_file {
        return Ok(PathBuf::from(config_file));
    }
    let model_dir = section
        .model_dir
        .as_deref()
        .ok_or(CompileError::MissingField("model_dir"))?;
    Ok(Path::new(model_dir).join(DEFAULT_TEMPLATE))
}

/// Convert a YAML scalar into a dataset attribute value.
fn attr_value(key: &str, value: &Value) -> Result<serde_json::Value, CompileError> {
    match value {
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(serde_json::Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(serde_json::Value::from(u))
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| CompileError::NonScalarValue {
                        key: key.to_string(),
                    })
            }
        }
        _ => Err(CompileError::NonScalarValue {
            key: key.to_string(),
        }),
    }
}
