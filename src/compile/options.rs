//! Key-value normalization and option rendering.
//!
//! The three renderers turn one coupler model's `files`, `kv_pairs` and
//! `flags` into command-line fragments. They are also reused for the
//! section's global key-value pairs and flags.

use crate::compile::CompileError;
use crate::config::{basename, PismSection};
use serde_yaml::{Mapping, Value};

/// Collapse the two key-value authoring shapes into one ordered mapping.
///
/// Authors write either a plain mapping or a list of single-entry mappings;
/// the list form keeps repeated or deliberately ordered keys readable in
/// YAML, where a plain mapping cannot hold duplicates. Later entries win on
/// duplicate keys. `context` names the configuration field for error
/// messages.
pub fn normalize_kv(value: &Value, context: &str) -> Result<Mapping, CompileError> {
    match value {
        Value::Mapping(map) => Ok(map.clone()),
        Value::Sequence(items) => {
            let mut flat = Mapping::new();
            for item in items {
                let Value::Mapping(entry) = item else {
                    return Err(CompileError::MalformedKvEntry {
                        context: context.to_string(),
                        found: value_kind(item),
                    });
                };
                for (key, val) in entry {
                    flat.insert(key.clone(), val.clone());
                }
            }
            Ok(flat)
        }
        other => Err(CompileError::MalformedKvEntry {
            context: context.to_string(),
            found: value_kind(other),
        }),
    }
}

/// Render file options for one coupler model.
///
/// Each entry becomes `-{tag} {basename}`, and the tag is registered in the
/// section's forcing bookkeeping so the staging step later copies the source
/// into the run directory. Paths are taken at face value here; whether they
/// exist is the staging step's problem.
pub fn render_files(section: &mut PismSection, files: &Mapping) -> Result<Vec<String>, CompileError> {
    let mut args = Vec::new();
    for (tag, path) in files {
        let tag = key_str(tag, "files")?;
        let path = scalar_str(&tag, path)?;
        args.push(format!("-{} {}", tag, basename(&path)));
        section.register_forcing_file(&tag, &path);
    }
    Ok(args)
}

/// Render `-{key} {value}` fragments. A key already carrying a leading
/// dash passes through unchanged, never double-dashed.
pub fn render_kv(pairs: &Mapping, context: &str) -> Result<Vec<String>, CompileError> {
    let mut args = Vec::new();
    for (key, value) in pairs {
        let key = key_str(key, context)?;
        let value = scalar_str(&key, value)?;
        if key.starts_with('-') {
            args.push(format!("{} {}", key, value));
        } else {
            args.push(format!("-{} {}", key, value));
        }
    }
    Ok(args)
}

/// Render bare flags; a flag already carrying a dash passes through.
pub fn render_flags(flags: &[String]) -> Vec<String> {
    flags
        .iter()
        .map(|flag| {
            if flag.starts_with('-') {
                flag.clone()
            } else {
                format!("-{}", flag)
            }
        })
        .collect()
}

/// Append the section's global key-value pairs to the accumulated options.
pub fn set_kv_pairs(section: &mut PismSection) -> Result<(), CompileError> {
    if let Some(kv) = section.kv_pairs.clone() {
        let pairs = normalize_kv(&kv, "kv_pairs")?;
        let rendered = render_kv(&pairs, "kv_pairs")?;
        section.pism_command_line_opts.extend(rendered);
    }
    Ok(())
}

/// Append the section's global flags to the accumulated options.
pub fn set_flags(section: &mut PismSection) {
    let rendered = render_flags(&section.flags);
    section.pism_command_line_opts.extend(rendered);
}

/// Render a YAML scalar for interpolation into a command line.
pub(crate) fn scalar_str(key: &str, value: &Value) -> Result<String, CompileError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(CompileError::NonScalarValue {
            key: key.to_string(),
        }),
    }
}

/// A mapping key as text. YAML allows non-string scalar keys, so numbers
/// and booleans are rendered rather than rejected.
pub(crate) fn key_str(key: &Value, context: &str) -> Result<String, CompileError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CompileError::MalformedKvEntry {
            context: context.to_string(),
            found: value_kind(other),
        }),
    }
}

/// Human-readable YAML value kind for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
