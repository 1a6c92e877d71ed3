//! Coupler selection and per-model option assembly.

use crate::compile::options::{key_str, normalize_kv, render_files, render_flags, render_kv, value_kind};
use crate::compile::CompileError;
use crate::config::{ModelOptions, PismSection};
use crate::diagnostics::{Diagnostics, Severity};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// The closed set of coupler categories PISM accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouplerKind {
    Ocean,
    Surface,
    Atmosphere,
}

impl CouplerKind {
    pub const ALL: [CouplerKind; 3] = [
        CouplerKind::Ocean,
        CouplerKind::Surface,
        CouplerKind::Atmosphere,
    ];

    pub fn parse(name: &str) -> Option<CouplerKind> {
        match name {
            "ocean" => Some(CouplerKind::Ocean),
            "surface" => Some(CouplerKind::Surface),
            "atmosphere" => Some(CouplerKind::Atmosphere),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CouplerKind::Ocean => "ocean",
            CouplerKind::Surface => "surface",
            CouplerKind::Atmosphere => "atmosphere",
        }
    }
}

impl fmt::Display for CouplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Walk the declared couplers and turn them into command-line fragments.
///
/// Categories and models are processed in declaration order. For each
/// model with a non-empty options bundle the files, key-value and flags
/// renderers run in that fixed order; after a category's models comes its
/// aggregate selector, `-{category} model1,model2`. Everything is appended
/// to the section's accumulated options, after whatever a prior stage
/// already put there.
pub fn set_couplers(
    section: &mut PismSection,
    diag: &mut dyn Diagnostics,
) -> Result<(), CompileError> {
    let Some(couplers) = section.couplers.clone() else {
        return Ok(());
    };

    let mut additions = Vec::new();
    for (category, spec) in &couplers {
        let category = key_str(category, "couplers")?;
        if CouplerKind::parse(&category).is_none() {
            let valid = CouplerKind::ALL.map(|kind| kind.as_str()).join(" ");
            diag.report(
                Severity::Error,
                &format!(
                    "You can only use {} as a coupler type. You had: {}!",
                    valid, category
                ),
            );
            return Err(CompileError::UnknownCouplerCategory(category));
        }

        let models = category_models(&category, spec)?;
        let mut chosen = Vec::new();
        for (model, model_spec) in &models {
            let model = key_str(model, &category)?;
            chosen.push(model.clone());

            let opts = model_options(&model, model_spec)?;
            if opts.is_empty() {
                continue;
            }
            if let Some(files) = &opts.files {
                additions.extend(render_files(section, files)?);
            }
            if let Some(kv) = &opts.kv_pairs {
                let context = format!("couplers.{}.{}", category, model);
                let pairs = normalize_kv(kv, &context)?;
                additions.extend(render_kv(&pairs, &context)?);
            }
            if let Some(flags) = &opts.flags {
                additions.extend(render_flags(flags));
            }
        }
        additions.push(format!("-{} {}", category, chosen.join(",")));
    }

    section.pism_command_line_opts.extend(additions);
    Ok(())
}

/// The model map declared under one category. `~` stands for "no models".
fn category_models(category: &str, spec: &Value) -> Result<Mapping, CompileError> {
    match spec {
        Value::Mapping(models) => Ok(models.clone()),
        Value::Null => Ok(Mapping::new()),
        other => Err(CompileError::MalformedCoupler {
            category: category.to_string(),
            found: value_kind(other),
        }),
    }
}

/// One model's options bundle. `~` and `{}` both mean "chosen, no options".
fn model_options(model: &str, spec: &Value) -> Result<ModelOptions, CompileError> {
    match spec {
        Value::Null => Ok(ModelOptions::default()),
        _ => serde_yaml::from_value(spec.clone()).map_err(|source| {
            CompileError::InvalidModelOptions {
                model: model.to_string(),
                source,
            }
        }),
    }
}
