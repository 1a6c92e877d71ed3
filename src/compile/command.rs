//! Final command assembly.

use crate::compile::CompileError;
use crate::config::{basename, GeneralSection, PismSection};
use crate::diagnostics::{Diagnostics, Severity};
use std::collections::HashSet;

/// Put together the final invocation used to launch PISM and store it on
/// the section as `execution_command`.
///
/// Fixed argument order: executable, input restart file, year range, the
/// accumulated options, the time-series and spatial diagnostics output
/// arguments, restart output, output size, and a trailing `-options_left`
/// so PISM refuses to run if any option went unused.
pub fn assemble_command(
    section: &mut PismSection,
    general: &GeneralSection,
    diag: &mut dyn Diagnostics,
) -> Result<(), CompileError> {
    if section.executable.is_empty() {
        return Err(CompileError::MissingField("executable"));
    }
    let input = section
        .input_in_work
        .get("input")
        .ok_or(CompileError::MissingField("input_in_work.input"))?;
    let current_year = section
        .current_year
        .ok_or(CompileError::MissingField("current_year"))?;
    let ts_file = section
        .output_files
        .get("ts_file")
        .ok_or(CompileError::MissingField("output_files.ts_file"))?;
    let ex_file = section
        .output_files
        .get("ex_file")
        .ok_or(CompileError::MissingField("output_files.ex_file"))?;
    let ts_times = section
        .ts_times
        .as_deref()
        .ok_or(CompileError::MissingField("ts_times"))?;
    let ex_times = section
        .ex_times
        .as_deref()
        .ok_or(CompileError::MissingField("ex_times"))?;
    let restart = section
        .restart_out_in_workdir
        .get("restart")
        .ok_or(CompileError::MissingField("restart_out_in_workdir.restart"))?;
    let output_size = section
        .output_size
        .as_deref()
        .ok_or(CompileError::MissingField("output_size"))?;

    let mut parts = vec![
        section.executable.clone(),
        format!("-i {}", basename(input)),
        format!("-ys {}", current_year),
        format!("-y {}", general.nyear),
    ];
    parts.extend(dedup_opts(&section.pism_command_line_opts));
    parts.push(format!("-ts_file {}", ts_file));
    parts.push(format!("-ts_vars {}", section.ts_vars.join(",")));
    parts.push(format!("-ts_times {}", ts_times));
    parts.push(format!("-extra_file {}", ex_file));
    parts.push(format!("-extra_vars {}", section.ex_vars.join(",")));
    parts.push(format!("-extra_times {}", ex_times));
    parts.push(format!("-o {}", restart));
    parts.push(format!("-o_size {}", output_size));
    parts.push("-options_left".to_string());
    let command = parts.join(" ");

    diag.report(Severity::Critical, "PISM will be run like this:");
    diag.report(Severity::Critical, &command);
    section.execution_command = Some(command);
    Ok(())
}

/// Collapse exact-text duplicate fragments, keeping the first occurrence.
///
/// Duplicates are legal during accumulation; collapsing happens only here.
/// First-occurrence order makes repeated compilations of the same
/// configuration produce the same command text.
fn dedup_opts(opts: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    opts.iter()
        .filter(|opt| seen.insert(opt.as_str()))
        .cloned()
        .collect()
}
