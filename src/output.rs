//! Shared output formatting for taskboard commands.
//!
//! Every command ends in either `emit_success` or `emit_error`. With `--json`
//! both print a versioned envelope on stdout; otherwise a short human report.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human-readable report for one command: a header line, then optional
/// summary pairs, detail lines, warnings and next steps.
///
/// Warnings and next steps are also carried into the JSON envelope.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)?;
        if !self.summary.is_empty() {
            f.write_str("\n\nSummary:")?;
            for (key, value) in &self.summary {
                match value.as_str() {
                    "" => write!(f, "\n- {key}")?,
                    value => write!(f, "\n- {key}: {value}")?,
                }
            }
        }
        for (title, items) in [
            ("Details", &self.details),
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ] {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// JSON envelope
// =============================================================================

/// `{schema_version, command, status, data | error, warnings?, next_steps?}`
#[derive(Serialize)]
struct Envelope<'a, P: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(flatten)]
    payload: P,
    #[serde(skip_serializing_if = "is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    next_steps: &'a [String],
}

#[derive(Serialize)]
struct Success<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
struct Failure {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn is_empty(items: &&[String]) -> bool {
    items.is_empty()
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = match human {
            Some(human) => (human.warnings.as_slice(), human.next_steps.as_slice()),
            None => (&[][..], &[][..]),
        };
        return print_json(
            &Envelope {
                schema_version: SCHEMA_VERSION,
                command,
                status: "success",
                payload: Success { data },
                warnings,
                next_steps,
            },
            true,
        );
    }

    if let Some(human) = human.filter(|_| !options.quiet) {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        return print_json(
            &Envelope {
                schema_version: SCHEMA_VERSION,
                command,
                status: "error",
                payload: Failure {
                    error: ErrorBody {
                        message: err.to_string(),
                        code: err.exit_code(),
                        kind: error_kind(err),
                        details: err.details(),
                    },
                },
                warnings: &[],
                next_steps: &next_steps,
            },
            true,
        );
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Print one streamed record: a compact JSON line, or `line` for humans.
pub fn emit_line<T: Serialize>(options: OutputOptions, data: &T, line: &str) -> Result<()> {
    if options.json {
        return print_json(data, false);
    }
    if !options.quiet {
        println!("{line}");
    }
    Ok(())
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    let mut skip_value = false;
    let mut command = None;

    for arg in args.by_ref() {
        if skip_value {
            skip_value = false;
            continue;
        }
        if arg == "--data-dir" {
            skip_value = true;
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        command = Some(arg);
        break;
    }

    let Some(command) = command else {
        return "taskboard".to_string();
    };

    if command != "task" {
        return command;
    }

    match args.find(|arg| !arg.starts_with('-')) {
        Some(sub) => format!("{command} {sub}"),
        None => command,
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "edit_conflict",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotAuthenticated => {
            vec!["taskboard login <email> --password <password>".to_string()]
        }
        Error::AuthenticationFailed(_) => vec!["taskboard users".to_string()],
        Error::EditConflict { .. } => {
            vec!["retry with --on-conflict merge or --on-conflict overwrite".to_string()]
        }
        Error::TaskNotFound(_) => vec!["taskboard task list".to_string()],
        Error::InvalidConfig(_) => vec!["fix taskboard.toml then retry".to_string()],
        Error::StorageUnavailable(_) => vec!["pass a writable --data-dir".to_string()],
        _ => Vec::new(),
    }
}
