// src/core/references.rs

//! Expansion of alias references inside command text.
//!
//! `@name` and `tp@name` re-invoke the wrapper itself with the alias or script `name`.
//! The marker `tp@` is replaced by the command line the wrapper was started with, minus
//! the command and any one-shot options.

use crate::constants::SELF_REFERENCE;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::path::Path;

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"(tp)?@([\w-]+)").unwrap();
}

/// Options whose value is a path, made absolute so nested invocations work from any `cwd`.
const PATH_OPTIONS: &[&str] = &["-t", "--toml", "--install-dir"];

/// Options that only make sense once per invocation, together with whether they take a value.
const ONE_SHOT_OPTIONS: &[(&str, bool)] = &[
    ("--install-context", true),
    ("--add", true),
    ("--lock", false),
    ("-c", false),
    ("--clean", false),
    ("-i", false),
    ("--info", false),
];

/// Resolves `@name` / `tp@name` references to known aliases or scripts, then substitutes
/// every `tp@` with `wrapper_args`.
///
/// References to unknown names are left untouched.
pub fn resolve_references<F>(cmd: &str, wrapper_args: &[String], is_known: F) -> String
where
    F: Fn(&str) -> bool,
{
    let normalized = REFERENCE_RE.replace_all(cmd, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        match caps.get(2) {
            Some(name) if is_known(name.as_str()) => format!("{}{}", SELF_REFERENCE, name.as_str()),
            _ => whole.to_string(),
        }
    });
    let replacement = format!(
        "{} ",
        wrapper_args.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" ")
    );
    normalized.replace(SELF_REFERENCE, &replacement)
}

/// Double-quotes an argument if it contains whitespace.
pub fn quote(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

/// Wraps a user argument in double quotes, escaping the quotes it contains.
pub fn wrap_value(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// Builds the argument list that re-invokes the wrapper.
///
/// `program` is the running executable and `args` the wrapper's own options that
/// preceded the command. Path-valued options are made absolute against `cwd` and one-shot
/// options are dropped with their values.
pub fn self_reference_args(program: &Path, args: &[String], cwd: &Path) -> Vec<String> {
    let absolute = |value: &str| {
        let path = Path::new(value);
        if path.is_absolute() {
            value.to_string()
        } else {
            cwd.join(path).display().to_string()
        }
    };

    let mut result = vec![program.display().to_string()];
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if PATH_OPTIONS.contains(&arg.as_str()) {
            result.push(arg.clone());
            if let Some(value) = iter.next() {
                result.push(absolute(value));
            }
            continue;
        }
        if let Some((option, value)) = arg.split_once('=')
            && PATH_OPTIONS.contains(&option)
        {
            result.push(format!("{}={}", option, absolute(value)));
            continue;
        }
        let option = arg.split_once('=').map_or(arg.as_str(), |(option, _)| option);
        if let Some(&(_, takes_value)) = ONE_SHOT_OPTIONS.iter().find(|(name, _)| *name == option) {
            if takes_value && !arg.contains('=') {
                iter.next();
            }
            continue;
        }
        result.push(arg.clone());
    }
    result
}
