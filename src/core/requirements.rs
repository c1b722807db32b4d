// src/core/requirements.rs

//! Adding requirements to a tool context by rewriting the manifest in place.
//!
//! Edits go through `toml_edit` so comments, ordering and formatting of the rest of the
//! manifest survive.

use crate::constants::{MAIN_CONTEXT, TOOL_SECTION};
use crate::models::split_lines;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use toml_edit::{Array, DocumentMut, Item, Table, Value};

lazy_static! {
    static ref CTX_SEPARATOR_RE: Regex = Regex::new(r"\s*:\s*").unwrap();
    static ref SPEC_SEPARATOR_RE: Regex = Regex::new(r"\s*,\s*").unwrap();
    static ref PACKAGE_NAME_RE: Regex = Regex::new(r"^([^=<>~!]+)").unwrap();
}

#[derive(Error, Debug)]
pub enum RequirementsError {
    #[error("Could not parse the manifest: {0}")]
    Parse(#[from] toml_edit::TomlError),
    #[error("[tool.{section}] is not a table", section = TOOL_SECTION)]
    InvalidSection,
    #[error("{0} has invalid requirements. Check your pyproject.toml file")]
    InvalidRequirements(String),
    #[error("{name} is already a requirement in {ctx}")]
    AlreadyPresent { name: String, ctx: String },
    #[error("No requirement given")]
    Empty,
}

/// A parsed `--add` argument: `[ctx:]spec[,spec...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    pub ctx: String,
    pub specs: Vec<String>,
}

impl AddRequest {
    pub fn parse(arg: &str) -> Result<Self, RequirementsError> {
        let mut parts = CTX_SEPARATOR_RE.splitn(arg.trim(), 2);
        let (ctx, specs) = match (parts.next(), parts.next()) {
            (Some(ctx), Some(specs)) => (ctx.to_string(), specs),
            _ => (MAIN_CONTEXT.to_string(), arg.trim()),
        };
        let specs: Vec<String> = SPEC_SEPARATOR_RE
            .split(specs)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if specs.is_empty() {
            return Err(RequirementsError::Empty);
        }
        Ok(Self { ctx, specs })
    }
}

/// Returns the manifest text with the requested specs appended to the context's
/// requirements. The context is created when it does not exist yet.
pub fn add_to_manifest(text: &str, request: &AddRequest) -> Result<String, RequirementsError> {
    let mut doc: DocumentMut = text.parse()?;
    let section = tool_section(&mut doc)?;
    let requirements = requirements_array(section, &request.ctx)?;

    for spec in &request.specs {
        check_not_present(requirements, spec, &request.ctx)?;
    }
    for spec in &request.specs {
        requirements.push(spec.as_str());
    }
    Ok(doc.to_string())
}

fn implicit_table() -> Item {
    let mut table = Table::new();
    table.set_implicit(true);
    Item::Table(table)
}

fn tool_section(doc: &mut DocumentMut) -> Result<&mut dyn toml_edit::TableLike, RequirementsError> {
    let tool = doc
        .entry("tool")
        .or_insert_with(implicit_table)
        .as_table_like_mut()
        .ok_or(RequirementsError::InvalidSection)?;
    tool.entry(TOOL_SECTION)
        .or_insert_with(toml_edit::table)
        .as_table_like_mut()
        .ok_or(RequirementsError::InvalidSection)
}

fn requirements_array<'a>(
    section: &'a mut dyn toml_edit::TableLike,
    ctx: &str,
) -> Result<&'a mut Array, RequirementsError> {
    let invalid = || RequirementsError::InvalidRequirements(ctx.to_string());
    let item = section
        .entry(ctx)
        .or_insert_with(|| Item::Value(Value::Array(Array::new())));
    if is_blank(item) {
        *item = Item::Value(Value::Array(Array::new()));
    }
    if item.is_str() || item.is_array() {
        return as_array(item).ok_or_else(invalid);
    }
    let table = item.as_table_like_mut().ok_or_else(invalid)?;
    let requirements = table.get_mut("requirements").ok_or_else(invalid)?;
    as_array(requirements).ok_or_else(invalid)
}

/// Turns a multi-line string into an array of lines, then returns the array.
fn as_array(item: &mut Item) -> Option<&mut Array> {
    if let Some(text) = item.as_str() {
        let lines: Array = split_lines(text).into_iter().collect();
        *item = Item::Value(Value::Array(lines));
    }
    item.as_array_mut()
}

fn is_blank(item: &Item) -> bool {
    item.is_none()
        || item.as_str().is_some_and(|s| s.trim().is_empty())
        || item.as_array().is_some_and(Array::is_empty)
}

fn check_not_present(requirements: &Array, spec: &str, ctx: &str) -> Result<(), RequirementsError> {
    let Some(name) = PACKAGE_NAME_RE.captures(spec).and_then(|caps| caps.get(1)) else {
        return Ok(());
    };
    let name = name.as_str().trim();
    if requirements
        .iter()
        .filter_map(Value::as_str)
        .any(|existing| existing.starts_with(name))
    {
        return Err(RequirementsError::AlreadyPresent {
            name: name.to_string(),
            ctx: ctx.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(text: &str, arg: &str) -> Result<String, RequirementsError> {
        add_to_manifest(text, &AddRequest::parse(arg).unwrap())
    }

    fn reqs(text: &str, ctx: &str) -> Vec<String> {
        let doc: DocumentMut = text.parse().unwrap();
        let item = &doc["tool"][TOOL_SECTION][ctx];
        let array = item
            .as_array()
            .or_else(|| item.get("requirements").and_then(Item::as_array))
            .unwrap();
        array.iter().map(|v| v.as_str().unwrap().to_string()).collect()
    }

    #[test]
    fn test_parse_add_argument() {
        assert_eq!(
            AddRequest::parse("black").unwrap(),
            AddRequest {
                ctx: "main".to_string(),
                specs: vec!["black".to_string()]
            }
        );
        assert_eq!(
            AddRequest::parse("lint : ruff>=0.4 , isort").unwrap(),
            AddRequest {
                ctx: "lint".to_string(),
                specs: vec!["ruff>=0.4".to_string(), "isort".to_string()]
            }
        );
        assert!(matches!(AddRequest::parse(" , "), Err(RequirementsError::Empty)));
    }

    #[test]
    fn test_add_to_empty_manifest_creates_context() {
        let out = add("", "pycowsay").unwrap();
        assert_eq!(reqs(&out, "main"), vec!["pycowsay"]);
        assert!(out.contains("[tool.toolpin]"));
    }

    #[test]
    fn test_add_preserves_formatting_and_other_keys() {
        let text = "# project manifest\n[project]\nname = \"demo\" # the name\n\n[tool.toolpin]\nmain = [\"uv\"]\n";
        let out = add(text, "ruff,black").unwrap();
        assert!(out.starts_with("# project manifest\n[project]\nname = \"demo\" # the name\n"));
        assert_eq!(reqs(&out, "main"), vec!["uv", "ruff", "black"]);
    }

    #[test]
    fn test_add_converts_inline_and_table_shapes() {
        let out = add("[tool.toolpin]\nlint = \"ruff\\nisort\"\n", "lint:black").unwrap();
        assert_eq!(reqs(&out, "lint"), vec!["ruff", "isort", "black"]);

        let out = add(
            "[tool.toolpin]\ndocs = { requirements = \"mkdocs\", post-install = \"x\" }\n",
            "docs:mike",
        )
        .unwrap();
        assert_eq!(reqs(&out, "docs"), vec!["mkdocs", "mike"]);
        assert!(out.contains("post-install = \"x\""));
    }

    #[test]
    fn test_add_refuses_existing_package() {
        let text = "[tool.toolpin]\nmain = [\"black==24.1.0\"]\n";
        assert!(matches!(
            add(text, "black>=25"),
            Err(RequirementsError::AlreadyPresent { ref name, .. }) if name == "black"
        ));
    }

    #[test]
    fn test_add_rejects_context_without_requirements_list() {
        let text = "[tool.toolpin]\ndocs = { post-install = \"x\" }\n";
        assert!(matches!(
            add(text, "docs:mike"),
            Err(RequirementsError::InvalidRequirements(_))
        ));
    }
}
