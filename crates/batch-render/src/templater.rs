use minijinja::{Environment, Value as JinjaValue};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template evaluation failed: {0}")]
    Eval(String),
}

/// External templating collaborator the renderer delegates `{{expr}}`
/// evaluation to. Kept as a trait so the Consumer pipeline never depends
/// on a concrete template engine.
pub trait Templater: Send + Sync {
    /// Renders `template` (a string that may mix literal text with
    /// `{{expr}}` placeholders) against `context`.
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError>;
}

impl fmt::Debug for dyn Templater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Templater")
    }
}

/// Default `Templater` backed by `minijinja`. Registers a small set of
/// "value functions" (callable substitutions) the original message
/// context doesn't carry: `uuid()` and `env(name)`.
pub struct MinijinjaTemplater {
    env: Environment<'static>,
}

impl Default for MinijinjaTemplater {
    fn default() -> Self {
        Self::new()
    }
}

impl MinijinjaTemplater {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_function("uuid", || uuid::Uuid::new_v4().to_string());
        env.add_function("env", |name: String| {
            std::env::var(&name).unwrap_or_default()
        });
        Self { env }
    }
}

impl Templater for MinijinjaTemplater {
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        let ctx = JinjaValue::from_serialize(context);
        let source = strip_root_dot(template);
        self.env
            .render_str(&source, ctx)
            .map_err(|err| TemplateError::Eval(err.to_string()))
    }
}

/// Messages are templated against a root value map the same way the
/// original Go `text/template` dispatcher did (`{{.field}}`). `minijinja`
/// expressions name the root implicitly, so a leading dot right after
/// `{{` is stripped before the expression is parsed; everything else
/// (attribute chains, function calls) is passed through untouched.
fn strip_root_dot(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        out.push_str("{{");
        let after_open = &rest[open + 2..];
        let trimmed = after_open.trim_start_matches(' ');
        let skipped = after_open.len() - trimmed.len();
        out.push_str(&after_open[..skipped]);
        rest = trimmed.strip_prefix('.').unwrap_or(trimmed);
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_single_leading_dot_per_expression() {
        assert_eq!(strip_root_dot("batch-{{.a}}"), "batch-{{a}}");
        assert_eq!(strip_root_dot("{{._id}}-{{._metadata.team}}"), "{{_id}}-{{_metadata.team}}");
        assert_eq!(strip_root_dot("no expressions here"), "no expressions here");
        assert_eq!(strip_root_dot("{{ .a }}"), "{{ a }}");
    }
}

impl fmt::Debug for MinijinjaTemplater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinijinjaTemplater").finish_non_exhaustive()
    }
}
