use crate::templater::{TemplateError, Templater};
use base64::Engine as _;
use batch_core::Workload;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("workload spec could not be reshaped for templating: {0}")]
    Reshape(#[from] serde_json::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Turns a raw message body plus metadata into a fully-templated
/// `Workload`, per the decode → parse → inject → template-walk pipeline.
pub struct MessageRenderer {
    templater: Arc<dyn Templater>,
}

impl MessageRenderer {
    pub fn new(templater: Arc<dyn Templater>) -> Self {
        Self { templater }
    }

    pub fn render(
        &self,
        raw_body: &[u8],
        loggable_id: &str,
        metadata: &HashMap<String, String>,
        workload: &Workload,
    ) -> Result<Workload, RenderError> {
        let context = self.build_context(raw_body, loggable_id, metadata);

        let mut value = serde_json::to_value(workload)?;
        self.walk(&mut value, &context)?;
        Ok(serde_json::from_value(value)?)
    }

    fn build_context(
        &self,
        raw_body: &[u8],
        loggable_id: &str,
        metadata: &HashMap<String, String>,
    ) -> Value {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(raw_body)
            .unwrap_or_else(|_| raw_body.to_vec());

        let mut m = match serde_json::from_slice::<Value>(&decoded) {
            Ok(Value::Object(map)) => map,
            _ => {
                let mut fallback = Map::new();
                fallback.insert(
                    "body".to_string(),
                    Value::String(String::from_utf8_lossy(&decoded).into_owned()),
                );
                fallback
            }
        };

        m.insert(
            "_raw_body".to_string(),
            Value::String(String::from_utf8_lossy(raw_body).into_owned()),
        );
        m.insert("_id".to_string(), Value::String(loggable_id.to_string()));
        m.insert(
            "_metadata".to_string(),
            serde_json::to_value(metadata).unwrap_or(Value::Null),
        );

        Value::Object(m)
    }

    /// Recursively templates every string leaf of `value` in place.
    fn walk(&self, value: &mut Value, context: &Value) -> Result<(), RenderError> {
        match value {
            Value::String(s) => {
                *s = self.templater.render(s, context)?;
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, context)?;
                }
            }
            Value::Object(map) => {
                for (_, v) in map.iter_mut() {
                    self.walk(v, context)?;
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
        Ok(())
    }
}

impl std::fmt::Debug for MessageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRenderer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templater::MinijinjaTemplater;
    use base64::Engine as _;
    use batch_core::WorkloadDocument;
    use serde_json::json;

    fn renderer() -> MessageRenderer {
        MessageRenderer::new(Arc::new(MinijinjaTemplater::new()))
    }

    #[test]
    fn templates_the_name_field_from_a_json_body() {
        let workload = Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "batch-{{.a}}", "namespace": "default"}
        })));
        let body = br#"{"a": "42"}"#;

        let rendered = renderer()
            .render(body, "id-1", &HashMap::new(), &workload)
            .unwrap();

        let Workload::Pod(doc) = rendered else {
            panic!("expected pod");
        };
        assert_eq!(doc.name(), "batch-42");
    }

    #[test]
    fn base64_body_is_decoded_before_parsing() {
        let workload = Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "job-{{.a}}", "namespace": "default"}
        })));
        let body = base64::engine::general_purpose::STANDARD.encode(br#"{"a": "7"}"#);

        let rendered = renderer()
            .render(body.as_bytes(), "id-2", &HashMap::new(), &workload)
            .unwrap();

        let Workload::Pod(doc) = rendered else {
            panic!("expected pod");
        };
        assert_eq!(doc.name(), "job-7");
    }

    #[test]
    fn non_json_body_falls_back_to_a_body_key() {
        let workload = Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "raw-{{.body}}", "namespace": "default"}
        })));

        let rendered = renderer()
            .render(b"plain-text", "id-3", &HashMap::new(), &workload)
            .unwrap();

        let Workload::Pod(doc) = rendered else {
            panic!("expected pod");
        };
        assert_eq!(doc.name(), "raw-plain-text");
    }

    #[test]
    fn loggable_id_and_metadata_are_injected_into_the_context() {
        let workload = Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "{{._id}}-{{._metadata.team}}", "namespace": "default"}
        })));
        let mut metadata = HashMap::new();
        metadata.insert("team".to_string(), "payments".to_string());

        let rendered = renderer()
            .render(b"{}", "abc123", &metadata, &workload)
            .unwrap();

        let Workload::Pod(doc) = rendered else {
            panic!("expected pod");
        };
        assert_eq!(doc.name(), "abc123-payments");
    }

    #[test]
    fn original_spec_is_never_mutated() {
        let workload = Workload::Pod(WorkloadDocument(json!({
            "metadata": {"name": "{{._id}}", "namespace": "default"}
        })));

        let _ = renderer().render(b"{}", "first", &HashMap::new(), &workload);

        let Workload::Pod(doc) = &workload else {
            panic!("expected pod");
        };
        assert_eq!(doc.name(), "{{._id}}");
    }
}
