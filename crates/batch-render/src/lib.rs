//! Turns a raw queue message into a fully-templated `Workload` ready for
//! dispatch: base64/JSON decoding, metadata injection, and a `{{expr}}`
//! template walk delegated to an external `Templater`.

mod renderer;
mod templater;

pub use renderer::{MessageRenderer, RenderError};
pub use templater::{MinijinjaTemplater, TemplateError, Templater};
