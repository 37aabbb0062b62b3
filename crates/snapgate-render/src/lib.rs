//! Template execution and hydration payloads for snapgate.
//!
//! Dynamic pages are produced from a prerendered template body and data
//! returned by a route loader:
//!
//! - [`TemplateEngine`]: Pluggable `render(template, data)` capability
//! - [`HandlebarsEngine`]: Default engine for Handlebars templates
//! - [`HydrationPayload`]: Inline script exposing the data to client code
//! - [`inject`]: Places the script after `<head>` or before `</body>`
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use snapgate_render::{HandlebarsEngine, HydrationPayload, InjectionPoint, TemplateEngine, inject};
//!
//! let data = json!({"title": "Hello"});
//! let html = HandlebarsEngine::new()
//!     .render("<html><body><h1>{{ title }}</h1></body></html>", &data)
//!     .unwrap();
//!
//! let script = HydrationPayload::new(data, "/post/1").script();
//! let page = inject(&html, &script, InjectionPoint::BodyEnd);
//! assert!(page.starts_with("<html><body><h1>Hello</h1><script>"));
//! ```

mod hydration;
mod template;

pub use hydration::{HydrationPayload, InjectionPoint, escape_script_json, inject};
pub use template::{HandlebarsEngine, RenderError, TemplateEngine};
