//! Template engine capability and the default Handlebars engine.

use std::fmt;

use handlebars::Handlebars;
use serde_json::Value;

/// Template rendering error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    /// Engine-specific failure, including template syntax errors.
    #[error("{0}")]
    Engine(String),
}

/// Renders a template string against a data object.
///
/// The template syntax belongs to the implementation. The gateway only
/// requires that values from `data` can be interpolated into `template`.
pub trait TemplateEngine: Send + Sync {
    /// Render `template` with `data`.
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError>;
}

/// Handlebars engine.
///
/// `{{ expr }}` output is HTML-escaped, `{{{ expr }}}` is inserted raw.
/// Block helpers (`#if`, `#unless`, `#each`, `#with`) and comments behave as
/// in Handlebars. Missing values render as the empty string.
///
/// Templates are compiled on every call since template bodies come from the
/// store and may change between requests.
pub struct HandlebarsEngine {
    registry: Handlebars<'static>,
}

impl HandlebarsEngine {
    /// Create an engine with the built-in helpers and HTML escaping.
    pub fn new() -> Self {
        Self {
            registry: Handlebars::new(),
        }
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlebarsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlebarsEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError> {
        self.registry
            .render_template(template, data)
            .map_err(|e| RenderError::Engine(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(template: &str, data: &Value) -> String {
        HandlebarsEngine::new().render(template, data).unwrap()
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(render("<p>no tags</p>", &json!({})), "<p>no tags</p>");
    }

    #[test]
    fn test_interpolates_fields() {
        let data = json!({"title": "Hello", "id": 7});
        assert_eq!(
            render("<h1>{{title}}</h1><i>{{ id }}</i>", &data),
            "<h1>Hello</h1><i>7</i>"
        );
    }

    #[test]
    fn test_nested_paths() {
        let data = json!({"author": {"name": "Ada"}});
        assert_eq!(render("{{author.name}}", &data), "Ada");
    }

    #[test]
    fn test_missing_and_null_render_empty() {
        let data = json!({"empty": null});
        assert_eq!(render("[{{missing}}][{{empty}}][{{a.b.c}}]", &data), "[][][]");
    }

    #[test]
    fn test_block_helpers() {
        let data = json!({"draft": false, "tags": ["a", "b"], "title": "T"});
        assert_eq!(
            render(
                "{{#if draft}}DRAFT{{/if}}<ul>{{#each tags}}<li>{{this}}</li>{{/each}}</ul>",
                &data
            ),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_if_else_and_with() {
        let data = json!({"draft": true, "author": {"name": "Ada"}});
        assert_eq!(
            render(
                "{{#if draft}}D{{else}}P{{/if}} {{#with author}}{{name}}{{/with}}",
                &data
            ),
            "D Ada"
        );
    }

    #[test]
    fn test_escaping() {
        let data = json!({"body": "<b>x</b> & y"});
        assert_eq!(render("{{body}}", &data), "&lt;b&gt;x&lt;/b&gt; &amp; y");
        assert_eq!(render("{{{body}}}", &data), "<b>x</b> & y");
    }

    #[test]
    fn test_comments_render_nothing() {
        assert_eq!(render("a{{! note }}b", &json!({})), "ab");
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let result = HandlebarsEngine::new().render("{{#if ok}}<p>never closed</p>", &json!({}));
        assert!(matches!(result, Err(RenderError::Engine(_))));
    }

    #[test]
    fn test_unterminated_tag_is_an_error() {
        let result = HandlebarsEngine::new().render("<p>{{ broken", &json!({}));
        assert!(matches!(result, Err(RenderError::Engine(_))));
    }

    #[test]
    fn test_multibyte_text_preserved() {
        let data = json!({"name": "Zoë"});
        assert_eq!(render("héllo {{name}} ✓", &data), "héllo Zoë ✓");
    }
}
