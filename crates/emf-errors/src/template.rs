use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::{DataValue, ErrorData};
use crate::error::TemplateError;

// -- Action patterns compiled once via LazyLock --

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("must be valid regex"));

static DATA_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\.Data((?:\.[A-Za-z_][A-Za-z0-9_]*)+)\s*$").expect("must be valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Key path below `.Data`
    Field(Vec<String>),
}

/// A compiled, localized message template
///
/// Supports literal text interleaved with `{{ .Data.Key }}` lookups.
/// Rendering never fails: a key that is absent renders as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Compile a template
    ///
    /// # Errors
    ///
    /// Returns an error for an unterminated `{{` or for any action other
    /// than a `.Data.<Key>` lookup
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut last_end = 0;

        for captures in ACTION_RE.captures_iter(source) {
            let (Some(overall), Some(action)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            push_literal(&mut segments, &source[last_end..overall.start()], source)?;

            let path = DATA_FIELD_RE
                .captures(action.as_str())
                .and_then(|c| c.get(1))
                .ok_or_else(|| TemplateError::UnsupportedAction {
                    action: action.as_str().trim().to_owned(),
                })?;

            segments.push(Segment::Field(
                path.as_str().split('.').filter(|s| !s.is_empty()).map(str::to_owned).collect(),
            ));

            last_end = overall.end();
        }

        push_literal(&mut segments, &source[last_end..], source)?;

        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    /// Original template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level `.Data` keys this template references
    pub fn referenced_keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(path) => path.first().map(String::as_str),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute bound data into the template
    pub fn render(&self, data: &ErrorData) -> String {
        let mut output = String::with_capacity(self.source.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Field(path) => {
                    if let Some(value) = lookup(data, path) {
                        output.push_str(&value.to_string());
                    }
                }
            }
        }

        output
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str, template: &str) -> Result<(), TemplateError> {
    if text.contains("{{") {
        return Err(TemplateError::Unterminated {
            template: template.to_owned(),
        });
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_owned()));
    }
    Ok(())
}

fn lookup<'a>(data: &'a ErrorData, path: &[String]) -> Option<&'a DataValue> {
    let (first, rest) = path.split_first()?;
    rest.iter().try_fold(data.get(first)?, |value, key| value.get(key))
}

impl TryFrom<String> for MessageTemplate {
    type Error = TemplateError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(&source)
    }
}

impl From<MessageTemplate> for String {
    fn from(template: MessageTemplate) -> Self {
        template.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_data;

    #[test]
    fn renders_data_fields() {
        let template = MessageTemplate::parse("Param '{{.Data.Param}}' failed: '{{ .Data.Error }}'").unwrap();
        let data = error_data! { "Param" => "limit", "Error" => "bad int" };
        assert_eq!(template.render(&data), "Param 'limit' failed: 'bad int'");
    }

    #[test]
    fn missing_keys_render_empty() {
        let template = MessageTemplate::parse("User '{{.Data.Target}}' role '{{.Data.Role}}'").unwrap();
        let data = error_data! { "Target" => "alice" };
        assert_eq!(template.render(&data), "User 'alice' role ''");
    }

    #[test]
    fn nested_lookup_through_maps() {
        let template = MessageTemplate::parse("{{.Data.Response.foo}}|{{.Data.Response.foo.deeper}}").unwrap();
        let value: serde_json::Value = serde_json::json!({ "foo": "bar" });
        let data = error_data! { "Response" => value };
        assert_eq!(template.render(&data), "bar|");
    }

    #[test]
    fn multiline_templates_keep_literal_text() {
        let template = MessageTemplate::parse("could not be verified,\nplease try again. Error: '{{.Data.Error}}'").unwrap();
        assert_eq!(
            template.render(&error_data! { "Error" => "expired" }),
            "could not be verified,\nplease try again. Error: 'expired'"
        );
    }

    #[test]
    fn rejects_non_data_actions() {
        let err = MessageTemplate::parse("{{ range .Items }}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnsupportedAction {
                action: "range .Items".to_owned()
            }
        );
    }

    #[test]
    fn rejects_unterminated_action() {
        let err = MessageTemplate::parse("oops {{.Data.Param").unwrap_err();
        assert!(matches!(err, TemplateError::Unterminated { .. }));
    }

    #[test]
    fn lists_referenced_keys() {
        let template = MessageTemplate::parse("{{.Data.Name}} {{.Data.Value}} {{.Data.Error}}").unwrap();
        let keys: Vec<_> = template.referenced_keys().collect();
        assert_eq!(keys, ["Name", "Value", "Error"]);
    }

    #[test]
    fn deserializes_from_plain_string() {
        let template: MessageTemplate = serde_json::from_str(r#""Failed: '{{.Data.Error}}'""#).unwrap();
        assert_eq!(template.source(), "Failed: '{{.Data.Error}}'");
        assert!(serde_json::from_str::<MessageTemplate>(r#""{{ .Other }}""#).is_err());
    }
}
