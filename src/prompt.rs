//! Prompt templates with `{variable}` placeholders.

use std::collections::HashMap;

use crate::error::LLMError;

/// The first stage: turn a topic into Python code.
pub const CODE_TEMPLATE: &str = "Write Python code on this topic: {name}";
/// The second stage: describe the generated code.
pub const DESCRIPTION_TEMPLATE: &str = "Describe this given code: {code}";
/// The third stage: illustrate the description.
pub const EXAMPLE_TEMPLATE: &str = "Give an example of this given description: {description}";

/// A prompt with named `{variable}` placeholders.
///
/// Values are inserted as-is: no escaping and no length limit. A value that
/// itself contains `{...}` is never expanded a second time.
///
/// ```
/// use pygpt::prompt::PromptTemplate;
///
/// let prompt = PromptTemplate::new("Describe this given code: {code}", &["code"]).unwrap();
/// assert_eq!(
///     prompt.format_with("code", "print(1)").unwrap(),
///     "Describe this given code: print(1)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    input_variables: Vec<String>,
    template: String,
}

impl PromptTemplate {
    /// Creates a template, checking that every declared variable has a
    /// placeholder.
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Result<Self, LLMError> {
        let template = template.into();
        for var in input_variables {
            if !template.contains(&format!("{{{var}}}")) {
                return Err(LLMError::InvalidRequest(format!(
                    "Template has no placeholder for input variable '{var}': {template}"
                )));
            }
        }
        Ok(Self {
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
            template,
        })
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitutes every declared placeholder with its value.
    ///
    /// Braces that do not name a declared variable are copied through.
    pub fn format(&self, values: &HashMap<String, String>) -> Result<String, LLMError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let key = after
                .find('}')
                .map(|close| &after[..close])
                .filter(|key| self.input_variables.iter().any(|v| v == key));

            match key {
                Some(key) => {
                    let value = values.get(key).ok_or_else(|| {
                        LLMError::InvalidRequest(format!("Missing value for prompt variable '{key}'"))
                    })?;
                    out.push_str(value);
                    rest = &after[key.len() + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }

    /// Formats a single-variable template.
    pub fn format_with(&self, name: &str, value: &str) -> Result<String, LLMError> {
        let values = HashMap::from([(name.to_string(), value.to_string())]);
        self.format(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_the_topic() {
        let prompt = PromptTemplate::new(CODE_TEMPLATE, &["name"]).unwrap();
        assert_eq!(
            prompt.format_with("name", "bubble sort").unwrap(),
            "Write Python code on this topic: bubble sort"
        );
    }

    #[test]
    fn values_are_not_expanded_twice() {
        let prompt = PromptTemplate::new(DESCRIPTION_TEMPLATE, &["code"]).unwrap();
        let code = "d = {code}\nprint(f'{d}')";
        assert_eq!(
            prompt.format_with("code", code).unwrap(),
            format!("Describe this given code: {code}")
        );
    }

    #[test]
    fn unknown_braces_are_copied_through() {
        let prompt = PromptTemplate::new("{x} and {y} and {", &["x"]).unwrap();
        assert_eq!(prompt.format_with("x", "1").unwrap(), "1 and {y} and {");
    }

    #[test]
    fn empty_value_is_allowed() {
        let prompt = PromptTemplate::new(EXAMPLE_TEMPLATE, &["description"]).unwrap();
        assert_eq!(
            prompt.format_with("description", "").unwrap(),
            "Give an example of this given description: "
        );
    }

    #[test]
    fn missing_value_is_an_error() {
        let prompt = PromptTemplate::new(CODE_TEMPLATE, &["name"]).unwrap();
        let err = prompt.format(&HashMap::new()).unwrap_err();
        assert!(matches!(err, LLMError::InvalidRequest(msg) if msg.contains("'name'")));
    }

    #[test]
    fn declared_variable_must_have_a_placeholder() {
        assert!(PromptTemplate::new("no placeholders here", &["name"]).is_err());
    }
}
