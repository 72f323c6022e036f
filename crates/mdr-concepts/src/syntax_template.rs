//! Syntax templates with `[Parameter]` placeholders.
//!
//! A template name such as `"Patients with [Indication] treated for [Duration]"`
//! declares two parameters. Once a template has been approved the parameter
//! list is frozen; later versions may only reword the text around it.

use serde::{Deserialize, Serialize};

use mdr_model::{ConceptKind, ItemMetadata, MdrError};
use mdr_versioning::{ConceptValue, ReferenceResolver};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTemplate {
    pub name: String,
    #[serde(default)]
    pub guidance_text: Option<String>,
}

impl SyntaxTemplate {
    /// Parameter names of the plain name in order of appearance, duplicates included.
    pub fn parameter_names(&self) -> Vec<String> {
        extract_parameters(&self.name_plain()).unwrap_or_default()
    }

    /// Name with HTML tags removed.
    pub fn name_plain(&self) -> String {
        let mut plain = String::with_capacity(self.name.len());
        let mut in_tag = false;
        for c in self.name.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => plain.push(c),
                _ => {}
            }
        }
        plain
    }
}

/// Extracts `[name]` placeholders.
///
/// Returns `None` for blank text, unbalanced or nested brackets and empty
/// placeholders.
pub fn extract_parameters(template: &str) -> Option<Vec<String>> {
    if template.trim().is_empty() {
        return None;
    }
    let mut parameters = Vec::new();
    let mut current: Option<String> = None;
    for c in template.chars() {
        match (c, current.as_mut()) {
            ('[', None) => current = Some(String::new()),
            ('[', Some(_)) | (']', None) => return None,
            (']', Some(name)) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return None;
                }
                parameters.push(name);
                current = None;
            }
            (c, Some(name)) => name.push(c),
            (_, None) => {}
        }
    }
    current.is_none().then_some(parameters)
}

impl ConceptValue for SyntaxTemplate {
    const KIND: ConceptKind = ConceptKind::SyntaxTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        resolver: &dyn ReferenceResolver,
        previous: Option<&Self>,
    ) -> Result<(), MdrError> {
        let parameters = extract_parameters(&self.name_plain()).ok_or_else(|| {
            MdrError::business_logic(format!("Template string syntax incorrect: {}", self.name))
        })?;
        if let Some(unknown) = parameters
            .iter()
            .find(|p| !resolver.exists_by_name(ConceptKind::TemplateParameter, p))
        {
            return Err(MdrError::business_logic(format!(
                "Unknown parameter name in template string: {unknown}"
            )));
        }
        let unchanged = previous.is_some_and(|p| p.name == self.name);
        if !unchanged && resolver.exists_by_name(Self::KIND, &self.name) {
            return Err(MdrError::business_logic(format!(
                "Duplicate templates not allowed - template exists: {}",
                self.name
            )));
        }
        Ok(())
    }

    fn check_edit(&self, previous: &Self, current: &ItemMetadata) -> Result<(), MdrError> {
        if current.version().is_released() && previous.parameter_names() != self.parameter_names()
        {
            return Err(MdrError::versioning(
                "You cannot change number or order of template parameters.",
            ));
        }
        Ok(())
    }
}
