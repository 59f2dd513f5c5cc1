//! Prefix and global-uniqueness policy over an error-code registry.
//!
//! Without `--file` the built-in registry is checked. With it, the file is a
//! JSON array of `{name, prefix, codes: {KEY: CODE}}` namespaces.

use std::collections::BTreeMap;

use serde::Deserialize;

use qgate_domain::error_codes::error_codes_policy as codes;
use qgate_domain::{ValidationError, REGISTRY};

use super::{ArtifactKind, ArtifactValidator, ValidatorInput};
use crate::context::EnvSnapshot;
use crate::error::{QgateError, Result};
use crate::io;

/// One namespace as read from a registry file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyNamespace {
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    pub codes: BTreeMap<String, String>,
}

impl PolicyNamespace {
    fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub struct ErrorCodesPolicyValidator;

impl ArtifactValidator for ErrorCodesPolicyValidator {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::ErrorCodesPolicy
    }

    fn title(&self) -> &'static str {
        "Error codes policy"
    }

    fn default_file(&self) -> Option<&'static str> {
        None
    }

    fn load_input(&self, env: &EnvSnapshot, file: Option<&str>) -> Result<ValidatorInput> {
        match file {
            Some(file) => Ok(ValidatorInput {
                file: Some(file.to_string()),
                content: io::read_text(&env.resolve(file))?,
            }),
            None => Ok(ValidatorInput {
                file: None,
                content: String::new(),
            }),
        }
    }

    fn validate(&self, _env: &EnvSnapshot, input: &ValidatorInput) -> Result<Vec<ValidationError>> {
        if input.file.is_none() {
            return Ok(validate_registry(REGISTRY.iter().map(|ns| {
                (ns.name, ns.prefix, ns.entries.iter().copied().collect::<Vec<_>>())
            })));
        }
        let namespaces: Vec<PolicyNamespace> =
            serde_json::from_str(&input.content).map_err(|source| QgateError::Parse {
                what: format!("error code registry {}", input.file.as_deref().unwrap_or("")),
                source,
            })?;
        Ok(validate_namespaces(&namespaces))
    }
}

pub fn validate_namespaces(namespaces: &[PolicyNamespace]) -> Vec<ValidationError> {
    validate_registry(
        namespaces
            .iter()
            .map(|ns| (ns.name.as_str(), ns.prefix.as_str(), ns.entries().collect::<Vec<_>>())),
    )
}

/// Check `(name, prefix, entries)` namespaces in order.
pub fn validate_registry<'a, I>(namespaces: I) -> Vec<ValidationError>
where
    I: IntoIterator<Item = (&'a str, &'a str, Vec<(&'a str, &'a str)>)>,
{
    let mut errors = Vec::new();
    let mut first_location: BTreeMap<&str, String> = BTreeMap::new();

    for (name, prefix, entries) in namespaces {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            errors.push(ValidationError::new(
                codes::MISSING_PREFIX,
                name,
                format!("Namespace {} has no required prefix.", name),
            ));
        }
        for (key, code) in entries {
            let location = format!("{}.{}", name, key);
            if !prefix.is_empty() && !code.starts_with(prefix) {
                errors.push(ValidationError::new(
                    codes::PREFIX_MISMATCH,
                    location.clone(),
                    format!("{} ({}) must start with {}.", location, code, prefix),
                ));
            }
            match first_location.get(code) {
                Some(first) => errors.push(ValidationError::new(
                    codes::DUPLICATE_VALUE,
                    location.clone(),
                    format!("{} is used by both {} and {}.", code, first, location),
                )),
                None => {
                    first_location.insert(code, location);
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str, prefix: &str, entries: &[(&str, &str)]) -> PolicyNamespace {
        PolicyNamespace {
            name: name.to_string(),
            prefix: prefix.to_string(),
            codes: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_builtin_registry_passes() {
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), "/tmp");
        let output = ErrorCodesPolicyValidator.check(&env, None).unwrap();
        assert!(output.ok, "{:?}", output.errors);
        assert!(output.file.is_none());
    }

    #[test]
    fn test_shared_code_reports_one_duplicate_naming_both() {
        let errors = validate_namespaces(&[
            ns("alpha", "A_", &[("ONE", "A_SHARED")]),
            ns("beta", "A_", &[("TWO", "A_SHARED")]),
        ]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, codes::DUPLICATE_VALUE);
        assert!(errors[0].message.contains("alpha.ONE"));
        assert!(errors[0].message.contains("beta.TWO"));
    }

    #[test]
    fn test_prefix_rules() {
        let errors = validate_namespaces(&[
            ns("alpha", "A_", &[("ONE", "B_ONE")]),
            ns("beta", "", &[("TWO", "TWO")]),
        ]);
        let found: Vec<&str> = errors.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(found, vec![codes::PREFIX_MISMATCH, codes::MISSING_PREFIX]);
        assert_eq!(errors[0].field, "alpha.ONE");
    }

    #[test]
    fn test_unparseable_registry_file_is_fatal() {
        let env = EnvSnapshot::new(Vec::<(String, String)>::new(), "/tmp");
        let input = ValidatorInput {
            file: Some("registry.json".to_string()),
            content: "{".to_string(),
        };
        assert!(ErrorCodesPolicyValidator.validate(&env, &input).is_err());
    }
}
