// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Registration`: the pure-domain handle a template lookup resolves to,
//! and the namespace it lives under (§3.1, §4.9, §6.5, glossary
//! "Registration").

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::workflow::TemplateId;

/// A prompt-template namespace. `Workflow` is the built-in set shipped with
/// the binary; `Community` holds opt-in templates the host has pulled in,
/// normalised by prefixing bare keys with `workflow/` before lookup unless
/// already namespaced (§9: "whether namespaces other than `workflow/` are
/// meaningful for the core is left to the registry collaborator").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Namespace {
    Workflow,
    Community(String),
}

impl Namespace {
    pub fn prefix(&self) -> String {
        match self {
            Namespace::Workflow => "workflow/".to_string(),
            Namespace::Community(name) => format!("{name}/"),
        }
    }
}

/// A resolved template registration: the coordinator prompt body plus the
/// declared arguments it requires (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub template_id: TemplateId,
    pub namespace: Namespace,
    pub display_name: String,
    pub prompt_body: String,
    pub required_args: Vec<String>,
}

impl Registration {
    /// Render the coordinator's initial prompt by substituting `{{key}}`
    /// placeholders with the supplied arguments, treated as a pure function
    /// of registration plus args (glossary). Fails fast with
    /// `MissingRequiredArgument` rather than rendering a partially
    /// substituted prompt.
    pub fn render(&self, args: &BTreeMap<String, String>) -> Result<String, ValidationError> {
        for required in &self.required_args {
            if !args.contains_key(required) {
                return Err(ValidationError::MissingRequiredArgument {
                    field: required.clone(),
                });
            }
        }
        let mut rendered = self.prompt_body.clone();
        for (key, value) in args {
            rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
        }
        Ok(rendered)
    }
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
