// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry service (§4.9, §6.5): resolves a namespace/key pair to a
//! `Registration`, backed by an embeddable filesystem of `.toml` template
//! files. Missing or malformed templates fail fast at construction time,
//! not when a workflow later asks to render them.

use std::collections::HashMap;

use async_trait::async_trait;
use include_dir::{include_dir, Dir};
use perles_core::{Namespace, Registration, TemplateId};

use crate::error::RegistryError;
use crate::template_file::TemplateFile;

static WORKFLOW_TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates/workflow");

const DEFAULT_SYSTEM_PREAMBLE: &str =
    "You are a coordinator process in an automated multi-agent workflow. \
     Emit progress as structured events on stdout and delegate work to workers.";

#[async_trait]
pub trait RegistryService: Send + Sync {
    /// All registrations known under a namespace, e.g. for a template picker UI.
    async fn get_by_namespace(&self, namespace: &Namespace) -> Vec<Registration>;

    /// A single registration by its bare key (without the namespace prefix).
    async fn get_by_key(&self, namespace: &Namespace, key: &str) -> Result<Registration, RegistryError>;

    /// The system prompt preamble a coordinator prompt should be wrapped
    /// with, independent of the per-registration prompt body.
    async fn get_system_prompt_template(&self, registration: &Registration) -> Result<String, RegistryError>;
}

/// `RegistryService` backed by the binary's embedded template files.
pub struct EmbeddedRegistryService {
    workflow: HashMap<String, Registration>,
}

impl EmbeddedRegistryService {
    /// Parses every embedded `.toml` file eagerly. A malformed file here is
    /// a build-time defect, not a runtime one, so this fails loudly rather
    /// than deferring the error to whichever caller first requests the
    /// broken template.
    pub fn load() -> Result<Self, RegistryError> {
        let mut workflow = HashMap::new();
        for file in WORKFLOW_TEMPLATES.files() {
            let path = file.path().display().to_string();
            let contents = file.contents_utf8().ok_or_else(|| RegistryError::MalformedTemplate {
                path: path.clone(),
                reason: "not valid UTF-8".to_string(),
            })?;
            let parsed: TemplateFile = toml::from_str(contents).map_err(|err| RegistryError::MalformedTemplate {
                path: path.clone(),
                reason: err.to_string(),
            })?;
            let registration = Registration {
                template_id: TemplateId::from_string(parsed.template_id.clone()),
                namespace: Namespace::Workflow,
                display_name: parsed.display_name,
                prompt_body: parsed.prompt_body,
                required_args: parsed.required_args,
            };
            workflow.insert(parsed.template_id, registration);
        }
        Ok(Self { workflow })
    }

    fn namespace_map(&self, namespace: &Namespace) -> Option<&HashMap<String, Registration>> {
        match namespace {
            Namespace::Workflow => Some(&self.workflow),
            Namespace::Community(_) => None,
        }
    }
}

#[async_trait]
impl RegistryService for EmbeddedRegistryService {
    async fn get_by_namespace(&self, namespace: &Namespace) -> Vec<Registration> {
        self.namespace_map(namespace)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn get_by_key(&self, namespace: &Namespace, key: &str) -> Result<Registration, RegistryError> {
        self.namespace_map(namespace)
            .and_then(|map| map.get(key))
            .cloned()
            .ok_or_else(|| RegistryError::TemplateNotFound(format!("{}{key}", namespace.prefix())))
    }

    async fn get_system_prompt_template(&self, _registration: &Registration) -> Result<String, RegistryError> {
        Ok(DEFAULT_SYSTEM_PREAMBLE.to_string())
    }
}

#[cfg(test)]
#[path = "registry_service_tests.rs"]
mod tests;
