// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk (embedded) shape of a template file, parsed into a
//! `perles_core::Registration` at load time.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TemplateFile {
    pub template_id: String,
    pub display_name: String,
    #[serde(default)]
    pub required_args: Vec<String>,
    pub prompt_body: String,
}
