use std::collections::BTreeMap;

use super::*;

#[tokio::test]
async fn load_parses_every_embedded_template() {
    let registry = EmbeddedRegistryService::load().expect("embedded templates must parse");
    let all = registry.get_by_namespace(&Namespace::Workflow).await;
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn get_by_key_resolves_known_template() {
    let registry = EmbeddedRegistryService::load().unwrap();
    let reg = registry.get_by_key(&Namespace::Workflow, "tpl-cook").await.unwrap();
    assert_eq!(reg.display_name, "Cook");
    assert_eq!(reg.required_args, vec!["goal".to_string()]);
}

#[tokio::test]
async fn get_by_key_reports_unknown_template() {
    let registry = EmbeddedRegistryService::load().unwrap();
    let err = registry.get_by_key(&Namespace::Workflow, "tpl-missing").await.unwrap_err();
    assert!(matches!(err, RegistryError::TemplateNotFound(_)));
}

#[tokio::test]
async fn community_namespace_is_empty_until_the_host_populates_it() {
    let registry = EmbeddedRegistryService::load().unwrap();
    let all = registry.get_by_namespace(&Namespace::Community("acme".to_string())).await;
    assert!(all.is_empty());
}

#[tokio::test]
async fn resolved_registration_renders_with_required_args() {
    let registry = EmbeddedRegistryService::load().unwrap();
    let reg = registry.get_by_key(&Namespace::Workflow, "tpl-cook").await.unwrap();
    let mut args = BTreeMap::new();
    args.insert("goal".to_string(), "ship the feature".to_string());
    let rendered = reg.render(&args).unwrap();
    assert!(rendered.contains("ship the feature"));
}

#[tokio::test]
async fn system_prompt_template_is_available_for_any_registration() {
    let registry = EmbeddedRegistryService::load().unwrap();
    let reg = registry.get_by_key(&Namespace::Workflow, "tpl-review").await.unwrap();
    let preamble = registry.get_system_prompt_template(&reg).await.unwrap();
    assert!(!preamble.is_empty());
}
