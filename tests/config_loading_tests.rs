//! Loading dashboard configuration from YAML files and validating it at startup

mod dashboard_harness;

use dashboard::prelude::*;
use dashboard_harness::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

/// Build a host from YAML, with the person entity and the usual collaborators
fn build_from_yaml(yaml: &str) -> anyhow::Result<dashboard::server::DashboardHost> {
    let file = yaml_file(yaml);
    DashboardBuilder::new()
        .with_config_file(file.path().to_str().expect("temp path is UTF-8"))?
        .register_entity::<Person>()
        .with_object_manager(InMemoryObjectManager::new())
        .register_operation_fn("greet_person", |_, _, _| Ok(()))
        .register_form_factory(
            "person_form",
            EntityFormType::new(EntityFactory::<Person>::shared()).into_factory(),
        )
        .register_form_type(
            "PersonType",
            std::sync::Arc::new(EntityFormType::new(EntityFactory::<Person>::shared())),
        )
        .register_import_before_insert_hook("normalize", |_| Ok(()))
        .build_host()
}

fn configuration_error(result: anyhow::Result<dashboard::server::DashboardHost>) -> ConfigurationError {
    let err = result.err().expect("configuration should be rejected");
    err.downcast_ref::<ConfigurationError>()
        .cloned()
        .unwrap_or_else(|| panic!("not a configuration error: {:#}", err))
}

const FULL_YAML: &str = r#"
default_dashboard: directory
dashboards:
  - name: directory
    title: Directory
    description: Everyone we know
    objects: [person]
objects:
  - type: person
    label: People
    list:
      fields: [full_name, years]
      results_per_page: 25
      operations:
        greet:
          label: Say hello
          handler: greet_person
      redirects:
        profile:
          label: Profile
          path: /people/{id}
    new:
      form_factory: person_form
    imports:
      people:
        type: csv_upload
        name: People file
        mime_types: [text/csv, text/plain]
        mapping:
          name: full_name
          age: years
        before_insert: normalize
      quick:
        type: paste_csv
        name: Quick add
        separator: "|"
        mapping:
          "1": years
          "0": full_name
"#;

#[test]
fn test_load_from_yaml_file() {
    let file = yaml_file(FULL_YAML);
    let config = DashboardConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.default_dashboard.as_deref(), Some("directory"));
    assert_eq!(config.dashboards[0].description.as_deref(), Some("Everyone we know"));

    let person = config.find_object("person").unwrap();
    assert_eq!(person.list.results_per_page, 25);
    assert_eq!(person.list.redirects["profile"].path, "/people/{id}");

    let imports = person.imports.as_ref().unwrap();
    assert_eq!(imports["people"].kind, ImportKind::CsvUpload);
    assert_eq!(imports["people"].mime_types, vec!["text/csv", "text/plain"]);
    assert_eq!(imports["quick"].separator, Some('|'));
    let columns: Vec<_> = imports["quick"].mapping.keys().cloned().collect();
    assert_eq!(columns, vec!["1", "0"]);
}

#[test]
fn test_full_configuration_builds() {
    let host = build_from_yaml(FULL_YAML).expect("configuration should be valid");

    let dashboard = host.registry.default_dashboard().unwrap();
    assert_eq!(dashboard.name, "directory");
    let person = host.registry.object("person").unwrap();
    assert_eq!(person.label(), "People");
    assert_eq!(person.results_per_page(), 25);
    assert_eq!(person.operation("greet").unwrap().handler, "greet_person");
    assert_eq!(host.object_types(), vec!["person"]);
}

#[test]
fn test_missing_file() {
    let err = DashboardConfig::from_yaml_file("/nonexistent/dashboard.yaml").unwrap_err();
    assert!(matches!(err, ConfigurationError::Io { .. }));
}

#[test]
fn test_malformed_file_names_the_file() {
    let file = yaml_file("objects:\n  - type: [person\n");
    let path = file.path().to_str().unwrap().to_string();

    let err = DashboardConfig::from_yaml_file(&path).unwrap_err();

    match err {
        ConfigurationError::Parse { file, .. } => assert_eq!(file, Some(path)),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_synthesized_default_dashboard() {
    let host = build_from_yaml(
        r#"
objects:
  - type: person
"#,
    )
    .unwrap();

    let dashboard = host.registry.default_dashboard().unwrap();
    assert_eq!(dashboard.name, "default");
    assert_eq!(dashboard.objects, vec!["person"]);
}

#[test]
fn test_fields_to_show_are_checked_on_use() {
    let host = build_from_yaml("objects:\n  - type: person\n").unwrap();

    let err = host
        .registry
        .object("person")
        .unwrap()
        .fields_to_show()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::NoFieldsToShow { .. }));
}

#[test]
fn test_duplicate_object_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
  - type: person
"#,
    ));
    assert!(matches!(err, ConfigurationError::DuplicateObject { ref object_type } if object_type == "person"));
}

#[test]
fn test_both_form_sources_are_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    new:
      form_factory: person_form
      form_class: PersonType
"#,
    ));
    assert!(matches!(err, ConfigurationError::AmbiguousFormSource { .. }));
}

#[test]
fn test_missing_form_source_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    new:
      transform: null
"#,
    ));
    assert!(matches!(err, ConfigurationError::NoFormSource { .. }));
}

#[test]
fn test_unregistered_form_factory_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    new:
      form_factory: employee_form
"#,
    ));
    assert!(matches!(
        err,
        ConfigurationError::UnknownFormSource { kind: "factory", ref name } if name == "employee_form"
    ));
}

#[test]
fn test_unknown_default_dashboard_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
default_dashboard: office
dashboards:
  - name: directory
    title: Directory
objects:
  - type: person
"#,
    ));
    assert!(matches!(err, ConfigurationError::UnknownDashboard { ref name } if name == "office"));
}

#[test]
fn test_dashboard_listing_unmanaged_object_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
dashboards:
  - name: directory
    title: Directory
    objects: [person, robot]
objects:
  - type: person
"#,
    ));
    assert!(matches!(err, ConfigurationError::UnknownObject { ref object_type } if object_type == "robot"));
}

#[test]
fn test_object_without_factory_is_rejected() {
    let err = configuration_error(build_from_yaml("objects:\n  - type: robot\n"));
    assert!(matches!(err, ConfigurationError::NoObjectFactory { .. }));
}

#[test]
fn test_unknown_operation_handler_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    list:
      operations:
        wave:
          label: Wave
          handler: wave_person
"#,
    ));
    assert!(matches!(
        err,
        ConfigurationError::UnknownOperationHandler { ref handler } if handler == "wave_person"
    ));
}

#[test]
fn test_import_mapping_to_unknown_field_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    imports:
      people:
        type: csv_upload
        name: People
        mapping:
          email: email_address
"#,
    ));
    assert!(matches!(
        err,
        ConfigurationError::UnknownField { ref field, .. } if field == "email_address"
    ));
}

#[test]
fn test_unregistered_import_hook_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    imports:
      people:
        type: csv_upload
        name: People
        post_insert: audit
"#,
    ));
    assert!(matches!(
        err,
        ConfigurationError::HookNotCallable { ref hook, .. } if hook == "audit"
    ));
}

#[test]
fn test_unknown_object_manager_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    object_manager: archive
"#,
    ));
    assert!(matches!(err, ConfigurationError::UnknownObjectManager { .. }));
}

#[test]
fn test_zero_results_per_page_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    list:
      results_per_page: 0
"#,
    ));
    assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
}

#[test]
fn test_duplicate_dashboard_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
dashboards:
  - name: main
    title: First
    objects: [person]
  - name: main
    title: Second
objects:
  - type: person
"#,
    ));
    assert!(matches!(err, ConfigurationError::DuplicateDashboard { ref name } if name == "main"));
}

#[test]
fn test_paste_column_outside_line_is_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    imports:
      quick:
        type: paste_csv
        name: Quick add
        mapping:
          "0": full_name
          "5": years
"#,
    ));
    match err {
        ConfigurationError::InvalidValue { field, value, .. } => {
            assert_eq!(field, "person.imports.quick.mapping");
            assert_eq!(value, "5");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_paste_columns_resolving_to_same_position_are_rejected() {
    let err = configuration_error(build_from_yaml(
        r#"
objects:
  - type: person
    imports:
      quick:
        type: paste_csv
        name: Quick add
        mapping:
          "1": full_name
          age: years
"#,
    ));
    assert!(matches!(err, ConfigurationError::InvalidValue { ref value, .. } if value == "age"));
}

#[test]
fn test_upload_columns_are_not_positions() {
    let host = build_from_yaml(
        r#"
objects:
  - type: person
    imports:
      people:
        type: csv_upload
        name: People file
        mapping:
          "7": full_name
"#,
    );
    assert!(host.is_ok());
}
