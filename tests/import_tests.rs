//! CSV import through the dispatcher: uploads with a header, pasted lines
//! mapped by position, hooks around each persisted row.

mod dashboard_harness;

use dashboard::prelude::*;
use dashboard_harness::*;
use serde_json::json;
use std::sync::{Arc, Mutex};

const IMPORT_QUERY: &str = "action=import&object=person";

fn upload_rule() -> ImportRule {
    ImportRule::csv_upload("People file")
        .mime_type("text/csv")
        .map("name", "full_name")
        .map("age", "years")
}

fn paste_rule() -> ImportRule {
    ImportRule::paste_csv("Quick add")
        .separator(';')
        .map("0", "full_name")
        .map("1", "years")
}

fn import_fixture(rules: Vec<(&str, ImportRule)>) -> Fixture {
    let config = rules
        .into_iter()
        .fold(person_config(), |config, (key, rule)| config.import(key, rule));
    fixture(builder(DashboardConfig::new().object(config), vec![]))
}

fn upload(content: &str, mime_type: &str) -> DashboardRequest {
    DashboardRequest::post(IMPORT_QUERY).with_file(
        "people[file]",
        UploadedFile::new(mime_type, content).with_file_name("people.csv"),
    )
}

fn names(objects: &[Box<dyn ManagedObject>]) -> Vec<String> {
    objects
        .iter()
        .map(|o| o.get_field("full_name").unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_import_page_lists_forms() {
    let fx = import_fixture(vec![("people", upload_rule()), ("quick", paste_rule())]);

    let response = fx.get(IMPORT_QUERY).await.unwrap();

    assert_eq!(response.html(), Some("rendered import.html"));
    let view = fx.view("import.html");
    assert_eq!(view["label"], "People");
    assert_eq!(view["imports"][0]["name"], "people");
    assert_eq!(view["imports"][0]["kind"], "csv_upload");
    assert_eq!(view["imports"][0]["mime_types"], json!(["text/csv"]));
    assert_eq!(view["imports"][0]["columns"], json!(["name", "age"]));
    assert_eq!(view["imports"][1]["kind"], "paste_csv");
    assert_eq!(view["imports"][1]["title"], "Quick add");
    assert!(view["imports"][1]["errors"].as_array().unwrap().is_empty());
    assert!(fx.manager.calls().is_empty());
}

#[tokio::test]
async fn test_object_without_imports() {
    let fx = import_fixture(vec![]);

    let err = fx.get(IMPORT_QUERY).await.unwrap_err();

    assert!(matches!(
        err,
        DashboardError::Configuration(ConfigurationError::NoImports { .. })
    ));
}

#[tokio::test]
async fn test_upload_maps_header_columns() {
    let fx = import_fixture(vec![("people", upload_rule())]);

    let response = fx
        .dispatch(upload("age,name\n36,Ada\n41,Alan\n", "text/csv"))
        .await
        .unwrap();

    assert_eq!(
        response.redirect_location(),
        Some("/dashboard?action=crud&crud_operation=list&object=person")
    );
    let stored = fx.stored();
    assert_eq!(names(&stored), vec!["Ada", "Alan"]);
    assert_eq!(stored[1].get_field("years"), Some(FieldValue::Integer(41)));
    assert_ne!(stored[0].id(), stored[1].id());
}

#[tokio::test]
async fn test_upload_skips_rows_not_matching_header() {
    let fx = import_fixture(vec![("people", upload_rule())]);

    fx.dispatch(upload(
        "name,age\nAda,36\nCharles,79,too many\nAlan\nGrace,85\n",
        "text/csv; charset=utf-8",
    ))
    .await
    .unwrap();

    assert_eq!(names(&fx.stored()), vec!["Ada", "Grace"]);
}

#[tokio::test]
async fn test_upload_with_disallowed_mime_type() {
    let fx = import_fixture(vec![("people", upload_rule())]);

    let response = fx
        .dispatch(upload("name,age\nAda,36\n", "application/pdf"))
        .await
        .unwrap();

    assert!(response.html().is_some());
    let view = fx.view("import.html");
    let errors = view["imports"][0]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        "The mime type of the file is invalid (application/pdf). Allowed mime types are text/csv."
    );
    assert!(fx.stored().is_empty());
    assert!(fx.manager.calls().is_empty());
}

#[tokio::test]
async fn test_upload_missing_mapped_column() {
    let fx = import_fixture(vec![("people", upload_rule())]);

    let err = fx
        .dispatch(upload("name,years\nAda,36\n", "text/csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Data(ref message) if message.contains("\"age\"")));
    assert!(fx.stored().is_empty());
}

#[tokio::test]
async fn test_upload_with_unparsable_value_stops_import() {
    let fx = import_fixture(vec![("people", upload_rule())]);

    let err = fx
        .dispatch(upload("name,age\nAda,36\nAlan,forty\nGrace,85\n", "text/csv"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "DATA_ERROR");
    assert_eq!(names(&fx.stored()), vec!["Ada"]);
}

#[tokio::test]
async fn test_paste_uses_separator_and_positions() {
    let fx = import_fixture(vec![("quick", paste_rule())]);

    let response = fx
        .dispatch(
            DashboardRequest::post(IMPORT_QUERY)
                .with_body_field("quick[content]", "Ada;36\r\n\r\nAlan;41\nbroken line\nGrace;85"),
        )
        .await
        .unwrap();

    assert!(response.redirect_location().is_some());
    let stored = fx.stored();
    assert_eq!(names(&stored), vec!["Ada", "Alan", "Grace"]);
    assert_eq!(stored[2].get_field("years"), Some(FieldValue::Integer(85)));
}

#[tokio::test]
async fn test_paste_with_named_columns_uses_mapping_order() {
    let rule = ImportRule::paste_csv("Quick add")
        .map("name", "full_name")
        .map("age", "years");
    let fx = import_fixture(vec![("quick", rule)]);

    fx.dispatch(
        DashboardRequest::post(IMPORT_QUERY).with_body_field("quick[content]", "Edsger,72"),
    )
    .await
    .unwrap();

    let stored = fx.stored();
    assert_eq!(names(&stored), vec!["Edsger"]);
    assert_eq!(stored[0].get_field("years"), Some(FieldValue::Integer(72)));
}

#[tokio::test]
async fn test_blank_paste_is_rejected() {
    let fx = import_fixture(vec![("people", upload_rule()), ("quick", paste_rule())]);

    fx.dispatch(DashboardRequest::post(IMPORT_QUERY).with_body_field("quick[content]", "  \n "))
        .await
        .unwrap();

    let view = fx.view("import.html");
    assert!(view["imports"][0]["errors"].as_array().unwrap().is_empty());
    assert_eq!(
        view["imports"][1]["errors"],
        json!(["This value should not be blank."])
    );
    assert_eq!(view["imports"][1]["content"], "  \n ");
    assert!(fx.stored().is_empty());
}

#[tokio::test]
async fn test_import_hooks_wrap_each_row() {
    let inserted = Arc::new(Mutex::new(Vec::new()));
    let log = inserted.clone();
    let config = DashboardConfig::new().object(
        person_config().import(
            "people",
            upload_rule()
                .before_insert("capitalize")
                .post_insert("remember"),
        ),
    );
    let (builder, manager, renderer) = builder(config, vec![]);
    let fx = fixture((
        builder
            .register_import_before_insert_hook("capitalize", |object| {
                let name = object.get_field("full_name").unwrap_or(FieldValue::Null);
                object.set_field("full_name", FieldValue::String(name.to_string().to_uppercase()))?;
                Ok(())
            })
            .register_import_post_insert_hook("remember", move |object| {
                log.lock()
                    .unwrap()
                    .push(object.get_field("full_name").unwrap_or(FieldValue::Null).to_string());
                Ok(())
            }),
        manager,
        renderer,
    ));

    fx.dispatch(upload("name,age\nada,36\nalan,41\n", "text/csv"))
        .await
        .unwrap();

    assert_eq!(names(&fx.stored()), vec!["ADA", "ALAN"]);
    assert_eq!(*inserted.lock().unwrap(), vec!["ADA", "ALAN"]);
}

#[tokio::test]
async fn test_failing_hook_keeps_rows_already_persisted() {
    let config = DashboardConfig::new()
        .object(person_config().import("quick", paste_rule().before_insert("no_minors")));
    let (builder, manager, renderer) = builder(config, vec![]);
    let fx = fixture((
        builder.register_import_before_insert_hook("no_minors", |object| {
            let years = object.get_field("years").and_then(|y| y.as_integer());
            anyhow::ensure!(years >= Some(18), "{} is a minor", object.id());
            Ok(())
        }),
        manager,
        renderer,
    ));

    let err = fx
        .dispatch(
            DashboardRequest::post(IMPORT_QUERY)
                .with_body_field("quick[content]", "Ada;36\nTom;12\nGrace;85"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "HOOK_FAILED");
    assert_eq!(names(&fx.stored()), vec!["Ada"]);
}
