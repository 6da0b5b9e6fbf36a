//! CSV import engine
//!
//! Rows are read with the `csv` crate, turned into an [`ImportRecord`] through
//! the rule's column mapping, built into a fresh object by the type's factory,
//! and persisted one by one. A row with the wrong number of fields is logged
//! and skipped; any other failure stops the import, leaving the rows already
//! persisted in place.

use crate::config::ImportRule;
use crate::core::entity::{ImportRecord, ObjectFactory};
use crate::core::error::{DashboardError, DashboardResult};
use crate::core::field::FieldValue;
use crate::core::hooks::{HookRegistry, ImportBeforeInsertHook, ImportPostInsertHook};
use crate::core::service::ObjectManager;
use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use serde::Serialize;

/// Outcome of one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows persisted
    pub imported: usize,
    /// Rows dropped because their field count did not match
    pub skipped: usize,
}

struct ResolvedHooks<'r> {
    before_insert: Option<(&'r str, ImportBeforeInsertHook)>,
    post_insert: Option<(&'r str, ImportPostInsertHook)>,
}

/// Imports rows of one object type
pub struct ImportEngine<'a> {
    factory: &'a dyn ObjectFactory,
    manager: &'a dyn ObjectManager,
    hooks: &'a HookRegistry,
}

impl<'a> ImportEngine<'a> {
    pub fn new(
        factory: &'a dyn ObjectFactory,
        manager: &'a dyn ObjectManager,
        hooks: &'a HookRegistry,
    ) -> Self {
        Self {
            factory,
            manager,
            hooks,
        }
    }

    fn resolve_hooks<'r>(&self, rule: &'r ImportRule) -> DashboardResult<ResolvedHooks<'r>> {
        let before_insert = match rule.before_insert.as_deref() {
            Some(name) => Some((name, self.hooks.import_before_insert(name)?)),
            None => None,
        };
        let post_insert = match rule.post_insert.as_deref() {
            Some(name) => Some((name, self.hooks.import_post_insert(name)?)),
            None => None,
        };
        Ok(ResolvedHooks {
            before_insert,
            post_insert,
        })
    }

    /// Import an uploaded CSV file whose first record is the header
    pub async fn import_upload(&self, rule: &ImportRule, data: &[u8]) -> DashboardResult<ImportReport> {
        let hooks = self.resolve_hooks(rule)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);
        let mut records = reader.records();

        let header = match records.next() {
            Some(header) => header?,
            None => {
                tracing::info!(import = %rule.name, "Uploaded file is empty, nothing to import");
                return Ok(ImportReport::default());
            }
        };

        let mut columns: IndexMap<String, usize> = IndexMap::new();
        for (index, name) in header.iter().enumerate() {
            columns.entry(name.trim().to_string()).or_insert(index);
        }

        let mut positions = Vec::with_capacity(rule.mapping.len());
        for (column, field) in &rule.mapping {
            let index = columns.get(column.as_str()).copied().ok_or_else(|| {
                DashboardError::Data(format!(
                    "Column \"{}\" is missing from the header of the uploaded file",
                    column
                ))
            })?;
            positions.push((index, field.as_str()));
        }

        let mut report = ImportReport::default();
        for (line, record) in records.enumerate() {
            // line 1 is the header
            let line = line + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(line, error = %e, "Error while importing a file: line could not be read, line will be skipped");
                    report.skipped += 1;
                    continue;
                }
            };
            if record.len() != header.len() {
                tracing::warn!(
                    line,
                    expected = header.len(),
                    found = record.len(),
                    "Error while importing a file: line does not match headers, line will be skipped"
                );
                report.skipped += 1;
                continue;
            }

            self.import_row(&record, &positions, &hooks).await?;
            report.imported += 1;
        }

        Ok(report)
    }

    /// Import pasted CSV text, one record per line, without header
    ///
    /// Columns are resolved by [`ImportRule::paste_positions`].
    pub async fn import_paste(&self, rule: &ImportRule, content: &str) -> DashboardResult<ImportReport> {
        let hooks = self.resolve_hooks(rule)?;
        let delimiter = rule.separator_byte()?;
        let positions = rule.paste_positions()?;
        let expected = rule.mapping.len();

        let mut report = ImportReport::default();
        for (line_number, line) in content.split('\n').enumerate() {
            let line_number = line_number + 1;
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }

            let mut reader = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .delimiter(delimiter)
                .from_reader(line.as_bytes());
            let record = match reader.records().next() {
                Some(Ok(record)) => record,
                Some(Err(e)) => {
                    tracing::warn!(line = line_number, error = %e, "Error while importing pasted content: line could not be read, line will be skipped");
                    report.skipped += 1;
                    continue;
                }
                None => continue,
            };

            if record.len() != expected {
                tracing::warn!(
                    line = line_number,
                    expected,
                    found = record.len(),
                    "Error while importing pasted content: line does not match mapping, line will be skipped"
                );
                report.skipped += 1;
                continue;
            }

            self.import_row(&record, &positions, &hooks).await?;
            report.imported += 1;
        }

        Ok(report)
    }

    async fn import_row(
        &self,
        row: &StringRecord,
        positions: &[(usize, &str)],
        hooks: &ResolvedHooks<'_>,
    ) -> DashboardResult<()> {
        let mut record = ImportRecord::new();
        for (index, field) in positions {
            let value = row.get(*index).ok_or_else(|| {
                DashboardError::Data(format!(
                    "Column {} does not exist in a line of {} fields",
                    index,
                    row.len()
                ))
            })?;
            record.insert(field.to_string(), FieldValue::String(value.to_string()));
        }

        let mut object = self.factory.from_record(&record)?;

        if let Some((name, hook)) = &hooks.before_insert {
            HookRegistry::run_import_before_insert(hook, name, object.as_mut())?;
        }

        self.manager.persist(object.clone_object()).await?;

        if let Some((name, hook)) = &hooks.post_insert {
            HookRegistry::run_import_post_insert(hook, name, object.as_ref())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityFactory;
    use crate::storage::InMemoryObjectManager;

    crate::impl_managed_object!(Member, "member", {
        full_name: String,
        years: i64,
    });

    fn names(manager: &InMemoryObjectManager) -> Vec<String> {
        manager
            .all("member")
            .unwrap()
            .iter()
            .map(|o| o.get_field("full_name").unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_upload_with_header_mapping() {
        let factory = EntityFactory::<Member>::new();
        let manager = InMemoryObjectManager::new();
        let hooks = HookRegistry::new();
        let engine = ImportEngine::new(&factory, &manager, &hooks);

        let rule = ImportRule::csv_upload("Members")
            .map("name", "full_name")
            .map("age", "years");
        let csv = "name, age\n\"Doe, Jane\",34\nJohn,41\nbroken\n";

        let report = engine.import_upload(&rule, csv.as_bytes()).await.unwrap();
        assert_eq!(report, ImportReport { imported: 2, skipped: 1 });
        assert_eq!(names(&manager), vec!["Doe, Jane", "John"]);
    }

    #[tokio::test]
    async fn test_upload_missing_column_fails_before_rows() {
        let factory = EntityFactory::<Member>::new();
        let manager = InMemoryObjectManager::new();
        let hooks = HookRegistry::new();
        let engine = ImportEngine::new(&factory, &manager, &hooks);

        let rule = ImportRule::csv_upload("Members").map("surname", "full_name");
        let err = engine
            .import_upload(&rule, b"name,age\nJane,34\n")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DATA_ERROR");
        assert!(names(&manager).is_empty());
    }

    #[tokio::test]
    async fn test_uncoercible_value_aborts_after_prior_rows() {
        let factory = EntityFactory::<Member>::new();
        let manager = InMemoryObjectManager::new();
        let hooks = HookRegistry::new();
        let engine = ImportEngine::new(&factory, &manager, &hooks);

        let rule = ImportRule::csv_upload("Members")
            .map("name", "full_name")
            .map("age", "years");
        let err = engine
            .import_upload(&rule, b"name,age\nJane,34\nJohn,old\nAmy,20\n")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DATA_ERROR");
        assert_eq!(names(&manager), vec!["Jane"]);
    }

    #[tokio::test]
    async fn test_paste_positional_with_separator() {
        let factory = EntityFactory::<Member>::new();
        let manager = InMemoryObjectManager::new();
        let hooks = HookRegistry::new();
        let engine = ImportEngine::new(&factory, &manager, &hooks);

        let rule = ImportRule::paste_csv("Quick add")
            .map("1", "years")
            .map("0", "full_name")
            .separator(';');
        let content = "Jane;34\r\nJohn;41\r\n\r\nAmy;20;extra\n";

        let report = engine.import_paste(&rule, content).await.unwrap();
        assert_eq!(report, ImportReport { imported: 2, skipped: 1 });
        let stored = manager.all("member").unwrap();
        assert_eq!(stored[0].get_field("years"), Some(FieldValue::Integer(34)));
        assert_eq!(names(&manager), vec!["Jane", "John"]);
    }

    #[tokio::test]
    async fn test_paste_named_columns_use_mapping_order() {
        let factory = EntityFactory::<Member>::new();
        let manager = InMemoryObjectManager::new();
        let hooks = HookRegistry::new();
        let engine = ImportEngine::new(&factory, &manager, &hooks);

        let rule = ImportRule::paste_csv("Quick add")
            .map("name", "full_name")
            .map("age", "years");
        let report = engine.import_paste(&rule, "Jane,34").await.unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(names(&manager), vec!["Jane"]);
    }

    #[tokio::test]
    async fn test_hooks_run_around_persist() {
        let factory = EntityFactory::<Member>::new();
        let manager = InMemoryObjectManager::new();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut hooks = HookRegistry::new();
        hooks.register_import_before_insert("upper", |object| {
            let name = object.get_field("full_name").unwrap_or(FieldValue::Null);
            object.set_field("full_name", FieldValue::String(name.to_string().to_uppercase()))?;
            Ok(())
        });
        hooks.register_import_post_insert("audit", move |object| {
            sink.lock().unwrap().push(object.get_field("full_name").unwrap().to_string());
            Ok(())
        });
        let engine = ImportEngine::new(&factory, &manager, &hooks);

        let rule = ImportRule::paste_csv("Quick add")
            .map("0", "full_name")
            .map("1", "years")
            .before_insert("upper")
            .post_insert("audit");
        engine.import_paste(&rule, "jane,34\njohn,41").await.unwrap();

        assert_eq!(names(&manager), vec!["JANE", "JOHN"]);
        assert_eq!(*seen.lock().unwrap(), vec!["JANE", "JOHN"]);
    }

    #[tokio::test]
    async fn test_unregistered_hook_fails_before_any_row() {
        let factory = EntityFactory::<Member>::new();
        let manager = InMemoryObjectManager::new();
        let hooks = HookRegistry::new();
        let engine = ImportEngine::new(&factory, &manager, &hooks);

        let rule = ImportRule::paste_csv("Quick add")
            .map("0", "full_name")
            .post_insert("audit");
        let err = engine.import_paste(&rule, "jane").await.unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(names(&manager).is_empty());
    }
}
