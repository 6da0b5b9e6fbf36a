//! Library dashboard: books and authors managed through the dashboard
//!
//! Run with `cargo run --example library_dashboard` and open
//! <http://127.0.0.1:3000/dashboard>.

use anyhow::Context;
use dashboard::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

impl_managed_object!(Book, "book", {
    title: String,
    author: String,
    pages: i64,
    available: bool,
    added_at: DateTime<Utc>,
});

impl_managed_object!(Author, "author", {
    name: String,
    country: Option<String>,
});

fn seed() -> Vec<Box<dyn ManagedObject>> {
    let books = [
        ("Dune", "Frank Herbert", 412),
        ("Children of Dune", "Frank Herbert", 444),
        ("The Left Hand of Darkness", "Ursula K. Le Guin", 304),
        ("The Dispossessed", "Ursula K. Le Guin", 387),
        ("Foundation", "Isaac Asimov", 255),
    ];
    let authors = [
        ("Frank Herbert", Some("United States")),
        ("Ursula K. Le Guin", Some("United States")),
        ("Isaac Asimov", None),
    ];

    let mut objects: Vec<Box<dyn ManagedObject>> = books
        .into_iter()
        .map(|(title, author, pages)| {
            Box::new(Book::new(
                title.to_string(),
                author.to_string(),
                pages,
                true,
                Utc::now(),
            )) as Box<dyn ManagedObject>
        })
        .collect();
    objects.extend(authors.into_iter().map(|(name, country)| {
        Box::new(Author::new(name.to_string(), country.map(str::to_string)))
            as Box<dyn ManagedObject>
    }));
    objects
}

/// Lends or gives back a book, refusing no-op changes
struct SetAvailability {
    manager: Arc<InMemoryObjectManager>,
    available: bool,
}

#[async_trait]
impl OperationHandler for SetAvailability {
    async fn handle(
        &self,
        _operation: &Operation,
        object: Box<dyn ManagedObject>,
        context: &DashboardContext,
    ) -> anyhow::Result<()> {
        let mut book = downcast_ref::<Book>(object.as_ref())
            .cloned()
            .context("operation received something else than a book")?;
        if book.available == self.available {
            anyhow::bail!(
                "\"{}\" is already {}",
                book.title,
                if book.available { "on the shelf" } else { "lent" }
            );
        }
        book.available = self.available;
        tracing::info!(title = %book.title, available = book.available, user = ?context.user, "book availability changed");
        self.manager.persist(Box::new(book)).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dashboard=debug,tower_http=debug,info")),
        )
        .init();

    let config = DashboardConfig::from_yaml_str(include_str!("dashboard.yaml"))?;

    let manager = InMemoryObjectManager::new()
        .with_repository_method("book", "find_available", |books| {
            Ok(CriteriaResult::Objects(
                books
                    .into_iter()
                    .filter(|book| book.get_field("available") == Some(FieldValue::Boolean(true)))
                    .collect(),
            ))
        })
        .with_repository_method("book", "count_per_author", |books| {
            let mut counts: BTreeMap<String, i64> = BTreeMap::new();
            for book in &books {
                let author = book.get_field("author").unwrap_or(FieldValue::Null).to_string();
                *counts.entry(author).or_default() += 1;
            }
            Ok(CriteriaResult::Json(
                counts
                    .into_iter()
                    .map(|(author, books)| json!({ "author": author, "books": books }))
                    .collect(),
            ))
        });
    manager.seed(seed())?;
    let manager = Arc::new(manager);

    let book_form = EntityFormType::new(EntityFactory::<Book>::shared())
        .fields(&["title", "author", "pages", "available"])
        .filter("title", filters::trim())
        .filter("author", filters::trim())
        .validator("title", validators::required())
        .validator("pages", validators::positive());
    let author_form = EntityFormType::new(EntityFactory::<Author>::shared())
        .filter("country", filters::empty_to_null())
        .validator("name", validators::required());

    let lend = Arc::new(SetAvailability {
        manager: manager.clone(),
        available: false,
    });
    let give_back = Arc::new(SetAvailability {
        manager: manager.clone(),
        available: true,
    });

    DashboardBuilder::new()
        .with_config(config)
        .register_entity::<Book>()
        .register_entity::<Author>()
        .with_shared_object_manager(manager)
        .register_form_type("book", Arc::new(book_form))
        .register_form_factory("author", author_form.into_factory())
        .register_transform_hook("normalize_title", |mut book| {
            let title = book.get_field("title").unwrap_or(FieldValue::Null).to_string();
            book.set_field("title", FieldValue::String(title.trim().to_string()))?;
            book.set_field("added_at", FieldValue::DateTime(Utc::now()))?;
            Ok(Some(book))
        })
        .register_import_before_insert_hook("mark_available", |book| {
            book.set_field("available", FieldValue::Boolean(true))?;
            Ok(())
        })
        .register_import_post_insert_hook("log_import", |book| {
            tracing::info!(id = %book.id(), "book imported");
            Ok(())
        })
        .register_operation("lend_book", lend)
        .register_operation("return_book", give_back)
        .serve("127.0.0.1:3000")
        .await
}
