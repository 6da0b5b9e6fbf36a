//! Path generation for every dashboard view
//!
//! All views are served from a single mount point and told apart by their query
//! string, so a path is the mount point plus url-encoded parameters.

use crate::core::store::{OrderBy, SortDirection};
use url::form_urlencoded::Serializer;

/// Query string parameter names understood by the dispatcher
pub mod param {
    pub const ACTION: &str = "action";
    pub const CRUD_OPERATION: &str = "crud_operation";
    pub const OBJECT: &str = "object";
    pub const ID: &str = "id";
    pub const PAGE: &str = "page";
    pub const CRITERIA: &str = "criteria";
    pub const ORDER_BY: &str = "order_by";
    pub const OPERATION: &str = "operation";
}

/// Values of the `action` parameter
pub mod action {
    pub const CRUD: &str = "crud";
    pub const IMPORT: &str = "import";
    pub const OPERATION: &str = "operation";
    pub const BATCH_OPERATION: &str = "batch_operation";
}

/// Values of the `crud_operation` parameter
pub mod crud {
    pub const LIST: &str = "list";
    pub const NEW: &str = "new";
    pub const EDIT: &str = "edit";
    pub const SHOW: &str = "show";
}

/// Default mount point of the dashboard route
pub const DEFAULT_MOUNT_PATH: &str = "/dashboard";

/// Builds the paths of dashboard views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGenerator {
    base: String,
}

impl Default for PathGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_PATH)
    }
}

impl PathGenerator {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn build(&self, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return self.base.clone();
        }
        let mut query = Serializer::new(String::new());
        for (name, value) in params {
            query.append_pair(name, value);
        }
        format!("{}?{}", self.base, query.finish())
    }

    /// Home of the default dashboard
    pub fn dashboard(&self) -> String {
        self.build(&[])
    }

    pub fn object_list(&self, object_type: &str) -> String {
        self.build(&[
            (param::ACTION, action::CRUD),
            (param::CRUD_OPERATION, crud::LIST),
            (param::OBJECT, object_type),
        ])
    }

    /// List path keeping criteria and ordering, for pagination links
    pub fn object_list_page(
        &self,
        object_type: &str,
        page: usize,
        criteria: Option<&str>,
        order_by: &[OrderBy],
    ) -> String {
        let page = page.to_string();
        let order_by = order_by
            .iter()
            .map(|clause| {
                let direction = match clause.direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                format!("{}:{}", clause.field, direction)
            })
            .collect::<Vec<_>>()
            .join(",");

        let mut params = vec![
            (param::ACTION, action::CRUD),
            (param::CRUD_OPERATION, crud::LIST),
            (param::OBJECT, object_type),
            (param::PAGE, page.as_str()),
        ];
        if let Some(criteria) = criteria {
            params.push((param::CRITERIA, criteria));
        }
        if !order_by.is_empty() {
            params.push((param::ORDER_BY, order_by.as_str()));
        }
        self.build(&params)
    }

    pub fn object_show(&self, object_type: &str, id: &str) -> String {
        self.build(&[
            (param::ACTION, action::CRUD),
            (param::CRUD_OPERATION, crud::SHOW),
            (param::OBJECT, object_type),
            (param::ID, id),
        ])
    }

    pub fn object_new(&self, object_type: &str) -> String {
        self.build(&[
            (param::ACTION, action::CRUD),
            (param::CRUD_OPERATION, crud::NEW),
            (param::OBJECT, object_type),
        ])
    }

    pub fn object_edit(&self, object_type: &str, id: &str) -> String {
        self.build(&[
            (param::ACTION, action::CRUD),
            (param::CRUD_OPERATION, crud::EDIT),
            (param::OBJECT, object_type),
            (param::ID, id),
        ])
    }

    pub fn import(&self, object_type: &str) -> String {
        self.build(&[(param::ACTION, action::IMPORT), (param::OBJECT, object_type)])
    }

    pub fn object_operation(&self, object_type: &str, id: &str, operation: &str) -> String {
        self.build(&[
            (param::ACTION, action::OPERATION),
            (param::OBJECT, object_type),
            (param::ID, id),
            (param::OPERATION, operation),
        ])
    }

    /// Target of the batch form; operation and ids travel in the body
    pub fn batch_operation(&self, object_type: &str) -> String {
        self.build(&[
            (param::ACTION, action::BATCH_OPERATION),
            (param::OBJECT, object_type),
        ])
    }

    /// Substitute the object identifier into a redirect path template
    pub fn object_redirect(&self, path: &str, id: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        path.replace("{id}", &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_show_paths() {
        let paths = PathGenerator::default();
        assert_eq!(paths.dashboard(), "/dashboard");
        assert_eq!(
            paths.object_list("book"),
            "/dashboard?action=crud&crud_operation=list&object=book"
        );
        assert_eq!(
            paths.object_show("book", "a b"),
            "/dashboard?action=crud&crud_operation=show&object=book&id=a+b"
        );
    }

    #[test]
    fn test_operation_paths() {
        let paths = PathGenerator::new("/admin");
        assert_eq!(
            paths.object_operation("book", "7", "publish"),
            "/admin?action=operation&object=book&id=7&operation=publish"
        );
        assert_eq!(
            paths.batch_operation("book"),
            "/admin?action=batch_operation&object=book"
        );
        assert_eq!(paths.import("book"), "/admin?action=import&object=book");
    }

    #[test]
    fn test_list_page_keeps_criteria_and_order() {
        let paths = PathGenerator::default();
        let path = paths.object_list_page(
            "book",
            2,
            Some("available"),
            &[OrderBy::desc("title"), OrderBy::asc("id")],
        );
        assert_eq!(
            path,
            "/dashboard?action=crud&crud_operation=list&object=book&page=2&criteria=available&order_by=title%3Adesc%2Cid%3Aasc"
        );
    }

    #[test]
    fn test_redirect_substitutes_id() {
        let paths = PathGenerator::default();
        assert_eq!(paths.object_redirect("/preview/{id}", "42"), "/preview/42");
        assert_eq!(
            paths.object_redirect("/books/{id}/print?copy={id}", "a/b"),
            "/books/a%2Fb/print?copy=a%2Fb"
        );
    }
}
