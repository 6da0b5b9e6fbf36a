//! Macros for reducing boilerplate when defining managed objects
//!
//! The dashboard reads and writes fields by name. Rather than reaching into
//! private state, each entity carries an explicit field map; these macros
//! generate it together with the struct.

/// Define a managed object with automatic trait implementations
///
/// The generated struct always has an `id: String` field (a fresh UUID for new
/// instances) followed by the declared fields. Every declared field type must
/// implement [`ToFieldValue`](crate::core::field::ToFieldValue),
/// [`FromFieldValue`](crate::core::field::FromFieldValue) and `Default`.
///
/// # Example
///
/// ```rust,ignore
/// use dashboard::prelude::*;
///
/// impl_managed_object!(Book, "book", {
///     title: String,
///     pages: i64,
///     published_at: Option<DateTime<Utc>>,
/// });
///
/// let book = Book::new("Dune".to_string(), 412, None);
/// assert_eq!(book.get_field("pages"), Some(FieldValue::Integer(412)));
/// ```
#[macro_export]
macro_rules! impl_managed_object {
    (
        $type:ident,
        $type_name:expr,
        {
            $( $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Identifier of this object
            pub id: String,
            $( pub $field : $field_type ),*
        }

        impl $crate::core::entity::ManagedObject for $type {
            fn object_type(&self) -> &str {
                $type_name
            }

            fn id(&self) -> String {
                self.id.clone()
            }

            fn field_names(&self) -> &'static [&'static str] {
                <Self as $crate::core::entity::ManagedEntity>::FIELDS
            }

            fn get_field(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::ToFieldValue;
                match field {
                    "id" => Some(self.id.to_field_value()),
                    $( stringify!($field) => Some(self.$field.to_field_value()), )*
                    _ => None,
                }
            }

            fn set_field(
                &mut self,
                field: &str,
                value: $crate::core::field::FieldValue,
            ) -> Result<(), $crate::core::field::FieldError> {
                match field {
                    "id" => {
                        self.id = $crate::core::field::convert_field(field, value)?;
                    }
                    $(
                        stringify!($field) => {
                            self.$field = $crate::core::field::convert_field(field, value)?;
                        }
                    )*
                    _ => {
                        return Err($crate::core::field::FieldError::UnknownField {
                            object_type: $type_name.to_string(),
                            field: field.to_string(),
                        });
                    }
                }
                Ok(())
            }

            fn clone_object(&self) -> Box<dyn $crate::core::entity::ManagedObject> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl $crate::core::entity::ManagedEntity for $type {
            const OBJECT_TYPE: &'static str = $type_name;
            const FIELDS: &'static [&'static str] = &["id" $(, stringify!($field) )*];

            fn blank() -> Self {
                Self {
                    id: ::uuid::Uuid::new_v4().to_string(),
                    $( $field: ::std::default::Default::default() ),*
                }
            }
        }

        impl $type {
            /// Create a new instance with a fresh identifier
            #[allow(clippy::too_many_arguments)]
            pub fn new($( $field: $field_type ),*) -> Self {
                Self {
                    id: ::uuid::Uuid::new_v4().to_string(),
                    $( $field ),*
                }
            }

            /// Replace the identifier
            pub fn with_id(mut self, id: impl Into<String>) -> Self {
                self.id = id.into();
                self
            }
        }
    };
}
