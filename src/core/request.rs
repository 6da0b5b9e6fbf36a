//! Transport-neutral request and response types consumed by the dispatcher

use axum::http::Method;
use axum::response::{Html, IntoResponse, Redirect, Response};
use indexmap::IndexMap;

/// A file received through a multipart body
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            content_type: Some(content_type.into()),
            data: data.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// MIME type without parameters (`text/csv; charset=utf-8` → `text/csv`)
    pub fn mime_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
    }
}

/// Everything the dispatcher reads from an incoming request
///
/// Query and body keep their pairs in arrival order so repeated keys
/// (`id=1&id=2`) survive.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Vec<(String, String)>,
    pub files: IndexMap<String, UploadedFile>,
    pub referer: Option<String>,
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self {
            method: Method::GET,
            query: Vec::new(),
            body: Vec::new(),
            files: IndexMap::new(),
            referer: None,
        }
    }
}

impl DashboardRequest {
    /// A GET request with the given query string
    pub fn get(query: &str) -> Self {
        Self {
            query: parse_pairs(query),
            ..Self::default()
        }
    }

    /// A POST request with the given query string
    pub fn post(query: &str) -> Self {
        Self {
            method: Method::POST,
            query: parse_pairs(query),
            ..Self::default()
        }
    }

    /// Append an url-encoded body
    pub fn with_form(mut self, body: &str) -> Self {
        self.body.extend(parse_pairs(body));
        self
    }

    pub fn with_body_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.push((name.into(), value.into()));
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// First query value for a key
    pub fn query_value(&self, name: &str) -> Option<&str> {
        first(&self.query, name)
    }

    /// First non-empty query value for a key
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_value(name).filter(|v| !v.is_empty())
    }

    /// First body value for a key
    pub fn body_value(&self, name: &str) -> Option<&str> {
        first(&self.body, name)
    }

    /// Every body value for a key, also accepting the `name[]` spelling
    pub fn body_values(&self, name: &str) -> Vec<&str> {
        let bracketed = format!("{}[]", name);
        self.body
            .iter()
            .filter(|(key, _)| key == name || *key == bracketed)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Whether any body key or file belongs to the named form
    pub fn has_form_data(&self, form_name: &str) -> bool {
        let prefix = format!("{}[", form_name);
        self.body.iter().any(|(key, _)| key.starts_with(&prefix))
            || self.files.keys().any(|key| key.starts_with(&prefix))
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }
}

fn first<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Decode an `application/x-www-form-urlencoded` string into ordered pairs
pub fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// What a dispatched flow produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardResponse {
    /// Rendered page, served with 200
    Html(String),
    /// Location to send the browser to, served with 303
    Redirect(String),
}

impl DashboardResponse {
    pub fn redirect_location(&self) -> Option<&str> {
        match self {
            DashboardResponse::Redirect(location) => Some(location),
            DashboardResponse::Html(_) => None,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            DashboardResponse::Html(body) => Some(body),
            DashboardResponse::Redirect(_) => None,
        }
    }
}

impl IntoResponse for DashboardResponse {
    fn into_response(self) -> Response {
        match self {
            DashboardResponse::Html(body) => Html(body).into_response(),
            DashboardResponse::Redirect(location) => Redirect::to(&location).into_response(),
        }
    }
}
