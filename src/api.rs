//! Endpoint catalog for the Zhihu Daily API
//!
//! Maps each logical operation to the base address, path and method used to
//! reach it. Everything here is pure and derived from the [`Operation`] alone.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Base URL for the Zhihu Daily API
pub const ZHIHU_BASE_URL: &str = "https://news-at.zhihu.com/api/4";

/// Prefix for cache keys of the dynamic call mode
pub const CACHE_KEY_PREFIX: &str = "dictionary:";

/// Logical API operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Latest stories
    Latest,
    /// Content of a single story
    Content(u64),
}

/// HTTP methods used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
        }
    }
}

/// Resolved request descriptor for an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub operation: Operation,
    pub base_url: &'static str,
    pub path: String,
    pub method: Method,
    /// Whether non-success status codes are treated as failures
    pub requires_validation: bool,
}

impl Endpoint {
    /// Full request URL
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    /// Cache key for the dynamic call mode
    ///
    /// One key per path, so every query against the same path shares an entry.
    pub fn cache_key(&self) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, self.path)
    }
}

/// Describes the endpoint for an operation
pub fn describe(operation: Operation) -> Endpoint {
    let path = match operation {
        Operation::Latest => "/news/latest".to_string(),
        Operation::Content(id) => format!("/news/{}", id),
    };

    Endpoint {
        operation,
        base_url: ZHIHU_BASE_URL,
        path,
        method: Method::Get,
        requires_validation: true,
    }
}

/// Error parsing an operation name
#[derive(Debug, Error, PartialEq)]
pub enum OperationParseError {
    #[error("Unknown operation: '{0}'. Valid operations: latest, content:<id>")]
    Unknown(String),

    #[error("Invalid story id: '{0}'")]
    InvalidId(String),
}

impl FromStr for Operation {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "latest" {
            return Ok(Operation::Latest);
        }
        match lower.split_once(':') {
            Some(("content", id)) => id
                .parse()
                .map(Operation::Content)
                .map_err(|_| OperationParseError::InvalidId(id.to_string())),
            _ => Err(OperationParseError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Latest => write!(f, "latest"),
            Operation::Content(id) => write!(f, "content:{}", id),
        }
    }
}
