use std::fmt;

#[derive(Debug)]
pub enum StyleError {
    Json(serde_json::Error),
    NotAnObject(String),
    InvalidDeclaration(String),
    InvalidMediaList,
    InvalidAtRule(String),
}

impl std::error::Error for StyleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StyleError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleError::Json(e) => write!(f, "Malformed style sheet JSON: {}", e),
            StyleError::NotAnObject(what) => write!(f, "Expected a JSON object for {}", what),
            StyleError::InvalidDeclaration(selector) => {
                write!(f, "Declaration for selector '{}' is not an object", selector)
            }
            StyleError::InvalidMediaList => write!(f, "@MEDIA must be an array of objects"),
            StyleError::InvalidAtRule(key) => write!(f, "{} must be an object", key),
        }
    }
}

impl From<serde_json::Error> for StyleError {
    fn from(e: serde_json::Error) -> Self {
        StyleError::Json(e)
    }
}
