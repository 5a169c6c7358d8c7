//! # Request Validation
//!
//! Declarative per-field schemas checked before a payload reaches a handler.
//! Violations are collected for every field rather than stopping at the first.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    /// Absolute `http`/`https` URL with a host.
    Url,
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

impl FieldRule {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            min_len: None,
            max_len: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn email(name: &'static str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub const fn url(name: &'static str) -> Self {
        Self::new(name, FieldKind::Url)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_len = Some(min);
        self.max_len = Some(max);
        self
    }

    fn check(&self, value: Option<&Value>, violations: &mut Vec<String>) {
        let name = self.name;
        let text = match value {
            None => {
                if self.required {
                    violations.push(format!("\"{name}\" is required"));
                }
                return;
            }
            Some(Value::String(s)) => s,
            Some(_) => {
                violations.push(format!("\"{name}\" must be a string"));
                return;
            }
        };

        if text.is_empty() {
            violations.push(format!("\"{name}\" is not allowed to be empty"));
            return;
        }

        let len = text.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                violations.push(format!(
                    "\"{name}\" length must be at least {min} characters long"
                ));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                violations.push(format!(
                    "\"{name}\" length must be less than or equal to {max} characters long"
                ));
            }
        }

        match self.kind {
            FieldKind::Text => {}
            FieldKind::Email if !is_valid_email(text) => {
                violations.push(format!("\"{name}\" must be a valid email"));
            }
            FieldKind::Url if !is_valid_url(text) => {
                violations.push(format!("\"{name}\" must be a valid http(s) URL"));
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    /// Returns the body unchanged when every rule holds.
    pub fn validate(&self, body: Value) -> Result<Value, ApiError> {
        let Some(object) = body.as_object() else {
            return Err(ApiError::validation("request body must be a JSON object"));
        };

        let violations = self.violations(object);
        if violations.is_empty() {
            Ok(body)
        } else {
            Err(ApiError::Validation(violations))
        }
    }

    fn violations(&self, object: &Map<String, Value>) -> Vec<String> {
        let mut violations = Vec::new();
        for rule in &self.fields {
            rule.check(object.get(rule.name), &mut violations);
        }
        for key in object.keys() {
            if !self.fields.iter().any(|rule| rule.name == key) {
                violations.push(format!("\"{key}\" is not allowed"));
            }
        }
        violations
    }
}

/// Payload types that carry their own schema.
pub trait Validate {
    fn schema() -> &'static Schema;
}

/// JSON body extractor that runs `T::schema()` before deserializing.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;

        let body = T::schema().validate(body)?;
        let payload = serde_json::from_value(body)
            .map_err(|e| ApiError::validation(format!("malformed request body: {e}")))?;

        Ok(ValidatedJson(payload))
    }
}

pub fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

pub fn is_valid_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signup_like() -> Schema {
        Schema::new(vec![
            FieldRule::text("name").length(2, 30),
            FieldRule::url("avatar"),
            FieldRule::email("email").required(),
            FieldRule::text("password").required(),
        ])
    }

    fn messages(result: Result<Value, ApiError>) -> Vec<String> {
        match result {
            Err(ApiError::Validation(v)) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_body_is_returned_unchanged() {
        let body = json!({"email": "a@b.com", "password": "secret1", "name": "Jo"});
        assert_eq!(signup_like().validate(body.clone()).unwrap(), body);
    }

    #[test]
    fn email_pattern() {
        for good in ["a@b.com", "first.last+tag@mail.example.org"] {
            assert!(is_valid_email(good), "{good}");
        }
        for bad in ["ab.com", "@b.com", "a@b", "a@@b.com", "a@b..com", "a b@c.com", "a@.com"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn url_pattern() {
        assert!(is_valid_url("https://pictures.example.com/a.png"));
        assert!(is_valid_url("http://localhost:3000/x"));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("example.com/a.png"));
        assert!(!is_valid_url("javascript:alert(1)"));
    }

    #[test]
    fn all_violations_are_reported() {
        let body = json!({"name": "J", "avatar": "nope", "extra": 1});
        let v = messages(signup_like().validate(body));
        assert!(v.contains(&"\"name\" length must be at least 2 characters long".to_string()));
        assert!(v.contains(&"\"avatar\" must be a valid http(s) URL".to_string()));
        assert!(v.contains(&"\"email\" is required".to_string()));
        assert!(v.contains(&"\"password\" is required".to_string()));
        assert!(v.contains(&"\"extra\" is not allowed".to_string()));
    }

    #[test]
    fn bad_email_is_rejected() {
        let v = messages(signup_like().validate(json!({"email": "not-an-email", "password": "x"})));
        assert_eq!(v, vec!["\"email\" must be a valid email".to_string()]);
    }

    #[test]
    fn wrong_types_and_empty_strings() {
        let v = messages(signup_like().validate(json!({"email": 42, "password": ""})));
        assert_eq!(
            v,
            vec![
                "\"email\" must be a string".to_string(),
                "\"password\" is not allowed to be empty".to_string(),
            ]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let schema = Schema::new(vec![FieldRule::text("name").length(2, 3)]);
        assert!(schema.validate(json!({"name": "Жак"})).is_ok());
        assert!(schema.validate(json!({"name": "Жакк"})).is_err());
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(signup_like().validate(json!(["a@b.com"])).is_err());
    }
}
