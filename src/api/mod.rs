//! REST API module.
//!
//! Contains all API routes and handlers. Status codes follow the original
//! contract: 201 on create, 204 on delete, 400 on validation failure, 401
//! without a valid token, 404 for rows owned by another user.

mod ingredients;
mod recipes;
mod tags;
mod users;

pub use ingredients::*;
pub use recipes::*;
pub use tags::*;
pub use users::*;

use uuid::Uuid;

use crate::errors::AppError;

/// Parse a comma-separated list of UUIDs from a query parameter.
fn parse_id_list(raw: Option<&str>) -> Result<Vec<Uuid>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| AppError::Validation(format!("Invalid id in filter: {}", s)))
        })
        .collect()
}

/// Interpret an `assigned_only` query value (`1`/`0`).
fn is_truthy(value: Option<i32>) -> bool {
    matches!(value, Some(v) if v != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let parsed = parse_id_list(Some(&format!("{},{}", a, b))).unwrap();
        assert_eq!(parsed, vec![a, b]);

        assert!(parse_id_list(None).unwrap().is_empty());
        assert!(parse_id_list(Some("")).unwrap().is_empty());
        assert!(parse_id_list(Some("not-a-uuid")).is_err());
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(Some(1)));
        assert!(!is_truthy(Some(0)));
        assert!(!is_truthy(None));
    }
}
