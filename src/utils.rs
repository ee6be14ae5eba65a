use mongodb::bson::oid::ObjectId;
use serde::Serializer;
use validator::ValidationError;

use crate::error::AppError;

pub fn serialize_object_id<S>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&id.to_hex())
}

/// Parses a hex id taken from a path segment or request body.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::BadRequest(format!("'{raw}' is not a valid id")))
}

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_ids() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn whitespace_is_blank() {
        assert!(not_blank("  \t").is_err());
        assert!(not_blank(" Hall A ").is_ok());
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = parse_object_id("99").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
