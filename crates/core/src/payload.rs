//! Row → request body.
//!
//! The backend's templates render `null` as a literal placeholder word, so
//! every field is sent as a string and a blank cell is always `""`.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ValidationError;
use crate::grid::GridDescriptor;
use crate::row::Row;

/// Wire key carrying the row's never-persisted flag.
pub const IS_NEW_KEY: &str = "nuevo";

/// Field name → value, in registration order, plus the `nuevo` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(String, String)>,
    is_new: bool,
}

impl Payload {
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len() + 1);
        for (name, value) in &self.fields {
            map.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        map.insert(IS_NEW_KEY.to_string(), serde_json::Value::Bool(self.is_new));
        serde_json::Value::Object(map)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(IS_NEW_KEY, &self.is_new)?;
        map.end()
    }
}

/// Build the payload for `row`, or refuse before any network call.
///
/// Cells are read left to right and trimmed. Fails if the row has fewer
/// cells than the grid declares, or if the identifying field is blank.
pub fn serialize(row: &Row, descriptor: &GridDescriptor) -> Result<Payload, ValidationError> {
    let expected = descriptor.column_count();
    if row.len() < expected {
        return Err(ValidationError::ColumnCountMismatch {
            expected,
            actual: row.len(),
        });
    }

    let fields: Vec<(String, String)> = descriptor
        .field_names()
        .iter()
        .zip(row.cells())
        .map(|(name, cell)| (name.clone(), cell.trim().to_string()))
        .collect();

    if fields[descriptor.identifier_column()].1.is_empty() {
        return Err(ValidationError::MissingIdentifier {
            field: descriptor.identifier_field().to_string(),
        });
    }

    Ok(Payload {
        fields,
        is_new: row.is_new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridId;
    use crate::row::RowId;

    fn descriptor() -> GridDescriptor {
        GridDescriptor::new(
            "tablaEmpleados",
            "/api/empleados",
            vec!["Numero de DPI".into(), "Nombre".into(), "Apellidos".into()],
        )
        .unwrap()
    }

    fn row(cells: &[&str]) -> Row {
        Row::new(RowId(1), GridId::from("tablaEmpleados"), cells.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_trims_and_keeps_blanks_as_empty_strings() {
        let payload = serialize(&row(&["  1234 ", "   ", "Lopez"]), &descriptor()).unwrap();
        assert_eq!(payload.get("Numero de DPI"), Some("1234"));
        assert_eq!(payload.get("Nombre"), Some(""));
        assert_eq!(payload.get("Apellidos"), Some("Lopez"));
        assert!(!payload.is_new());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["Nombre"], serde_json::json!(""));
        assert!(json.as_object().unwrap().values().all(|v| !v.is_null()));
        assert_eq!(json[IS_NEW_KEY], serde_json::json!(false));
    }

    #[test]
    fn test_serializes_fields_in_registration_order() {
        let payload = serialize(&row(&["1", "Ana", "Perez"]), &descriptor()).unwrap();
        let text = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            text,
            r#"{"Numero de DPI":"1","Nombre":"Ana","Apellidos":"Perez","nuevo":false}"#
        );
        assert_eq!(serde_json::to_value(&payload).unwrap(), payload.to_json());
    }

    #[test]
    fn test_blank_identifier_is_rejected() {
        let err = serialize(&row(&["   ", "Ana", ""]), &descriptor()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingIdentifier { field: "Numero de DPI".into() }
        );
    }

    #[test]
    fn test_short_row_is_rejected() {
        let err = serialize(&row(&["1", "Ana"]), &descriptor()).unwrap_err();
        assert_eq!(err, ValidationError::ColumnCountMismatch { expected: 3, actual: 2 });
    }

    #[test]
    fn test_identifier_column_can_move() {
        let d = descriptor().with_identifier_column(2).unwrap();
        assert!(serialize(&row(&["", "Ana", "X"]), &d).is_ok());
        let err = serialize(&row(&["1", "Ana", " "]), &d).unwrap_err();
        assert_eq!(err, ValidationError::MissingIdentifier { field: "Apellidos".into() });
    }

    #[test]
    fn test_extra_cells_are_ignored() {
        let payload = serialize(&row(&["1", "a", "b", "extra"]), &descriptor()).unwrap();
        assert_eq!(payload.fields().len(), 3);
    }
}
