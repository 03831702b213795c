//! Record card ("ficha"): a fixed set of fields resolved from whatever key
//! spelling the backend used.
//!
//! Keys are normalized (accents folded, separators dropped, lowercased)
//! before matching, so `"Numero de DPI"`, `"numero_de_dpi"` and
//! `"NúmeroDeDPI"` all land on `numerodedpi`.

use std::collections::BTreeMap;

use crate::page::cell_text;

/// Card field → accepted normalized key spellings, in priority order.
pub const FIELD_VARIANTS: &[(&str, &[&str])] = &[
    ("dpi", &["numerodedpi", "dpi", "numero", "id"]),
    ("nombre", &["nombre", "nombres", "fullname"]),
    ("apellidos", &["apellidos", "apellido", "apellido2", "apellidopaterno", "apellidomaterno"]),
    ("apellidos_casada", &["apellidosdecasada", "apellidoscasada"]),
    ("estado_civil", &["estadocivil", "estado", "civil"]),
    ("nacionalidad", &["nacionalidad"]),
    ("fecha_nacimiento", &["fechadenacimiento", "fechanacimiento", "nacimiento", "birthdate"]),
    ("direccion", &["direcciondeldomicilio", "direccion", "direcciondomicilio"]),
    ("departamento", &["departamento", "estado"]),
    ("telefono", &["numerodetelefono", "telefono", "tel"]),
    ("correo", &["correoelectronico", "correo", "email", "mail"]),
    ("puesto", &["puestodetrabajo", "puesto", "cargo"]),
    ("fecha_ingreso", &["fechadeiniciolaboral", "fechainiciolaboral", "fechainicio", "inicio"]),
    ("sueldo", &["sueldo"]),
    ("region", &["region"]),
];

/// Normalize a record key for matching.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .map(fold_accent)
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_' | '/' | '.' | '(' | ')' | ',' | ':'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'Á' | 'À' | 'Â' | 'Ä' => 'A',
        'á' | 'à' | 'â' | 'ä' => 'a',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ç' => 'C',
        'ç' => 'c',
        other => other,
    }
}

/// A record with normalized keys. Null values are kept as `None` so a
/// later variant can still win.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRecord {
    values: BTreeMap<String, Option<String>>,
}

impl NormalizedRecord {
    /// Accepts an object, or an array whose first element is the object.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let record = match value {
            serde_json::Value::Array(items) => items.first(),
            other => Some(other),
        };
        let values = record
            .and_then(|r| r.as_object())
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (normalize_key(k), (!v.is_null()).then(|| cell_text(v))))
                    .collect()
            })
            .unwrap_or_default();
        Self { values }
    }

    pub fn get(&self, normalized_key: &str) -> Option<&str> {
        self.values.get(normalized_key).and_then(|v| v.as_deref())
    }

    /// First variant with a non-null value.
    pub fn first_of(&self, variants: &[&str]) -> Option<&str> {
        variants.iter().find_map(|v| self.get(v))
    }
}

/// The resolved card. Every field in [`FIELD_VARIANTS`] is present;
/// unresolved fields are `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ficha {
    fields: Vec<(&'static str, String)>,
}

impl Ficha {
    pub fn from_value(value: &serde_json::Value) -> Self {
        let record = NormalizedRecord::from_value(value);
        let fields = FIELD_VARIANTS
            .iter()
            .map(|(field, variants)| (*field, record.first_of(variants).unwrap_or_default().to_string()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, field: &str) -> &str {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    pub fn identifier(&self) -> &str {
        self.get("dpi")
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Numero de DPI"), "numerodedpi");
        assert_eq!(normalize_key("Dirección del Domicilio"), "direcciondeldomicilio");
        assert_eq!(normalize_key("full_name"), "fullname");
        assert_eq!(normalize_key("C.P. (zona): 1/2"), "cpzona12");
        assert_eq!(normalize_key("Región"), "region");
    }

    #[test]
    fn test_ficha_resolves_variants() {
        let ficha = Ficha::from_value(&json!({
            "Numero de DPI": "1234",
            "Nombre": "Ana",
            "Correo Electronico": "ana@example.com",
            "Puesto de trabajo": null,
            "cargo": "Contadora",
            "Sueldo": 5000
        }));
        assert_eq!(ficha.identifier(), "1234");
        assert_eq!(ficha.get("nombre"), "Ana");
        assert_eq!(ficha.get("correo"), "ana@example.com");
        assert_eq!(ficha.get("puesto"), "Contadora");
        assert_eq!(ficha.get("sueldo"), "5000");
        assert_eq!(ficha.get("region"), "");
        assert_eq!(ficha.fields().len(), FIELD_VARIANTS.len());
    }

    #[test]
    fn test_ficha_takes_first_array_element() {
        let ficha = Ficha::from_value(&json!([{"dpi": "42"}, {"dpi": "43"}]));
        assert_eq!(ficha.identifier(), "42");
    }

    #[test]
    fn test_ficha_from_non_object_is_blank() {
        let ficha = Ficha::from_value(&json!("nope"));
        assert!(ficha.fields().iter().all(|(_, v)| v.is_empty()));
    }
}
