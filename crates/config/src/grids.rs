// Grid definitions
// Each entry describes one tabular region of the personnel pages.

use serde::{Deserialize, Serialize};

use planilla_core::{DescriptorError, GridDescriptor};

/// Field list of the main personnel grid. Column 0 is the DPI.
pub const PERSONAL_FIELDS: &[&str] = &[
    "Numero de DPI",
    "Nombre",
    "Apellidos",
    "Apellidos de casada",
    "Estado Civil",
    "Nacionalidad",
    "Departamento",
    "Fecha de nacimiento",
    "Lugar de nacimiento",
    "Numero de Afiliación del IGGS",
    "Dirección del Domicilio",
    "Numero de Telefono",
    "Religión",
    "Correo Electronico",
    "Puesto de trabajo",
    "Tipo de contrato",
    "Jornada laboral",
    "Duración del trabajo",
    "Fecha de inicio laboral",
    "Dias Laborales",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    /// Page element id of the grid (e.g. `tablaEmpleados`)
    pub id: String,

    /// Persistence endpoint; `None` uses `apiEmpleados`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Column header texts, in column order
    pub fields: Vec<String>,

    /// Columns that never accept input
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locked: Vec<usize>,

    #[serde(default)]
    pub identifier_column: usize,
}

impl GridConfig {
    fn builtin(id: &str, fields: &[&str], locked: &[usize]) -> Self {
        Self {
            id: id.to_string(),
            endpoint: None,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            locked: locked.to_vec(),
            identifier_column: 0,
        }
    }

    /// Build the validated descriptor. `default_endpoint` is used when the
    /// entry names none.
    pub fn to_descriptor(&self, default_endpoint: &str) -> Result<GridDescriptor, DescriptorError> {
        let endpoint = self.endpoint.as_deref().unwrap_or(default_endpoint);
        GridDescriptor::new(self.id.as_str(), endpoint, self.fields.clone())?
            .with_locked_columns(self.locked.iter().copied())?
            .with_identifier_column(self.identifier_column)
    }
}

/// The six grids of the personnel pages.
pub fn builtin_grids() -> Vec<GridConfig> {
    vec![
        GridConfig::builtin("tablaEmpleados", PERSONAL_FIELDS, &[]),
        GridConfig::builtin(
            "tablaAcademica",
            &[
                "Numero de DPI",
                "Nivel de estudios",
                "Profesión u Oficio",
                "Cursos o titulos adicionales",
                "Establecimiento",
                "Año de graduación",
            ],
            &[0],
        ),
        GridConfig::builtin(
            "tablaConyuge",
            &[
                "Numero de DPI",
                "Nombre del conyuge",
                "Apellidos del conyuge",
                "Telefono del conyuge",
                "Ocupación del conyuge",
            ],
            &[0],
        ),
        GridConfig::builtin(
            "tablaEmergencia",
            &[
                "Numero de DPI",
                "Nombre del contacto de emergencia",
                "Numero de telefono de emergencia",
                "Parentesco",
                "Dirección del contacto",
            ],
            &[0],
        ),
        GridConfig::builtin(
            "tablaLaboral",
            &[
                "Numero de DPI",
                "Empresa",
                "Puesto",
                "Fecha de inicio",
                "Fecha de finalización",
                "Motivo de retiro",
                "Telefono de referencia",
            ],
            &[0],
        ),
        GridConfig::builtin(
            "tablaMedica",
            &[
                "Numero de DPI",
                "Tipo de sangre",
                "Padece alguna enfermedad",
                "Nombre del tratamiento",
                "Alergias",
                "Operaciones",
                "Accidentes",
            ],
            &[0],
        ),
    ]
}
