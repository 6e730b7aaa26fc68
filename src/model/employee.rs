use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "document_number": 1061234567,
        "first_name": "Ana",
        "middle_name": "Lucia",
        "last_name": "Perez",
        "second_last_name": null,
        "role_title": "Enfermera",
        "active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Code printed on the employee QR and typed at the kiosk
    #[schema(example = 1061234567)]
    pub document_number: u64,

    #[schema(example = "Ana")]
    pub first_name: String,

    #[schema(example = "Lucia", nullable = true)]
    pub middle_name: Option<String>,

    #[schema(example = "Perez")]
    pub last_name: String,

    #[schema(nullable = true)]
    pub second_last_name: Option<String>,

    #[schema(example = "Enfermera")]
    pub role_title: String,

    #[schema(example = true)]
    pub active: bool,
}

impl Employee {
    /// Full name with empty parts skipped, uppercased for the kiosk display.
    pub fn display_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
            self.second_last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
    }
}
