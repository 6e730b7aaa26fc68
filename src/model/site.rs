use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Site {
    pub id: u64,
    pub location: Option<String>,
    pub city: Option<String>,
}
