use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Assigned shift. `exit_time < entry_time` means the shift ends the next day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Schedule {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "22:00:00", value_type = String)]
    pub entry_time: NaiveTime,
    #[schema(example = "06:00:00", value_type = String)]
    pub exit_time: NaiveTime,
}

impl Schedule {
    pub fn crosses_midnight(&self) -> bool {
        self.exit_time < self.entry_time
    }
}
