use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub licence_plate: Masked<String>,
    pub make: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarEntry {
    #[serde(skip)]
    pub id: i64,
    pub uuid: Uuid,
    #[serde(skip)]
    pub owner_id: i64,
    pub car: Car,
}

impl CarEntry {
    pub fn car(&self) -> &Car {
        &self.car
    }
}
