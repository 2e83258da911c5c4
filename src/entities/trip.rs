use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "vehicle")]
pub enum Vehicle {
    #[sea_orm(string_value = "bus")]
    Bus,
    #[sea_orm(string_value = "flight")]
    Flight,
}

impl Vehicle {
    /// Sellable seats are fixed by vehicle type.
    pub fn capacity(&self) -> i32 {
        match self {
            Vehicle::Bus => 45,
            Vehicle::Flight => 189,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Bus" | "bus" => Some(Vehicle::Bus),
            "Flight" | "flight" => Some(Vehicle::Flight),
            _ => None,
        }
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vehicle::Bus => write!(f, "Bus"),
            Vehicle::Flight => write!(f, "Flight"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub vehicle: Vehicle,
    pub departure_at: DateTimeWithTimeZone,
    pub capacity: i32,
    pub available_seats: i32,
    pub price: f64,
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_capacities() {
        assert_eq!(Vehicle::Bus.capacity(), 45);
        assert_eq!(Vehicle::Flight.capacity(), 189);
    }

    #[test]
    fn test_vehicle_parse() {
        assert_eq!(Vehicle::parse("Bus"), Some(Vehicle::Bus));
        assert_eq!(Vehicle::parse("flight"), Some(Vehicle::Flight));
        assert_eq!(Vehicle::parse("Train"), None);
        assert_eq!(Vehicle::parse(""), None);
    }
}
