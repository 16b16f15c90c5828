use crate::ids::BuildingID;

/// A building served by a fleet of elevators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Building {
    pub id: BuildingID,
    pub name: String,
    pub number_of_floors: i32,
}

impl Building {
    pub fn new(name: impl Into<String>, number_of_floors: i32) -> Self {
        Self {
            id: BuildingID::new(),
            name: name.into(),
            number_of_floors,
        }
    }

    /// Floors are numbered `1..=number_of_floors`.
    pub fn contains_floor(&self, floor: i32) -> bool {
        (1..=self.number_of_floors).contains(&floor)
    }
}
