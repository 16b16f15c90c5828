use uuid::Uuid;

/// Strongly typed ID for elevators
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ElevatorID(pub Uuid);

impl Default for ElevatorID {
    fn default() -> Self {
        Self::new()
    }
}

impl ElevatorID {
    pub fn new() -> Self {
        ElevatorID(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for ElevatorID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ElevatorID {
    fn from(id: Uuid) -> Self {
        ElevatorID(id)
    }
}

impl std::fmt::Display for ElevatorID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed ID for buildings
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BuildingID(pub Uuid);

impl Default for BuildingID {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildingID {
    pub fn new() -> Self {
        BuildingID(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for BuildingID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for BuildingID {
    fn from(id: Uuid) -> Self {
        BuildingID(id)
    }
}

impl std::str::FromStr for BuildingID {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(BuildingID)
    }
}

impl std::fmt::Display for BuildingID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
