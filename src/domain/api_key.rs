use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "0000")]
    Basic,
    #[serde(rename = "1111")]
    Partner,
    #[serde(rename = "2222")]
    Internal,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "0000",
            Self::Partner => "1111",
            Self::Internal => "2222",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "0000" => Some(Self::Basic),
            "1111" => Some(Self::Partner),
            "2222" => Some(Self::Internal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub key: String,
    pub active: bool,
    pub permissions: Vec<Permission>,
}

impl ApiKey {
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        self.active && self.permissions.contains(&permission)
    }
}
