use serde::{Deserialize, Serialize};

/// Platform role resolved by the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Driver,
    Owner,
    Admin,
}

/// Already-authenticated caller identity supplied by the transport layer.
/// The ledger trusts this input completely and never re-derives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        assert!(Caller::new("550e8400-e29b-41d4-a716-446655440000", Role::Admin).is_admin());
        assert!(!Caller::new("550e8400-e29b-41d4-a716-446655440000", Role::Driver).is_admin());
        assert!(!Caller::new("550e8400-e29b-41d4-a716-446655440000", Role::Owner).is_admin());
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Driver).unwrap(), "\"driver\"");
    }
}
