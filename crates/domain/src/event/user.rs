//! User snapshot used for eligibility and fee checks.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{EventError, Generation, Role, UserId};

/// A user as supplied by the user directory.
///
/// Events never own or mutate users; they only read roles and generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    roles: BTreeSet<Role>,
    generation: Generation,
}

impl User {
    /// Creates a user, rejecting a blank name or an empty role set.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
        generation: Generation,
    ) -> Result<Self, EventError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(EventError::validation("user name cannot be empty"));
        }

        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(EventError::validation("user must have at least one role"));
        }

        Ok(Self {
            id,
            name,
            roles,
            generation,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if the user holds at least one of `roles`.
    pub fn has_any_role<'a>(&self, roles: impl IntoIterator<Item = &'a Role>) -> bool {
        roles.into_iter().any(|role| self.has_role(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn role(name: &str) -> Role {
        Role::new(name).unwrap()
    }

    #[test]
    fn test_new_user_validates_name_and_roles() {
        let id = UserId::from_uuid(Uuid::from_u128(7));
        let generation = Generation::new("2024").unwrap();

        assert!(matches!(
            User::new(id, "  ", [role("member")], generation.clone()),
            Err(EventError::Validation(_))
        ));
        assert!(matches!(
            User::new(id, "Aoi", Vec::new(), generation.clone()),
            Err(EventError::Validation(_))
        ));

        let user = User::new(id, " Aoi ", [role("member")], generation).unwrap();
        assert_eq!(user.name(), "Aoi");
        assert_eq!(user.id(), id);
    }

    #[test]
    fn test_role_checks() {
        let user = User::new(
            UserId::from_uuid(Uuid::from_u128(1)),
            "Ren",
            [role("member"), role("staff")],
            Generation::new("2023").unwrap(),
        )
        .unwrap();

        assert!(user.has_role(&role("staff")));
        assert!(!user.has_role(&role("alumni")));
        assert!(user.has_any_role(&[role("alumni"), role("member")]));
        assert!(!user.has_any_role(&[role("alumni")]));
        assert!(!user.has_any_role(&Vec::<Role>::new()));
    }
}
