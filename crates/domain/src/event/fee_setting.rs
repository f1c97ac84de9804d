//! Role and generation scoped pricing rules.

use serde::{Deserialize, Serialize};

use super::{Generation, Money, Role, User};

/// A pricing rule: users holding `applicable_role` pay `fee`.
///
/// When `applicable_generation` is set the rule only applies to users of that
/// generation, and it wins over a role-only rule for the same role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSetting {
    applicable_role: Role,
    applicable_generation: Option<Generation>,
    fee: Money,
}

impl FeeSetting {
    /// A rule for every user holding `role`.
    pub fn for_role(role: Role, fee: Money) -> Self {
        Self {
            applicable_role: role,
            applicable_generation: None,
            fee,
        }
    }

    /// A rule for users holding `role` in a specific generation.
    pub fn for_generation(role: Role, generation: Generation, fee: Money) -> Self {
        Self {
            applicable_role: role,
            applicable_generation: Some(generation),
            fee,
        }
    }

    pub fn applicable_role(&self) -> &Role {
        &self.applicable_role
    }

    pub fn applicable_generation(&self) -> Option<&Generation> {
        self.applicable_generation.as_ref()
    }

    pub fn fee(&self) -> &Money {
        &self.fee
    }

    pub fn is_generation_specific(&self) -> bool {
        self.applicable_generation.is_some()
    }

    /// Returns true if the rule covers the user's role and, when scoped, generation.
    pub fn is_applicable_to(&self, user: &User) -> bool {
        if !user.has_role(&self.applicable_role) {
            return false;
        }
        match &self.applicable_generation {
            Some(generation) => generation == user.generation(),
            None => true,
        }
    }
}

impl std::fmt::Display for FeeSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.applicable_generation {
            Some(generation) => write!(
                f,
                "{} ({}): {}",
                self.applicable_role,
                generation,
                self.fee.format_jpy()
            ),
            None => write!(f, "{}: {}", self.applicable_role, self.fee.format_jpy()),
        }
    }
}

/// Picks the fee rule that applies to `user`.
///
/// The first matching generation-specific rule wins; otherwise the first
/// matching role-only rule. List order is authoritative.
pub fn resolve_fee<'a>(settings: &'a [FeeSetting], user: &User) -> Option<&'a FeeSetting> {
    settings
        .iter()
        .find(|setting| setting.is_generation_specific() && setting.is_applicable_to(user))
        .or_else(|| {
            settings
                .iter()
                .find(|setting| !setting.is_generation_specific() && setting.is_applicable_to(user))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::UserId;
    use uuid::Uuid;

    fn role(name: &str) -> Role {
        Role::new(name).unwrap()
    }

    fn generation(value: &str) -> Generation {
        Generation::new(value).unwrap()
    }

    fn user(roles: &[&str], gen_value: &str) -> User {
        User::new(
            UserId::from_uuid(Uuid::from_u128(1)),
            "Test User",
            roles.iter().map(|r| role(r)),
            generation(gen_value),
        )
        .unwrap()
    }

    fn settings() -> Vec<FeeSetting> {
        vec![
            FeeSetting::for_role(role("member"), Money::jpy(1000).unwrap()),
            FeeSetting::for_generation(
                role("member"),
                generation("2024"),
                Money::jpy(500).unwrap(),
            ),
        ]
    }

    #[test]
    fn test_generation_specific_rule_wins() {
        let settings = settings();
        let resolved = resolve_fee(&settings, &user(&["member"], "2024")).unwrap();
        assert_eq!(resolved.fee(), &Money::jpy(500).unwrap());
    }

    #[test]
    fn test_falls_back_to_role_only_rule() {
        let settings = settings();
        let resolved = resolve_fee(&settings, &user(&["member"], "2023")).unwrap();
        assert_eq!(resolved.fee(), &Money::jpy(1000).unwrap());
    }

    #[test]
    fn test_no_matching_role() {
        assert!(resolve_fee(&settings(), &user(&["staff"], "2024")).is_none());
        assert!(resolve_fee(&[], &user(&["member"], "2024")).is_none());
    }

    #[test]
    fn test_first_generation_specific_match_wins() {
        let settings = vec![
            FeeSetting::for_generation(role("member"), generation("2024"), Money::jpy(300).unwrap()),
            FeeSetting::for_generation(role("staff"), generation("2024"), Money::jpy(0).unwrap()),
        ];
        let resolved = resolve_fee(&settings, &user(&["member", "staff"], "2024")).unwrap();
        assert_eq!(resolved.fee().amount(), 300);
    }

    #[test]
    fn test_display() {
        let settings = settings();
        assert_eq!(settings[0].to_string(), "member: ¥1000");
        assert_eq!(settings[1].to_string(), "member (2024): ¥500");
    }
}
