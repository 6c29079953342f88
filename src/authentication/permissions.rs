use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnLists,
            ActionType::ManageSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnLists,
            ActionType::ManageSubscriptions,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnLists,
    ManageSubscriptions,

    ManageTags,
    ManageIngredients,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        ACTION_TABLE
            .iter()
            .find(|(role, _)| *role == session.role)
            .map(|(_, actions)| actions.contains(&self))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("cook"),
            role,
        }
    }

    #[test]
    fn users_manage_their_own_content() {
        let user = session(UserRole::User);

        assert!(ActionType::CreateRecipes.authenticate(&user));
        assert!(ActionType::ManageOwnLists.authenticate(&user));
        assert!(!ActionType::ManageTags.authenticate(&user));
        assert!(!ActionType::ManageIngredients.authenticate(&user));
    }

    #[test]
    fn admins_manage_catalogues() {
        let admin = session(UserRole::Admin);

        assert!(ActionType::ManageTags.authenticate(&admin));
        assert!(ActionType::ManageIngredients.authenticate(&admin));
        assert!(ActionType::CreateRecipes.authenticate(&admin));
    }
}
