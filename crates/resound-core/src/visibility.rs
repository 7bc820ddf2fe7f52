use crate::types::{AccountId, Collaborator, HubTerms};

/// Whether `actor` may add content to the hub.
///
/// Pure function of its inputs, evaluated freshly on every call: the actor must
/// be connected and either appear in the collaborator set with the
/// `can_add_content` grant or be the hub authority. No cached or partial state
/// is consulted.
pub fn can_add_content(
    actor: Option<&AccountId>,
    hub: &HubTerms,
    collaborators: &[Collaborator],
) -> bool {
    let Some(account) = actor else {
        return false;
    };
    let granted = collaborators
        .iter()
        .any(|c| c.account == *account && c.can_add_content);
    granted || *account == hub.authority
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> HubTerms {
        HubTerms::new("hub-a", "hub-a-handle", "authority-account")
    }

    fn collaborator(account: &str, can_add: bool) -> Collaborator {
        Collaborator {
            hub_id: "hub-a".into(),
            account: account.into(),
            can_add_content: can_add,
        }
    }

    #[test]
    fn disconnected_actor_cannot_add() {
        assert!(!can_add_content(
            None,
            &hub(),
            &[collaborator("someone", true)]
        ));
    }

    #[test]
    fn granted_collaborator_can_add() {
        let account: AccountId = "alice".into();
        assert!(can_add_content(
            Some(&account),
            &hub(),
            &[collaborator("alice", true)]
        ));
    }

    #[test]
    fn ungranted_collaborator_cannot_add() {
        let account: AccountId = "alice".into();
        assert!(!can_add_content(
            Some(&account),
            &hub(),
            &[collaborator("alice", false)]
        ));
    }

    #[test]
    fn authority_can_add_without_collaborator_entry() {
        let account: AccountId = "authority-account".into();
        assert!(can_add_content(Some(&account), &hub(), &[]));
    }

    #[test]
    fn unrelated_account_cannot_add() {
        let account: AccountId = "mallory".into();
        assert!(!can_add_content(
            Some(&account),
            &hub(),
            &[collaborator("alice", true)]
        ));
    }
}
