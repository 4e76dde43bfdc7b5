use crate::sanitize::sanitize_email;
#[cfg(test)]
use mockall::automock;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Profile blob the login flow stored alongside the access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
}

/// Credentials as persisted by the runtime's store. Presence is the only
/// validity check; a stale token surfaces later as an authorization failure
/// on a backend call, reported as a generic connection error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub user_data: Option<UserProfile>,
}

/// Persistent key-value storage for session credentials.
#[cfg_attr(test, automock)]
pub trait CredentialStore {
    fn load(&self) -> Option<StoredCredentials>;
    fn save(&self, credentials: &StoredCredentials) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

/// Identity resolved from stored credentials for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub access_token: String,
    pub email: Option<String>,
    pub display_name: String,
    pub user_id: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum Bootstrap {
    /// No usable credentials: the runtime must navigate to the login page
    /// and perform no further initialization.
    RedirectToLogin,
    Ready(Identity),
}

/// Loads persisted credentials and resolves the session identity.
///
/// Display name preference: profile full name, then the stored user name,
/// then a generated guest name. The email is sanitized here so every
/// downstream use (feedback records in particular) sees the clean form.
pub fn bootstrap<S: CredentialStore + ?Sized>(store: &S) -> Bootstrap {
    let Some(credentials) = store.load() else {
        return Bootstrap::RedirectToLogin;
    };
    if credentials.access_token.is_empty() {
        return Bootstrap::RedirectToLogin;
    }

    let profile_name = credentials
        .user_data
        .as_ref()
        .and_then(|profile| profile.user_metadata.full_name.clone());
    let display_name = profile_name
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            credentials
                .user_name
                .clone()
                .filter(|name| !name.trim().is_empty())
        })
        .unwrap_or_else(guest_name);

    Bootstrap::Ready(Identity {
        access_token: credentials.access_token,
        email: credentials
            .user_email
            .as_deref()
            .map(sanitize_email)
            .filter(|email| !email.is_empty()),
        display_name,
        user_id: credentials.user_data.and_then(|profile| profile.user_id),
    })
}

/// Clears stored credentials. The caller follows with a navigation to the
/// login page.
pub fn sign_out<S: CredentialStore + ?Sized>(store: &S) -> anyhow::Result<()> {
    store.clear()
}

/// Placeholder name for sessions without any stored user name.
pub fn guest_name() -> String {
    format!("user{}", rand::rng().random_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(access_token: &str) -> StoredCredentials {
        StoredCredentials {
            access_token: access_token.to_string(),
            user_email: Some("Sam@Example.com".to_string()),
            user_name: Some("sam".to_string()),
            user_data: None,
        }
    }

    #[test]
    fn empty_store_redirects_to_login() {
        let mut store = MockCredentialStore::new();
        store.expect_load().returning(|| None);
        assert_eq!(bootstrap(&store), Bootstrap::RedirectToLogin);
    }

    #[test]
    fn blank_token_redirects_to_login() {
        let mut store = MockCredentialStore::new();
        store.expect_load().return_const(Some(stored("")));
        assert_eq!(bootstrap(&store), Bootstrap::RedirectToLogin);
    }

    #[test]
    fn profile_full_name_wins_over_stored_user_name() {
        let mut credentials = stored("tok-1");
        credentials.user_data = Some(UserProfile {
            user_id: Some("u-7".to_string()),
            user_metadata: UserMetadata {
                full_name: Some("Sam Smith".to_string()),
            },
        });
        let mut store = MockCredentialStore::new();
        store.expect_load().return_const(Some(credentials));

        let Bootstrap::Ready(identity) = bootstrap(&store) else {
            panic!("expected Ready");
        };
        assert_eq!(identity.display_name, "Sam Smith");
        assert_eq!(identity.user_id.as_deref(), Some("u-7"));
        assert_eq!(identity.email.as_deref(), Some("sam@example.com"));
    }

    #[test]
    fn missing_names_fall_back_to_a_guest_name() {
        let mut credentials = stored("tok-1");
        credentials.user_name = None;
        credentials.user_email = None;
        let mut store = MockCredentialStore::new();
        store.expect_load().return_const(Some(credentials));

        let Bootstrap::Ready(identity) = bootstrap(&store) else {
            panic!("expected Ready");
        };
        assert!(identity.display_name.starts_with("user"));
        assert_eq!(identity.email, None);
    }
}
