//! Signed-in admin session.
//!
//! A [`Session`] is created at the composition root (the CLI's `main`) and
//! handed to the client; nothing reads it from global state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::locale::Locale;
use crate::permissions::{Action, CapabilityMap, Module, ROLE_SUPER_ADMIN};
use crate::types::DbId;

/// Bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub permissions: CapabilityMap,
}

impl AdminProfile {
    pub fn is_super_admin(&self) -> bool {
        self.role == ROLE_SUPER_ADMIN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    token: Option<AuthToken>,
    #[serde(default)]
    locale: Locale,
    admin: Option<AdminProfile>,
}

impl Session {
    /// Anonymous session in `locale`.
    pub fn anonymous(locale: Locale) -> Self {
        Self {
            token: None,
            locale,
            admin: None,
        }
    }

    pub fn login(&mut self, token: AuthToken, admin: AdminProfile) {
        self.token = Some(token);
        self.admin = Some(admin);
    }

    /// Drop credentials; the locale survives logout.
    pub fn logout(&mut self) {
        self.token = None;
        self.admin = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn admin(&self) -> Option<&AdminProfile> {
        self.admin.as_ref()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Replace the cached profile (e.g. after `GET /auth/me`).
    pub fn refresh_admin(&mut self, admin: AdminProfile) {
        self.admin = Some(admin);
    }

    pub fn require_auth(&self) -> Result<&AuthToken, CoreError> {
        self.token
            .as_ref()
            .ok_or_else(|| CoreError::Unauthorized("Please log in first".into()))
    }

    /// Authorize `action` on `module` for the signed-in admin.
    pub fn authorize(&self, module: Module, action: Action) -> Result<(), CoreError> {
        self.require_auth()?;
        match &self.admin {
            Some(admin) if admin.is_super_admin() => Ok(()),
            Some(admin) => admin.permissions.authorize(module, action),
            None => Err(CoreError::Unauthorized(
                "Session has no admin profile; log in again".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Capabilities;

    fn admin(role: &str) -> AdminProfile {
        let mut permissions = CapabilityMap::default();
        permissions.grant(
            Module::Cars,
            Capabilities {
                read: true,
                ..Capabilities::default()
            },
        );
        AdminProfile {
            id: 1,
            name: "Sara".into(),
            email: "sara@example.com".into(),
            role: role.into(),
            permissions,
        }
    }

    #[test]
    fn anonymous_session_is_rejected() {
        let session = Session::anonymous(Locale::Ar);
        assert!(matches!(session.require_auth(), Err(CoreError::Unauthorized(_))));
        assert!(session.authorize(Module::Cars, Action::Read).is_err());
    }

    #[test]
    fn admin_checks_go_through_capabilities() {
        let mut session = Session::anonymous(Locale::En);
        session.login(AuthToken::new("t"), admin("admin"));
        assert!(session.authorize(Module::Cars, Action::Read).is_ok());
        assert!(matches!(
            session.authorize(Module::Cars, Action::Delete),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn super_admin_passes_every_check() {
        let mut session = Session::anonymous(Locale::En);
        session.login(AuthToken::new("t"), admin(ROLE_SUPER_ADMIN));
        assert!(session.authorize(Module::Admins, Action::Delete).is_ok());
    }

    #[test]
    fn logout_keeps_locale() {
        let mut session = Session::anonymous(Locale::Ar);
        session.login(AuthToken::new("t"), admin("admin"));
        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.admin().is_none());
        assert_eq!(session.locale(), Locale::Ar);
    }

    #[test]
    fn token_debug_is_redacted() {
        assert_eq!(format!("{:?}", AuthToken::new("secret")), "AuthToken(***)");
    }
}
