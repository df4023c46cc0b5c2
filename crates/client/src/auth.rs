//! Login, logout and the current admin profile.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use dealerdash_core::session::{AdminProfile, AuthToken};

use crate::api::DashboardApi;
use crate::error::ClientResult;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `data` of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: AuthToken,
    pub admin: AdminProfile,
}

impl DashboardApi {
    /// Sign in and store the token and profile in the shared session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AdminProfile> {
        let builder = self
            .request(Method::POST, "/auth/login")
            .await
            .json(&LoginRequest { email, password });
        let LoginResponse { token, admin } = self.fetch_data(builder).await?;

        tracing::info!(admin_id = admin.id, role = %admin.role, "Admin logged in");
        self.session().write().await.login(token, admin.clone());
        self.cache().clear().await;
        Ok(admin)
    }

    /// Refresh the cached admin profile from `GET /auth/me`.
    pub async fn me(&self) -> ClientResult<AdminProfile> {
        self.session().read().await.require_auth()?;
        let builder = self.request(Method::GET, "/auth/me").await;
        let admin: AdminProfile = self.fetch_data(builder).await?;
        self.session().write().await.refresh_admin(admin.clone());
        Ok(admin)
    }

    /// Forget credentials locally. The backend keeps no server-side session.
    pub async fn logout(&self) {
        self.session().write().await.logout();
        self.cache().clear().await;
        tracing::info!("Admin logged out");
    }
}
