use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::adapters::DatabaseAdapter;
use crate::config::HubConfig;
use crate::error::{HubError, HubResult};
use crate::types::{CreateSession, HubRequest, Session, User};

/// Session manager handles session creation, validation, and cleanup
pub struct SessionManager<DB: DatabaseAdapter> {
    config: Arc<HubConfig>,
    database: Arc<DB>,
}

impl<DB: DatabaseAdapter> SessionManager<DB> {
    pub fn new(config: Arc<HubConfig>, database: Arc<DB>) -> Self {
        Self { config, database }
    }

    pub async fn create_session(&self, user: &User) -> HubResult<Session> {
        let expires_at = Utc::now() + self.config.session.expires_in;
        self.database
            .create_session(CreateSession {
                user_id: user.id.clone(),
                expires_at,
            })
            .await
    }

    /// Look up a live session. Expired sessions are deleted and read as
    /// missing; live ones are extended when `update_age` is set.
    pub async fn get_session(&self, token: &str) -> HubResult<Option<Session>> {
        let Some(mut session) = self.database.get_session(token).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.expires_at < now {
            self.database.delete_session(token).await?;
            return Ok(None);
        }

        if self.config.session.update_age {
            let new_expires_at = now + self.config.session.expires_in;
            self.database
                .update_session_expiry(token, new_expires_at)
                .await?;
            session.expires_at = new_expires_at;
        }

        Ok(Some(session))
    }

    /// Resolve the request's bearer token to a session and its user.
    pub async fn authenticate(&self, req: &HubRequest) -> HubResult<Option<(Session, User)>> {
        let Some(token) = extract_bearer_token(req) else {
            return Ok(None);
        };
        let Some(session) = self.get_session(token).await? else {
            return Ok(None);
        };

        match self.database.get_user_by_id(&session.user_id).await? {
            Some(user) => Ok(Some((session, user))),
            None => {
                self.database.delete_session(token).await?;
                Ok(None)
            }
        }
    }

    /// Like [`authenticate`](Self::authenticate) but fails with
    /// `Unauthenticated` when there is no live session.
    pub async fn require(&self, req: &HubRequest) -> HubResult<(Session, User)> {
        self.authenticate(req).await?.ok_or(HubError::Unauthenticated)
    }

    pub async fn delete_session(&self, token: &str) -> HubResult<()> {
        self.database.delete_session(token).await
    }

    pub async fn delete_user_sessions(&self, user_id: &str) -> HubResult<()> {
        self.database.delete_user_sessions(user_id).await
    }

    pub async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> HubResult<usize> {
        self.database.delete_expired_sessions(now).await
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(req: &HubRequest) -> Option<&str> {
    req.header("authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryDatabaseAdapter, SessionOps, UserOps};
    use crate::rbac::GlobalRole;
    use crate::types::{CreateUser, HttpMethod};
    use chrono::Duration;

    async fn setup() -> (SessionManager<MemoryDatabaseAdapter>, Arc<MemoryDatabaseAdapter>, User) {
        let db = Arc::new(MemoryDatabaseAdapter::new());
        let user = db
            .create_user(CreateUser {
                name: "Ravi".into(),
                email: "ravi@campus.edu".into(),
                password_hash: None,
                role: GlobalRole::Student,
            })
            .await
            .unwrap();
        let manager = SessionManager::new(Arc::new(HubConfig::default()), db.clone());
        (manager, db, user)
    }

    fn bearer(token: &str) -> HubRequest {
        let mut req = HubRequest::new(HttpMethod::Get, "/me");
        req.headers
            .insert("authorization".into(), format!("Bearer {}", token));
        req
    }

    #[tokio::test]
    async fn test_authenticate_with_bearer_token() {
        let (manager, _, user) = setup().await;
        let session = manager.create_session(&user).await.unwrap();
        assert!(session.token.starts_with("session_"));

        let (found, found_user) = manager.require(&bearer(&session.token)).await.unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found_user.id, user.id);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_token() {
        let (manager, _, _) = setup().await;
        let err = manager
            .require(&HubRequest::new(HttpMethod::Get, "/me"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(manager.authenticate(&bearer("session_nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let (manager, db, user) = setup().await;
        let session = db
            .create_session(CreateSession {
                user_id: user.id.clone(),
                expires_at: Utc::now() - Duration::seconds(5),
            })
            .await
            .unwrap();

        assert!(manager.get_session(&session.token).await.unwrap().is_none());
        assert!(db.get_session(&session.token).await.unwrap().is_none());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&bearer("abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&bearer("")), None);
        let mut basic = HubRequest::new(HttpMethod::Get, "/me");
        basic
            .headers
            .insert("authorization".into(), "Basic Zm9v".into());
        assert_eq!(extract_bearer_token(&basic), None);
    }
}
