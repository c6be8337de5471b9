use crate::app::state::AppState;
use crate::domain::model::{AuthUser, Role, User};
use crate::utils::error::{FoodError, Result};
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

/// 已驗證的呼叫者；缺少或無效的 bearer token 一律 401
#[derive(Debug, Clone)]
pub struct Caller(pub AuthUser);

impl Caller {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// 路徑中的使用者必須是呼叫者本人
    pub fn require_self(&self, user_id: &str) -> Result<()> {
        if self.id() != user_id {
            tracing::warn!(
                "🚫 User {} attempted to access data of user {}",
                self.id(),
                user_id
            );
            return Err(FoodError::Forbidden(
                "You can only access your own data".to_string(),
            ));
        }
        Ok(())
    }

    /// 需要外送員角色；回傳呼叫者的使用者檔案
    pub async fn require_deliverer(&self, state: &AppState) -> Result<User> {
        match state.store.get_user(self.id()).await? {
            Some(user) if user.role == Role::Deliverer => Ok(user),
            _ => Err(FoodError::Forbidden("deliverer role required".to_string())),
        }
    }
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = FoodError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = bearer_token(parts) else {
            return Err(FoodError::Unauthorized);
        };

        match state.identity.resolve(token).await? {
            Some(user) => Ok(Caller(user)),
            None => Err(FoodError::Unauthorized),
        }
    }
}
