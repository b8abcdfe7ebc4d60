// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserStore,
    models::auth::{AuthResponse, Claims, NewUser, SignupPayload, User},
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    expiration_hours: i64,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: String, expiration_hours: i64, hash_cost: u32) -> Self {
        Self {
            users,
            jwt_secret,
            expiration_hours,
            hash_cost,
        }
    }

    pub async fn signup(&self, payload: SignupPayload) -> Result<AuthResponse, AppError> {
        // Checagem antecipada para não gastar um hash à toa
        if self.users.find_by_email(&payload.email).await?.is_some() {
            return Err(AppError::conflict("User with this email already exists"));
        }

        let password = payload.password;
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // O repositório cria o perfil (doctor/customer) na mesma transação
        let user = self
            .users
            .create(NewUser {
                email: payload.email,
                password_hash,
                name: payload.name,
                role: payload.role,
                phone: payload.phone,
            })
            .await?;

        tracing::info!("👤 Novo usuário {} ({})", user.email, user.role.as_str());

        self.auth_response(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self.authenticate(email, password).await?;
        self.auth_response(&user)
    }

    /// Verifica credenciais e conta ativa.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        if !user.is_active {
            return Err(AppError::unauthorized("User account is inactive"));
        }

        Ok(user)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::unauthorized("Invalid token"))?;

        let user = self
            .users
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

        if !user.is_active {
            return Err(AppError::unauthorized("Invalid token"));
        }

        Ok(user)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.expiration_hours);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    fn auth_response(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            token: self.create_token(user)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, models::auth::Role};

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), "test-secret".into(), 1, 4)
    }

    fn signup(email: &str) -> SignupPayload {
        SignupPayload {
            email: email.to_string(),
            password: "password123".to_string(),
            name: "Dr. Sarah Johnson".to_string(),
            role: Role::Therapist,
            phone: None,
        }
    }

    #[tokio::test]
    async fn signup_then_login_issues_valid_tokens() {
        let auth = service();
        let created = auth.signup(signup("sarah@clinic.test")).await.unwrap();
        assert_eq!(created.role, Role::Therapist);

        let logged = auth.login("sarah@clinic.test", "password123").await.unwrap();
        let user = auth.validate_token(&logged.token).await.unwrap();
        assert_eq!(user.id, created.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_unauthorized() {
        let auth = service();
        auth.signup(signup("sarah@clinic.test")).await.unwrap();

        let wrong = auth.login("sarah@clinic.test", "nope-nope").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let unknown = auth.login("ghost@clinic.test", "password123").await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let auth = service();
        auth.signup(signup("sarah@clinic.test")).await.unwrap();
        let again = auth.signup(signup("sarah@clinic.test")).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let result = service().validate_token("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
