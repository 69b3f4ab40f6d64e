use crate::{
    auth::{hash_password, verify_password},
    entities::{user, User},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Account service: registration, credential verification, and profile
/// maintenance.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Registers a new account. Fails when the username or email is
    /// already taken; only the salted hash of the password is stored.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        if User::find()
            .filter(user::Column::Username.eq(&input.username))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict("Username already exists".to_string()));
        }

        if User::find()
            .filter(user::Column::Email.eq(&input.email))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict("Email already exists".to_string()));
        }

        let user_id = Uuid::new_v4();
        let account = user::ActiveModel {
            id: Set(user_id),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(hash_password(&input.password)?),
            full_name: Set(input.full_name),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(Utc::now()),
        };

        let account = account.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserRegistered(user_id))
            .await;

        info!("Registered user: {}", user_id);
        Ok(account)
    }

    /// Verifies login credentials. The failure message never reveals
    /// whether the username exists.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let account = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?;

        match account {
            Some(account) if verify_password(password, &account.password_hash) => Ok(account),
            _ => Err(ServiceError::AuthError(
                "Invalid username or password".to_string(),
            )),
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    /// Applies a partial profile update. An email change is rejected
    /// when the address belongs to a different account.
    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<user::Model, ServiceError> {
        let account = self.get_user(user_id).await?;

        if let Some(ref email) = input.email {
            let existing = User::find()
                .filter(user::Column::Email.eq(email))
                .filter(user::Column::Id.ne(user_id))
                .one(&*self.db)
                .await?;
            if existing.is_some() {
                return Err(ServiceError::Conflict("Email already in use".to_string()));
            }
        }

        let mut active: user::ActiveModel = account.into();
        if let Some(full_name) = input.full_name {
            active.full_name = Set(Some(full_name));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProfileUpdated(user_id))
            .await;

        Ok(updated)
    }
}

/// Input for account registration
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for profile updates
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

/// Public projection of an account, safe to serialize to clients
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            address: user.address,
        }
    }
}
