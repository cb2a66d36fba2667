// src/utils/seed.rs

use crate::{
    config::Config,
    error::AppError,
    models::user::{AccountStatus, NewUser, Role},
    store::Store,
    utils::hash::hash_password,
};

/// Creates the configured admin account if it does not exist yet.
/// Returns `true` when a new account was created.
pub async fn seed_admin_user(store: &dyn Store, config: &Config) -> Result<bool, AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(false);
    };

    if store.find_user_by_email(email).await?.is_some() {
        return Ok(false);
    }

    tracing::info!("Seeding admin user: {}", email);
    store
        .create_user(NewUser {
            email: email.trim().to_lowercase(),
            full_name: "Administrator".to_string(),
            password_hash: hash_password(password)?,
            role: Role::Admin,
            status: AccountStatus::Approved,
        })
        .await?;
    tracing::info!("Admin user created successfully.");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn seeds_once_and_only_when_configured() {
        let store = MemoryStore::new();
        let mut config = Config::new("postgres://unused", "secret");
        assert!(!seed_admin_user(&store, &config).await.unwrap());

        config.admin_email = Some("Admin@Example.com".to_string());
        config.admin_password = Some("changeme".to_string());
        assert!(seed_admin_user(&store, &config).await.unwrap());
        assert!(!seed_admin_user(&store, &config).await.unwrap());

        let admin = store.find_user_by_email("admin@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.status, AccountStatus::Approved);
    }
}
