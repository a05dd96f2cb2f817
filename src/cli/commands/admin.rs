use anyhow::{bail, Context};

use crate::auth::password::{BcryptHasher, PasswordHasher};
use crate::config::config;
use crate::database::{admins, DatabaseManager};

/// `userdesk hash-password` - prints a hash suitable for pasting into the
/// admins table by hand.
pub fn hash_password(password: &str) -> anyhow::Result<()> {
    if password.len() < 6 {
        bail!("password must be at least 6 characters");
    }
    let hasher = BcryptHasher::new(config().security.bcrypt_cost);
    let hashed = hasher.hash(password).context("hashing failed")?;
    println!("{hashed}");
    Ok(())
}

/// `userdesk seed-admin` - creates the schema if needed and inserts an admin
/// row. Refuses to overwrite an existing account with the same email.
pub async fn seed_admin(email: &str, password: &str, name: &str, role: &str) -> anyhow::Result<()> {
    if password.len() < 6 {
        bail!("password must be at least 6 characters");
    }

    let pool = DatabaseManager::connect().await?;
    DatabaseManager::init_schema(&pool).await?;

    if admins::find_active_by_email(&pool, email).await?.is_some() {
        bail!("an admin with email '{email}' already exists");
    }

    let hasher = BcryptHasher::new(config().security.bcrypt_cost);
    let hashed = hasher.hash(password).context("hashing failed")?;
    let id = admins::insert(&pool, name, email, &hashed, role).await?;

    println!("created admin {id} ({email})");
    Ok(())
}
