use sqlx::PgPool;
use uuid::Uuid;

use super::model::{EmailTaken, NewUser, ProfileUpdate, User};

const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "id, name, email, password_hash, dietary_preferences, allergies, \
     pantry_items, calorie_target, created_at, updated_at";

/// Find a user by id.
pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Find a user by (lowercased) email.
pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Fails with [`EmailTaken`] when the email is already registered.
pub async fn create(db: &PgPool, new: &NewUser) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hash, dietary_preferences, allergies,
                           pantry_items, calorie_target)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.dietary_preferences)
    .bind(&new.allergies)
    .bind(&new.pantry_items)
    .bind(new.calorie_target)
    .fetch_one(db)
    .await
    .map_err(|e| {
        let taken = e
            .as_database_error()
            .and_then(|d| d.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION);
        if taken {
            anyhow::Error::new(EmailTaken)
        } else {
            anyhow::Error::new(e)
        }
    })?;
    Ok(user)
}

/// Applies the non-`None` fields of `update`. Returns `None` for an unknown id.
pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    update: &ProfileUpdate,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
           SET name                = COALESCE($2, name),
               dietary_preferences = COALESCE($3, dietary_preferences),
               allergies           = COALESCE($4, allergies),
               pantry_items        = COALESCE($5, pantry_items),
               calorie_target      = COALESCE($6, calorie_target),
               updated_at          = now()
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&update.name)
    .bind(&update.dietary_preferences)
    .bind(&update.allergies)
    .bind(&update.pantry_items)
    .bind(update.calorie_target)
    .fetch_optional(db)
    .await?;
    Ok(user)
}
