use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::model::{
    HistoryRow, MealHistoryEntry, MealPlan, MealPlanRow, NewHistoryEntry, NewMealPlan,
};

const PLAN_COLUMNS: &str = "id, user_id, meals, preferences, pantry_items, total_calories, \
     additional_instructions, generated_for";

pub async fn insert_plan_tx(
    tx: &mut Transaction<'_, Postgres>,
    plan: &NewMealPlan,
) -> anyhow::Result<MealPlan> {
    let row = sqlx::query_as::<_, MealPlanRow>(&format!(
        r#"
        INSERT INTO meal_plans (user_id, meals, preferences, pantry_items, total_calories,
                                additional_instructions)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(plan.user_id)
    .bind(sqlx::types::Json(&plan.meals))
    .bind(&plan.preferences)
    .bind(&plan.pantry_items)
    .bind(plan.total_calories)
    .bind(&plan.additional_instructions)
    .fetch_one(&mut **tx)
    .await
    .context("insert meal plan")?;
    Ok(row.into())
}

pub async fn insert_history_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewHistoryEntry,
) -> anyhow::Result<Uuid> {
    let (id,) = sqlx::query_as::<_, (Uuid,)>(
        r#"
        INSERT INTO meal_history (user_id, meal_plan_id, action, details)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.meal_plan_id)
    .bind(entry.action)
    .bind(&entry.details)
    .fetch_one(&mut **tx)
    .await
    .context("insert history entry")?;
    Ok(id)
}

pub async fn insert_history(db: &PgPool, entry: &NewHistoryEntry) -> anyhow::Result<Uuid> {
    let mut tx = db.begin().await.context("begin tx")?;
    let id = insert_history_tx(&mut tx, entry).await?;
    tx.commit().await.context("commit tx")?;
    Ok(id)
}

/// Newest plans first.
pub async fn list_plans_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<MealPlan>> {
    let rows = sqlx::query_as::<_, MealPlanRow>(&format!(
        r#"
        SELECT {PLAN_COLUMNS}
          FROM meal_plans
         WHERE user_id = $1
         ORDER BY generated_for DESC
         LIMIT $2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("list meal plans")?;
    Ok(rows.into_iter().map(MealPlan::from).collect())
}

pub async fn delete_plan_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<MealPlan>> {
    let row = sqlx::query_as::<_, MealPlanRow>(&format!(
        "DELETE FROM meal_plans WHERE id = $1 RETURNING {PLAN_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("delete meal plan")?;
    Ok(row.map(MealPlan::from))
}

/// Newest entries first, each joined with the summary of its linked plan.
pub async fn list_history_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<MealHistoryEntry>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT h.id, h.user_id, h.meal_plan_id,
               p.generated_for AS plan_generated_for,
               p.total_calories AS plan_total_calories,
               h.action, h.details, h.date
          FROM meal_history h
          LEFT JOIN meal_plans p ON p.id = h.meal_plan_id
         WHERE h.user_id = $1
         ORDER BY h.date DESC
         LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("list meal history")?;
    Ok(rows.into_iter().map(MealHistoryEntry::from).collect())
}
