//! Persistence seam. Handlers hold an `Arc<dyn Store>`; production uses
//! [`PgStore`], tests use an in-memory implementation.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    meals::{
        model::{HistoryAction, MealHistoryEntry, MealPlan, NewHistoryEntry, NewMealPlan},
        repo as meals_repo,
    },
    users::{
        model::{NewUser, ProfileUpdate, User},
        repo as users_repo,
    },
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, new: NewUser) -> anyhow::Result<User>;
    async fn update_user(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<Option<User>>;

    /// Persists the plan together with its `created` history entry.
    async fn create_meal_plan(&self, plan: NewMealPlan, details: String)
        -> anyhow::Result<MealPlan>;
    async fn list_meal_plans(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<MealPlan>>;
    /// Removes the plan and appends its `deleted` history entry in one unit.
    /// `details` renders the entry text from the removed plan.
    async fn delete_meal_plan(
        &self,
        id: Uuid,
        details: for<'m> fn(&'m MealPlan) -> String,
    ) -> anyhow::Result<Option<MealPlan>>;

    async fn append_history(&self, entry: NewHistoryEntry) -> anyhow::Result<Uuid>;
    async fn list_history(&self, user_id: Uuid, limit: i64)
        -> anyhow::Result<Vec<MealHistoryEntry>>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        users_repo::find_by_id(&self.db, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        users_repo::find_by_email(&self.db, email).await
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<User> {
        users_repo::create(&self.db, &new).await
    }

    async fn update_user(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<Option<User>> {
        users_repo::update_profile(&self.db, id, &update).await
    }

    async fn create_meal_plan(
        &self,
        plan: NewMealPlan,
        details: String,
    ) -> anyhow::Result<MealPlan> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let saved = meals_repo::insert_plan_tx(&mut tx, &plan).await?;
        let entry = NewHistoryEntry {
            user_id: saved.user_id,
            meal_plan_id: Some(saved.id),
            action: HistoryAction::Created,
            details,
        };
        meals_repo::insert_history_tx(&mut tx, &entry).await?;
        tx.commit().await.context("commit tx")?;
        Ok(saved)
    }

    async fn list_meal_plans(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<MealPlan>> {
        meals_repo::list_plans_by_user(&self.db, user_id, limit).await
    }

    async fn delete_meal_plan(
        &self,
        id: Uuid,
        details: for<'m> fn(&'m MealPlan) -> String,
    ) -> anyhow::Result<Option<MealPlan>> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let Some(removed) = meals_repo::delete_plan_tx(&mut tx, id).await? else {
            return Ok(None);
        };
        let entry = NewHistoryEntry {
            user_id: removed.user_id,
            meal_plan_id: None,
            action: HistoryAction::Deleted,
            details: details(&removed),
        };
        meals_repo::insert_history_tx(&mut tx, &entry).await?;
        tx.commit().await.context("commit tx")?;
        Ok(Some(removed))
    }

    async fn append_history(&self, entry: NewHistoryEntry) -> anyhow::Result<Uuid> {
        meals_repo::insert_history(&self.db, &entry).await
    }

    async fn list_history(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<MealHistoryEntry>> {
        meals_repo::list_history_by_user(&self.db, user_id, limit).await
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::meals::model::PlanSummary;
    use crate::users::model::EmailTaken;

    #[derive(Debug, Clone)]
    struct StoredHistory {
        id: Uuid,
        user_id: Uuid,
        meal_plan_id: Option<Uuid>,
        action: HistoryAction,
        details: String,
        date: OffsetDateTime,
    }

    #[derive(Default)]
    struct Tables {
        users: Vec<User>,
        plans: Vec<MealPlan>,
        history: Vec<StoredHistory>,
        // Strictly increasing timestamps keep ordering deterministic in tests.
        ticks: i64,
    }

    impl Tables {
        fn now(&mut self) -> OffsetDateTime {
            self.ticks += 1;
            OffsetDateTime::UNIX_EPOCH + Duration::days(20_000) + Duration::seconds(self.ticks)
        }

        fn push_history(&mut self, entry: NewHistoryEntry) -> anyhow::Result<Uuid> {
            anyhow::ensure!(
                self.users.iter().any(|u| u.id == entry.user_id),
                "history entry references unknown user {}",
                entry.user_id
            );
            let id = Uuid::new_v4();
            let date = self.now();
            self.history.push(StoredHistory {
                id,
                user_id: entry.user_id,
                meal_plan_id: entry.meal_plan_id,
                action: entry.action,
                details: entry.details,
                date,
            });
            Ok(id)
        }
    }

    /// Store backed by vectors behind a mutex; mirrors the Postgres semantics
    /// the handlers rely on (ordering, limits, user FK on history).
    #[derive(Default)]
    pub struct MemoryStore {
        tables: Mutex<Tables>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn history_len(&self) -> usize {
            self.tables.lock().unwrap().history.len()
        }

        pub fn plan_count(&self) -> usize {
            self.tables.lock().unwrap().plans.len()
        }

        /// Stored plan links of every history row, in insertion order.
        pub fn history_links(&self) -> Vec<Option<Uuid>> {
            let t = self.tables.lock().unwrap();
            t.history.iter().map(|h| h.meal_plan_id).collect()
        }
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
            let t = self.tables.lock().unwrap();
            Ok(t.users.iter().find(|u| u.id == id).cloned())
        }

        async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            let t = self.tables.lock().unwrap();
            Ok(t.users.iter().find(|u| u.email == email).cloned())
        }

        async fn create_user(&self, new: NewUser) -> anyhow::Result<User> {
            let mut t = self.tables.lock().unwrap();
            if t.users.iter().any(|u| u.email == new.email) {
                return Err(EmailTaken.into());
            }
            let now = t.now();
            let user = User {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email,
                password_hash: new.password_hash,
                dietary_preferences: new.dietary_preferences,
                allergies: new.allergies,
                pantry_items: new.pantry_items,
                calorie_target: new.calorie_target,
                created_at: now,
                updated_at: now,
            };
            t.users.push(user.clone());
            Ok(user)
        }

        async fn update_user(
            &self,
            id: Uuid,
            update: ProfileUpdate,
        ) -> anyhow::Result<Option<User>> {
            let mut t = self.tables.lock().unwrap();
            let now = t.now();
            Ok(t.users.iter_mut().find(|u| u.id == id).map(|u| {
                update.apply_to(u);
                u.updated_at = now;
                u.clone()
            }))
        }

        async fn create_meal_plan(
            &self,
            plan: NewMealPlan,
            details: String,
        ) -> anyhow::Result<MealPlan> {
            let mut t = self.tables.lock().unwrap();
            anyhow::ensure!(
                t.users.iter().any(|u| u.id == plan.user_id),
                "meal plan references unknown user {}",
                plan.user_id
            );
            let generated_for = t.now();
            let saved = MealPlan {
                id: Uuid::new_v4(),
                user_id: plan.user_id,
                meals: plan.meals,
                preferences: plan.preferences,
                pantry_items: plan.pantry_items,
                total_calories: plan.total_calories,
                additional_instructions: plan.additional_instructions,
                generated_for,
            };
            t.plans.push(saved.clone());
            t.push_history(NewHistoryEntry {
                user_id: saved.user_id,
                meal_plan_id: Some(saved.id),
                action: HistoryAction::Created,
                details,
            })?;
            Ok(saved)
        }

        async fn list_meal_plans(
            &self,
            user_id: Uuid,
            limit: i64,
        ) -> anyhow::Result<Vec<MealPlan>> {
            let t = self.tables.lock().unwrap();
            let mut plans: Vec<MealPlan> = t
                .plans
                .iter()
                .filter(|p| p.user_id == user_id)
                .cloned()
                .collect();
            plans.sort_by(|a, b| b.generated_for.cmp(&a.generated_for));
            plans.truncate(limit.max(0) as usize);
            Ok(plans)
        }

        async fn delete_meal_plan(
            &self,
            id: Uuid,
            details: for<'m> fn(&'m MealPlan) -> String,
        ) -> anyhow::Result<Option<MealPlan>> {
            let mut t = self.tables.lock().unwrap();
            let Some(pos) = t.plans.iter().position(|p| p.id == id) else {
                return Ok(None);
            };
            // Entry first: a failed insert leaves the plan in place.
            let entry = NewHistoryEntry {
                user_id: t.plans[pos].user_id,
                meal_plan_id: None,
                action: HistoryAction::Deleted,
                details: details(&t.plans[pos]),
            };
            t.push_history(entry)?;
            Ok(Some(t.plans.remove(pos)))
        }

        async fn append_history(&self, entry: NewHistoryEntry) -> anyhow::Result<Uuid> {
            self.tables.lock().unwrap().push_history(entry)
        }

        async fn list_history(
            &self,
            user_id: Uuid,
            limit: i64,
        ) -> anyhow::Result<Vec<MealHistoryEntry>> {
            let t = self.tables.lock().unwrap();
            let mut entries: Vec<MealHistoryEntry> = t
                .history
                .iter()
                .filter(|h| h.user_id == user_id)
                .map(|h| MealHistoryEntry {
                    id: h.id,
                    user_id: h.user_id,
                    meal_plan: h.meal_plan_id.and_then(|pid| {
                        t.plans.iter().find(|p| p.id == pid).map(|p| PlanSummary {
                            id: p.id,
                            generated_for: p.generated_for,
                            total_calories: p.total_calories,
                        })
                    }),
                    action: h.action,
                    details: h.details.clone(),
                    date: h.date,
                })
                .collect();
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            entries.truncate(limit.max(0) as usize);
            Ok(entries)
        }
    }
}
