use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_PREP_TIME: i32 = 30;

/// One generated meal, stored inside its plan's JSONB `meals` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub prep_time: i32,
    pub meal_type: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meals: Vec<Meal>,
    pub preferences: Vec<String>,
    pub pantry_items: Vec<String>,
    pub total_calories: i32,
    pub additional_instructions: String,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_for: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub(crate) struct MealPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meals: sqlx::types::Json<Vec<Meal>>,
    pub preferences: Vec<String>,
    pub pantry_items: Vec<String>,
    pub total_calories: i32,
    pub additional_instructions: String,
    pub generated_for: OffsetDateTime,
}

impl From<MealPlanRow> for MealPlan {
    fn from(r: MealPlanRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            meals: r.meals.0,
            preferences: r.preferences,
            pantry_items: r.pantry_items,
            total_calories: r.total_calories,
            additional_instructions: r.additional_instructions,
            generated_for: r.generated_for,
        }
    }
}

/// Plan contents ready to persist. `total_calories` is fixed here and never
/// recomputed afterwards.
#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub user_id: Uuid,
    pub meals: Vec<Meal>,
    pub preferences: Vec<String>,
    pub pantry_items: Vec<String>,
    pub total_calories: i32,
    pub additional_instructions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "history_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Created,
    Viewed,
    Deleted,
}

/// Linked plan as shown in a history listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_for: OffsetDateTime,
    pub total_calories: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_plan: Option<PlanSummary>,
    pub action: HistoryAction,
    pub details: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub(crate) struct HistoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_plan_id: Option<Uuid>,
    pub plan_generated_for: Option<OffsetDateTime>,
    pub plan_total_calories: Option<i32>,
    pub action: HistoryAction,
    pub details: String,
    pub date: OffsetDateTime,
}

impl From<HistoryRow> for MealHistoryEntry {
    fn from(r: HistoryRow) -> Self {
        let meal_plan = match (r.meal_plan_id, r.plan_generated_for, r.plan_total_calories) {
            (Some(id), Some(generated_for), Some(total_calories)) => Some(PlanSummary {
                id,
                generated_for,
                total_calories,
            }),
            _ => None,
        };
        Self {
            id: r.id,
            user_id: r.user_id,
            meal_plan,
            action: r.action,
            details: r.details,
            date: r.date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub user_id: Uuid,
    pub meal_plan_id: Option<Uuid>,
    pub action: HistoryAction,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_row_without_plan_has_no_summary() {
        let row = HistoryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            meal_plan_id: None,
            plan_generated_for: None,
            plan_total_calories: None,
            action: HistoryAction::Viewed,
            details: "Viewed meal plan history".into(),
            date: OffsetDateTime::now_utc(),
        };
        let entry = MealHistoryEntry::from(row);
        assert!(entry.meal_plan.is_none());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "viewed");
        assert!(json["mealPlan"].is_null());
    }

    #[test]
    fn meal_serializes_camel_case() {
        let meal = Meal {
            name: "Oats".into(),
            ingredients: vec!["oats".into()],
            instructions: "Boil".into(),
            prep_time: 10,
            meal_type: "breakfast".into(),
            calories: 350,
            protein: 12.0,
            carbs: 50.0,
            fat: 7.5,
        };
        let json = serde_json::to_value(&meal).unwrap();
        assert_eq!(json["prepTime"], 10);
        assert_eq!(json["mealType"], "breakfast");
        let back: Meal = serde_json::from_value(json).unwrap();
        assert_eq!(back, meal);
    }
}
