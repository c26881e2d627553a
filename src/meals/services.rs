use serde_json::Value;
use time::{macros::format_description, OffsetDateTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::model::{
    HistoryAction, Meal, MealHistoryEntry, MealPlan, NewHistoryEntry, NewMealPlan,
    DEFAULT_PREP_TIME,
};
use crate::{
    error::AppError,
    llm::{
        extract::{fallback_plan, parse_meal_plan},
        prompts::{meal_plan_messages, PlanContext},
        MEAL_PLAN_MAX_TOKENS,
    },
    state::AppState,
};

pub const PLAN_LIST_LIMIT: i64 = 5;
pub const HISTORY_LIST_LIMIT: i64 = 20;
/// Per-meal calorie ceiling applied to model output.
pub const MAX_MEAL_CALORIES: i32 = 100_000;

/// Reads a JSON number or a numeric string such as `"420"`.
fn number(v: Option<&Value>) -> Option<f64> {
    let n = match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn ingredients(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| text(Some(i)))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn meal_from_value(v: &Value) -> Option<Meal> {
    let name = text(v.get("name")).filter(|n| !n.is_empty())?;
    let instructions = match v.get("instructions") {
        Some(Value::Array(steps)) => steps
            .iter()
            .filter_map(|s| text(Some(s)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => text(other).unwrap_or_default(),
    };
    let prep_time = number(v.get("prepTime"))
        .map(|n| n.round() as i32)
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PREP_TIME);
    let meal_type = text(v.get("type"))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .unwrap_or_else(|| "meal".to_string());

    Some(Meal {
        name,
        ingredients: ingredients(v.get("ingredients")),
        instructions,
        prep_time,
        meal_type,
        calories: number(v.get("calories"))
            .map(|n| n.round().clamp(0.0, f64::from(MAX_MEAL_CALORIES)) as i32)
            .unwrap_or(0),
        protein: number(v.get("protein")).unwrap_or(0.0),
        carbs: number(v.get("carbs")).unwrap_or(0.0),
        fat: number(v.get("fat")).unwrap_or(0.0),
    })
}

fn flatten(doc: &Value) -> Vec<Meal> {
    doc.get("days")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|day| day.get("meals").and_then(Value::as_array))
        .flatten()
        .filter_map(meal_from_value)
        .collect()
}

/// Flattens `days[].meals[]` into meal records. A document with no usable
/// meal yields the placeholder meal built from `raw`.
pub fn format_meals(doc: &Value, raw: &str) -> Vec<Meal> {
    let meals = flatten(doc);
    if meals.is_empty() {
        warn!("model plan contained no usable meals; using fallback meal");
        return flatten(&fallback_plan(raw));
    }
    meals
}

pub fn total_calories(meals: &[Meal]) -> i32 {
    meals
        .iter()
        .fold(0i32, |acc, m| acc.saturating_add(m.calories))
}

fn created_details(meal_count: usize, additional_instructions: &str) -> String {
    format!(
        "Generated new meal plan with {meal_count} meals{}",
        if additional_instructions.trim().is_empty() {
            ""
        } else {
            " and custom instructions"
        }
    )
}

fn deleted_details(generated_for: OffsetDateTime) -> String {
    let date = generated_for
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| generated_for.date().to_string());
    format!("Deleted meal plan from {date}")
}

#[instrument(skip(state, additional_instructions))]
pub async fn generate_meal_plan(
    state: &AppState,
    user_id: Uuid,
    additional_instructions: &str,
) -> Result<MealPlan, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let messages = meal_plan_messages(&PlanContext {
        dietary_preferences: &user.dietary_preferences,
        allergies: &user.allergies,
        pantry_items: &user.pantry_items,
        calorie_target: Some(user.calorie_target),
        additional_instructions,
    });
    let raw = state.llm.complete(&messages, MEAL_PLAN_MAX_TOKENS).await?;
    debug!(chars = raw.len(), "meal plan reply received");

    let doc = parse_meal_plan(&raw);
    let meals = format_meals(&doc, &raw);
    let total = total_calories(&meals);
    let details = created_details(meals.len(), additional_instructions);

    let plan = state
        .store
        .create_meal_plan(
            NewMealPlan {
                user_id,
                meals,
                preferences: user.dietary_preferences,
                pantry_items: user.pantry_items,
                total_calories: total,
                additional_instructions: additional_instructions.to_string(),
            },
            details,
        )
        .await?;

    info!(plan_id = %plan.id, meals = plan.meals.len(), total_calories = plan.total_calories, "meal plan generated");
    Ok(plan)
}

#[instrument(skip(state))]
pub async fn list_user_plans(state: &AppState, user_id: Uuid) -> Result<Vec<MealPlan>, AppError> {
    if state.store.find_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let plans = state.store.list_meal_plans(user_id, PLAN_LIST_LIMIT).await?;
    state
        .store
        .append_history(NewHistoryEntry {
            user_id,
            meal_plan_id: None,
            action: HistoryAction::Viewed,
            details: "Viewed meal plan history".into(),
        })
        .await?;
    Ok(plans)
}

#[instrument(skip(state))]
pub async fn user_history(
    state: &AppState,
    user_id: Uuid,
) -> Result<Vec<MealHistoryEntry>, AppError> {
    Ok(state.store.list_history(user_id, HISTORY_LIST_LIMIT).await?)
}

#[instrument(skip(state))]
pub async fn delete_meal_plan(state: &AppState, plan_id: Uuid) -> Result<(), AppError> {
    let deleted = state
        .store
        .delete_meal_plan(plan_id, |plan: &MealPlan| deleted_details(plan.generated_for))
        .await?
        .ok_or_else(|| AppError::NotFound("Meal plan not found".into()))?;

    info!(%plan_id, user_id = %deleted.user_id, "meal plan deleted");
    Ok(())
}
