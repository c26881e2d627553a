// Prompt text for the two model calls the service makes.

use super::ChatMessage;

pub const DEFAULT_CALORIE_TARGET: i32 = 2000;

/// Number of prior chat turns forwarded to the model.
pub const CHAT_HISTORY_WINDOW: usize = 6;

pub const MEAL_PLAN_SYSTEM: &str =
    "You are a helpful meal planning assistant that creates personalized meal plans.";

const CHEF_PERSONA: &str = "You are Chef Byte, an energetic, funny, and optimistic AI assistant \
    specializing in dietary advice, nutrition, and meal planning.";

const CHEF_STYLE: &str = "
Response style:
- Concise (under 120 words)
- Friendly, humorous, positive
- Markdown formatting
- Bullet points for lists
";

const OUTPUT_FORMAT: &str = r#"Output format:
{
  "days": [
    {
      "day": "Day 1",
      "meals": [
        {
          "type": "Breakfast",
          "name": "Meal name",
          "ingredients": ["ingredient 1", "ingredient 2"],
          "instructions": "Cooking instructions",
          "prepTime": 15,
          "calories": 400,
          "protein": 20,
          "carbs": 30,
          "fat": 15
        }
      ]
    }
  ]
}"#;

/// User attributes that shape a generated plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub dietary_preferences: &'a [String],
    pub allergies: &'a [String],
    pub pantry_items: &'a [String],
    pub calorie_target: Option<i32>,
    pub additional_instructions: &'a str,
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

pub fn meal_plan_prompt(ctx: &PlanContext<'_>) -> String {
    let calories = ctx
        .calorie_target
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_CALORIE_TARGET);
    let mut prompt = format!(
        "Generate a 3-day meal plan (breakfast, lunch, and dinner) based on:\n\n\
         - Dietary preferences: {}\n\
         - Allergies to avoid: {}\n\
         - Available pantry items: {}\n\
         - Daily calorie target: {} calories\n\n",
        join_or_none(ctx.dietary_preferences),
        join_or_none(ctx.allergies),
        join_or_none(ctx.pantry_items),
        calories,
    );
    let extra = ctx.additional_instructions.trim();
    if !extra.is_empty() {
        prompt.push_str(&format!("Additional instructions: {extra}\n\n"));
    }
    prompt.push_str(OUTPUT_FORMAT);
    prompt
}

pub fn meal_plan_messages(ctx: &PlanContext<'_>) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(MEAL_PLAN_SYSTEM),
        ChatMessage::user(meal_plan_prompt(ctx)),
    ]
}

pub fn chatbot_system_message(
    dietary_preferences: &[String],
    allergies: &[String],
    calorie_target: Option<i32>,
) -> String {
    let mut msg = CHEF_PERSONA.to_string();
    if !dietary_preferences.is_empty() {
        msg.push_str(&format!(
            " Dietary preferences: {}.",
            dietary_preferences.join(", ")
        ));
    }
    if !allergies.is_empty() {
        msg.push_str(&format!(" Allergies: {}.", allergies.join(", ")));
    }
    if let Some(target) = calorie_target.filter(|c| *c > 0) {
        msg.push_str(&format!(" Daily calorie target: {target} calories."));
    }
    msg.push_str(CHEF_STYLE);
    msg
}

/// System message, the tail of the history, then the new user turn.
pub fn chatbot_messages(
    system: String,
    history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(CHAT_HISTORY_WINDOW);
    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history[start..].iter().cloned());
    messages.push(ChatMessage::user(user_message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn meal_plan_prompt_lists_user_attributes() {
        let prefs = strings(&["vegetarian", "low-carb"]);
        let allergies = strings(&["peanuts"]);
        let pantry = Vec::new();
        let prompt = meal_plan_prompt(&PlanContext {
            dietary_preferences: &prefs,
            allergies: &allergies,
            pantry_items: &pantry,
            calorie_target: Some(1800),
            additional_instructions: "",
        });
        assert!(prompt.contains("Dietary preferences: vegetarian, low-carb"));
        assert!(prompt.contains("Allergies to avoid: peanuts"));
        assert!(prompt.contains("Available pantry items: None"));
        assert!(prompt.contains("Daily calorie target: 1800 calories"));
        assert!(!prompt.contains("Additional instructions"));
        assert!(prompt.contains("\"days\""));
    }

    #[test]
    fn meal_plan_prompt_defaults_calories_and_adds_instructions() {
        let empty: Vec<String> = Vec::new();
        let prompt = meal_plan_prompt(&PlanContext {
            dietary_preferences: &empty,
            allergies: &empty,
            pantry_items: &empty,
            calorie_target: None,
            additional_instructions: "  quick dinners  ",
        });
        assert!(prompt.contains("Daily calorie target: 2000 calories"));
        assert!(prompt.contains("Additional instructions: quick dinners\n"));
    }

    #[test]
    fn meal_plan_messages_are_system_then_user() {
        let empty: Vec<String> = Vec::new();
        let msgs = meal_plan_messages(&PlanContext {
            dietary_preferences: &empty,
            allergies: &empty,
            pantry_items: &empty,
            calorie_target: None,
            additional_instructions: "",
        });
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[0].content, MEAL_PLAN_SYSTEM);
        assert_eq!(msgs[1].role, Role::User);
    }

    #[test]
    fn chatbot_system_message_personalises_only_non_empty_fields() {
        let msg = chatbot_system_message(&strings(&["vegan"]), &[], Some(2200));
        assert!(msg.starts_with("You are Chef Byte"));
        assert!(msg.contains("Dietary preferences: vegan."));
        assert!(!msg.contains("Allergies:"));
        assert!(msg.contains("Daily calorie target: 2200 calories."));
        assert!(msg.contains("under 120 words"));

        let bare = chatbot_system_message(&[], &[], None);
        assert!(!bare.contains("Dietary preferences"));
        assert!(!bare.contains("calorie target"));
    }

    #[test]
    fn chatbot_messages_keep_last_six_history_turns() {
        let history: Vec<ChatMessage> = (0..10)
            .map(|i| ChatMessage {
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                content: format!("turn {i}"),
            })
            .collect();
        let msgs = chatbot_messages("sys".into(), &history, "what now?");
        assert_eq!(msgs.len(), 1 + CHAT_HISTORY_WINDOW + 1);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].content, "turn 4");
        assert_eq!(msgs[6].content, "turn 9");
        assert_eq!(msgs[7].content, "what now?");
        assert_eq!(msgs[7].role, Role::User);
    }

    #[test]
    fn chatbot_messages_with_short_history() {
        let history = vec![ChatMessage::user("hi")];
        let msgs = chatbot_messages("sys".into(), &history, "again");
        assert_eq!(msgs.len(), 3);
    }
}
