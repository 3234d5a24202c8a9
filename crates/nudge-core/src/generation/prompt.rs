//! System prompt for rule generation.
//!
//! The catalogue sections are rendered from the registries so the prompt can
//! never drift from what the validator accepts.

use std::fmt::Write;

use crate::actions::{BACKGROUND_ACTIONS, PLACEHOLDER_TOKENS};
use crate::registry::{variables, BACKGROUND_VARIABLES, OPERATORS, USER_PLANS};

const PREAMBLE: &str = "You are an expert in trigger rules for a health app.
Produce exactly one JSON object describing a single rule, following this schema:

interface TriggerRule {
  id: string;                    // snake_case, starts with a letter
  name: string;                  // readable name
  enabled: boolean;
  priority: number;              // 1-100, higher fires first
  conditions: ConditionGroup;
  cooldown?: string;             // \"30m\", \"1h\", \"24h\", \"7d\"
  schedule?: {
    hours?: { from: number; to: number; };   // 0-23 inclusive, from > to wraps past midnight
    days?: number[];             // 1=Monday ... 7=Sunday
    excludeWeekends?: boolean;
  };
  actions: Action[];             // at least one
  backgroundEnabled?: boolean;
}

ConditionGroup:
{ \"operator\": \"AND\" | \"OR\", \"rules\": [ConditionRule | ConditionGroup] }

ConditionRule:
{ \"field\": string, \"op\": string, \"value\"?: number | boolean | string | [number, number], \"ref\"?: string }
Use either \"value\" or \"ref\" (another variable of the same type), never both.
";

const EPILOGUE: &str = "Return ONLY the JSON object, without comments and without markdown.";

/// Build the system prompt describing the rule schema and catalogues.
pub fn schema_prompt() -> String {
    let mut out = String::from(PREAMBLE);

    out.push_str("\nVariables (key: type, description):\n");
    for def in variables() {
        let _ = write!(out, "- {}: {}", def.key, def.data_type);
        if let Some(unit) = def.unit {
            let _ = write!(out, " [{}]", unit);
        }
        let _ = writeln!(out, ", {}", def.description);
    }
    let _ = writeln!(out, "Values for user_plan: {}", USER_PLANS.join(", "));

    out.push_str("\nOperators:\n");
    for def in OPERATORS.iter() {
        let types: Vec<String> = def.valid_for.iter().map(|t| t.to_string()).collect();
        let _ = write!(out, "- {} ({}) for {}; operand: {}", def.key, def.label, types.join("/"), def.arity);
        if def.allows_ref {
            out.push_str(", ref allowed");
        }
        out.push('\n');
    }

    out.push_str(
        "\nActions:
1) { \"type\": \"notification\", \"title\": string, \"body\": string, \"targetView\"?: \"/home\" | \"/journal\" | \"/habits\" | \"/nutrition\" | \"/settings\" }
2) { \"type\": \"in_app_alert\", \"title\": string, \"body\": string, \"style\"?: \"info\" | \"warning\" | \"success\", \"dismissable\"?: boolean }
3) { \"type\": \"add_memory\", \"category\": string, \"content\": string }
4) { \"type\": \"add_insight\", \"category\": string, \"title\": string, \"body\": string, \"priority\"?: \"low\" | \"medium\" | \"high\" }
",
    );

    let tokens: Vec<String> = PLACEHOLDER_TOKENS.iter().map(|t| format!("{{{{{}}}}}", t)).collect();
    let _ = writeln!(out, "Text fields may use these placeholders: {}", tokens.join(", "));

    let bg_vars: Vec<String> = BACKGROUND_VARIABLES.iter().map(|k| k.to_string()).collect();
    let bg_actions: Vec<String> = BACKGROUND_ACTIONS.iter().map(|a| a.to_string()).collect();
    let _ = writeln!(
        out,
        "\nWhen backgroundEnabled is true, conditions may only use {} and actions may only be of type {}.",
        bg_vars.join(", "),
        bg_actions.join(", ")
    );

    out.push('\n');
    out.push_str(EPILOGUE);
    out
}
