//! Builds the flat variable context a run starts from.
//!
//! Layering order, each layer overwriting the last on name collision:
//! 1. GLOBAL variables' stored value
//! 2. INPUT variables' default value
//! 3. GlobalLists, keyed by list name, as a JSON array of item values
//! 4. caller-supplied `input_overrides`, applied wholesale
//!
//! A GlobalList wins over a same-named GLOBAL variable (layer 3 over layer
//! 1) since the list is the more specific binding a sequence author opted
//! into by name.

use std::collections::HashMap;

use serde_json::Value;

use crate::model::{GlobalList, Variable, VariableType};

/// Build the seed context for a run, before any block executes.
pub fn build_context(
    variables: &[Variable],
    global_lists: &[GlobalList],
    input_overrides: &Value,
) -> HashMap<String, Value> {
    let mut ctx = HashMap::new();

    for var in variables.iter().filter(|v| v.var_type == VariableType::Global) {
        if let Some(value) = var.payload.get("value") {
            ctx.insert(var.name.clone(), value.clone());
        }
    }

    for var in variables.iter().filter(|v| v.var_type == VariableType::Input) {
        let default = var.payload.get("default").cloned().unwrap_or(Value::Null);
        ctx.insert(var.name.clone(), default);
    }

    for list in global_lists {
        let values: Vec<Value> = list
            .items
            .iter()
            .map(|item| Value::String(item.value.clone()))
            .collect();
        ctx.insert(list.name.clone(), Value::Array(values));
    }

    if let Value::Object(overrides) = input_overrides {
        for (name, value) in overrides {
            ctx.insert(name.clone(), value.clone());
        }
    }

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GlobalListItem;
    use serde_json::json;

    fn global(name: &str, value: Value) -> Variable {
        Variable {
            id: 1,
            sequence_id: 1,
            name: name.to_string(),
            var_type: VariableType::Global,
            payload: json!({ "value": value }),
            description: None,
        }
    }

    fn input(name: &str, default: Value) -> Variable {
        Variable {
            id: 2,
            sequence_id: 1,
            name: name.to_string(),
            var_type: VariableType::Input,
            payload: json!({ "default": default }),
            description: None,
        }
    }

    #[test]
    fn input_default_overrides_global_of_same_name() {
        let vars = vec![global("x", json!("g")), input("x", json!("i"))];
        let ctx = build_context(&vars, &[], &Value::Null);
        assert_eq!(ctx["x"], json!("i"));
    }

    #[test]
    fn global_list_wins_over_same_named_global_variable() {
        let vars = vec![global("topics", json!("single-value"))];
        let lists = vec![GlobalList {
            id: 1,
            owner_id: 1,
            name: "topics".to_string(),
            description: None,
            items: vec![GlobalListItem {
                id: 1,
                global_list_id: 1,
                value: "a".to_string(),
                order: 0,
            }],
        }];
        let ctx = build_context(&vars, &lists, &Value::Null);
        assert_eq!(ctx["topics"], json!(["a"]));
    }

    #[test]
    fn input_without_default_seeds_null_not_absent() {
        let vars = vec![Variable {
            id: 3,
            sequence_id: 1,
            name: "untouched".to_string(),
            var_type: VariableType::Input,
            payload: json!({}),
            description: None,
        }];
        let ctx = build_context(&vars, &[], &Value::Null);
        assert_eq!(ctx["untouched"], Value::Null);
    }

    #[test]
    fn input_overrides_win_over_everything() {
        let vars = vec![global("x", json!("g"))];
        let overrides = json!({ "x": "override" });
        let ctx = build_context(&vars, &[], &overrides);
        assert_eq!(ctx["x"], json!("override"));
    }
}
