use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

use crate::models::tool::ToolSignature;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

#[derive(Serialize)]
struct ToolInfo<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct SystemPromptContext<'a> {
    tools: Vec<ToolInfo<'a>>,
    tool_names: Vec<&'a str>,
    max_tool_rounds: usize,
}

/// Render the assistant's system prompt for the given tools and round limit
pub fn system_prompt(tools: &[ToolSignature], max_tool_rounds: usize) -> Result<String, TeraError> {
    let context = SystemPromptContext {
        tools: tools
            .iter()
            .map(|tool| ToolInfo {
                name: &tool.name,
                description: &tool.description,
            })
            .collect(),
        tool_names: tools.iter().map(|tool| tool.name.as_str()).collect(),
        max_tool_rounds,
    };
    load_prompt(SYSTEM_TEMPLATE, &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_load_prompt() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        context.insert("age".to_string(), 30.to_string());

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "Hello, Alice! You are 30 years old.");
    }

    #[test]
    fn test_load_prompt_missing_variable() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        assert!(load_prompt(template, &context).is_err());
    }

    #[test]
    fn test_system_prompt_lists_tools_and_rounds() {
        let tools = vec![
            ToolSignature::new("get_course_outline", "Get the outline", json!({})),
            ToolSignature::new("search_course_content", "Search content", json!({})),
        ];
        let prompt = system_prompt(&tools, 2).unwrap();

        assert!(prompt.contains("1. **get_course_outline**: Get the outline"));
        assert!(prompt.contains("2. **search_course_content**: Search content"));
        assert!(prompt.contains("across up to 2 rounds"));
        assert!(prompt.contains("Cross-reference queries"));
        assert!(!prompt.contains("ask_nutrition_expert"));
        assert!(prompt.contains("No meta-commentary"));
    }

    #[test]
    fn test_system_prompt_without_tools() {
        let prompt = system_prompt(&[], 2).unwrap();
        assert!(!prompt.contains("Available Tools"));
        assert!(prompt.contains("General knowledge"));
    }

    #[test]
    fn test_system_prompt_mentions_expert() {
        let tools = vec![ToolSignature::new("ask_nutrition_expert", "Ask", json!({}))];
        let prompt = system_prompt(&tools, 1).unwrap();
        assert!(prompt.contains("Use ask_nutrition_expert"));
        assert!(!prompt.contains("Later rounds"));
    }
}
