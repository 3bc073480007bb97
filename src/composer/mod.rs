//! Prompt Composer.
//!
//! Builds the system and user messages sent to the LLM gateway from
//! annotated HTML, the static API catalog, the caller-supplied
//! script/connector/agent enumerations, theme info, and the user's chat
//! message. Pure: the same inputs always produce the same output bytes.

pub mod prompt_text;

use serde::{Deserialize, Serialize};

use self::prompt_text::{theme_block, SERVER_APIS, TRANSFORM_INSTR};

/// Caller-supplied theme context for the `<THEME>` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeInfo {
    pub mode: ThemeMode,
    pub colors: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

/// All inputs the composer needs to build a system message.
pub struct SystemMessageInputs<'a> {
    pub annotated_source: &'a str,
    pub scripts: Option<&'a str>,
    pub theme_info: Option<&'a ThemeInfo>,
    pub connectors: Option<&'a str>,
    pub agents: Option<&'a str>,
    /// Pre-formatted extra route descriptions for this deployment. Not
    /// one of the six fixed labeled blocks; read literally, "extra route
    /// descriptions" extend the `<SERVER_APIS>` catalog rather than
    /// introduce a new top-level block, so they are appended inside it
    /// (see DESIGN.md).
    pub route_hints: Option<&'a str>,
    pub user_message: &'a str,
}

/// Build the system message: six labeled blocks, in fixed order,
/// separated by blank lines. Optional blocks are omitted entirely when
/// their input is absent or empty.
pub fn compose_system_message(inputs: &SystemMessageInputs) -> String {
    let mut blocks = Vec::new();

    blocks.push(format!(
        "<CURRENT_PAGE>\n{}\n</CURRENT_PAGE>",
        inputs.annotated_source
    ));

    match inputs.route_hints {
        Some(hints) if !hints.is_empty() => {
            blocks.push(format!(
                "{}\n\nAdditional routes for this deployment:\n{}\n</SERVER_APIS>",
                SERVER_APIS.trim_end_matches("\n</SERVER_APIS>"),
                hints
            ));
        }
        _ => blocks.push(SERVER_APIS.to_string()),
    }

    if let Some(scripts) = inputs.scripts {
        if !scripts.is_empty() {
            blocks.push(format!("<SERVER_SCRIPTS>\n{}\n</SERVER_SCRIPTS>", scripts));
        }
    }

    if let Some(theme) = inputs.theme_info {
        blocks.push(theme_block(theme.mode.as_str(), &theme.colors));
    }

    if let Some(connectors) = inputs.connectors {
        if !connectors.is_empty() {
            blocks.push(format!(
                "<CONFIGURED_CONNECTORS>\n{}\n</CONFIGURED_CONNECTORS>",
                connectors
            ));
        }
    }

    if let Some(agents) = inputs.agents {
        if !agents.is_empty() {
            blocks.push(format!("<CONFIGURED_AGENTS>\n{}\n</CONFIGURED_AGENTS>", agents));
        }
    }

    blocks.push(format!(
        "<USER_MESSAGE>\n{}\n</USER_MESSAGE>",
        inputs.user_message
    ));

    blocks.join("\n\n")
}

/// Build the user message: the caller's custom instructions, the
/// provider-specific formatting instructions, then the fixed
/// `transformInstr` block, each separated by a blank line. Either
/// instruction block is omitted when absent.
pub fn compose_user_message(
    instructions: Option<&str>,
    model_instructions: Option<&str>,
    custom_transform_instructions: Option<&[String]>,
) -> String {
    let mut parts = Vec::new();

    if let Some(instructions) = instructions {
        if !instructions.is_empty() {
            parts.push(instructions.to_string());
        }
    }

    if let Some(model_instructions) = model_instructions {
        if !model_instructions.is_empty() {
            parts.push(model_instructions.to_string());
        }
    }

    if let Some(extra) = custom_transform_instructions {
        for line in extra {
            if !line.is_empty() {
                parts.push(line.clone());
            }
        }
    }

    parts.push(TRANSFORM_INSTR.to_string());

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_inputs<'a>(page: &'a str, msg: &'a str) -> SystemMessageInputs<'a> {
        SystemMessageInputs {
            annotated_source: page,
            scripts: None,
            theme_info: None,
            connectors: None,
            agents: None,
            route_hints: None,
            user_message: msg,
        }
    }

    #[test]
    fn system_message_always_carries_current_page_and_server_apis() {
        let inputs = base_inputs("<html></html>", "make it blue");
        let msg = compose_system_message(&inputs);
        assert!(msg.contains("<CURRENT_PAGE>"));
        assert!(msg.contains("<SERVER_APIS>"));
        assert!(msg.contains("<USER_MESSAGE>\nmake it blue\n</USER_MESSAGE>"));
    }

    #[test]
    fn optional_blocks_omitted_when_absent() {
        let inputs = base_inputs("<html></html>", "hi");
        let msg = compose_system_message(&inputs);
        assert!(!msg.contains("<SERVER_SCRIPTS>"));
        assert!(!msg.contains("<THEME>"));
        assert!(!msg.contains("<CONFIGURED_CONNECTORS>"));
        assert!(!msg.contains("<CONFIGURED_AGENTS>"));
    }

    #[test]
    fn theme_block_included_when_provided() {
        let theme = ThemeInfo {
            mode: ThemeMode::Dark,
            colors: vec![("accent".to_string(), "#5865f2".to_string())],
        };
        let mut inputs = base_inputs("<html></html>", "hi");
        inputs.theme_info = Some(&theme);
        let msg = compose_system_message(&inputs);
        assert!(msg.contains("<THEME>"));
        assert!(msg.contains("--accent: #5865f2"));
        assert!(msg.contains("dark"));
    }

    #[test]
    fn route_hints_extend_the_server_apis_block_not_a_new_block() {
        let mut inputs = base_inputs("<html></html>", "hi");
        inputs.route_hints = Some("- GET /api/widgets — list widgets");
        let msg = compose_system_message(&inputs);
        assert!(msg.contains("Additional routes for this deployment"));
        assert!(msg.contains("GET /api/widgets"));
        assert_eq!(msg.matches("<SERVER_APIS>").count(), 1);
        assert_eq!(msg.matches("</SERVER_APIS>").count(), 1);
    }

    #[test]
    fn composer_is_pure() {
        let inputs = base_inputs("<html><body>x</body></html>", "do a thing");
        let a = compose_system_message(&inputs);
        let b = compose_system_message(&inputs);
        assert_eq!(a, b);
    }

    #[test]
    fn user_message_always_ends_with_transform_instr() {
        let msg = compose_user_message(Some("be nice"), None, None);
        assert!(msg.starts_with("be nice"));
        assert!(msg.ends_with(prompt_text::TRANSFORM_INSTR));
    }

    #[test]
    fn user_message_with_no_instructions_is_just_transform_instr() {
        let msg = compose_user_message(None, None, None);
        assert_eq!(msg, prompt_text::TRANSFORM_INSTR);
    }
}
