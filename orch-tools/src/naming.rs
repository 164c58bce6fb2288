//! Tool name parsing (spec §4.7): canonical `provider:tool`, legacy
//! `provider__tool`, and a per-provider `snake_case` → canonical `camelCase`
//! alias table.

use orch_core::{OrchError, Result};
use std::collections::HashMap;

/// A parsed, canonicalized tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToolName {
    pub provider: String,
    pub tool: String,
}

/// Rewrite a legacy `provider__tool` name into canonical `provider:tool`
/// form, then split on `:`. Neither form with an empty provider or tool is
/// accepted.
pub fn parse_full_name(full_name: &str) -> Result<ParsedToolName> {
    let canonical = if full_name.contains(':') {
        full_name.to_string()
    } else if let Some(idx) = full_name.find("__") {
        format!("{}:{}", &full_name[..idx], &full_name[idx + 2..])
    } else {
        full_name.to_string()
    };

    let Some((provider, tool)) = canonical.split_once(':') else {
        return Err(OrchError::ToolNotFound {
            full_name: full_name.to_string(),
        });
    };

    if provider.is_empty() || tool.is_empty() {
        return Err(OrchError::ToolNotFound {
            full_name: full_name.to_string(),
        });
    }

    Ok(ParsedToolName {
        provider: provider.to_string(),
        tool: tool.to_string(),
    })
}

/// Resolve a possibly-legacy `snake_case` tool alias to its canonical
/// `camelCase` name using a per-provider alias table. Unknown aliases pass
/// through unchanged.
#[must_use]
pub fn resolve_alias(provider: &str, tool: &str, aliases: &HashMap<String, HashMap<String, String>>) -> String {
    aliases
        .get(provider)
        .and_then(|table| table.get(tool))
        .cloned()
        .unwrap_or_else(|| tool.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_splits_directly() {
        let parsed = parse_full_name("slack:send_message").unwrap();
        assert_eq!(parsed.provider, "slack");
        assert_eq!(parsed.tool, "send_message");
    }

    #[test]
    fn legacy_double_underscore_is_rewritten() {
        let parsed = parse_full_name("slack__send_message").unwrap();
        assert_eq!(parsed.provider, "slack");
        assert_eq!(parsed.tool, "send_message");
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(parse_full_name("slacksendmessage").is_err());
    }

    #[test]
    fn empty_provider_or_tool_is_rejected() {
        assert!(parse_full_name(":send_message").is_err());
        assert!(parse_full_name("slack:").is_err());
    }

    #[test]
    fn alias_resolution_falls_back_to_input() {
        let mut table = HashMap::new();
        let mut slack = HashMap::new();
        slack.insert("send_message".to_string(), "sendMessage".to_string());
        table.insert("slack".to_string(), slack);

        assert_eq!(resolve_alias("slack", "send_message", &table), "sendMessage");
        assert_eq!(resolve_alias("slack", "unknown_tool", &table), "unknown_tool");
        assert_eq!(resolve_alias("other", "send_message", &table), "send_message");
    }
}
