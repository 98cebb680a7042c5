//! Environment-driven configuration.
//!
//! A `.env` file is loaded by `main` before any of these are read.

/// Where the HTTP/WebSocket listener binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

impl ServerConfig {
    /// Load config from `HOSTNAME` and `PORT`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("HOSTNAME").unwrap_or(defaults.host),
            port: env_string("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
        }
    }
}

/// Chat assistant behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// When false, prefixed messages are relayed as plain chat only
    pub enabled: bool,
    /// Marker that turns a chat message into an assistant prompt
    pub prefix: String,
    /// Sender name attached to assistant replies
    pub sender_name: String,
    /// Sent to the asking connection only when the assistant call fails
    pub fallback_message: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "@AI".to_string(),
            sender_name: "AI Assistant".to_string(),
            fallback_message: "Sorry, I couldn't process your request right now.".to_string(),
        }
    }
}

impl AssistantConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_string("AI_ENABLED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            prefix: env_string("AI_PREFIX").unwrap_or(defaults.prefix),
            sender_name: env_string("AI_SENDER_NAME").unwrap_or(defaults.sender_name),
            fallback_message: env_string("AI_FALLBACK_MESSAGE")
                .unwrap_or(defaults.fallback_message),
        }
    }

    /// Returns the prompt when `text` is addressed to the assistant.
    ///
    /// The check runs on the trimmed text and the prompt is the trimmed
    /// remainder after the prefix, which may be empty.
    pub fn extract_prompt<'a>(&self, text: &'a str) -> Option<&'a str> {
        if !self.enabled || self.prefix.is_empty() {
            return None;
        }
        text.trim()
            .strip_prefix(self.prefix.as_str())
            .map(str::trim)
    }
}

/// Trimmed value of `key`, `None` when unset or blank
pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_extract_prompt() {
        let config = AssistantConfig::default();

        assert_eq!(config.extract_prompt("@AI what is 2+2"), Some("what is 2+2"));
        assert_eq!(config.extract_prompt("   @AI   hi  "), Some("hi"));
        assert_eq!(config.extract_prompt("@AI"), Some(""));
        assert_eq!(config.extract_prompt("hello"), None);
        assert_eq!(config.extract_prompt("hey @AI"), None);
        // Prefix is case sensitive
        assert_eq!(config.extract_prompt("@ai hi"), None);
    }

    #[test]
    fn test_extract_prompt_disabled() {
        let config = AssistantConfig {
            enabled: false,
            ..AssistantConfig::default()
        };
        assert_eq!(config.extract_prompt("@AI hi"), None);
    }

    #[test]
    #[serial]
    fn test_server_config_from_env() {
        std::env::set_var("HOSTNAME", " 127.0.0.1 ");
        std::env::set_var("PORT", "8080");
        let config = ServerConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);

        std::env::set_var("PORT", "not-a-port");
        assert_eq!(ServerConfig::from_env().port, 3001);

        std::env::remove_var("HOSTNAME");
        std::env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn test_assistant_config_from_env() {
        std::env::set_var("AI_ENABLED", "false");
        std::env::set_var("AI_PREFIX", "!bot");
        std::env::set_var("AI_SENDER_NAME", "");

        let config = AssistantConfig::from_env();
        assert!(!config.enabled);
        assert_eq!(config.prefix, "!bot");
        assert_eq!(config.sender_name, "AI Assistant");

        std::env::remove_var("AI_ENABLED");
        std::env::remove_var("AI_PREFIX");
        std::env::remove_var("AI_SENDER_NAME");
    }

    #[test]
    #[serial]
    fn test_assistant_enabled_flag_is_trimmed() {
        std::env::set_var("AI_ENABLED", " FALSE ");
        assert!(!AssistantConfig::from_env().enabled);

        std::env::set_var("AI_ENABLED", " 0");
        assert!(!AssistantConfig::from_env().enabled);

        // Blank counts as unset
        std::env::set_var("AI_ENABLED", "   ");
        assert!(AssistantConfig::from_env().enabled);

        std::env::set_var("AI_ENABLED", "true");
        assert!(AssistantConfig::from_env().enabled);

        std::env::remove_var("AI_ENABLED");
    }
}
