use reqwest::Url;

use crate::config::WidgetConfig;
use crate::error::{BotboardError, Result};

/// Snippets a third-party site pastes to show a chatbot: an inline iframe
/// and a floating bubble script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSnippets {
    pub iframe_src: String,
    pub iframe: String,
    pub script: String,
}

pub fn widget_url(widget: &WidgetConfig, chatbot_id: &str) -> Result<String> {
    let base = format!("{}/", widget.base_url.trim().trim_end_matches('/'));
    let mut url =
        Url::parse(&base).map_err(|e| BotboardError::Config(format!("widget.base_url: {e}")))?;
    url.query_pairs_mut().append_pair("chatbotId", chatbot_id);
    Ok(url.to_string())
}

pub fn snippets(widget: &WidgetConfig, chatbot_id: &str) -> Result<EmbedSnippets> {
    let iframe_src = widget_url(widget, chatbot_id)?;
    let iframe = format!(
        "<iframe\n  src=\"{iframe_src}\"\n  width=\"100%\"\n  height=\"700\"\n  frameborder=\"0\"\n></iframe>"
    );
    let script = format!(
        "<script\n  src=\"{}\"\n  data-chatbot-id=\"{}\">\n</script>",
        widget.bubble_script(),
        attribute_escape(chatbot_id)
    );
    Ok(EmbedSnippets {
        iframe_src,
        iframe,
        script,
    })
}

fn attribute_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> WidgetConfig {
        WidgetConfig {
            base_url: "https://leadqualifier.koretex.ai".to_string(),
            bubble_script_url: None,
        }
    }

    #[test]
    fn iframe_points_at_widget_with_chatbot_id() {
        let snippets = snippets(&widget(), "bot-42").unwrap();
        assert_eq!(
            snippets.iframe_src,
            "https://leadqualifier.koretex.ai/?chatbotId=bot-42"
        );
        assert!(snippets
            .iframe
            .contains("src=\"https://leadqualifier.koretex.ai/?chatbotId=bot-42\""));
        assert!(snippets.iframe.contains("height=\"700\""));
    }

    #[test]
    fn script_carries_data_attribute() {
        let snippets = snippets(&widget(), "bot-42").unwrap();
        assert!(snippets
            .script
            .contains("src=\"https://leadqualifier.koretex.ai/chat-bot-bubble.js\""));
        assert!(snippets.script.contains("data-chatbot-id=\"bot-42\""));
    }

    #[test]
    fn odd_ids_are_encoded() {
        let snippets = snippets(&widget(), "a b\"c").unwrap();
        assert!(snippets.iframe_src.ends_with("chatbotId=a+b%22c"));
        assert!(snippets.script.contains("data-chatbot-id=\"a b&quot;c\""));
    }
}
