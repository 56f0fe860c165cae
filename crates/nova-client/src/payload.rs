use base64::Engine;
use nova_core::FileAttachment;
use serde_json::{json, Value};

use crate::config::ClientConfig;

/// Build the request body around an already-assembled message content value.
pub(crate) fn build_body(config: &ClientConfig, content: Value) -> Value {
    json!({
        "model": config.model,
        "messages": [
            {
                "role": "user",
                "content": content,
            }
        ],
        "temperature": config.temperature,
        "stream": true,
        "max_tokens": config.max_tokens,
    })
}

/// Message content for a plain-text send.
pub(crate) fn text_content(text: &str) -> Value {
    json!(text)
}

/// Message content embedding images as typed parts alongside the text.
pub(crate) fn parts_content(text: &str, image_parts: Vec<Value>) -> Value {
    let mut parts = Vec::with_capacity(image_parts.len() + 1);
    if !text.is_empty() {
        parts.push(json!({ "type": "text", "text": text }));
    }
    parts.extend(image_parts);
    json!(parts)
}

/// Encode one image attachment as an `image_url` data-URL part.
pub(crate) fn image_part(attachment: &FileAttachment) -> Value {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&attachment.data);
    json!({
        "type": "image_url",
        "image_url": {
            "url": format!("data:{};base64,{}", attachment.mime_type, encoded),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_body() {
        let config = ClientConfig::default().with_model("Qwen/Qwen2.5-7B-Instruct");
        let body = build_body(&config, text_content("hello"));

        assert_eq!(body["model"], "Qwen/Qwen2.5-7B-Instruct");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert!(body["max_tokens"].as_u64().is_some());
    }

    #[test]
    fn test_image_part_is_data_url() {
        let attachment = FileAttachment::new("dot.png", "image/png", vec![1, 2, 3]);
        let part = image_part(&attachment);

        assert_eq!(part["type"], "image_url");
        let url = part["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(url.len() > "data:image/png;base64,".len());
    }

    #[test]
    fn test_parts_content_keeps_text_first() {
        let attachment = FileAttachment::new("dot.png", "image/png", vec![1, 2, 3]);
        let content = parts_content("look at this", vec![image_part(&attachment)]);

        let parts = content.as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
    }

    #[test]
    fn test_parts_content_omits_empty_text() {
        let attachment = FileAttachment::new("dot.png", "image/png", vec![1, 2, 3]);
        let content = parts_content("", vec![image_part(&attachment)]);

        let parts = content.as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0]["type"], "image_url");
    }
}
