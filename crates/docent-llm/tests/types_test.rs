use docent_llm::{Content, ContentPart, Message};
use serde_json::json;

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_content_from_string() {
    let content: Content = "Test".into();
    assert_eq!(content.as_text(), Some("Test"));
}

#[test]
fn test_content_with_no_images_stays_text() {
    let content = Content::with_images("plain", Vec::<String>::new());
    assert_eq!(content, Content::Text("plain".to_string()));
}

#[test]
fn test_content_with_images_builds_parts() {
    let content = Content::with_images("look", ["data:image/png;base64,AAAA"]);
    match &content {
        Content::Parts(parts) => {
            assert_eq!(parts.len(), 2);
            assert!(matches!(parts[1], ContentPart::ImageUrl { .. }));
        }
        Content::Text(_) => panic!("expected multipart content"),
    }
    assert_eq!(content.as_text(), None);
    assert_eq!(content.text_parts(), "look");
}

#[test]
fn test_message_roles() {
    assert_eq!(Message::system("You are helpful").role(), "system");
    assert_eq!(Message::human("Hello").role(), "user");
    assert_eq!(Message::ai("Hi there!").role(), "assistant");
}

#[test]
fn test_message_serialization_human() {
    let msg = Message::human("Hello");
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"role\":\"user\""));
    assert!(json.contains("Hello"));
}

#[test]
fn test_message_deserialization() {
    let json = r#"{"role":"assistant","content":"Test"}"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg.role(), "assistant");
    assert_eq!(msg.content().as_text(), Some("Test"));
}

#[test]
fn test_multipart_serialization_shape() {
    let msg = Message::human(Content::with_images("what is this?", ["https://img/1.png"]));
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        value,
        json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "what is this?"},
                {"type": "image_url", "image_url": {"url": "https://img/1.png"}}
            ]
        })
    );
}
