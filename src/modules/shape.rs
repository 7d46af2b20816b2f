use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of structured payload a JSON element carries.
#[derive(Debug, Deserialize, Clone, Copy, Display, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShapeTag {
    #[display("form")]
    Form,
    #[display("facts")]
    Facts,
    #[display("contact")]
    Contact,
    #[display("icon")]
    Icon,
    #[display("price")]
    Price,
    #[display("link")]
    Link,
    #[display("social")]
    Social,
    #[display("highlights")]
    Highlights,
    #[display("navbar")]
    Navbar,
    #[display("generic")]
    Generic,
}

pub const SOCIAL_LINK_TYPE: &str = "social_link";

/// Infers the shape of a document from the keys it carries.
///
/// The checks run in a fixed order and the first hit wins, so a document
/// holding both `form` and `contact_info` is always a form.
pub fn classify(document: &Value) -> ShapeTag {
    let object = match document {
        Value::Array(_) => return ShapeTag::Navbar,
        Value::Object(object) => object,
        _ => return ShapeTag::Generic,
    };
    let has = |key: &str| object.contains_key(key);

    // A form keeps its optional contact_info list, so `form` is checked first.
    if has("form") {
        ShapeTag::Form
    } else if has("items") {
        ShapeTag::Facts
    } else if has("contact_info") {
        ShapeTag::Contact
    } else if has("icone") {
        ShapeTag::Icon
    } else if has("price") {
        ShapeTag::Price
    } else if has("link") {
        ShapeTag::Link
    } else if object.get("type").and_then(Value::as_str) == Some(SOCIAL_LINK_TYPE) {
        ShapeTag::Social
    } else if has("highlights") {
        ShapeTag::Highlights
    } else {
        ShapeTag::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_wins_over_contact_in_any_key_order() {
        let docs = [
            r#"{"form": {"fields": []}, "contact_info": []}"#,
            r#"{"contact_info": [], "form": {"fields": []}}"#,
            r#"{"contact_info": [{"icon": "x"}], "price": "9", "form": {}}"#,
        ];
        for doc in docs {
            let value: Value = serde_json::from_str(doc).unwrap();
            assert_eq!(classify(&value), ShapeTag::Form, "{doc}");
        }
    }

    #[test]
    fn each_rule_matches_its_shape() {
        let cases = [
            (json!({"form": {}, "price": "90€ per person"}), ShapeTag::Form),
            (json!({"items": [], "contact_info": []}), ShapeTag::Facts),
            (json!({"contact_info": [], "icone": "fa"}), ShapeTag::Contact),
            (json!({"icone": "fas fa-hotel", "price": "1"}), ShapeTag::Icon),
            (json!({"price": "1", "link": "/x"}), ShapeTag::Price),
            (json!({"link": "theme/ourika", "link_text": "Read More"}), ShapeTag::Link),
            (json!({"type": "social_link", "icon": "fab fa-facebook"}), ShapeTag::Social),
            (json!({"highlights": ["a"]}), ShapeTag::Highlights),
            (json!([{"title": "Home", "src": "/"}]), ShapeTag::Navbar),
            (json!([]), ShapeTag::Navbar),
        ];
        for (doc, expected) in cases {
            assert_eq!(classify(&doc), expected, "{doc}");
        }
    }

    #[test]
    fn unrecognised_documents_are_generic() {
        assert_eq!(classify(&json!({"foo": "bar"})), ShapeTag::Generic);
        assert_eq!(classify(&json!({"type": "banner", "icon": "x"})), ShapeTag::Generic);
        assert_eq!(classify(&json!("plain string")), ShapeTag::Generic);
        assert_eq!(classify(&json!(42)), ShapeTag::Generic);
        assert_eq!(classify(&Value::Null), ShapeTag::Generic);
    }
}
