use serde_json::Value;
use crate::modules::error::EditError;
use crate::modules::shape::classify;
use crate::modules::types::PartialRef;

/// Parses stored `json_content`; a record that never held a document reads as `{}`.
pub fn parse_stored(raw: &str) -> Result<Value, EditError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(raw)?)
}

fn missing(document: &Value, fragment: &str) -> EditError {
    EditError::MissingFragment {
        shape: classify(document),
        fragment: fragment.to_string(),
    }
}

/// Finds the highlight a page element was rendered from.
///
/// Position is authoritative. If the entry at that position no longer
/// matches the rendered text, the first entry that does is used instead.
fn resolve_highlight(items: &[Value], index: usize, current: &str) -> Result<usize, EditError> {
    if items.get(index).and_then(Value::as_str) == Some(current) {
        return Ok(index);
    }
    items
        .iter()
        .position(|item| item.as_str() == Some(current))
        .ok_or_else(|| EditError::StaleReference {
            index,
            expected: current.to_string(),
        })
}

/// Replaces the fragment `partial` points at, leaving everything else alone.
pub fn apply_partial(document: &mut Value, partial: &PartialRef, value: &str) -> Result<(), EditError> {
    match partial {
        PartialRef::Highlight { index, current } => {
            let err = missing(document, "`highlights` list");
            let items = document
                .get_mut("highlights")
                .and_then(Value::as_array_mut)
                .ok_or(err)?;
            let at = resolve_highlight(items, *index, current)?;
            items[at] = Value::from(value);
        }
        PartialRef::SubmitText => {
            let err = missing(document, "`form` object");
            let form = document
                .get_mut("form")
                .and_then(Value::as_object_mut)
                .ok_or(err)?;
            form.insert("submit_text".to_string(), Value::from(value));
        }
        PartialRef::FormField { name } => {
            let err = missing(document, &format!("form field `{name}`"));
            let field = document
                .pointer_mut("/form/fields")
                .and_then(Value::as_array_mut)
                .and_then(|fields| {
                    fields
                        .iter_mut()
                        .find(|field| field.get("name").and_then(Value::as_str) == Some(name.as_str()))
                })
                .and_then(Value::as_object_mut)
                .ok_or(err)?;
            field.insert("label".to_string(), Value::from(value));
        }
    }
    Ok(())
}

/// Applies a partial edit to a freshly fetched document and returns the
/// complete document, serialized for the update endpoint.
pub fn merge_partial(stored: &str, partial: &PartialRef, value: &str) -> Result<String, EditError> {
    let mut document = parse_stored(stored)?;
    apply_partial(&mut document, partial, value)?;
    Ok(serde_json::to_string(&document)?)
}
