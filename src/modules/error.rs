use derive_more::with_trait::Display;
use reqwest::StatusCode;
use crate::modules::shape::ShapeTag;
use crate::modules::types::EditableKind;

#[derive(Debug, Display)]
pub enum EditError {
    #[display("network error: {_0}")]
    Transport(reqwest::Error),
    #[display("server answered {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[display("unreadable server answer: {_0}")]
    Decode(reqwest::Error),
    #[display("server rejected update of `{field}` on element {element_id}")]
    Rejected { element_id: String, field: String },
    #[display("malformed JSON: {_0}")]
    MalformedJson(serde_json::Error),
    #[display("{shape} document has no {fragment}")]
    MissingFragment { shape: ShapeTag, fragment: String },
    #[display("highlight #{index} no longer reads `{expected}`")]
    StaleReference { index: usize, expected: String },
    #[display("link address saved but its text was not: {_0}")]
    PartialLinkUpdate(Box<EditError>),
    #[display("element #{_0} already has an open editor")]
    AlreadyEditing(usize),
    #[display("element #{_0} has no open editor")]
    NotEditing(usize),
    #[display("another dialog is already open")]
    ModalOpen,
    #[display("no dialog is open")]
    NoModal,
    #[display("no editable element #{_0}")]
    NoSuchElement(usize),
    #[display("element #{index} is {actual}, not {expected}")]
    WrongKind { index: usize, expected: EditableKind, actual: EditableKind },
    #[display("invalid address: {_0}")]
    Url(url::ParseError),
    #[display("invalid header value: {_0}")]
    Header(reqwest::header::InvalidHeaderValue),
    #[display("I/O error: {_0}")]
    Io(std::io::Error),
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditError::Transport(e) | EditError::Decode(e) => Some(e),
            EditError::MalformedJson(e) => Some(e),
            EditError::PartialLinkUpdate(e) => Some(e.as_ref()),
            EditError::Url(e) => Some(e),
            EditError::Header(e) => Some(e),
            EditError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EditError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            EditError::Status { status, url }
        } else if err.is_decode() {
            EditError::Decode(err)
        } else {
            EditError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for EditError {
    fn from(err: serde_json::Error) -> Self {
        EditError::MalformedJson(err)
    }
}

impl From<url::ParseError> for EditError {
    fn from(err: url::ParseError) -> Self {
        EditError::Url(err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for EditError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        EditError::Header(err)
    }
}

impl From<std::io::Error> for EditError {
    fn from(err: std::io::Error) -> Self {
        EditError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_piece() {
        let err = EditError::Rejected { element_id: "7".into(), field: "title".into() };
        assert_eq!(err.to_string(), "server rejected update of `title` on element 7");

        let err = EditError::WrongKind {
            index: 2,
            expected: EditableKind::Video,
            actual: EditableKind::Text,
        };
        assert_eq!(err.to_string(), "element #2 is text, not video");
    }

    #[test]
    fn partial_link_update_keeps_its_cause() {
        let inner = EditError::Rejected { element_id: "3".into(), field: "title".into() };
        let err = EditError::PartialLinkUpdate(Box::new(inner));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("server rejected update of `title` on element 3"));
    }
}
