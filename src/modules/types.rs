use derive_more::with_trait::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Copy, Display, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EditableKind {
    #[display("text")]
    Text,
    #[display("image")]
    Image,
    #[display("video")]
    Video,
    #[display("link")]
    Link,
    #[display("json")]
    Json,
}

impl EditableKind {
    /// Reads a `data-editable` attribute value. Unknown kinds yield `None`.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value.trim() {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "link" => Some(Self::Link),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Selects one fragment of a larger JSON document.
#[derive(Debug, Deserialize, Clone, Display, Serialize, PartialEq, Eq)]
pub enum PartialRef {
    #[display("highlight #{index} ({current:.20})")]
    Highlight { index: usize, current: String },
    #[display("submit text")]
    SubmitText,
    #[display("form field `{name}`")]
    FormField { name: String },
}

#[derive(Debug, Deserialize, Clone, Display, Serialize, PartialEq, Eq)]
#[display("{src}")]
pub struct ImageView {
    pub src: String,
    pub class: Option<String>,
    pub style: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Deserialize, Clone, Display, Serialize, PartialEq, Eq)]
#[display("{src}")]
pub struct VideoView {
    pub src: String,
    pub reloads: u32,
}

#[derive(Debug, Deserialize, Clone, Display, Serialize, PartialEq, Eq)]
#[display("{text} -> {href}")]
pub struct LinkView {
    pub href: String,
    pub text: String,
}

/// What the page currently displays for an element.
#[derive(Debug, Deserialize, Clone, Display, Serialize, PartialEq, Eq)]
pub enum ElementView {
    #[display("{content:.60}")]
    Text { content: String },
    Image(ImageView),
    Video(VideoView),
    Link(LinkView),
    #[display("{raw:.60}")]
    Json { raw: String },
}

#[derive(Debug, Deserialize, Clone, Display, Serialize, PartialEq, Eq)]
#[display("[{kind}] element={element_id} field={field} view={view}")]
pub struct EditableElement {
    pub(crate) element_id: String,
    pub(crate) kind: EditableKind,
    pub(crate) field: String,
    pub(crate) text_field: Option<String>,
    pub(crate) partial: Option<PartialRef>,
    pub(crate) data_src: Option<String>,
    pub(crate) view: ElementView,
}

impl EditableElement {
    pub fn new(element_id: impl Into<String>, kind: EditableKind, view: ElementView) -> Self {
        let field = match kind {
            EditableKind::Link | EditableKind::Video => "src",
            EditableKind::Json => "json_content",
            _ => "description",
        };
        Self {
            element_id: element_id.into(),
            kind,
            field: field.to_string(),
            text_field: None,
            partial: None,
            data_src: None,
            view,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_partial(mut self, partial: PartialRef) -> Self {
        self.partial = Some(partial);
        self
    }

    pub fn with_text_field(mut self, text_field: impl Into<String>) -> Self {
        self.text_field = Some(text_field.into());
        self
    }

    pub fn with_data_src(mut self, src: impl Into<String>) -> Self {
        self.data_src = Some(src.into());
        self
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn kind(&self) -> EditableKind {
        self.kind
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn text_field(&self) -> &str {
        self.text_field.as_deref().unwrap_or("title")
    }

    pub fn partial(&self) -> Option<&PartialRef> {
        self.partial.as_ref()
    }

    pub fn data_src(&self) -> Option<&str> {
        self.data_src.as_deref()
    }

    pub fn view(&self) -> &ElementView {
        &self.view
    }
}

#[derive(Debug, Deserialize, Clone, Display, Serialize)]
#[display("success={success} src={src}")]
pub struct UploadResponse {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) src: String,
}

impl UploadResponse {
    pub fn new(success: bool, src: impl Into<String>) -> Self {
        Self { success, src: src.into() }
    }
}
