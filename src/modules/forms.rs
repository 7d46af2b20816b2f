use derive_more::with_trait::Display;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use crate::modules::error::EditError;
use crate::modules::shape::{classify, ShapeTag, SOCIAL_LINK_TYPE};

pub const DEFAULT_SUBMIT_TEXT: &str = "Submit";

fn default_submit_text() -> String {
    DEFAULT_SUBMIT_TEXT.to_string()
}

fn default_field_type() -> String {
    "text".to_string()
}

/// Reads a key that may hold an explicit `null`: absent is `None`, `null`
/// is `Some(None)`. Paired with `skip_serializing_if = "Option::is_none"`
/// the key is written back exactly as it was stored.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct FormField {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FormField {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: default_field_type(),
            label: String::new(),
            required: false,
            options: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct FormSpec {
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default = "default_submit_text")]
    pub submit_text: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq, Default)]
pub struct ContactItem {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub link: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct FormDoc {
    pub form: FormSpec,
    /// Rendered separately from the form itself; kept even when untouched.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<Option<Vec<ContactItem>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq, Default)]
pub struct FactItem {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct FactsDoc {
    pub items: Vec<FactItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct ContactDoc {
    pub contact_info: Vec<ContactItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct IconDoc {
    pub icone: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct PriceDoc {
    pub price: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct LinkDoc {
    pub link: String,
    #[serde(default)]
    pub link_text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `type` is implied by the shape and written back on extraction.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct SocialDoc {
    #[serde(default)]
    pub icon: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
pub struct HighlightsDoc {
    pub highlights: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq, Default)]
pub struct NavItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub src: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Editable state of one JSON document, one variant per shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Form(FormDoc),
    Facts(FactsDoc),
    Contact(ContactDoc),
    Icon(IconDoc),
    Price(PriceDoc),
    Link(LinkDoc),
    Social(SocialDoc),
    Highlights(HighlightsDoc),
    Navbar(Vec<NavItem>),
    /// Raw JSON text, validated only when extracted.
    Generic(String),
}

/// The repeatable lists a form state can hold.
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
pub enum ListKind {
    #[display("fields")]
    Fields,
    #[display("contact_info")]
    ContactInfo,
    #[display("items")]
    Facts,
    #[display("highlights")]
    Highlights,
    #[display("navbar")]
    Navbar,
}

trait ItemList {
    fn item_count(&self) -> usize;
    fn swap_items(&mut self, a: usize, b: usize);
    fn remove_item_at(&mut self, index: usize);
    fn push_blank(&mut self);
}

impl<T: Default> ItemList for Vec<T> {
    fn item_count(&self) -> usize {
        self.len()
    }

    fn swap_items(&mut self, a: usize, b: usize) {
        self.swap(a, b);
    }

    fn remove_item_at(&mut self, index: usize) {
        self.remove(index);
    }

    fn push_blank(&mut self) {
        self.push(T::default());
    }
}

impl FormState {
    /// Classifies the document and decodes it into the matching variant.
    ///
    /// A document whose keys point at a shape but whose values don't fit it
    /// is handed back as raw text instead of being dropped.
    pub fn build(document: &Value) -> FormState {
        let tag = classify(document);
        match Self::decode(tag, document) {
            Ok(state) => state,
            Err(err) => {
                warn!("{tag} document did not decode ({err}); editing as raw JSON");
                FormState::Generic(format!("{document:#}"))
            }
        }
    }

    pub fn from_raw(text: &str) -> Result<FormState, EditError> {
        let document: Value = serde_json::from_str(text)?;
        Ok(Self::build(&document))
    }

    fn decode(tag: ShapeTag, document: &Value) -> Result<FormState, serde_json::Error> {
        let state = match tag {
            ShapeTag::Form => FormState::Form(FormDoc::deserialize(document)?),
            ShapeTag::Facts => FormState::Facts(FactsDoc::deserialize(document)?),
            ShapeTag::Contact => FormState::Contact(ContactDoc::deserialize(document)?),
            ShapeTag::Icon => FormState::Icon(IconDoc::deserialize(document)?),
            ShapeTag::Price => FormState::Price(PriceDoc::deserialize(document)?),
            ShapeTag::Link => FormState::Link(LinkDoc::deserialize(document)?),
            ShapeTag::Social => {
                let mut social = SocialDoc::deserialize(document)?;
                social.extra.remove("type");
                FormState::Social(social)
            }
            ShapeTag::Highlights => FormState::Highlights(HighlightsDoc::deserialize(document)?),
            ShapeTag::Navbar => FormState::Navbar(Vec::<NavItem>::deserialize(document)?),
            ShapeTag::Generic => FormState::Generic(format!("{document:#}")),
        };
        Ok(state)
    }

    pub fn tag(&self) -> ShapeTag {
        match self {
            FormState::Form(_) => ShapeTag::Form,
            FormState::Facts(_) => ShapeTag::Facts,
            FormState::Contact(_) => ShapeTag::Contact,
            FormState::Icon(_) => ShapeTag::Icon,
            FormState::Price(_) => ShapeTag::Price,
            FormState::Link(_) => ShapeTag::Link,
            FormState::Social(_) => ShapeTag::Social,
            FormState::Highlights(_) => ShapeTag::Highlights,
            FormState::Navbar(_) => ShapeTag::Navbar,
            FormState::Generic(_) => ShapeTag::Generic,
        }
    }

    /// Rebuilds the complete document from the current state.
    pub fn extract(&self) -> Result<Value, EditError> {
        let document = match self {
            FormState::Form(doc) => serde_json::to_value(doc)?,
            FormState::Facts(doc) => serde_json::to_value(doc)?,
            FormState::Contact(doc) => serde_json::to_value(doc)?,
            FormState::Icon(doc) => serde_json::to_value(doc)?,
            FormState::Price(doc) => serde_json::to_value(doc)?,
            FormState::Link(doc) => serde_json::to_value(doc)?,
            FormState::Social(doc) => {
                let mut value = serde_json::to_value(doc)?;
                if let Value::Object(object) = &mut value {
                    object.insert("type".to_string(), Value::from(SOCIAL_LINK_TYPE));
                }
                value
            }
            FormState::Highlights(doc) => serde_json::to_value(doc)?,
            FormState::Navbar(items) => serde_json::to_value(items)?,
            FormState::Generic(text) => serde_json::from_str(text)?,
        };
        Ok(document)
    }

    fn list_mut(&mut self, list: ListKind) -> Option<&mut dyn ItemList> {
        match (self, list) {
            (FormState::Form(doc), ListKind::Fields) => Some(&mut doc.form.fields as &mut dyn ItemList),
            (FormState::Form(doc), ListKind::ContactInfo) => {
                doc.contact_info
                    .as_mut()
                    .and_then(Option::as_mut)
                    .map(|items| items as &mut dyn ItemList)
            }
            (FormState::Contact(doc), ListKind::ContactInfo) => Some(&mut doc.contact_info as &mut dyn ItemList),
            (FormState::Facts(doc), ListKind::Facts) => Some(&mut doc.items as &mut dyn ItemList),
            (FormState::Highlights(doc), ListKind::Highlights) => {
                Some(&mut doc.highlights as &mut dyn ItemList)
            }
            (FormState::Navbar(items), ListKind::Navbar) => Some(items as &mut dyn ItemList),
            _ => None,
        }
    }

    fn require_list(&mut self, list: ListKind) -> Result<&mut dyn ItemList, EditError> {
        let shape = self.tag();
        self.list_mut(list).ok_or(EditError::MissingFragment {
            shape,
            fragment: format!("`{list}` list"),
        })
    }

    /// Appends a blank entry and returns its index.
    pub fn add_item(&mut self, list: ListKind) -> Result<usize, EditError> {
        let items = self.require_list(list)?;
        items.push_blank();
        Ok(items.item_count() - 1)
    }

    pub fn remove_item(&mut self, list: ListKind, index: usize) -> Result<bool, EditError> {
        let items = self.require_list(list)?;
        if index >= items.item_count() {
            return Ok(false);
        }
        items.remove_item_at(index);
        Ok(true)
    }

    pub fn move_up(&mut self, list: ListKind, index: usize) -> Result<bool, EditError> {
        let items = self.require_list(list)?;
        if index == 0 || index >= items.item_count() {
            return Ok(false);
        }
        items.swap_items(index - 1, index);
        Ok(true)
    }

    pub fn move_down(&mut self, list: ListKind, index: usize) -> Result<bool, EditError> {
        let items = self.require_list(list)?;
        if index + 1 >= items.item_count() {
            return Ok(false);
        }
        items.swap_items(index, index + 1);
        Ok(true)
    }
}
