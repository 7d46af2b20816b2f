use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use log::{error, info, warn};
use crate::modules::api::ContentApi;
use crate::modules::error::EditError;
use crate::modules::forms::FormState;
use crate::modules::merge::{merge_partial, parse_stored};
use crate::modules::types::{EditableElement, EditableKind, ElementView, PartialRef};
use crate::modules::ui::{Level, Modal, UiState};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextDraft {
    original: String,
    draft: String,
}

/// Appends a timestamp query so browsers refetch a replaced image.
pub fn cache_bust(src: &str, stamp: u128) -> String {
    let separator = if src.contains('?') { '&' } else { '?' };
    format!("{src}{separator}t={stamp}")
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Edit session over the editable elements of one page.
///
/// Every save reconciles the element view with the server answer: applied
/// on success, rolled back and reported on failure. Nothing is retried.
pub struct InlineEditor<A> {
    api: A,
    elements: Vec<EditableElement>,
    drafts: HashMap<usize, TextDraft>,
    ui: UiState,
}

impl<A: ContentApi> InlineEditor<A> {
    pub fn new(api: A, elements: Vec<EditableElement>) -> Self {
        Self {
            api,
            elements,
            drafts: HashMap::new(),
            ui: UiState::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn elements(&self) -> &[EditableElement] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Result<&EditableElement, EditError> {
        self.elements.get(index).ok_or(EditError::NoSuchElement(index))
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    fn expect_kind(&self, index: usize, expected: EditableKind) -> Result<&EditableElement, EditError> {
        let element = self.element(index)?;
        if element.kind != expected {
            return Err(EditError::WrongKind { index, expected, actual: element.kind });
        }
        Ok(element)
    }

    /// One field update; a refusal from the server becomes `Rejected`.
    async fn update(&self, element_id: &str, field: &str, value: &str) -> Result<(), EditError> {
        if self.api.update_field(element_id, field, value).await? {
            Ok(())
        } else {
            Err(EditError::Rejected {
                element_id: element_id.to_string(),
                field: field.to_string(),
            })
        }
    }

    fn fail(&mut self, message: &str, err: &EditError) {
        error!("{message}: {err}");
        self.ui.notify(Level::Error, message);
    }

    // --- text -----------------------------------------------------------

    pub fn open_text(&mut self, index: usize) -> Result<(), EditError> {
        let element = self.expect_kind(index, EditableKind::Text)?;
        if self.drafts.contains_key(&index) {
            return Err(EditError::AlreadyEditing(index));
        }
        let ElementView::Text { content } = &element.view else {
            return Err(EditError::WrongKind { index, expected: EditableKind::Text, actual: element.kind });
        };
        let original = content.clone();
        self.drafts.insert(index, TextDraft { draft: original.clone(), original });
        Ok(())
    }

    pub fn is_editing(&self, index: usize) -> bool {
        self.drafts.contains_key(&index)
    }

    pub fn draft(&self, index: usize) -> Option<&str> {
        self.drafts.get(&index).map(|d| d.draft.as_str())
    }

    pub fn set_draft(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditError> {
        let draft = self.drafts.get_mut(&index).ok_or(EditError::NotEditing(index))?;
        draft.draft = text.into();
        Ok(())
    }

    fn show_text(&mut self, index: usize, text: String) {
        if let Some(element) = self.elements.get_mut(index) {
            element.view = ElementView::Text { content: text };
        }
    }

    /// Closes the text area without touching the server.
    pub fn cancel_text(&mut self, index: usize) -> Result<(), EditError> {
        let draft = self.drafts.remove(&index).ok_or(EditError::NotEditing(index))?;
        self.show_text(index, draft.original);
        Ok(())
    }

    /// Re-reads the stored document, swaps in one fragment and writes the
    /// whole document back.
    async fn save_partial(
        &self,
        element_id: &str,
        field: &str,
        partial: &PartialRef,
        value: &str,
    ) -> Result<(), EditError> {
        let stored = self.api.fetch_document(element_id).await?;
        let merged = merge_partial(&stored, partial, value)?;
        self.update(element_id, field, &merged).await
    }

    pub async fn save_text(&mut self, index: usize) -> Result<(), EditError> {
        let draft = self.drafts.remove(&index).ok_or(EditError::NotEditing(index))?;
        let element = self.element(index)?;
        let element_id = element.element_id.clone();
        let field = element.field.clone();
        let partial = element.partial.clone();

        let result = match &partial {
            None => self.update(&element_id, &field, &draft.draft).await,
            Some(partial) => self.save_partial(&element_id, &field, partial, &draft.draft).await,
        };

        match result {
            Ok(()) => {
                info!("Updated {field} of element {element_id}");
                if let Some(PartialRef::Highlight { index: at, .. }) = partial {
                    self.elements[index].partial = Some(PartialRef::Highlight {
                        index: at,
                        current: draft.draft.clone(),
                    });
                }
                self.show_text(index, draft.draft);
                self.ui.notify(Level::Success, "Content updated successfully");
                Ok(())
            }
            Err(err) => {
                self.show_text(index, draft.original);
                self.fail("Error updating content", &err);
                Err(err)
            }
        }
    }

    // --- image ----------------------------------------------------------

    pub async fn replace_image(
        &mut self,
        index: usize,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), EditError> {
        let element_id = self.expect_kind(index, EditableKind::Image)?.element_id.clone();
        if let ElementView::Image(view) = &mut self.elements[index].view {
            if view.loading {
                return Err(EditError::AlreadyEditing(index));
            }
            view.loading = true;
        }

        let result = match self.api.upload_image(&element_id, file_name, bytes).await {
            Ok(answer) if answer.success => Ok(answer.src),
            Ok(_) => Err(EditError::Rejected { element_id: element_id.clone(), field: "image".to_string() }),
            Err(err) => Err(err),
        };

        let ElementView::Image(view) = &mut self.elements[index].view else {
            return Err(EditError::NoSuchElement(index));
        };
        view.loading = false;
        match result {
            Ok(src) => {
                view.src = cache_bust(&src, now_millis());
                info!("Replaced image of element {element_id} with {src}");
                self.ui.notify(Level::Success, "Image updated successfully");
                Ok(())
            }
            Err(err) => {
                self.fail("Error updating image", &err);
                Err(err)
            }
        }
    }

    // --- video and link dialogs -----------------------------------------

    pub fn open_video(&mut self, index: usize) -> Result<(), EditError> {
        let element = self.expect_kind(index, EditableKind::Video)?;
        let url = match (element.data_src(), &element.view) {
            (Some(src), _) => src.to_string(),
            (None, ElementView::Video(view)) => view.src.clone(),
            (None, _) => String::new(),
        };
        self.ui.open_modal(Modal::Video { element: index, url })
    }

    pub fn open_link(&mut self, index: usize) -> Result<(), EditError> {
        let element = self.expect_kind(index, EditableKind::Link)?;
        let (url, text) = match &element.view {
            ElementView::Link(view) => (view.href.clone(), view.text.clone()),
            _ => (String::new(), String::new()),
        };
        self.ui.open_modal(Modal::Link { element: index, url, text })
    }

    pub fn fill_video(&mut self, new_url: impl Into<String>) -> Result<(), EditError> {
        match self.ui.modal_mut() {
            Some(Modal::Video { url, .. }) => {
                *url = new_url.into();
                Ok(())
            }
            _ => Err(EditError::NoModal),
        }
    }

    pub fn fill_link(&mut self, new_url: impl Into<String>, new_text: impl Into<String>) -> Result<(), EditError> {
        match self.ui.modal_mut() {
            Some(Modal::Link { url, text, .. }) => {
                *url = new_url.into();
                *text = new_text.into();
                Ok(())
            }
            _ => Err(EditError::NoModal),
        }
    }

    pub fn cancel_modal(&mut self) -> Result<(), EditError> {
        self.ui.close_modal().map(|_| ()).ok_or(EditError::NoModal)
    }

    /// Saves the video address. The dialog closes whatever the outcome.
    pub async fn save_video(&mut self) -> Result<(), EditError> {
        let Some(Modal::Video { element: index, url }) = self.ui.modal().cloned() else {
            return Err(EditError::NoModal);
        };
        let element = self.element(index)?;
        let element_id = element.element_id.clone();
        let field = element.field.clone();

        let result = self.update(&element_id, &field, &url).await;
        self.ui.close_modal();

        match result {
            Ok(()) => {
                let element = &mut self.elements[index];
                if let ElementView::Video(view) = &mut element.view {
                    view.src = url.clone();
                    view.reloads += 1;
                }
                element.data_src = Some(url);
                info!("Updated video of element {element_id}");
                self.ui.notify(Level::Success, "Video updated successfully");
                Ok(())
            }
            Err(err) => {
                self.fail("Error updating video", &err);
                Err(err)
            }
        }
    }

    /// Saves address then text as two updates. When the second one fails
    /// the address stays saved on the server and the page is left as it was.
    pub async fn save_link(&mut self) -> Result<(), EditError> {
        let Some(Modal::Link { element: index, url, text }) = self.ui.modal().cloned() else {
            return Err(EditError::NoModal);
        };
        let element = self.element(index)?;
        let element_id = element.element_id.clone();
        let field = element.field.clone();
        let text_field = element.text_field().to_string();

        let result = match self.update(&element_id, &field, &url).await {
            Err(err) => Err(err),
            Ok(()) => self
                .update(&element_id, &text_field, &text)
                .await
                .map_err(|err| EditError::PartialLinkUpdate(Box::new(err))),
        };
        self.ui.close_modal();

        match result {
            Ok(()) => {
                if let ElementView::Link(view) = &mut self.elements[index].view {
                    view.href = url;
                    view.text = text;
                }
                info!("Updated link of element {element_id}");
                self.ui.notify(Level::Success, "Link updated successfully");
                Ok(())
            }
            Err(err) => {
                if matches!(err, EditError::PartialLinkUpdate(_)) {
                    warn!("Link address of element {element_id} was saved without its text");
                }
                self.fail("Error updating link", &err);
                Err(err)
            }
        }
    }

    // --- structured content ---------------------------------------------

    /// Fetches the element's document and opens the shape-specific form.
    pub async fn open_json(&mut self, index: usize) -> Result<(), EditError> {
        let element_id = self.expect_kind(index, EditableKind::Json)?.element_id.clone();
        if self.ui.modal().is_some() {
            return Err(EditError::ModalOpen);
        }

        let loaded = match self.api.fetch_document(&element_id).await {
            Ok(raw) => parse_stored(&raw),
            Err(err) => Err(err),
        };
        let document = match loaded {
            Ok(document) => document,
            Err(err) => {
                self.fail("Error loading content", &err);
                return Err(err);
            }
        };

        let form = FormState::build(&document);
        info!("Editing element {element_id} as {}", form.tag());
        self.ui.open_modal(Modal::Json { element: index, form })
    }

    pub fn json_form(&self) -> Option<&FormState> {
        match self.ui.modal() {
            Some(Modal::Json { form, .. }) => Some(form),
            _ => None,
        }
    }

    pub fn json_form_mut(&mut self) -> Result<&mut FormState, EditError> {
        match self.ui.modal_mut() {
            Some(Modal::Json { form, .. }) => Ok(form),
            _ => Err(EditError::NoModal),
        }
    }

    /// Writes the complete document rebuilt from the form.
    ///
    /// A document that does not parse stops here with a validation message
    /// and never reaches the server. A failed write keeps the dialog open.
    pub async fn save_json(&mut self) -> Result<(), EditError> {
        let (index, extracted) = match self.ui.modal() {
            Some(Modal::Json { element, form }) => (*element, form.extract()),
            _ => return Err(EditError::NoModal),
        };
        let document = match extracted {
            Ok(document) => document,
            Err(err) => {
                self.ui.set_validation(format!("Invalid JSON: {err}"));
                return Err(err);
            }
        };
        let value = serde_json::to_string(&document)?;

        let element = self.element(index)?;
        let element_id = element.element_id.clone();
        let field = element.field.clone();

        match self.update(&element_id, &field, &value).await {
            Ok(()) => {
                self.ui.close_modal();
                self.elements[index].view = ElementView::Json { raw: value };
                info!("Saved structured content of element {element_id}");
                self.ui.notify(Level::Success, "Content updated successfully");
                self.ui.request_reload();
                Ok(())
            }
            Err(err) => {
                self.fail("Error updating content", &err);
                Err(err)
            }
        }
    }

    // --- edit mode ------------------------------------------------------

    pub async fn toggle_edit_mode(&mut self) -> Result<bool, EditError> {
        match self.api.toggle_edit_mode().await {
            Ok(edit_mode) => {
                self.ui.request_reload();
                Ok(edit_mode)
            }
            Err(err) => {
                self.fail("Error switching edit mode", &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;
    use std::sync::Mutex;
    use serde_json::{json, Value};
    use crate::modules::forms::ListKind;
    use crate::modules::types::{ImageView, LinkView, UploadResponse, VideoView};

    #[derive(Default)]
    struct FakeApi {
        documents: Mutex<HashMap<String, String>>,
        refused: HashSet<String>,
        offline: bool,
        updates: Mutex<Vec<(String, String, String)>>,
    }

    impl FakeApi {
        fn with_document(self, element_id: &str, document: Value) -> Self {
            self.documents
                .lock()
                .unwrap()
                .insert(element_id.to_string(), document.to_string());
            self
        }

        fn refusing(mut self, field: &str) -> Self {
            self.refused.insert(field.to_string());
            self
        }

        fn offline(mut self) -> Self {
            self.offline = true;
            self
        }

        fn document(&self, element_id: &str) -> Value {
            let raw = self.documents.lock().unwrap().get(element_id).cloned().unwrap_or_default();
            serde_json::from_str(&raw).unwrap()
        }

        fn updated_fields(&self) -> Vec<String> {
            self.updates.lock().unwrap().iter().map(|(_, f, _)| f.clone()).collect()
        }
    }

    impl ContentApi for FakeApi {
        async fn fetch_document(&self, element_id: &str) -> Result<String, EditError> {
            Ok(self.documents.lock().unwrap().get(element_id).cloned().unwrap_or_default())
        }

        async fn update_field(&self, element_id: &str, field: &str, value: &str) -> Result<bool, EditError> {
            if self.offline {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "offline").into());
            }
            self.updates
                .lock()
                .unwrap()
                .push((element_id.to_string(), field.to_string(), value.to_string()));
            if self.refused.contains(field) {
                return Ok(false);
            }
            if field == "json_content" {
                self.documents.lock().unwrap().insert(element_id.to_string(), value.to_string());
            }
            Ok(true)
        }

        async fn upload_image(
            &self,
            _element_id: &str,
            file_name: &str,
            _bytes: Vec<u8>,
        ) -> Result<UploadResponse, EditError> {
            if self.refused.contains("image") {
                return Ok(UploadResponse::new(false, ""));
            }
            Ok(UploadResponse::new(true, format!("/media/uploads/{file_name}")))
        }

        async fn toggle_edit_mode(&self) -> Result<bool, EditError> {
            Ok(false)
        }
    }

    fn text(id: &str, content: &str) -> EditableElement {
        EditableElement::new(id, EditableKind::Text, ElementView::Text { content: content.into() })
    }

    fn content_of(editor: &InlineEditor<FakeApi>, index: usize) -> String {
        match editor.element(index).unwrap().view() {
            ElementView::Text { content } => content.clone(),
            other => panic!("not text: {other:?}"),
        }
    }

    #[tokio::test]
    async fn saved_text_replaces_the_content() {
        let mut editor = InlineEditor::new(FakeApi::default(), vec![text("4", "Contact")]);
        editor.open_text(0).unwrap();
        editor.set_draft(0, "Contact us").unwrap();
        editor.save_text(0).await.unwrap();

        assert_eq!(content_of(&editor, 0), "Contact us");
        assert!(!editor.is_editing(0));
        assert_eq!(
            editor.api().updates.lock().unwrap()[0],
            ("4".to_string(), "description".to_string(), "Contact us".to_string())
        );
        assert_eq!(editor.ui().last_notification().unwrap().level, Level::Success);
    }

    #[tokio::test]
    async fn refused_text_rolls_back() {
        let api = FakeApi::default().refusing("description");
        let mut editor = InlineEditor::new(api, vec![text("4", "Before")]);
        editor.open_text(0).unwrap();
        editor.set_draft(0, "After").unwrap();

        let err = editor.save_text(0).await.unwrap_err();
        assert!(matches!(err, EditError::Rejected { .. }));
        assert_eq!(content_of(&editor, 0), "Before");
        let note = editor.ui().last_notification().unwrap();
        assert_eq!(note.to_string(), "[error] Error updating content");
    }

    #[tokio::test]
    async fn network_failure_rolls_back() {
        let mut editor = InlineEditor::new(FakeApi::default().offline(), vec![text("4", "Before")]);
        editor.open_text(0).unwrap();
        editor.set_draft(0, "After").unwrap();
        assert!(matches!(editor.save_text(0).await, Err(EditError::Io(_))));
        assert_eq!(content_of(&editor, 0), "Before");
    }

    #[tokio::test]
    async fn cancel_never_calls_the_server() {
        let mut editor = InlineEditor::new(FakeApi::default(), vec![text("4", "Before")]);
        editor.open_text(0).unwrap();
        editor.set_draft(0, "Draft").unwrap();
        editor.cancel_text(0).unwrap();
        assert_eq!(content_of(&editor, 0), "Before");
        assert!(editor.api().updated_fields().is_empty());
        assert!(matches!(editor.save_text(0).await, Err(EditError::NotEditing(0))));
    }

    #[test]
    fn one_text_area_per_element() {
        let mut editor = InlineEditor::new(FakeApi::default(), vec![text("4", "a"), text("5", "b")]);
        editor.open_text(0).unwrap();
        assert!(matches!(editor.open_text(0), Err(EditError::AlreadyEditing(0))));
        editor.open_text(1).unwrap();
        assert!(matches!(editor.open_text(7), Err(EditError::NoSuchElement(7))));
    }

    #[tokio::test]
    async fn highlight_edit_merges_into_the_fresh_document() {
        let stored = json!({"highlights": ["a", "b", "c"], "title": "Agafay"});
        let api = FakeApi::default().with_document("20", stored);
        let element = text("20", "b")
            .with_field("json_content")
            .with_partial(PartialRef::Highlight { index: 1, current: "b".into() });
        let mut editor = InlineEditor::new(api, vec![element]);

        // Someone else edited a sibling after the page was rendered.
        editor.api().documents.lock().unwrap().insert(
            "20".into(),
            json!({"highlights": ["A", "b", "c"], "title": "Agafay"}).to_string(),
        );

        editor.open_text(0).unwrap();
        editor.set_draft(0, "B").unwrap();
        editor.save_text(0).await.unwrap();

        assert_eq!(
            editor.api().document("20"),
            json!({"highlights": ["A", "B", "c"], "title": "Agafay"})
        );
        assert_eq!(
            editor.element(0).unwrap().partial(),
            Some(&PartialRef::Highlight { index: 1, current: "B".into() })
        );
    }

    fn image() -> EditableElement {
        EditableElement::new(
            "9",
            EditableKind::Image,
            ElementView::Image(ImageView {
                src: "/static/images/gallery-1.jpg".into(),
                class: Some("img-fluid".into()),
                style: Some("max-width:100%;".into()),
                loading: false,
            }),
        )
    }

    #[tokio::test]
    async fn uploaded_image_keeps_class_and_style() {
        let mut editor = InlineEditor::new(FakeApi::default(), vec![image()]);
        editor.replace_image(0, "dunes.jpg", vec![1, 2, 3]).await.unwrap();
        let ElementView::Image(view) = editor.element(0).unwrap().view() else {
            panic!("expected an image");
        };
        assert!(view.src.starts_with("/media/uploads/dunes.jpg?t="));
        assert_eq!(view.class.as_deref(), Some("img-fluid"));
        assert_eq!(view.style.as_deref(), Some("max-width:100%;"));
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn failed_upload_keeps_the_old_image() {
        let mut editor = InlineEditor::new(FakeApi::default().refusing("image"), vec![image()]);
        assert!(editor.replace_image(0, "dunes.jpg", vec![]).await.is_err());
        assert_eq!(editor.element(0).unwrap().view(), image().view());
    }

    #[tokio::test]
    async fn upload_in_flight_refuses_another() {
        let mut busy = image();
        if let ElementView::Image(view) = &mut busy.view {
            view.loading = true;
        }
        let mut editor = InlineEditor::new(FakeApi::default(), vec![busy.clone()]);
        assert!(matches!(
            editor.replace_image(0, "dunes.jpg", vec![1]).await,
            Err(EditError::AlreadyEditing(0))
        ));
        assert_eq!(editor.element(0).unwrap(), &busy);
        assert!(editor.ui().last_notification().is_none());
    }

    #[test]
    fn cache_bust_respects_existing_queries() {
        assert_eq!(cache_bust("/a.jpg", 5), "/a.jpg?t=5");
        assert_eq!(cache_bust("/a.jpg?w=300", 5), "/a.jpg?w=300&t=5");
    }

    fn video() -> EditableElement {
        EditableElement::new(
            "11",
            EditableKind::Video,
            ElementView::Video(VideoView { src: "/old.mp4".into(), reloads: 0 }),
        )
        .with_data_src("/old.mp4")
    }

    #[tokio::test]
    async fn video_dialog_closes_after_every_attempt() {
        let mut editor = InlineEditor::new(FakeApi::default(), vec![video()]);
        editor.open_video(0).unwrap();
        assert_eq!(editor.ui().modal(), Some(&Modal::Video { element: 0, url: "/old.mp4".into() }));
        editor.fill_video("/new.mp4").unwrap();
        editor.save_video().await.unwrap();
        assert!(editor.ui().modal().is_none());
        assert_eq!(
            editor.element(0).unwrap().view(),
            &ElementView::Video(VideoView { src: "/new.mp4".into(), reloads: 1 })
        );
        assert_eq!(editor.element(0).unwrap().data_src(), Some("/new.mp4"));

        let mut editor = InlineEditor::new(FakeApi::default().refusing("src"), vec![video()]);
        editor.open_video(0).unwrap();
        editor.fill_video("/new.mp4").unwrap();
        assert!(editor.save_video().await.is_err());
        assert!(editor.ui().modal().is_none());
        assert_eq!(editor.element(0).unwrap().view(), video().view());
    }

    fn link() -> EditableElement {
        EditableElement::new(
            "12",
            EditableKind::Link,
            ElementView::Link(LinkView { href: "theme/ourika".into(), text: "Read More".into() }),
        )
    }

    #[tokio::test]
    async fn link_saves_address_then_text() {
        let mut editor = InlineEditor::new(FakeApi::default(), vec![link()]);
        editor.open_link(0).unwrap();
        editor.fill_link("theme/imlil", "Discover Imlil").unwrap();
        editor.save_link().await.unwrap();
        assert_eq!(editor.api().updated_fields(), ["src", "title"]);
        assert_eq!(
            editor.element(0).unwrap().view(),
            &ElementView::Link(LinkView { href: "theme/imlil".into(), text: "Discover Imlil".into() })
        );
    }

    #[tokio::test]
    async fn link_text_failure_leaves_the_address_saved() {
        let mut editor = InlineEditor::new(FakeApi::default().refusing("title"), vec![link()]);
        editor.open_link(0).unwrap();
        editor.fill_link("theme/imlil", "Discover Imlil").unwrap();

        let err = editor.save_link().await.unwrap_err();
        assert!(matches!(err, EditError::PartialLinkUpdate(_)));
        assert_eq!(editor.api().updated_fields(), ["src", "title"]);
        assert_eq!(editor.element(0).unwrap().view(), link().view());
        assert!(editor.ui().modal().is_none());
    }

    #[tokio::test]
    async fn link_address_failure_skips_the_text() {
        let mut editor = InlineEditor::new(FakeApi::default().refusing("src"), vec![link()]);
        editor.open_link(0).unwrap();
        let err = editor.save_link().await.unwrap_err();
        assert!(matches!(err, EditError::Rejected { .. }));
        assert_eq!(editor.api().updated_fields(), ["src"]);
    }

    fn json_element(id: &str) -> EditableElement {
        EditableElement::new(id, EditableKind::Json, ElementView::Json { raw: String::new() })
    }

    #[tokio::test]
    async fn structured_edit_writes_the_whole_document() {
        let facts = json!({"items": [
            {"icon": "fas fa-map-marker-alt", "title": "50+", "text": "Destinations Covered"},
            {"icon": "fas fa-globe", "title": "1,000+", "text": "Happy Travelers"}
        ]});
        let api = FakeApi::default().with_document("30", facts);
        let mut editor = InlineEditor::new(api, vec![json_element("30")]);

        editor.open_json(0).await.unwrap();
        let form = editor.json_form_mut().unwrap();
        assert!(form.move_down(ListKind::Facts, 0).unwrap());
        editor.save_json().await.unwrap();

        let stored = editor.api().document("30");
        assert_eq!(stored["items"][0]["title"], "1,000+");
        assert_eq!(stored["items"][1]["title"], "50+");
        assert!(editor.ui().reload_requested());
        assert!(editor.ui().modal().is_none());
    }

    #[tokio::test]
    async fn unparsable_raw_json_never_reaches_the_server() {
        let api = FakeApi::default().with_document("31", json!({"foo": "bar"}));
        let mut editor = InlineEditor::new(api, vec![json_element("31")]);
        editor.open_json(0).await.unwrap();
        *editor.json_form_mut().unwrap() = FormState::Generic("{\"foo\": ".into());

        assert!(matches!(editor.save_json().await, Err(EditError::MalformedJson(_))));
        assert!(editor.api().updated_fields().is_empty());
        assert!(editor.ui().validation().unwrap().starts_with("Invalid JSON"));
        assert!(editor.json_form().is_some());
        assert_eq!(editor.api().document("31"), json!({"foo": "bar"}));
    }

    #[tokio::test]
    async fn dialogs_do_not_stack() {
        let api = FakeApi::default().with_document("30", json!({"price": "90€"}));
        let mut editor = InlineEditor::new(api, vec![json_element("30"), video()]);
        editor.open_video(1).unwrap();
        assert!(matches!(editor.open_json(0).await, Err(EditError::ModalOpen)));
        editor.cancel_modal().unwrap();
        editor.open_json(0).await.unwrap();
        assert!(matches!(editor.cancel_modal(), Ok(())));
        assert!(matches!(editor.cancel_modal(), Err(EditError::NoModal)));
    }

    #[test]
    fn kinds_are_checked() {
        let mut editor = InlineEditor::new(FakeApi::default(), vec![link()]);
        assert!(matches!(
            editor.open_video(0),
            Err(EditError::WrongKind { expected: EditableKind::Video, .. })
        ));
        assert!(matches!(editor.open_text(0), Err(EditError::WrongKind { .. })));
    }
}
