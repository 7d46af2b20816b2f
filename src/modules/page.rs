use std::collections::HashMap;
use std::io;
use log::warn;
use scraper::{ElementRef, Html, Selector};
use crate::modules::error::EditError;
use crate::modules::types::{
    EditableElement, EditableKind, ElementView, ImageView, LinkView, PartialRef, VideoView,
};

fn selector(css: &str) -> Result<Selector, EditError> {
    Selector::parse(css)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()).into())
}

fn non_empty<'a>(node: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    node.value().attr(name).filter(|value| !value.trim().is_empty())
}

/// Collects every editable region of a rendered page, in document order.
pub fn scan_page(html: &str) -> Result<Vec<EditableElement>, EditError> {
    let document = Html::parse_document(html);
    let editable_sel = selector("[data-editable]")?;
    let img_sel = selector("img")?;
    let source_sel = selector("video source")?;

    // Highlights of one record are numbered in the order they are rendered.
    let mut highlight_counts: HashMap<String, usize> = HashMap::new();
    let mut elements = Vec::new();

    for node in document.select(&editable_sel) {
        let kind_attr = node.value().attr("data-editable").unwrap_or_default();
        let Some(kind) = EditableKind::from_attr(kind_attr) else {
            warn!("Skipping element with unsupported data-editable=\"{kind_attr}\"");
            continue;
        };
        let Some(element_id) = non_empty(&node, "data-element-id") else {
            warn!("Skipping {kind} element without data-element-id");
            continue;
        };
        let text: String = node.text().collect();

        let view = match kind {
            EditableKind::Text => ElementView::Text { content: text },
            EditableKind::Json => ElementView::Json { raw: text.trim().to_string() },
            EditableKind::Image => {
                let Some(img) = node.select(&img_sel).next() else {
                    warn!("Skipping image element {element_id} without an <img>");
                    continue;
                };
                ElementView::Image(ImageView {
                    src: img.value().attr("src").unwrap_or_default().to_string(),
                    class: img.value().attr("class").map(str::to_string),
                    style: img.value().attr("style").map(str::to_string),
                    loading: false,
                })
            }
            EditableKind::Video => {
                let src = non_empty(&node, "data-src")
                    .or_else(|| node.select(&source_sel).next().and_then(|s| s.value().attr("src")))
                    .unwrap_or_default();
                ElementView::Video(VideoView { src: src.to_string(), reloads: 0 })
            }
            EditableKind::Link => ElementView::Link(LinkView {
                href: node.value().attr("href").unwrap_or("#").to_string(),
                text: text.trim().to_string(),
            }),
        };

        let mut element = EditableElement::new(element_id, kind, view);
        if let Some(field) = non_empty(&node, "data-field") {
            element = element.with_field(field);
        }
        if let Some(text_field) = non_empty(&node, "data-text-field") {
            element = element.with_text_field(text_field);
        }
        if let Some(src) = node.value().attr("data-src") {
            element = element.with_data_src(src);
        }

        if let Some(current) = node.value().attr("data-highlight-item") {
            let counter = highlight_counts.entry(element_id.to_string()).or_default();
            element = element.with_partial(PartialRef::Highlight {
                index: *counter,
                current: current.to_string(),
            });
            *counter += 1;
        } else if node.value().attr("data-submit-text").is_some() {
            element = element.with_partial(PartialRef::SubmitText);
        } else if let Some(name) = non_empty(&node, "data-form-field") {
            element = element.with_partial(PartialRef::FormField { name: name.to_string() });
        }

        elements.push(element);
    }

    Ok(elements)
}
