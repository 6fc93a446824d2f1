//! Resource rewriting and metadata extraction.
//!
//! Every resource-bearing element has its reference resolved and the
//! attribute replaced by the normalized URL or a `cid:` link. The document
//! title and publish date are collected during the same pass.

use std::cell::{Cell, RefCell};

use lol_html::html_content::Element;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};

use super::{collapse_whitespace, unescape_text};
use crate::resource::{ContentIdTable, Resolver};

/// `<meta>` tags holding a publish date, highest priority first.
pub const PUBLISH_DATE_SELECTORS: &[&str] = &[
    "meta[name=\"inostar:publish\" i]",
    "meta[property=\"article:published_time\" i]",
    "meta[name=\"pubdate\" i]",
];

/// Elements whose references are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceElement {
    Img,
    Video,
    Link,
    Source,
}

impl ResourceElement {
    /// All resource-bearing elements, in no particular order.
    pub const ALL: [Self; 4] = [Self::Img, Self::Video, Self::Link, Self::Source];

    /// Tag name.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Img => "img",
            Self::Video => "video",
            Self::Link => "link",
            Self::Source => "source",
        }
    }

    /// Attribute holding the reference.
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Link => "href",
            Self::Img | Self::Video | Self::Source => "src",
        }
    }
}

/// Document metadata collected while rewriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Text of the first `<title>`, decoded and whitespace-collapsed.
    pub title: Option<String>,
    /// Non-empty publish date values, in [`PUBLISH_DATE_SELECTORS`] order.
    pub publish_dates: Vec<String>,
}

/// Output of the rewriting pass.
#[derive(Debug, Clone)]
pub struct Rewritten {
    /// Serialized markup.
    pub html: String,
    /// Collected metadata.
    pub metadata: Metadata,
    /// Attributes that were rewritten.
    pub rewritten: usize,
    /// References that could not be resolved and were left as they were.
    pub unresolved: usize,
}

#[derive(Default)]
struct PassState {
    titles_seen: Cell<usize>,
    title: RefCell<String>,
    publish_dates: RefCell<Vec<Option<String>>>,
    rewritten: Cell<usize>,
    unresolved: Cell<usize>,
}

/// Resolve every resource reference in `html`.
///
/// Failures for individual references are logged and leave the attribute
/// untouched; only a failure of the rewriter itself is returned.
pub fn rewrite_resources(
    html: &str,
    resolver: &Resolver,
    table: &mut ContentIdTable,
) -> Result<Rewritten, lol_html::errors::RewritingError> {
    let state = PassState {
        publish_dates: RefCell::new(vec![None; PUBLISH_DATE_SELECTORS.len()]),
        ..PassState::default()
    };
    let table = RefCell::new(table);

    let mut handlers = Vec::new();

    for kind in ResourceElement::ALL {
        let state = &state;
        let table = &table;
        handlers.push(element!(kind.tag(), move |el| {
            resolve_element(el, kind, resolver, &mut table.borrow_mut(), state)?;
            Ok(())
        }));
    }

    handlers.push(element!("title", |_el| {
        state.titles_seen.set(state.titles_seen.get() + 1);
        Ok(())
    }));
    handlers.push(text!("title", |chunk| {
        if state.titles_seen.get() == 1 {
            state.title.borrow_mut().push_str(chunk.as_str());
        }
        Ok(())
    }));

    for (priority, selector) in PUBLISH_DATE_SELECTORS.iter().enumerate() {
        let state = &state;
        handlers.push(element!(*selector, move |el| {
            let content = el.get_attribute("content").unwrap_or_default();
            let mut dates = state.publish_dates.borrow_mut();
            if dates[priority].is_none() && !content.trim().is_empty() {
                dates[priority] = Some(unescape_text(content.trim()));
            }
            Ok(())
        }));
    }

    let html = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )?;

    let title = (state.titles_seen.get() > 0)
        .then(|| collapse_whitespace(&unescape_text(&state.title.borrow())));

    Ok(Rewritten {
        html,
        metadata: Metadata {
            title,
            publish_dates: state.publish_dates.take().into_iter().flatten().collect(),
        },
        rewritten: state.rewritten.get(),
        unresolved: state.unresolved.get(),
    })
}

fn resolve_element(
    el: &mut Element<'_, '_>,
    kind: ResourceElement,
    resolver: &Resolver,
    table: &mut ContentIdTable,
    state: &PassState,
) -> Result<(), lol_html::errors::AttributeNameError> {
    let attribute = kind.attribute();
    let Some(reference) = el.get_attribute(attribute) else {
        return Ok(());
    };

    match resolver.resolve(&reference, table) {
        Ok(resolution) => {
            if let Some(value) = resolution.attribute_value() {
                el.set_attribute(attribute, &value)?;
                state.rewritten.set(state.rewritten.get() + 1);
            }
        }
        Err(e) => {
            tracing::warn!(element = kind.tag(), error = %e, "Reference left unresolved");
            state.unresolved.set(state.unresolved.get() + 1);
        }
    }
    Ok(())
}
