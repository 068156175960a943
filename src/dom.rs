//! Small structural queries over a parsed page: first match of a selector,
//! rows whose class starts with a prefix, and the detail sibling that
//! follows a row. The extractor only talks to the page through these.

use scraper::{ElementRef, Html, Selector};

pub fn parse_selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|err| format!("invalid selector {css:?}: {err:?}"))
}

pub fn find_first<'a>(doc: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    doc.select(selector).next()
}

pub fn find_within<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub fn has_class_prefix(el: ElementRef<'_>, prefix: &str) -> bool {
    el.value().classes().any(|c| c.starts_with(prefix))
}

/// Descendant `tag` elements of `scope` carrying a class that begins with
/// `prefix`, in document order.
pub fn descendants_with_class_prefix<'a>(
    scope: ElementRef<'a>,
    tag: &'a str,
    prefix: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag && has_class_prefix(*el, prefix))
}

/// Walks the element siblings after `el` and returns the first one carrying
/// `class`, giving up as soon as `stop` matches a sibling.
pub fn next_sibling_with_class<'a, F>(
    el: ElementRef<'a>,
    class: &str,
    stop: F,
) -> Option<ElementRef<'a>>
where
    F: Fn(ElementRef<'a>) -> bool,
{
    for sibling in el.next_siblings().filter_map(ElementRef::wrap) {
        if has_class(sibling, class) {
            return Some(sibling);
        }
        if stop(sibling) {
            return None;
        }
    }
    None
}

pub fn child_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// Visible text with runs of whitespace collapsed to single spaces.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
