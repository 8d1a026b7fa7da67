use scraper::{ElementRef, Selector};

pub fn select_first<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

/// All descendant text, trimmed at the ends. Inner spacing is kept.
pub fn full_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Each descendant text node trimmed, then concatenated with no separator.
pub fn compact_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}

pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Nearest ancestor with the given tag name and class.
pub fn closest<'a>(element: ElementRef<'a>, tag: &str, class: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == tag && has_class(*ancestor, class))
}

pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
