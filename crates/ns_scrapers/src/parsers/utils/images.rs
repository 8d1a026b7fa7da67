use scraper::ElementRef;
use url::Url;

/// First URL of a `srcset` attribute, without its width/density descriptor.
pub fn first_srcset_url(srcset: &str) -> Option<String> {
    let first = srcset.split(',').next()?.trim();
    first.split_whitespace().next().map(str::to_string)
}

/// Make an image `src` absolute. Protocol-relative sources get `https:`,
/// root-relative ones are joined to `base_url`, anything else is returned
/// as is.
pub fn resolve_image_url(base_url: &str, src: &str) -> String {
    if src.starts_with("//") {
        return format!("https:{}", src);
    }
    if src.starts_with('/') {
        return Url::parse(base_url)
            .and_then(|base| base.join(src))
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", base_url.trim_end_matches('/'), src));
    }
    src.to_string()
}

pub fn is_data_uri(src: &str) -> bool {
    src.trim_start().starts_with("data:")
}

/// Read the first usable image URL from `img`, trying `attributes` in order.
/// Attributes whose name ends in `srcset` are reduced to their first entry.
/// Inline `data:` placeholders are skipped.
pub fn image_from_attributes(img: ElementRef<'_>, base_url: &str, attributes: &[&str]) -> Option<String> {
    attributes.iter().find_map(|attr| {
        let value = img.value().attr(attr)?.trim();
        let src = if attr.ends_with("srcset") {
            first_srcset_url(value)?
        } else {
            value.to_string()
        };
        if src.is_empty() || is_data_uri(&src) {
            None
        } else {
            Some(resolve_image_url(base_url, &src))
        }
    })
}
