use lazy_static::lazy_static;
use ns_core::ParsedArticleData;
use scraper::{ElementRef, Html, Selector};
use crate::parsers::utils::{closest, compact_text, image_from_attributes, non_empty, select_first};
use crate::parsers::{ExtractionError, SiteParser};

lazy_static! {
    static ref TITLE: Selector = Selector::parse("h2.title").unwrap();
    static ref LINK: Selector = Selector::parse("a").unwrap();
    static ref ANY_LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref IMG: Selector = Selector::parse("img").unwrap();
}

const IMAGE_ATTRIBUTES: &[&str] = &["src", "data-src", "srcset", "data-srcset"];

/// Headlines are bare `h2.title` elements; the photo lives somewhere in the
/// surrounding `div.item`, or in the wider `div.noticia` block.
#[derive(Debug, Clone, Default)]
pub struct LaPoliticaOnlineParser;

impl LaPoliticaOnlineParser {
    pub const NAME: &'static str = "lapoliticaonline";
    const BASE_URL: &'static str = "https://www.lapoliticaonline.com";
    const ALLOWED_HOSTS: &'static [&'static str] =
        &["www.lapoliticaonline.com", "lapoliticaonline.com"];

    pub fn new() -> Self {
        Self
    }

    fn image_in(&self, container: ElementRef<'_>, href: &str) -> Option<String> {
        let linked = container
            .select(&ANY_LINK)
            .filter(|link| link.value().attr("href") == Some(href))
            .find_map(|link| select_first(link, &IMG));

        linked
            .into_iter()
            .chain(select_first(container, &IMG))
            .find_map(|img| image_from_attributes(img, Self::BASE_URL, IMAGE_ATTRIBUTES))
    }

    fn extract_image_url(&self, title: ElementRef<'_>, href: &str) -> Option<String> {
        ["item", "noticia"]
            .iter()
            .filter_map(|class| closest(title, "div", class))
            .find_map(|container| self.image_in(container, href))
    }
}

impl SiteParser for LaPoliticaOnlineParser {
    fn source(&self) -> &str {
        Self::NAME
    }

    fn base_url(&self) -> &str {
        Self::BASE_URL
    }

    fn allowed_hosts(&self) -> &[&str] {
        Self::ALLOWED_HOSTS
    }

    fn article_elements<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&TITLE).collect()
    }

    fn parse_article_element(
        &self,
        title: ElementRef<'_>,
    ) -> Result<Option<ParsedArticleData>, ExtractionError> {
        let link = match select_first(title, &LINK) {
            Some(link) => link,
            None => return Ok(None),
        };
        let href = match link.value().attr("href") {
            Some(href) => href,
            None => return Ok(None),
        };
        let (url, headline) = match (self.resolve_url(href), non_empty(compact_text(link))) {
            (Some(url), Some(headline)) => (url, headline),
            _ => return Ok(None),
        };

        Ok(Some(
            ParsedArticleData::new(headline, url).image_url(self.extract_image_url(title, href)),
        ))
    }
}
