use lazy_static::lazy_static;
use ns_core::ParsedArticleData;
use scraper::{ElementRef, Html, Selector};
use crate::parsers::utils::{compact_text, full_text, image_from_attributes, non_empty, select_first};
use crate::parsers::{ExtractionError, SiteParser};

lazy_static! {
    static ref CARD: Selector = Selector::parse("article.ln-card").unwrap();
    static ref CARD_LINK: Selector = Selector::parse("a.ln-link").unwrap();
    static ref ANY_LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref H1: Selector = Selector::parse("h1").unwrap();
    static ref H2: Selector = Selector::parse("h2").unwrap();
    static ref H3: Selector = Selector::parse("h3").unwrap();
    static ref IMG: Selector = Selector::parse("img").unwrap();
}

const IMAGE_ATTRIBUTES: &[&str] = &["src", "data-src", "srcset", "data-srcset"];

#[derive(Debug, Clone, Default)]
pub struct LaNacionParser;

impl LaNacionParser {
    pub const NAME: &'static str = "lanacion";
    const BASE_URL: &'static str = "https://www.lanacion.com.ar";
    const ALLOWED_HOSTS: &'static [&'static str] = &["www.lanacion.com.ar", "lanacion.com.ar"];

    pub fn new() -> Self {
        Self
    }

    // The ln-link anchor first, then any other link in the card that resolves.
    fn extract_url(&self, card: ElementRef<'_>) -> Option<String> {
        select_first(card, &CARD_LINK)
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| self.resolve_url(href))
            .or_else(|| {
                card.select(&ANY_LINK)
                    .filter_map(|link| link.value().attr("href"))
                    .find_map(|href| self.resolve_url(href))
            })
    }

    fn extract_headline(card: ElementRef<'_>) -> Option<String> {
        [&*H1, &*H2]
            .into_iter()
            .filter_map(|selector| select_first(card, selector))
            .find_map(|heading| non_empty(full_text(heading)))
    }

    // Cards with an h1 headline use the h2 as kicker text.
    fn extract_summary(card: ElementRef<'_>) -> Option<String> {
        let kicker = match (select_first(card, &H1), select_first(card, &H2)) {
            (Some(_), Some(h2)) => non_empty(compact_text(h2)),
            _ => None,
        };
        kicker.or_else(|| select_first(card, &H3).map(compact_text).and_then(non_empty))
    }

    fn extract_image_url(&self, card: ElementRef<'_>) -> Option<String> {
        let img = select_first(card, &IMG)?;
        image_from_attributes(img, Self::BASE_URL, IMAGE_ATTRIBUTES)
    }
}

impl SiteParser for LaNacionParser {
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
        document.select(&CARD).collect()
    }

    fn parse_article_element(
        &self,
        card: ElementRef<'_>,
    ) -> Result<Option<ParsedArticleData>, ExtractionError> {
        let (url, headline) = match (self.extract_url(card), Self::extract_headline(card)) {
            (Some(url), Some(headline)) => (url, headline),
            _ => return Ok(None),
        };

        Ok(Some(
            ParsedArticleData::new(headline, url)
                .summary(Self::extract_summary(card))
                .image_url(self.extract_image_url(card)),
        ))
    }
}
