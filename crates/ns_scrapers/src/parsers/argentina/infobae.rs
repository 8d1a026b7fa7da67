use lazy_static::lazy_static;
use ns_core::ParsedArticleData;
use scraper::{ElementRef, Html, Selector};
use crate::parsers::utils::{compact_text, image_from_attributes, non_empty, select_first};
use crate::parsers::{ExtractionError, SiteParser};

lazy_static! {
    static ref CARD: Selector = Selector::parse(".story-card-ctn").unwrap();
    static ref ANY_LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref HEADLINE: Selector = Selector::parse("h2.story-card-hl").unwrap();
    static ref ANY_H2: Selector = Selector::parse("h2").unwrap();
    static ref DECK: Selector = Selector::parse("h3.story-card-deck").unwrap();
    static ref CARD_IMG: Selector = Selector::parse("img.story-card-img").unwrap();
    static ref ANY_IMG: Selector = Selector::parse("img").unwrap();
}

// Lazy-loaded images keep the real URL in data-* attributes.
const IMAGE_ATTRIBUTES: &[&str] = &["data-src", "data-srcset", "srcset", "src"];

#[derive(Debug, Clone, Default)]
pub struct InfobaeParser;

impl InfobaeParser {
    pub const NAME: &'static str = "infobae";
    const BASE_URL: &'static str = "https://www.infobae.com";
    const ALLOWED_HOSTS: &'static [&'static str] = &["www.infobae.com", "infobae.com"];

    pub fn new() -> Self {
        Self
    }

    // The card's own href first, then any nested link that resolves.
    fn extract_url(&self, card: ElementRef<'_>) -> Option<String> {
        card.value()
            .attr("href")
            .and_then(|href| self.resolve_url(href))
            .or_else(|| {
                card.select(&ANY_LINK)
                    .filter_map(|link| link.value().attr("href"))
                    .find_map(|href| self.resolve_url(href))
            })
    }

    fn extract_headline(card: ElementRef<'_>) -> Option<String> {
        [&*HEADLINE, &*ANY_H2]
            .into_iter()
            .flat_map(|selector| card.select(selector))
            .find_map(|heading| non_empty(compact_text(heading)))
    }

    fn extract_summary(card: ElementRef<'_>) -> Option<String> {
        select_first(card, &DECK).map(compact_text).and_then(non_empty)
    }

    fn extract_image_url(&self, card: ElementRef<'_>) -> Option<String> {
        let img = select_first(card, &CARD_IMG).or_else(|| select_first(card, &ANY_IMG))?;
        image_from_attributes(img, Self::BASE_URL, IMAGE_ATTRIBUTES)
    }
}

impl SiteParser for InfobaeParser {
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

#[cfg(test)]
mod tests {
    use super::*;

    const FRONT_PAGE: &str = r#"
        <html><body>
          <a class="story-card-ctn" href="/politica/2024/01/10/el-congreso-debate/">
            <h2 class="story-card-hl"><span>EN VIVO</span> El Congreso debate la ley</h2>
            <h3 class="story-card-deck">Sesión maratónica en Diputados</h3>
            <img class="story-card-img" src="data:image/gif;base64,R0lGOD" data-src="https://www.infobae.com/resizer/a.jpg">
          </a>
          <div class="story-card-ctn">
            <a href="https://www.infobae.com/economia/2024/01/10/dolar/">
              <h2>Dólar hoy</h2>
            </a>
            <img srcset="//www.infobae.com/resizer/b.jpg 420w, //www.infobae.com/resizer/c.jpg 840w">
          </div>
          <a class="story-card-ctn" href="https://www.youtube.com/watch?v=abc">
            <h2 class="story-card-hl">Video externo</h2>
          </a>
          <a class="story-card-ctn" href="/sociedad/2024/01/10/sin-titulo/"></a>
        </body></html>
    "#;

    #[test]
    fn test_parse_front_page() {
        let articles = InfobaeParser::new().parse(FRONT_PAGE);
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.position(), 1);
        assert_eq!(first.headline(), "EN VIVOEl Congreso debate la ley");
        assert_eq!(
            first.url(),
            "https://www.infobae.com/politica/2024/01/10/el-congreso-debate/"
        );
        assert_eq!(first.summary(), Some("Sesión maratónica en Diputados"));
        assert_eq!(first.image_url(), Some("https://www.infobae.com/resizer/a.jpg"));

        let second = &articles[1];
        assert_eq!(second.position(), 2);
        assert_eq!(second.headline(), "Dólar hoy");
        assert_eq!(second.summary(), None);
        assert_eq!(second.image_url(), Some("https://www.infobae.com/resizer/b.jpg"));
    }

    #[test]
    fn test_empty_card_href_uses_nested_link() {
        let page = r#"
            <div class="story-card-ctn" href="">
              <a href="/economia/2024/01/10/x/"><h2>Economía</h2></a>
            </div>
        "#;
        let articles = InfobaeParser::new().parse(page);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url(), "https://www.infobae.com/economia/2024/01/10/x/");
    }

    #[test]
    fn test_blank_headline_falls_back_to_other_h2() {
        let page = r#"
            <a class="story-card-ctn" href="/politica/2024/01/10/nota/">
              <h2 class="story-card-hl"> </h2>
              <h2>Titular</h2>
            </a>
        "#;
        let articles = InfobaeParser::new().parse(page);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].headline(), "Titular");
    }
}
