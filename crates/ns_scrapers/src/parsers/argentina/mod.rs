use ns_core::Result;
use super::{ParserRegistry, SiteParser};

pub mod infobae;
pub mod lanacion;
pub mod lapoliticaonline;

pub use infobae::InfobaeParser;
pub use lanacion::LaNacionParser;
pub use lapoliticaonline::LaPoliticaOnlineParser;

/// Register every Argentine front-page parser under its source name.
pub fn register_parsers(registry: &mut ParserRegistry) -> Result<()> {
    registry.register(LaNacionParser::NAME, || -> Box<dyn SiteParser> {
        Box::new(LaNacionParser::new())
    })?;
    registry.register(InfobaeParser::NAME, || -> Box<dyn SiteParser> {
        Box::new(InfobaeParser::new())
    })?;
    registry.register(LaPoliticaOnlineParser::NAME, || -> Box<dyn SiteParser> {
        Box::new(LaPoliticaOnlineParser::new())
    })?;
    Ok(())
}

/// Fresh instances of every Argentine parser.
pub fn get_parsers() -> Vec<Box<dyn SiteParser>> {
    vec![
        Box::new(LaNacionParser::new()),
        Box::new(InfobaeParser::new()),
        Box::new(LaPoliticaOnlineParser::new()),
    ]
}
