pub mod images;
pub mod links;
pub mod text;

pub use images::{first_srcset_url, image_from_attributes, is_data_uri, resolve_image_url};
pub use links::resolve_url;
pub use text::{closest, compact_text, full_text, has_class, non_empty, select_first};
