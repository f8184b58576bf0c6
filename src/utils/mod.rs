pub mod logging;
pub mod slug;
pub mod urlencode;

pub use slug::slugify;
pub use urlencode::{encode_component, encode_query};
