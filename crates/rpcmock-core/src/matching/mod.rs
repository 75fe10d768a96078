//! URL pattern and header utilities.

mod headers;
mod url;

pub use self::headers::{from_header_map, is_json_content_type, to_header_map};
pub use self::url::{method_name_from_url, method_pattern, request_path, service_pattern, url_matches};
