pub mod format;
pub mod http;
pub mod js;
pub mod model;
mod render;

pub use http::{render_http, HttpMethod, HttpRequest};
pub use js::render_supabase_js;
pub use render::RenderError;
