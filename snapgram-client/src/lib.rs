mod config;
pub use config::{BackendConfig, StoreConfig};

mod error;
pub use error::Error;

mod http;
pub use http::HttpBackend;

mod list;
pub use list::CommentList;

mod section;
pub use section::{CommentSection, CurrentUser};

mod store;
pub use store::CommentStore;

mod fuzz;

pub mod api {
    pub use snapgram_api::*;
}
