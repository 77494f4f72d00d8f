pub mod access_service;
pub mod file_service;
pub mod markdown_service;
pub mod search_service;

pub use access_service::AccessService;
pub use file_service::FileService;
pub use markdown_service::MarkdownService;
pub use search_service::SearchService;
