//! Domain services for the wiki admin backend.
//!
//! Services contain logic that operates on domain models through the
//! directory traits.

pub mod directory;
pub mod page_limit;
pub mod settings;

pub use directory::{ConfigLookup, DirectoryError, PageDirectory, UserDirectory};
pub use page_limit::{
    configured_limit, resolve_page_limit, resolve_page_list_limit, DEFAULT_PAGE_LIST_LIMIT,
    MAX_RECENT_PAGES_LIMIT,
};
