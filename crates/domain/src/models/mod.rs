//! Domain models for the wiki admin backend.

pub mod page;
pub mod settings;
pub mod user;
pub mod user_query;

pub use page::{Page, PageGrant, PageRange, PageSummary, TRASH_PATH_PREFIX};
pub use settings::{
    keys, normalize_site_url, CustomizeFunctionParams, PageListTier, SiteUrlParams,
    CONFIG_NAMESPACE, PAGE_LIST_LIMIT_CHOICES,
};
pub use user::{
    expand_status_labels, InvitedUser, NewInvitedUser, PublicUser, StatusLabel, User,
    UserStatus, USER_PUBLIC_FIELDS,
};
pub use user_query::{
    build_user_list_query, SearchPattern, SortOrder, UserListFilter, UserListOptions,
    UserListQuery, UserSortField, USER_LIST_PAGE_SIZE,
};
