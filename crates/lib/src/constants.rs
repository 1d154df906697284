//! Constants used throughout the Startpage library.
//!
//! Field limits and the defaults applied by the import codec live here so the
//! validators, the storage schema and the codec agree on them.

/// Maximum number of links a single section may hold.
pub const MAX_LINKS_PER_SECTION: usize = 10;

/// Maximum length of a page title.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum length of a section or link name.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a link URL.
pub const MAX_URL_LEN: usize = 500;

/// Maximum length of an account username.
pub const MAX_USERNAME_LEN: usize = 150;

/// Title used when an import document omits one.
pub const DEFAULT_IMPORT_TITLE: &str = "Imported Page";

/// Section name used when an import document omits one.
pub const DEFAULT_SECTION_NAME: &str = "Untitled Section";

/// Link name used when an import document omits one.
pub const DEFAULT_LINK_NAME: &str = "Link";

/// Link URL used when an import document omits one.
pub const DEFAULT_LINK_URL: &str = "#";
