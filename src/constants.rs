/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 7/9/24
******************************************************************************/

pub(crate) const USER_AGENT_HEADER_KEY: &str = "user-agent";
pub(crate) const COOKIE_HEADER_KEY: &str = "cookie";
pub(crate) const SET_COOKIE_HEADER_KEY: &str = "set-cookie";
pub(crate) const APP_ID_HEADER_KEY: &str = "x-ig-app-id";

pub const DEFAULT_BASE_URL: &str = "https://i.instagram.com/api/v1";
pub const DEFAULT_USER_AGENT: &str =
    "Instagram 76.0.0.15.395 Android (24/7.0; 640dpi; 1440x2560; samsung; SM-G930F; herolte; samsungexynos8890; en_US; 138226743)";
pub const DEFAULT_APP_ID: &str = "567067343352427";

/// Where the session cookie is persisted between runs.
pub const DEFAULT_COOKIE_PATH: &str = "insta_cookie.json";

/// Days a freshly issued session cookie is considered valid.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 90;

/// Engagers analysed per run before random sampling kicks in.
pub const DEFAULT_ENGAGER_LIMIT: usize = 50;

/// Comments read per post when collecting the commenters of a post.
pub const ENGAGER_COMMENT_LIMIT: usize = 10;

/// Comments read per post when mining hashtags out of a comment section.
pub const HASHTAG_COMMENT_LIMIT: usize = 100;

/// Posts downloaded by `download_top_posts` when no count is given.
pub const DEFAULT_TOP_POSTS: usize = 10;

pub const DEFAULT_PHOTO_EXTENSION: &str = "png";

pub const WORD_CLOUD_WIDTH: u32 = 2000;
pub const WORD_CLOUD_HEIGHT: u32 = 1000;
pub const WORD_CLOUD_SEED: u64 = 40;
pub const WORD_CLOUD_FILE_SUFFIX: &str = "_ht_word_cloud.png";
pub const DEFAULT_STOPWORDS: &[&str] = &["photography"];
/// Tried in order when no font file is configured.
pub const FALLBACK_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];
