//! CSS selectors for the m.weibo.cn mobile timeline DOM.
//!
//! The mobile site renders one post per "card". Everything the scraper
//! touches is addressed by class name; keeping them in one place means a
//! site markup change is a one-file fix.

/// One whole post card on the timeline.
pub const POST_CARD: &str = ".card9";
/// Text-bearing div(s) inside a card.
pub const POST_TEXT: &str = ".weibo-text";
/// Timestamp element inside a card.
pub const POST_TIME: &str = ".time";
/// Media container (images and/or video) inside a card.
pub const MEDIA_WRAP: &str = ".weibo-media-wraps";
/// Inline video element on the timeline view.
pub const TIMELINE_VIDEO: &str = ".mwb-video";
/// One entry in the video player's quality menu.
pub const VIDEO_QUALITY_ITEM: &str = ".vjs-menu-item";
/// The `<video>` element inside the opened player.
pub const VIDEO_ELEMENT: &str = ".vjs-tech";
/// Button that closes/disposes the opened player.
pub const VIDEO_DISPOSE: &str = ".vjs-dispose-player";
/// Back button on a post's detail page.
pub const DETAIL_BACK: &str = ".nav-left";
/// Marker that the timeline view is showing again.
pub const TIMELINE_MARKER: &str = ".overlay";
/// Marker that a post's detail page has rendered.
pub const DETAIL_MARKER: &str = ".lite-page-tab";

/// Anchor tags, scanned inside text divs.
pub const ANCHOR: &str = "a";
/// Image tags, scanned inside the media container.
pub const IMAGE: &str = "img";

/// Marker text of the "full text" link on a truncated post.
pub const FULL_TEXT_MARKER: &str = "全文";
/// Marker text of an external "web link" anchor.
pub const WEB_LINK_MARKER: &str = "网页链接";
