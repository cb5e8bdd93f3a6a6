//! CSV rendering.
//!
//! Fixed header `username,uid,text,time,images,video,links,url`. Every
//! field is quoted; multi-value fields (images, links) are newline-joined
//! inside their quotes, absent video/url render as the empty string.

use crate::post::Post;

const HEADER: &str = "username,uid,text,time,images,video,links,url\n";

/// Render the post set as a CSV document.
#[must_use]
pub fn render(posts: &[Post]) -> String {
    let mut out = String::from(HEADER);
    for post in posts {
        let fields = [
            post.author.display_name.clone().unwrap_or_default(),
            post.author.numeric_id.to_string(),
            post.body_text.clone(),
            super::format_time(&post.published_at),
            post.full_image_urls.join("\n"),
            post.video_url.clone().unwrap_or_default(),
            post.external_links.join("\n"),
            post.canonical_url.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::Author;
    use chrono::NaiveDate;

    fn post(n: u32) -> Post {
        Post {
            author: Author {
                display_name: None,
                numeric_id: 42,
            },
            body_text: format!("post {n}\n"),
            published_at: NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(12, n, 0)
                .unwrap(),
            thumbnail_image_urls: vec![],
            full_image_urls: vec![
                "https://img/large/a.jpg".to_string(),
                "https://img/large/b.jpg".to_string(),
            ],
            video_url: None,
            external_links: vec![],
            canonical_url: None,
            dedup_fingerprint: format!("fp{n}"),
            truncated: false,
            video_fingerprint: None,
        }
    }

    #[test]
    fn header_plus_one_row_per_post() {
        let rendered = render(&[post(1), post(2)]);
        let lines: Vec<&str> = rendered.split('\n').collect();
        assert!(lines[0].starts_with("username,uid,"));
        // Each post body contains one embedded newline, and the images
        // field another, so a row spans three physical lines.
        assert!(rendered.contains("\"42\""));
        assert!(rendered.contains("https://img/large/a.jpg\nhttps://img/large/b.jpg"));
    }

    #[test]
    fn absent_video_and_url_are_empty_strings() {
        let rendered = render(&[post(1)]);
        assert!(rendered.trim_end().ends_with("\"\",\"\",\"\""));
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn empty_set_is_just_the_header() {
        assert_eq!(render(&[]), HEADER);
    }
}
