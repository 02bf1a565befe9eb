use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as listed on a monthly archive page, before its own page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStub {
    pub title: String,
    pub author: String,
    pub relative_url: String,
    pub full_url: String,
    pub slug: String,
    #[serde(default)]
    pub summary: String,
}

/// A hydrated post: the stub plus everything read from the post page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub stub: PostStub,
    pub published_at: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub meta: ExportMeta,
    pub data: ExportData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMeta {
    pub exported_on: i64,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub posts: Vec<ExportPost>,
    pub tags: Vec<ExportTag>,
    pub posts_tags: Vec<PostTagLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPost {
    pub id: u32,
    pub uuid: String,
    pub title: String,
    pub slug: String,
    pub markdown: String,
    pub html: String,
    pub image: Option<String>,
    pub featured: u8,
    pub page: u8,
    pub status: String,
    pub language: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub author_id: u32,
    pub created_at: i64,
    pub created_by: u32,
    pub updated_at: i64,
    pub updated_by: u32,
    pub published_at: i64,
    pub published_by: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTag {
    pub id: u32,
    pub uuid: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<u32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: i64,
    pub created_by: u32,
    pub updated_at: i64,
    pub updated_by: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTagLink {
    pub id: u32,
    pub post_id: u32,
    pub tag_id: u32,
}

/// Final path segment of `path` with its extension removed:
/// `/archive/2014/03/my-post.aspx` becomes `my-post`.
pub fn slug_from_path(path: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_owned(),
        _ => last.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_path_strips_extension() {
        assert_eq!(slug_from_path("/archive/2014/03/my-post.aspx"), "my-post");
        assert_eq!(slug_from_path("my.dotted.post.aspx"), "my.dotted.post");
        assert_eq!(slug_from_path("/archive/no-extension"), "no-extension");
    }

    #[test]
    fn slug_from_path_keeps_leading_dot_names_and_empty_tails() {
        assert_eq!(slug_from_path("/.hidden"), ".hidden");
        assert_eq!(slug_from_path("/b/blog/"), "");
    }

    #[test]
    fn post_serializes_stub_fields_flat() -> anyhow::Result<()> {
        let post = Post {
            stub: PostStub {
                title: "Hello".to_owned(),
                author: "Someone".to_owned(),
                relative_url: "/b/blog/archive/2014/03/10/hello.aspx".to_owned(),
                full_url: "http://old.example/b/blog/archive/2014/03/10/hello.aspx".to_owned(),
                slug: "hello".to_owned(),
                summary: String::new(),
            },
            published_at: DateTime::parse_from_rfc3339("2014-03-10T09:00:00Z")?.with_timezone(&Utc),
            content: "<p>hi</p>".to_owned(),
            tags: vec!["Azure".to_owned()],
        };

        let value = serde_json::to_value(&post)?;
        assert_eq!(value["slug"], "hello");
        assert_eq!(value["tags"][0], "Azure");

        let back: Post = serde_json::from_value(value)?;
        assert_eq!(back, post);
        Ok(())
    }
}
