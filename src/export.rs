use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::formats::{
    ExportData, ExportDocument, ExportMeta, ExportPost, ExportTag, Post, PostTagLink,
};

pub const SCHEMA_VERSION: &str = "000";
pub const POST_STATUS: &str = "published";
pub const DEFAULT_AUTHOR_ID: u32 = 1;
pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// The single identity every entity is attributed to.
    pub author_id: u32,
    pub language: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            author_id: DEFAULT_AUTHOR_ID,
            language: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}

/// Projects the final post list onto the export schema.
///
/// Surrogate ids are 1-based and follow input order: posts in list order,
/// tags in first-seen order, links in (post, tag-within-post) order.
pub fn build_export(
    posts: &[Post],
    options: &ExportOptions,
    exported_at: DateTime<Utc>,
) -> ExportDocument {
    let exported_on = exported_at.timestamp_millis();

    let mut tag_ids: HashMap<&str, u32> = HashMap::new();
    let mut tags = Vec::new();
    for name in posts.iter().flat_map(|post| post.tags.iter()) {
        if tag_ids.contains_key(name.as_str()) {
            continue;
        }
        let id = next_id(tags.len());
        tag_ids.insert(name.as_str(), id);
        tags.push(ExportTag {
            id,
            uuid: Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("tag:{name}").as_bytes()).to_string(),
            name: name.clone(),
            slug: tag_slug(name),
            description: None,
            parent_id: None,
            meta_title: None,
            meta_description: None,
            created_at: exported_on,
            created_by: options.author_id,
            updated_at: exported_on,
            updated_by: options.author_id,
        });
    }

    let mut export_posts = Vec::with_capacity(posts.len());
    let mut posts_tags = Vec::new();
    for (index, post) in posts.iter().enumerate() {
        let post_id = next_id(index);
        export_posts.push(export_post(post, post_id, options));

        let mut linked = HashSet::new();
        for name in &post.tags {
            let Some(&tag_id) = tag_ids.get(name.as_str()) else {
                continue;
            };
            if !linked.insert(tag_id) {
                continue;
            }
            posts_tags.push(PostTagLink {
                id: next_id(posts_tags.len()),
                post_id,
                tag_id,
            });
        }
    }

    ExportDocument {
        meta: ExportMeta {
            exported_on,
            version: SCHEMA_VERSION.to_owned(),
        },
        data: ExportData {
            posts: export_posts,
            tags,
            posts_tags,
        },
    }
}

fn export_post(post: &Post, id: u32, options: &ExportOptions) -> ExportPost {
    let published = post.published_at.timestamp_millis();
    ExportPost {
        id,
        uuid: Uuid::new_v5(&Uuid::NAMESPACE_URL, post.stub.full_url.as_bytes()).to_string(),
        title: post.stub.title.clone(),
        slug: post.stub.slug.clone(),
        markdown: post.content.clone(),
        html: post.content.clone(),
        image: None,
        featured: 0,
        page: 0,
        status: POST_STATUS.to_owned(),
        language: options.language.clone(),
        meta_title: None,
        meta_description: None,
        author_id: options.author_id,
        created_at: published,
        created_by: options.author_id,
        updated_at: published,
        updated_by: options.author_id,
        published_at: published,
        published_by: options.author_id,
    }
}

fn next_id(count: usize) -> u32 {
    u32::try_from(count + 1).unwrap_or(u32::MAX)
}

/// Lowercased name with every run of non-alphanumeric characters replaced
/// by a single `-`. Collisions between different names are not resolved.
pub fn tag_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::PostStub;

    fn post(slug: &str, tags: &[&str]) -> Post {
        Post {
            stub: PostStub {
                title: slug.to_uppercase(),
                author: "Ahmed Sabbour".to_owned(),
                relative_url: format!("/b/blog/archive/2014/03/10/{slug}.aspx"),
                full_url: format!("http://blogs.example/b/blog/archive/2014/03/10/{slug}.aspx"),
                slug: slug.to_owned(),
                summary: String::new(),
            },
            published_at: DateTime::parse_from_rfc3339("2014-03-10T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            content: format!("<p>{slug}</p>"),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    fn exported_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn tags_are_deduplicated_in_first_seen_order() {
        let posts = [post("one", &["A", "B"]), post("two", &["B", "C"])];
        let doc = build_export(&posts, &ExportOptions::default(), exported_at());

        let tags = doc
            .data
            .tags
            .iter()
            .map(|t| (t.name.as_str(), t.id))
            .collect::<Vec<_>>();
        assert_eq!(tags, [("A", 1), ("B", 2), ("C", 3)]);

        let links = doc
            .data
            .posts_tags
            .iter()
            .map(|l| (l.id, l.post_id, l.tag_id))
            .collect::<Vec<_>>();
        assert_eq!(links, [(1, 1, 1), (2, 1, 2), (3, 2, 2), (4, 2, 3)]);
    }

    #[test]
    fn posts_get_sequential_ids_and_static_fields() {
        let posts = [post("one", &[]), post("two", &[])];
        let options = ExportOptions {
            author_id: 7,
            language: "en-GB".to_owned(),
        };
        let doc = build_export(&posts, &options, exported_at());

        assert_eq!(doc.meta.version, "000");
        assert_eq!(doc.meta.exported_on, 1_577_836_800_000);
        assert_eq!(doc.data.posts.len(), 2);
        assert!(doc.data.tags.is_empty());
        assert!(doc.data.posts_tags.is_empty());

        let second = &doc.data.posts[1];
        assert_eq!(second.id, 2);
        assert_eq!(second.slug, "two");
        assert_eq!(second.status, "published");
        assert_eq!(second.language, "en-GB");
        assert_eq!(second.author_id, 7);
        assert_eq!(second.published_by, 7);
        assert_eq!(second.created_at, 1_394_442_000_000);
        assert_eq!(second.html, second.markdown);
    }

    #[test]
    fn tag_timestamps_are_export_time() {
        let doc = build_export(&[post("one", &["A"])], &ExportOptions::default(), exported_at());
        let tag = &doc.data.tags[0];
        assert_eq!(tag.created_at, doc.meta.exported_on);
        assert_eq!(tag.updated_at, doc.meta.exported_on);
    }

    #[test]
    fn repeated_tag_within_a_post_links_once() {
        let doc = build_export(
            &[post("one", &["A", "A", "B"])],
            &ExportOptions::default(),
            exported_at(),
        );
        assert_eq!(doc.data.tags.len(), 2);
        assert_eq!(doc.data.posts_tags.len(), 2);
    }

    #[test]
    fn export_is_deterministic() -> anyhow::Result<()> {
        let posts = [post("one", &["A", "B"]), post("two", &["B", "C"])];
        let first = serde_json::to_string(&build_export(
            &posts,
            &ExportOptions::default(),
            exported_at(),
        ))?;
        let second = serde_json::to_string(&build_export(
            &posts,
            &ExportOptions::default(),
            exported_at(),
        ))?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn slug_collapses_separator_runs() {
        assert_eq!(tag_slug("Windows Phone"), "windows-phone");
        assert_eq!(tag_slug("  C# / .NET  "), "c-net");
        assert_eq!(tag_slug("ASP.NET MVC 5"), "asp-net-mvc-5");
        assert_eq!(tag_slug("---"), "");
    }
}
