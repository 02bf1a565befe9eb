use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

use crate::formats::Post;

/// Writes `value` as indented JSON, replacing any previous file atomically.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("create output dir: {}", parent_dir.display()))?;

    let mut json = serde_json::to_vec_pretty(value).context("serialize json")?;
    json.push(b'\n');

    let mut staged = tempfile::NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("create temp file in {}", parent_dir.display()))?;
    staged
        .write_all(&json)
        .with_context(|| format!("write {}", path.display()))?;
    staged
        .persist(path)
        .with_context(|| format!("move output into place: {}", path.display()))?;
    Ok(())
}

pub fn read_posts(path: &Path) -> anyhow::Result<Vec<Post>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read post list: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse post list: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;
    use crate::formats::PostStub;

    #[test]
    fn post_list_survives_write_and_read() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("out").join("posts.json");
        let posts = vec![Post {
            stub: PostStub {
                title: "Hello".to_owned(),
                author: "A".to_owned(),
                relative_url: "/b/x/hello.aspx".to_owned(),
                full_url: "http://old.example/b/x/hello.aspx".to_owned(),
                slug: "hello".to_owned(),
                summary: "s".to_owned(),
            },
            published_at: Utc.with_ymd_and_hms(2014, 3, 23, 14, 14, 0).unwrap(),
            content: "<p>hi</p>".to_owned(),
            tags: vec!["Azure".to_owned(), "Mobile".to_owned()],
        }];

        write_json_pretty(&path, &posts)?;
        let text = std::fs::read_to_string(&path)?;
        assert!(text.contains("\n  {"), "output is indented");
        assert_eq!(read_posts(&path)?, posts);

        write_json_pretty(&path, &Vec::<Post>::new())?;
        assert!(read_posts(&path)?.is_empty());
        Ok(())
    }
}
