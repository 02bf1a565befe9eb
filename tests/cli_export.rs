use blogmigrate::formats::{ExportDocument, Post, PostStub};
use chrono::{TimeZone as _, Utc};
use predicates::prelude::*;

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
        published_at: Utc.with_ymd_and_hms(2014, 3, 10, 9, 0, 0).unwrap(),
        content: format!("<p>{slug}</p>"),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
    }
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("blogmigrate");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("export")));
}

#[test]
fn run_without_author_fails_before_fetching() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let work_dir = temp.path().join("work");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("blogmigrate");
    cmd.args(["run", "--work-dir"])
        .arg(&work_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--author is required"));

    assert!(!work_dir.exists());
    Ok(())
}

#[test]
fn export_rebuilds_document_from_post_list() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let posts_path = temp.path().join("posts.json");
    let out_path = temp.path().join("out").join("ghost.json");
    blogmigrate::store::write_json_pretty(
        &posts_path,
        &vec![post("one", &["A", "B"]), post("two", &["B", "C"])],
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("blogmigrate");
    cmd.env("RUST_LOG", "info")
        .args(["export", "--posts"])
        .arg(&posts_path)
        .arg("--out")
        .arg(&out_path)
        .args(["--author-id", "3", "--language", "en-GB"])
        .assert()
        .success()
        .stderr(predicate::str::contains("export written"));

    let document: ExportDocument = serde_json::from_str(&std::fs::read_to_string(&out_path)?)?;
    assert_eq!(document.meta.version, "000");
    assert_eq!(document.data.posts.len(), 2);
    assert_eq!(document.data.tags.len(), 3);
    assert_eq!(document.data.posts_tags.len(), 4);
    assert!(document
        .data
        .posts
        .iter()
        .all(|p| p.author_id == 3 && p.language == "en-GB"));
    Ok(())
}

#[test]
fn export_with_missing_post_list_fails() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("blogmigrate");
    cmd.args(["export", "--posts"])
        .arg(temp.path().join("missing.json"))
        .arg("--out")
        .arg(temp.path().join("ghost.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("read post list"));
    Ok(())
}
