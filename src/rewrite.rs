use url::Url;

use crate::cache::asset_file_name;
use crate::formats::slug_from_path;

/// Path markers of the legacy engine's file attachment handlers. A link whose
/// path contains one of these points at a file, not at another post.
pub const ATTACHMENT_MARKERS: &[&str] = &[
    "/cfs-file.ashx/",
    "/cfs-filesystemfile.ashx/",
    "/resized-image.ashx/",
];

/// Where a link or image reference in a post body points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Fragment, relative, or foreign reference: left as is.
    Untouched,
    /// The reference does not parse as an address: left as is.
    Malformed,
    /// The post links to itself.
    SelfLink,
    /// A file on the old site that has to be downloaded.
    Asset { url: Url, file_name: String },
    /// Another post on the old site.
    Post { slug: String },
}

/// Maps references into the old site's address space onto the new site.
#[derive(Debug, Clone)]
pub struct LinkRules {
    old_prefix: String,
    new_base: Url,
    asset_prefix: String,
}

impl LinkRules {
    pub fn new(old_base: &Url, new_base: &Url, asset_prefix: &str) -> Self {
        Self {
            old_prefix: old_base.as_str().to_ascii_lowercase(),
            new_base: new_base.clone(),
            asset_prefix: asset_prefix.to_owned(),
        }
    }

    /// Classifies an `<a href>` target found in the post at `self_path`.
    pub fn classify_link(&self, href: &str, self_path: &str) -> LinkTarget {
        let url = match self.parse_old_site(href) {
            Ok(Some(url)) => url,
            Ok(None) => return LinkTarget::Untouched,
            Err(()) => return LinkTarget::Malformed,
        };

        if is_attachment(&url) {
            return match asset_file_name(&url) {
                Some(file_name) => LinkTarget::Asset { url, file_name },
                None => LinkTarget::Untouched,
            };
        }

        if url.path() == self_path {
            return LinkTarget::SelfLink;
        }

        LinkTarget::Post {
            slug: slug_from_path(url.path()),
        }
    }

    /// Classifies an `<img src>` reference. Every old-site image is an asset.
    pub fn classify_image(&self, src: &str) -> LinkTarget {
        let url = match self.parse_old_site(src) {
            Ok(Some(url)) => url,
            Ok(None) => return LinkTarget::Untouched,
            Err(()) => return LinkTarget::Malformed,
        };

        match asset_file_name(&url) {
            Some(file_name) => LinkTarget::Asset { url, file_name },
            None => LinkTarget::Untouched,
        }
    }

    /// The attribute value that replaces the reference, if any.
    pub fn replacement(&self, target: &LinkTarget) -> Option<String> {
        match target {
            LinkTarget::Asset { file_name, .. } => {
                Some(format!("{}{file_name}", self.asset_prefix))
            }
            LinkTarget::Post { slug } => {
                let mut url = self.new_base.clone();
                url.path_segments_mut().ok()?.pop_if_empty().push(slug);
                Some(url.into())
            }
            LinkTarget::Untouched | LinkTarget::Malformed | LinkTarget::SelfLink => None,
        }
    }

    fn parse_old_site(&self, reference: &str) -> Result<Option<Url>, ()> {
        let reference = reference.trim();
        if reference.is_empty() || reference.starts_with('#') {
            return Ok(None);
        }

        let url = match Url::parse(reference) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => return Ok(None),
            Err(err) => {
                tracing::debug!(reference, %err, "leaving malformed reference untouched");
                return Err(());
            }
        };

        if url.as_str().to_ascii_lowercase().starts_with(&self.old_prefix) {
            Ok(Some(url))
        } else {
            Ok(None)
        }
    }
}

fn is_attachment(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    ATTACHMENT_MARKERS.iter().any(|marker| path.contains(marker))
}
