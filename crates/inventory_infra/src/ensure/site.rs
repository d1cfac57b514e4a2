use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;
use walkdir::WalkDir;

use crate::cloud::ObjectStorage;
use crate::error::DeployError;
use crate::package::slash_path;

pub const INDEX_KEY: &str = "index.html";
pub const LINK_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteObject {
    pub key: String,
    pub path: PathBuf,
}

pub fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".html") {
        "text/html; charset=utf-8"
    } else if key.ends_with(".css") {
        "text/css; charset=utf-8"
    } else if key.ends_with(".js") {
        "application/javascript; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

/// Every file under `web_dir`, keyed by its `/`-separated relative path.
pub fn site_objects(web_dir: &Path) -> Result<Vec<SiteObject>, DeployError> {
    if !web_dir.is_dir() {
        return Err(DeployError::package(web_dir, "web directory does not exist"));
    }

    let mut objects = Vec::new();
    for entry in WalkDir::new(web_dir).sort_by_file_name() {
        let entry = entry.map_err(|error| DeployError::package(web_dir, error))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(web_dir)
            .map_err(|error| DeployError::package(entry.path(), error))?;
        objects.push(SiteObject {
            key: slash_path(relative),
            path: entry.path().to_path_buf(),
        });
    }
    Ok(objects)
}

/// Uploads the static site and returns the number of objects written.
pub fn publish_site(
    storage: &impl ObjectStorage,
    bucket: &str,
    web_dir: &Path,
) -> Result<usize, DeployError> {
    let objects = site_objects(web_dir)?;
    for object in &objects {
        let body = fs::read(&object.path).map_err(|error| DeployError::package(&object.path, error))?;
        storage
            .put_object(bucket, &object.key, body, content_type_for(&object.key))
            .map_err(DeployError::at(format!("upload {}", object.key)))?;
    }
    info!(bucket, objects = objects.len(), "static site uploaded");
    Ok(objects.len())
}

/// Landing page link: the pre-signed index URL with the API endpoint appended
/// as the `api` query parameter.
pub fn landing_link(presigned_index: &str, api_endpoint: &str) -> String {
    format!("{presigned_index}&api={api_endpoint}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryCloud;

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("css/site.css"), "text/css; charset=utf-8");
        assert_eq!(
            content_type_for("app.js"),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(content_type_for("logo.png"), "application/octet-stream");
    }

    #[test]
    fn uploads_nested_files_with_slash_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("index.html"), "<html></html>").expect("write");
        fs::create_dir_all(dir.path().join("assets")).expect("mkdir");
        fs::write(dir.path().join("assets").join("app.js"), "1").expect("write");

        let cloud = InMemoryCloud::new();
        cloud.seed_bucket("inventory-web-dev");
        let written = publish_site(&cloud, "inventory-web-dev", dir.path()).expect("upload");

        assert_eq!(written, 2);
        assert_eq!(
            cloud.object_keys("inventory-web-dev"),
            vec!["assets/app.js".to_string(), "index.html".to_string()]
        );
        assert_eq!(
            cloud.object_body("inventory-web-dev", "assets/app.js"),
            Some(b"1".to_vec())
        );
        assert_eq!(
            cloud.content_type("inventory-web-dev", "index.html").as_deref(),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn missing_web_directory_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = site_objects(&dir.path().join("web")).expect_err("missing");
        assert!(matches!(error, DeployError::Package { .. }));
    }

    #[test]
    fn landing_link_appends_the_endpoint() {
        assert_eq!(
            landing_link(
                "https://b.s3.amazonaws.com/index.html?X-Amz-Signature=abc",
                "https://a1b2.execute-api.us-east-1.amazonaws.com"
            ),
            "https://b.s3.amazonaws.com/index.html?X-Amz-Signature=abc&api=https://a1b2.execute-api.us-east-1.amazonaws.com"
        );
    }
}
