//! Static file serving and the application shell.
//!
//! Files under the build folder are served as-is; directories resolve to
//! their `index.html`. Anything else, including paths that try to escape the
//! build folder, gets the `index.html` shell so client-side routing can take
//! over. Without a shell the response is 404.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

/// Application shell served for unmatched paths.
const SHELL_FILE: &str = "index.html";

/// Last-resort handler for requests no route answered.
pub(crate) struct Fallback {
    build_folder: PathBuf,
}

impl Fallback {
    pub(crate) fn new(build_folder: PathBuf) -> Self {
        Self { build_folder }
    }

    /// Serve a file from the build folder, else the shell.
    pub(crate) async fn serve(&self, req: Request<Body>) -> Response {
        let shell = ServeFile::new(self.build_folder.join(SHELL_FILE));
        let service = ServeDir::new(&self.build_folder)
            .append_index_html_on_directories(true)
            .fallback(shell);

        match service.oneshot(req).await {
            Ok(response) => response.into_response(),
            Err(infallible) => match infallible {},
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::to_bytes;
    use axum::http::{StatusCode, header};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn build_folder() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<html>shell</html>").unwrap();
        fs::create_dir_all(tmp.path().join("assets")).unwrap();
        fs::write(tmp.path().join("assets/app.js"), "console.log(1)").unwrap();
        fs::create_dir_all(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join("docs/index.html"), "<html>docs</html>").unwrap();
        tmp
    }

    async fn get(fallback: &Fallback, uri: &str) -> (StatusCode, String, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = fallback.serve(req).await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let tmp = build_folder();
        let fallback = Fallback::new(tmp.path().to_path_buf());

        let (status, content_type, body) = get(&fallback, "/assets/app.js").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.contains("javascript"));
        assert_eq!(body, "console.log(1)");
    }

    #[tokio::test]
    async fn test_directory_resolves_to_index() {
        let tmp = build_folder();
        let fallback = Fallback::new(tmp.path().to_path_buf());

        let (status, _, body) = get(&fallback, "/docs/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html>docs</html>");
    }

    #[tokio::test]
    async fn test_unknown_path_gets_shell() {
        let tmp = build_folder();
        let fallback = Fallback::new(tmp.path().to_path_buf());

        for uri in ["/", "/client/route", "/missing.png"] {
            let (status, content_type, body) = get(&fallback, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(content_type.starts_with("text/html"), "{uri}");
            assert_eq!(body, "<html>shell</html>", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_traversal_never_leaves_build_folder() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("dist");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("index.html"), "shell").unwrap();
        fs::write(tmp.path().join("secret.txt"), "secret").unwrap();
        let fallback = Fallback::new(root);

        let (_, _, body) = get(&fallback, "/../secret.txt").await;
        assert_eq!(body, "shell");
        let (_, _, body) = get(&fallback, "/%2e%2e/secret.txt").await;
        assert_eq!(body, "shell");
    }

    #[tokio::test]
    async fn test_missing_shell_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let fallback = Fallback::new(tmp.path().to_path_buf());

        let (status, _, _) = get(&fallback, "/anything").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
