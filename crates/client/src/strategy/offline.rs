//! Synthesized responses for when neither network nor store can answer.

use offgrid_core::Response;
use url::Url;

/// Where network-first goes when the fetch is rejected and the store has no entry.
#[derive(Debug, Clone)]
pub struct OfflineFallback {
    /// Cached document served instead (the shell root).
    pub document: Option<Url>,
    /// Status of the inline page.
    pub status: u16,
    pub app_name: String,
}

impl OfflineFallback {
    pub fn new(document: Option<Url>, status: u16, app_name: impl Into<String>) -> Self {
        Self { document, status, app_name: app_name.into() }
    }

    /// Minimal HTML page stating that the app is offline.
    pub fn inline_page(&self) -> Response {
        let body = format!(
            "<!doctype html><meta charset=\"utf-8\"><title>Offline</title>\
             <h2>You are offline</h2><p>{} needs an internet connection for live data.</p>",
            escape_html(&self.app_name)
        );
        Response::new(
            self.status,
            vec![
                ("content-type".into(), "text/html; charset=utf-8".into()),
                ("cache-control".into(), "no-store".into()),
            ],
            body,
        )
    }
}

/// Empty but valid response for stylesheet and script requests.
pub fn stub_for_extension(extension: &str) -> Option<Response> {
    let content_type = match extension {
        "css" => "text/css",
        "js" => "application/javascript",
        _ => return None,
    };
    Some(Response::new(200, vec![("content-type".into(), content_type.into())], ""))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_page_status_and_name() {
        let page = OfflineFallback::new(None, 503, "Skore <Point>").inline_page();
        assert_eq!(page.status, 503);
        let body = String::from_utf8_lossy(&page.body);
        assert!(body.contains("You are offline"));
        assert!(body.contains("Skore &lt;Point&gt;"));
    }

    #[test]
    fn test_stub_only_for_css_and_js() {
        assert_eq!(stub_for_extension("css").unwrap().content_type(), Some("text/css"));
        assert_eq!(stub_for_extension("js").unwrap().content_type(), Some("application/javascript"));
        assert!(stub_for_extension("png").is_none());
        assert!(stub_for_extension("JS").is_none());
    }
}
