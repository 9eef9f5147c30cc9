use std::borrow::Cow;

use http::StatusCode;
use hyper::body::Bytes;

use crate::error::Error;
use crate::header::Headers;
use crate::lock::LockInfo;
use crate::request::DavMethod;
use crate::tree::{build_tree, Resource};

/// What the classifier delivered for one response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// body passed through unchanged
    Raw(Bytes),
    /// a 207 multi-status body, parsed into its hierarchy
    Tree(Resource),
    /// a LOCK 200 body, flattened
    Lock(LockInfo),
}

/// Outcome of one request: status, status text, response headers, and the
/// classified content. Every issued request resolves to exactly one of
/// these (or an [`Error`]).
#[derive(Debug, Clone)]
pub struct DavResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: Headers,
    pub content: Content,
}

impl DavResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// turn a non-2xx response into [`Error::Protocol`]
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Protocol {
                status: self.status,
                status_text: self.status_text,
                body: match &self.content {
                    Content::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    _ => String::new(),
                },
            })
        }
    }

    pub fn raw(&self) -> Option<&Bytes> {
        match &self.content {
            Content::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// raw body as text (lossy)
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.raw().map(|b| String::from_utf8_lossy(b))
    }

    pub fn tree(&self) -> Option<&Resource> {
        match &self.content {
            Content::Tree(root) => Some(root),
            _ => None,
        }
    }

    pub fn lock(&self) -> Option<&LockInfo> {
        match &self.content {
            Content::Lock(info) => Some(info),
            _ => None,
        }
    }

    /// Lock token of a LOCK success: from the parsed body, else from the
    /// `Lock-Token` header (the firmware sends both).
    pub fn lock_token(&self) -> Option<String> {
        if let Some(token) = self.lock().and_then(|l| l.token()) {
            return Some(token.to_string());
        }
        self.headers
            .get("lock-token")
            .map(|v| v.trim_start_matches('<').trim_end_matches('>').to_string())
    }
}

/// Decide, per verb and status, whether the body must be parsed before
/// delivery. Pure in (method, status, body); every 207 delivers a tree.
pub(crate) async fn classify(
    method: DavMethod,
    status: StatusCode,
    headers: Headers,
    body: Bytes,
) -> Result<DavResponse, Error> {
    let content = match (method, status.as_u16()) {
        (DavMethod::Lock, 200) => {
            let parsed = cirrus_dav::parse_lock_response(&body).await?;
            Content::Lock(LockInfo::from_lock_response(&parsed))
        }
        (_, 207) => {
            let parsed = cirrus_dav::parse_multistatus(&body).await?;
            Content::Tree(build_tree(parsed)?)
        }
        _ => Content::Raw(body),
    };

    Ok(DavResponse {
        status,
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        headers,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MalformedResponse;

    const LOCK_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:prop xmlns:D="DAV:">
<D:lockdiscovery><D:activelock>
<D:lockscope><D:exclusive/></D:lockscope>
<D:locktype><D:write/></D:locktype>
<D:depth>0</D:depth>
<D:timeout>Second-600</D:timeout>
<D:owner></D:owner>
<D:locktoken><D:href>opaquelocktoken:abc</D:href></D:locktoken>
</D:activelock></D:lockdiscovery>
</D:prop>"#;

    const LISTING_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/share/</D:href>
    <D:propstat>
      <D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/share/a.txt</D:href>
    <D:propstat>
      <D:prop><D:getcontentlength>1</D:getcontentlength></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/share/b.txt</D:href>
    <D:propstat>
      <D:prop><D:getcontentlength>2</D:getcontentlength></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

    #[tokio::test]
    async fn lock_200_delivers_lock_info() {
        let resp = classify(
            DavMethod::Lock,
            StatusCode::OK,
            Headers::default(),
            Bytes::from_static(LOCK_BODY.as_bytes()),
        )
        .await
        .unwrap();
        assert_eq!(
            resp.lock().unwrap().token(),
            Some("opaquelocktoken:abc")
        );
        assert_eq!(resp.lock_token().as_deref(), Some("opaquelocktoken:abc"));
    }

    #[tokio::test]
    async fn propfind_207_delivers_tree() {
        let resp = classify(
            DavMethod::Propfind,
            StatusCode::MULTI_STATUS,
            Headers::default(),
            Bytes::from_static(LISTING_BODY.as_bytes()),
        )
        .await
        .unwrap();
        let root = resp.tree().unwrap();
        assert_eq!(root.items.len(), 2);
        assert_eq!(root.items[0].name(), "a.txt");
        assert_eq!(root.items[1].name(), "b.txt");
    }

    #[tokio::test]
    async fn lock_207_delivers_tree_too() {
        let resp = classify(
            DavMethod::Lock,
            StatusCode::MULTI_STATUS,
            Headers::default(),
            Bytes::from_static(LISTING_BODY.as_bytes()),
        )
        .await
        .unwrap();
        assert!(resp.tree().is_some());
    }

    #[tokio::test]
    async fn other_statuses_pass_the_body_through() {
        let resp = classify(
            DavMethod::Lock,
            StatusCode::CONFLICT,
            Headers::default(),
            Bytes::from_static(b"locked by someone else"),
        )
        .await
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("locked by someone else"));

        let resp = classify(
            DavMethod::Get,
            StatusCode::OK,
            Headers::default(),
            Bytes::from_static(b"plain file data"),
        )
        .await
        .unwrap();
        assert_eq!(resp.text().as_deref(), Some("plain file data"));
    }

    #[tokio::test]
    async fn malformed_multistatus_is_a_parse_error() {
        let err = classify(
            DavMethod::Propfind,
            StatusCode::MULTI_STATUS,
            Headers::default(),
            Bytes::from_static(b"<D:multistatus xmlns:D=\"DAV:\"><D:response>"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse(MalformedResponse::Xml(_))
        ));
    }

    #[tokio::test]
    async fn error_for_status_surfaces_protocol_failures() {
        let resp = classify(
            DavMethod::Get,
            StatusCode::NOT_FOUND,
            Headers::default(),
            Bytes::from_static(b"no such file"),
        )
        .await
        .unwrap();
        let err = resp.error_for_status().unwrap_err();
        match err {
            Error::Protocol { status, body, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "no such file");
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }
}
