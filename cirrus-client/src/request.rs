use cirrus_dav::types::{Depth, LockScope};
use hyper::body::Bytes;

/// Timeout header sent on LOCK when the caller gave no timeout: the
/// firmware treats this sentinel as "do not expire".
pub const INFINITE_TIMEOUT: &str = "Infinite, Second-4100000000";

/// Every verb the firmware understands. The transport is verb-agnostic;
/// adding a verb means adding a variant here plus its builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavMethod {
    // RFC 4918
    Get,
    Put,
    Delete,
    Mkcol,
    Copy,
    Move,
    Propfind,
    Proppatch,
    Lock,
    Unlock,
    Options,
    // vendor verbs
    Wol,
    Gsl,
    Gsll,
    RemoveSl,
    Logout,
    RescanSmbPc,
    GetRouterInfo,
    GetDiskSpace,
    PropfindMediaList,
    GetMusicClassification,
    GetAccountInfo,
    GetAccountList,
    UploadToFacebook,
    UploadToFlickr,
    UploadToPicasa,
    UploadToTwitter,
    GenRootCertificate,
    SetRootCertificate,
    ApplyApp,
    NvramGet,
    GetCpuUsage,
    GetMemoryUsage,
    OpenStreamingPort,
    GetSrvTime,
    GetRouterMac,
    GetFirmVer,
    GetLatestVer,
    GetNotice,
    GetVideoSubtitle,
}

impl DavMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Mkcol => "MKCOL",
            Self::Copy => "COPY",
            Self::Move => "MOVE",
            Self::Propfind => "PROPFIND",
            Self::Proppatch => "PROPPATCH",
            Self::Lock => "LOCK",
            Self::Unlock => "UNLOCK",
            Self::Options => "OPTIONS",
            Self::Wol => "WOL",
            Self::Gsl => "GSL",
            Self::Gsll => "GSLL",
            Self::RemoveSl => "REMOVESL",
            Self::Logout => "LOGOUT",
            Self::RescanSmbPc => "RESCANSMBPC",
            Self::GetRouterInfo => "GETROUTERINFO",
            Self::GetDiskSpace => "GETDISKSPACE",
            Self::PropfindMediaList => "PROPFINDMEDIALIST",
            Self::GetMusicClassification => "GETMUSICCLASSIFICATION",
            Self::GetAccountInfo => "GETACCOUNTINFO",
            Self::GetAccountList => "GETACCOUNTLIST",
            Self::UploadToFacebook => "UPLOADTOFACEBOOK",
            Self::UploadToFlickr => "UPLOADTOFLICKR",
            Self::UploadToPicasa => "UPLOADTOPICASA",
            Self::UploadToTwitter => "UPLOADTOTWITTER",
            Self::GenRootCertificate => "GENROOTCERTIFICATE",
            Self::SetRootCertificate => "SETROOTCERTIFICATE",
            Self::ApplyApp => "APPLYAPP",
            Self::NvramGet => "NVRAMGET",
            Self::GetCpuUsage => "GETCPUUSAGE",
            Self::GetMemoryUsage => "GETMEMORYUSAGE",
            Self::OpenStreamingPort => "OPENSTREAMINGPORT",
            Self::GetSrvTime => "GETSRVTIME",
            Self::GetRouterMac => "GETROUTERMAC",
            Self::GetFirmVer => "GETFIRMVER",
            Self::GetLatestVer => "GETLATESTVER",
            Self::GetNotice => "GETNOTICE",
            Self::GetVideoSubtitle => "GETVIDEOSUBTITLE",
        }
    }

    pub fn http_method(self) -> http::Method {
        http::Method::from_bytes(self.as_str().as_bytes()).expect("verb tokens are valid methods")
    }
}

/// byte window of a chunked PUT: `Content-Range: bytes {start}-{stop}/{filesize}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub stop: u64,
    pub filesize: u64,
}

/// LOCK options; `Default` is the exclusive write lock the firmware UI
/// takes before every MOVE/COPY.
#[derive(Debug, Clone)]
pub struct LockParams {
    pub scope: LockScope,
    pub depth: Depth,
    /// None sends the effectively-infinite sentinel.
    pub timeout_secs: Option<u32>,
    /// refresh of a lock already held
    pub locktoken: Option<String>,
}

impl Default for LockParams {
    fn default() -> Self {
        Self {
            scope: LockScope::Exclusive,
            depth: Depth::Zero,
            timeout_secs: None,
            locktoken: None,
        }
    }
}

/// Filters of a PROPFINDMEDIALIST query; every field maps to one request
/// header, absent fields omit theirs.
#[derive(Debug, Clone, Default)]
pub struct MediaListQuery {
    pub media_type: Option<String>,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub keyword: Option<String>,
    pub orderby: Option<String>,
    pub orderrule: Option<String>,
    pub parentid: Option<String>,
}

/// UPLOADTOTWITTER carries the full OAuth 1.0 header set.
#[derive(Debug, Clone)]
pub struct TwitterUploadParams {
    pub filename: String,
    pub title: String,
    pub token: String,
    pub secret: String,
    pub nonce: String,
    pub timestamp: String,
    pub signature: String,
    pub photo_size_limit: Option<String>,
}

/// Subject fields of a GENROOTCERTIFICATE request.
#[derive(Debug, Clone, Default)]
pub struct RootCertParams {
    pub keylen: String,
    pub caname: String,
    pub email: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub ln: Option<String>,
    pub organization: Option<String>,
    pub unit: Option<String>,
    pub cn: Option<String>,
}

/// One fully-described outgoing request. Built by the per-verb
/// constructors on [`Client`], consumed by the transport.
///
/// [`Client`]: crate::Client
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: DavMethod,
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl RequestSpec {
    pub fn new(method: DavMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// absent values omit the header entirely
    pub fn opt_header(self, name: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.header(name, v),
            None => self,
        }
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn xml_body(self, body: String) -> Self {
        self.header("Content-Type", "text/xml; charset=\"utf-8\"")
            .body(body)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// wrap a lock token for the `If`/`Lock-Token` headers
pub(crate) fn coded_token(token: &str) -> String {
    format!("<{}>", token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_verbs_are_valid_methods() {
        assert_eq!(DavMethod::Propfind.http_method(), http::Method::from_bytes(b"PROPFIND").unwrap());
        assert_eq!(DavMethod::RescanSmbPc.http_method().as_str(), "RESCANSMBPC");
        assert_eq!(DavMethod::Gsl.http_method().as_str(), "GSL");
    }

    #[test]
    fn optional_headers_are_omitted() {
        let spec = RequestSpec::new(DavMethod::Propfind, "/x")
            .header("Depth", "0")
            .opt_header("Mtype", None::<String>)
            .opt_header("Authorization", Some("Basic abc"));
        assert_eq!(spec.header_value("Depth"), Some("0"));
        assert_eq!(spec.header_value("Mtype"), None);
        assert_eq!(spec.header_value("authorization"), Some("Basic abc"));
    }
}
