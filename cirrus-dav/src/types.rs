use chrono::{DateTime, FixedOffset};

/// 14.7.  href XML Element
///
/// <!ELEMENT href (#PCDATA)>
#[derive(Debug, PartialEq, Clone)]
pub struct Href(pub String);

/// 14.4 depth XML Element
///
/// Value:   "0" | "1" | "infinity"
///
/// <!ELEMENT depth (#PCDATA) >
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        }
    }
}

/// 14.16.  multistatus XML Element
///
/// Purpose:   Contains multiple response messages.
///
/// <!ELEMENT multistatus (response*, responsedescription?)  >
#[derive(Debug, PartialEq, Clone)]
pub struct Multistatus {
    pub responses: Vec<Response>,
    pub responsedescription: Option<ResponseDescription>,
}

/// 14.24.  response XML Element
///
/// A response either carries a bare status (error entries) or one href
/// followed by propstat blocks.
///
/// <!ELEMENT response (href, ((href*, status)|(propstat+)),
///           error?, responsedescription? , location?) >
#[derive(Debug, PartialEq, Clone)]
pub struct Response {
    pub status_or_propstat: StatusOrPropstat,
    pub responsedescription: Option<ResponseDescription>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum StatusOrPropstat {
    Status(Vec<Href>, Status),
    PropStat(Href, Vec<PropStat>),
}

impl Response {
    pub fn href(&self) -> &Href {
        match &self.status_or_propstat {
            StatusOrPropstat::Status(hrefs, _) => &hrefs[0],
            StatusOrPropstat::PropStat(href, _) => href,
        }
    }
}

/// 14.22 propstat XML Element
///
/// <!ELEMENT propstat (prop, status, error?, responsedescription?) >
#[derive(Debug, PartialEq, Clone)]
pub struct PropStat {
    pub prop: PropList,
    pub status: Status,
}

/// 14.18.  prop XML Element — property container, document order kept
#[derive(Debug, PartialEq, Clone)]
pub struct PropList(pub Vec<Property>);

/// 14.28.  status XML Element
///
/// Value:   status-line (defined in Section 6.1 of [RFC2616])
#[derive(Debug, PartialEq, Clone)]
pub struct Status(pub http::status::StatusCode);

/// 14.25.  responsedescription XML Element
#[derive(Debug, PartialEq, Clone)]
pub struct ResponseDescription(pub String);

/// Identity of a property that is not part of the known vocabulary.
#[derive(Debug, PartialEq, Clone)]
pub struct PropertyName {
    pub namespace: Option<String>,
    pub local: String,
}

/// A property value inside a propstat block.
///
/// The firmware emits its vendor properties in the `DAV:` namespace next
/// to the RFC 4918 live properties. Anything outside the known vocabulary
/// is preserved as a raw (name, text) pair.
#[derive(Debug, PartialEq, Clone)]
pub enum Property {
    CreationDate(DateTime<FixedOffset>),
    DisplayName(String),
    GetContentLength(u64),
    GetContentType(String),
    GetEtag(String),
    GetLastModified(DateTime<FixedOffset>),
    ResourceType { collection: bool },
    LockDiscovery(Vec<ActiveLock>),
    SupportedLock(Vec<LockEntry>),

    // vendor vocabulary
    GetUniqueId(String),
    GetOnline(String),
    GetMac(String),
    GetIp(String),
    GetType(String),
    GetAttr {
        readonly: Option<String>,
        hidden: Option<String>,
    },
    GetUserAgent(String),
    GetRouterSync(String),
    GetMetadata(Metadata),

    Unknown(PropertyName, String),
}

/// Children of the vendor `getmetadata` property (media indexing data).
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub thumb: Option<String>,
    pub thumb_image: Option<String>,
}

/// 14.1.  activelock XML Element
///
/// <!ELEMENT activelock (lockscope, locktype, depth, owner?, timeout?,
///           locktoken?, lockroot)>
///
/// Every field is optional here: the firmware's LOCK response omits
/// `lockroot` and an expired entry may omit more.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ActiveLock {
    pub lockscope: Option<LockScope>,
    pub locktype: Option<LockType>,
    pub depth: Option<Depth>,
    pub owner: Option<Owner>,
    pub timeout: Option<Timeout>,
    pub locktoken: Option<LockToken>,
    pub lockroot: Option<LockRoot>,
}

/// 14.10.  lockentry XML Element
///
/// <!ELEMENT lockentry (lockscope, locktype) >
#[derive(Debug, PartialEq, Clone)]
pub struct LockEntry {
    pub lockscope: LockScope,
    pub locktype: LockType,
}

/// 14.13.  lockscope XML Element
///
/// <!ELEMENT lockscope (exclusive | shared) >
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LockScope {
    Exclusive,
    Shared,
}

/// 14.15.  locktype XML Element
///
/// <!ELEMENT locktype (write) >
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LockType {
    Write,
}

/// 14.17.  owner XML Element
///
/// Clients usually wrap the value in an href child; plain text happens.
#[derive(Debug, PartialEq, Clone)]
pub enum Owner {
    Txt(String),
    Href(Href),
    Unknown,
}

/// 15.  timeout value: "Infinite" or "Second-" 1*DIGIT
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Timeout {
    Seconds(u32),
    Infinite,
}

/// 14.14.  locktoken XML Element
///
/// <!ELEMENT locktoken (href) >
#[derive(Debug, PartialEq, Clone)]
pub struct LockToken(pub Href);

/// 14.12.  lockroot XML Element
///
/// <!ELEMENT lockroot (href) >
#[derive(Debug, PartialEq, Clone)]
pub struct LockRoot(pub Href);

/// Body of a LOCK success: `<D:prop><D:lockdiscovery>(activelock)*`.
#[derive(Debug, PartialEq, Clone)]
pub struct LockResponse(pub Vec<ActiveLock>);

// ---- request bodies ----

/// 14.20.  propfind XML Element
///
/// <!ELEMENT propfind ( propname | (allprop, include?) | prop ) >
/// (propname/include are not used by this client)
#[derive(Debug, PartialEq, Clone)]
pub enum PropFind {
    AllProp,
    Prop(Vec<PropertyRequest>),
}

/// A property name requested in a restricted propfind.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PropertyRequest {
    CreationDate,
    DisplayName,
    GetContentLength,
    GetContentType,
    GetEtag,
    GetLastModified,
    ResourceType,
    LockDiscovery,
    SupportedLock,
    GetUniqueId,
    GetOnline,
    GetMac,
    GetIp,
    GetType,
    GetAttr,
    GetUserAgent,
    GetRouterSync,
    GetMetadata,
}

impl PropertyRequest {
    pub fn dav_name(&self) -> &'static str {
        match self {
            Self::CreationDate => "creationdate",
            Self::DisplayName => "displayname",
            Self::GetContentLength => "getcontentlength",
            Self::GetContentType => "getcontenttype",
            Self::GetEtag => "getetag",
            Self::GetLastModified => "getlastmodified",
            Self::ResourceType => "resourcetype",
            Self::LockDiscovery => "lockdiscovery",
            Self::SupportedLock => "supportedlock",
            Self::GetUniqueId => "getuniqueid",
            Self::GetOnline => "getonline",
            Self::GetMac => "getmac",
            Self::GetIp => "getip",
            Self::GetType => "gettype",
            Self::GetAttr => "getattr",
            Self::GetUserAgent => "getuseragent",
            Self::GetRouterSync => "getroutersync",
            Self::GetMetadata => "getmetadata",
        }
    }
}

/// 14.11.  lockinfo XML Element — LOCK request body
///
/// <!ELEMENT lockinfo (lockscope, locktype, owner?)  >
#[derive(Debug, PartialEq, Clone)]
pub struct LockInfoRequest {
    pub lockscope: LockScope,
    pub locktype: LockType,
    pub owner: Option<Owner>,
}

/// 14.19.  propertyupdate XML Element — PROPPATCH request body
///
/// Dead-property updates only: set takes (name, text) pairs, remove takes
/// names.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct PropertyUpdate {
    pub set: Vec<(PropertyName, String)>,
    pub remove: Vec<PropertyName>,
}
