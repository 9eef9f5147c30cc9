use cirrus_dav::types::{Multistatus, Property, Response, StatusOrPropstat};
use http::StatusCode;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("multi-status document contains no response")]
    Empty,
    #[error("responses not reachable from the root: {0:?}")]
    Orphaned(Vec<String>),
}

/// One node of a parsed multi-status hierarchy.
///
/// The tree owns its children through `items`; the node whose href equals
/// the requested collection is the root, and its `items` are the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub href: String,
    /// href split on `/`, trailing empty segment dropped
    pub path: Vec<String>,
    /// properties in document order
    pub properties: Vec<Property>,
    /// per-resource status line, only present on error entries
    pub status: Option<StatusCode>,
    /// children in document order
    pub items: Vec<Resource>,
}

impl Resource {
    fn new(href: String, properties: Vec<Property>, status: Option<StatusCode>) -> Self {
        let path = split_path(&href);
        Resource {
            href,
            path,
            properties,
            status,
            items: Vec::new(),
        }
    }

    fn from_response(resp: Response) -> Vec<Resource> {
        match resp.status_or_propstat {
            StatusOrPropstat::Status(hrefs, status) => hrefs
                .into_iter()
                .map(|h| Resource::new(h.0, Vec::new(), Some(status.0)))
                .collect(),
            StatusOrPropstat::PropStat(href, propstats) => {
                let mut properties = Vec::new();
                for propstat in propstats {
                    if propstat.status.0.is_success() {
                        properties.extend(propstat.prop.0);
                    }
                }
                vec![Resource::new(href.0, properties, None)]
            }
        }
    }

    /// look a property up by (namespace, local name)
    pub fn property(&self, namespace: &str, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| property_matches(p, namespace, name))
    }

    pub fn is_collection(&self) -> bool {
        self.properties
            .iter()
            .any(|p| matches!(p, Property::ResourceType { collection: true }))
    }

    pub fn content_length(&self) -> Option<u64> {
        self.properties.iter().find_map(|p| match p {
            Property::GetContentLength(n) => Some(*n),
            _ => None,
        })
    }

    pub fn content_type(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match p {
            Property::GetContentType(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn display_name(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match p {
            Property::DisplayName(n) => Some(n.as_str()),
            _ => None,
        })
    }

    /// last path segment (file or directory name)
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }
}

fn property_matches(prop: &Property, namespace: &str, name: &str) -> bool {
    if let Property::Unknown(pn, _) = prop {
        return pn.namespace.as_deref() == Some(namespace) && pn.local == name;
    }
    namespace == "DAV:" && dav_local_name(prop) == Some(name)
}

fn dav_local_name(prop: &Property) -> Option<&'static str> {
    Some(match prop {
        Property::CreationDate(_) => "creationdate",
        Property::DisplayName(_) => "displayname",
        Property::GetContentLength(_) => "getcontentlength",
        Property::GetContentType(_) => "getcontenttype",
        Property::GetEtag(_) => "getetag",
        Property::GetLastModified(_) => "getlastmodified",
        Property::ResourceType { .. } => "resourcetype",
        Property::LockDiscovery(_) => "lockdiscovery",
        Property::SupportedLock(_) => "supportedlock",
        Property::GetUniqueId(_) => "getuniqueid",
        Property::GetOnline(_) => "getonline",
        Property::GetMac(_) => "getmac",
        Property::GetIp(_) => "getip",
        Property::GetType(_) => "gettype",
        Property::GetAttr { .. } => "getattr",
        Property::GetUserAgent(_) => "getuseragent",
        Property::GetRouterSync(_) => "getroutersync",
        Property::GetMetadata(_) => "getmetadata",
        Property::Unknown(..) => return None,
    })
}

fn split_path(href: &str) -> Vec<String> {
    let mut segments: Vec<String> = href.split('/').map(str::to_string).collect();
    if segments.len() > 1 && segments.last().is_some_and(String::is_empty) {
        segments.pop();
    }
    segments
}

/// Derive the resource hierarchy from a flat multi-status document.
///
/// The resource with the fewest path segments is the root; every other
/// resource attaches below it by path-segment matching, children in
/// document order. A placement pass that makes no progress aborts with
/// [`TreeError::Orphaned`] instead of looping.
pub fn build_tree(doc: Multistatus) -> Result<Resource, TreeError> {
    let mut flat: Vec<Resource> = doc
        .responses
        .into_iter()
        .flat_map(Resource::from_response)
        .collect();
    if flat.is_empty() {
        return Err(TreeError::Empty);
    }

    let mut root_idx = 0;
    for (idx, res) in flat.iter().enumerate() {
        if res.path.len() < flat[root_idx].path.len() {
            root_idx = idx;
        }
    }
    let mut root = flat.remove(root_idx);

    let mut pending = flat;
    while !pending.is_empty() {
        let mut progressed = false;
        let mut deferred = Vec::with_capacity(pending.len());
        for res in pending {
            match place(&mut root, res) {
                Ok(()) => progressed = true,
                Err(unplaced) => deferred.push(unplaced),
            }
        }
        if !progressed {
            return Err(TreeError::Orphaned(
                deferred.into_iter().map(|r| r.href).collect(),
            ));
        }
        pending = deferred;
    }

    Ok(root)
}

fn place(node: &mut Resource, res: Resource) -> Result<(), Resource> {
    if !res.path.starts_with(&node.path) || res.path.len() <= node.path.len() {
        return Err(res);
    }
    if res.path.len() == node.path.len() + 1 {
        node.items.push(res);
        return Ok(());
    }
    for child in node.items.iter_mut() {
        if res.path.starts_with(&child.path) {
            return place(child, res);
        }
    }
    Err(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_dav::types::{Href, PropList, PropStat, Status};

    fn ok_response(href: &str, properties: Vec<Property>) -> Response {
        Response {
            status_or_propstat: StatusOrPropstat::PropStat(
                Href(href.into()),
                vec![PropStat {
                    prop: PropList(properties),
                    status: Status(StatusCode::OK),
                }],
            ),
            responsedescription: None,
        }
    }

    fn multistatus(responses: Vec<Response>) -> Multistatus {
        Multistatus {
            responses,
            responsedescription: None,
        }
    }

    fn node_count(root: &Resource) -> usize {
        1 + root.items.iter().map(node_count).sum::<usize>()
    }

    fn child_count(root: &Resource) -> usize {
        root.items.len() + root.items.iter().map(child_count).sum::<usize>()
    }

    #[test]
    fn valid_tree_places_every_resource() {
        let doc = multistatus(vec![
            ok_response("/a/", vec![]),
            ok_response("/a/b.txt", vec![]),
            ok_response("/a/c/", vec![]),
            ok_response("/a/c/d.txt", vec![]),
        ]);
        let root = build_tree(doc).unwrap();

        assert_eq!(root.href, "/a/");
        assert_eq!(node_count(&root), 4);
        assert_eq!(child_count(&root), 3);
        assert_eq!(root.items.len(), 2);
    }

    #[test]
    fn children_keep_document_order() {
        let doc = multistatus(vec![
            ok_response("/d/", vec![]),
            ok_response("/d/zz", vec![]),
            ok_response("/d/aa", vec![]),
            ok_response("/d/mm", vec![]),
        ]);
        let root = build_tree(doc).unwrap();
        let names: Vec<&str> = root.items.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["zz", "aa", "mm"]);
    }

    #[test]
    fn parent_after_child_in_document_order() {
        let doc = multistatus(vec![
            ok_response("/r/", vec![]),
            ok_response("/r/sub/leaf", vec![]),
            ok_response("/r/sub/", vec![]),
        ]);
        let root = build_tree(doc).unwrap();
        assert_eq!(root.items.len(), 1);
        assert_eq!(root.items[0].name(), "sub");
        assert_eq!(root.items[0].items[0].name(), "leaf");
    }

    #[test]
    fn same_input_builds_equal_trees() {
        let doc = || {
            multistatus(vec![
                ok_response("/a/", vec![Property::ResourceType { collection: true }]),
                ok_response("/a/b", vec![Property::GetContentLength(7)]),
            ])
        };
        assert_eq!(build_tree(doc()).unwrap(), build_tree(doc()).unwrap());
    }

    #[test]
    fn gap_in_hierarchy_is_an_error() {
        let doc = multistatus(vec![
            ok_response("/a/", vec![]),
            ok_response("/a/missing/deep.txt", vec![]),
        ]);
        assert_eq!(
            build_tree(doc),
            Err(TreeError::Orphaned(vec!["/a/missing/deep.txt".into()]))
        );
    }

    #[test]
    fn empty_document_is_an_error() {
        assert_eq!(build_tree(multistatus(vec![])), Err(TreeError::Empty));
    }

    #[test]
    fn error_entries_carry_their_status() {
        let doc = multistatus(vec![
            ok_response("/a/", vec![]),
            Response {
                status_or_propstat: StatusOrPropstat::Status(
                    vec![Href("/a/gone".into())],
                    Status(StatusCode::NOT_FOUND),
                ),
                responsedescription: None,
            },
        ]);
        let root = build_tree(doc).unwrap();
        assert_eq!(root.items[0].status, Some(StatusCode::NOT_FOUND));
        assert_eq!(root.status, None);
    }

    #[test]
    fn property_lookup_by_namespace_and_name() {
        let doc = multistatus(vec![ok_response(
            "/a",
            vec![
                Property::GetMac("AA:BB".into()),
                Property::Unknown(
                    cirrus_dav::types::PropertyName {
                        namespace: Some("urn:x".into()),
                        local: "custom".into(),
                    },
                    "v".into(),
                ),
            ],
        )]);
        let root = build_tree(doc).unwrap();
        assert!(matches!(
            root.property("DAV:", "getmac"),
            Some(Property::GetMac(_))
        ));
        assert!(root.property("urn:x", "custom").is_some());
        assert!(root.property("DAV:", "custom").is_none());
    }

    #[test]
    fn full_url_hrefs_work() {
        let doc = multistatus(vec![
            ok_response("http://r.local/share/", vec![]),
            ok_response("http://r.local/share/file", vec![]),
        ]);
        let root = build_tree(doc).unwrap();
        assert_eq!(root.items.len(), 1);
        assert_eq!(root.items[0].name(), "file");
    }
}
