use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::Error as QError;

use super::types::*;
use super::xml::{IWrite, QWrite, Writer};

/// Serialize a request body, XML declaration included, `D` bound to `DAV:`
/// on the root element.
pub async fn to_xml_string<T: QWrite>(elem: &T) -> Result<String, QError> {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let q = quick_xml::writer::Writer::new(&mut buf);
        let mut xml = Writer {
            q,
            ns_to_apply: vec![("xmlns:D".into(), "DAV:".into())],
        };

        let decl = BytesDecl::from_start(BytesStart::from_content(
            "xml version=\"1.0\" encoding=\"utf-8\"",
            0,
        ));
        xml.q.write_event_async(Event::Decl(decl)).await?;
        elem.qwrite(&mut xml).await?;
    }

    String::from_utf8(buf.into_inner()).map_err(|e| QError::NonDecodable(Some(e.utf8_error())))
}

// ---- REQUEST BODIES ----

impl QWrite for PropFind {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("propfind");
        let end = start.to_end();

        xml.q.write_event_async(Event::Start(start.clone())).await?;
        match self {
            Self::AllProp => {
                let allprop = xml.create_dav_element("allprop");
                xml.q.write_event_async(Event::Empty(allprop)).await?;
            }
            Self::Prop(props) => {
                let prop_start = xml.create_dav_element("prop");
                let prop_end = prop_start.to_end();

                xml.q
                    .write_event_async(Event::Start(prop_start.clone()))
                    .await?;
                for prop in props.iter() {
                    prop.qwrite(xml).await?;
                }
                xml.q.write_event_async(Event::End(prop_end)).await?;
            }
        }
        xml.q.write_event_async(Event::End(end)).await
    }
}

impl QWrite for PropertyRequest {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let elem = xml.create_dav_element(self.dav_name());
        xml.q.write_event_async(Event::Empty(elem)).await
    }
}

impl QWrite for LockInfoRequest {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("lockinfo");
        let end = start.to_end();

        xml.q.write_event_async(Event::Start(start.clone())).await?;
        self.lockscope.qwrite(xml).await?;
        self.locktype.qwrite(xml).await?;
        if let Some(owner) = &self.owner {
            owner.qwrite(xml).await?;
        }
        xml.q.write_event_async(Event::End(end)).await
    }
}

impl QWrite for PropertyUpdate {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("propertyupdate");
        let end = start.to_end();

        xml.q.write_event_async(Event::Start(start.clone())).await?;
        if !self.set.is_empty() {
            let set_start = xml.create_dav_element("set");
            let set_end = set_start.to_end();
            let prop_start = xml.create_dav_element("prop");
            let prop_end = prop_start.to_end();

            xml.q
                .write_event_async(Event::Start(set_start.clone()))
                .await?;
            xml.q
                .write_event_async(Event::Start(prop_start.clone()))
                .await?;
            for (name, value) in self.set.iter() {
                let elem = name.element();
                let elem_end = elem.to_end();
                xml.q.write_event_async(Event::Start(elem.clone())).await?;
                xml.q
                    .write_event_async(Event::Text(BytesText::new(value)))
                    .await?;
                xml.q.write_event_async(Event::End(elem_end)).await?;
            }
            xml.q.write_event_async(Event::End(prop_end)).await?;
            xml.q.write_event_async(Event::End(set_end)).await?;
        }
        if !self.remove.is_empty() {
            let rm_start = xml.create_dav_element("remove");
            let rm_end = rm_start.to_end();
            let prop_start = xml.create_dav_element("prop");
            let prop_end = prop_start.to_end();

            xml.q
                .write_event_async(Event::Start(rm_start.clone()))
                .await?;
            xml.q
                .write_event_async(Event::Start(prop_start.clone()))
                .await?;
            for name in self.remove.iter() {
                xml.q.write_event_async(Event::Empty(name.element())).await?;
            }
            xml.q.write_event_async(Event::End(prop_end)).await?;
            xml.q.write_event_async(Event::End(rm_end)).await?;
        }
        xml.q.write_event_async(Event::End(end)).await
    }
}

impl PropertyName {
    /// element for this property name: `D:` prefixed inside `DAV:`,
    /// self-declared otherwise
    fn element(&self) -> BytesStart<'static> {
        match self.namespace.as_deref() {
            Some("DAV:") | None => BytesStart::new(format!("D:{}", self.local)),
            Some(ns) => {
                let mut start = BytesStart::new(self.local.clone());
                start.push_attribute(("xmlns", ns));
                start
            }
        }
    }
}

// ---- shared elements ----

impl QWrite for LockScope {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("lockscope");
        let end = start.to_end();

        xml.q.write_event_async(Event::Start(start.clone())).await?;
        let inner = xml.create_dav_element(match self {
            Self::Exclusive => "exclusive",
            Self::Shared => "shared",
        });
        xml.q.write_event_async(Event::Empty(inner)).await?;
        xml.q.write_event_async(Event::End(end)).await
    }
}

impl QWrite for LockType {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("locktype");
        let end = start.to_end();

        xml.q.write_event_async(Event::Start(start.clone())).await?;
        let write = xml.create_dav_element("write");
        xml.q.write_event_async(Event::Empty(write)).await?;
        xml.q.write_event_async(Event::End(end)).await
    }
}

impl QWrite for Owner {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("owner");
        let end = start.to_end();

        xml.q.write_event_async(Event::Start(start.clone())).await?;
        match self {
            Self::Txt(txt) => {
                xml.q
                    .write_event_async(Event::Text(BytesText::new(txt)))
                    .await?;
            }
            Self::Href(href) => href.qwrite(xml).await?,
            Self::Unknown => (),
        }
        xml.q.write_event_async(Event::End(end)).await
    }
}

impl QWrite for Href {
    async fn qwrite(&self, xml: &mut Writer<impl IWrite>) -> Result<(), QError> {
        let start = xml.create_dav_element("href");
        let end = start.to_end();

        xml.q.write_event_async(Event::Start(start.clone())).await?;
        xml.q
            .write_event_async(Event::Text(BytesText::new(&self.0)))
            .await?;
        xml.q.write_event_async(Event::End(end)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn propfind_allprop() {
        let got = to_xml_string(&PropFind::AllProp).await.unwrap();
        assert_eq!(
            got,
            r#"<?xml version="1.0" encoding="utf-8"?><D:propfind xmlns:D="DAV:"><D:allprop/></D:propfind>"#
        );
    }

    #[tokio::test]
    async fn propfind_restricted_media_props() {
        let got = to_xml_string(&PropFind::Prop(vec![
            PropertyRequest::GetLastModified,
            PropertyRequest::GetContentLength,
            PropertyRequest::GetContentType,
            PropertyRequest::GetMetadata,
        ]))
        .await
        .unwrap();
        assert_eq!(
            got,
            r#"<?xml version="1.0" encoding="utf-8"?><D:propfind xmlns:D="DAV:"><D:prop><D:getlastmodified/><D:getcontentlength/><D:getcontenttype/><D:getmetadata/></D:prop></D:propfind>"#
        );
    }

    #[tokio::test]
    async fn lockinfo_with_owner() {
        let got = to_xml_string(&LockInfoRequest {
            lockscope: LockScope::Exclusive,
            locktype: LockType::Write,
            owner: Some(Owner::Href(Href("http://owner/".into()))),
        })
        .await
        .unwrap();
        assert_eq!(
            got,
            r#"<?xml version="1.0" encoding="utf-8"?><D:lockinfo xmlns:D="DAV:"><D:lockscope><D:exclusive/></D:lockscope><D:locktype><D:write/></D:locktype><D:owner><D:href>http://owner/</D:href></D:owner></D:lockinfo>"#
        );
    }

    #[tokio::test]
    async fn propertyupdate_set_and_remove() {
        let got = to_xml_string(&PropertyUpdate {
            set: vec![(
                PropertyName {
                    namespace: Some("DAV:".into()),
                    local: "displayname".into(),
                },
                "new name".into(),
            )],
            remove: vec![PropertyName {
                namespace: Some("http://ns.example.com/z/".into()),
                local: "Copyright-Owner".into(),
            }],
        })
        .await
        .unwrap();
        assert_eq!(
            got,
            r#"<?xml version="1.0" encoding="utf-8"?><D:propertyupdate xmlns:D="DAV:"><D:set><D:prop><D:displayname>new name</D:displayname></D:prop></D:set><D:remove><D:prop><Copyright-Owner xmlns="http://ns.example.com/z/"/></D:prop></D:remove></D:propertyupdate>"#
        );
    }
}
