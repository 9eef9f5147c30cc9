use chrono::DateTime;
use quick_xml::events::Event;

use super::error::ParsingError;
use super::types::*;
use super::xml::{IRead, QRead, Reader, DAV_URN};

// ---- ROOT ----

impl QRead<Multistatus> for Multistatus {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "multistatus").await?;
        let mut responses = Vec::new();
        let mut responsedescription = None;

        loop {
            let mut dirty = false;
            xml.maybe_push(&mut responses, &mut dirty).await?;
            xml.maybe_read(&mut responsedescription, &mut dirty).await?;
            if !dirty {
                match xml.peek() {
                    Event::End(_) => break,
                    _ => xml.skip().await?,
                };
            }
        }

        xml.close().await?;
        Ok(Multistatus {
            responses,
            responsedescription,
        })
    }
}

impl QRead<LockResponse> for LockResponse {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "prop").await?;
        let mut locks = None;

        loop {
            let mut dirty = false;
            if locks.is_none() && xml.maybe_open(DAV_URN, "lockdiscovery").await?.is_some() {
                locks = Some(xml.collect::<ActiveLock>().await?);
                xml.close().await?;
                dirty = true;
            }
            if !dirty {
                match xml.peek() {
                    Event::End(_) => break,
                    _ => xml.skip().await?,
                };
            }
        }

        xml.close().await?;
        locks.map(LockResponse).ok_or(ParsingError::MissingChild)
    }
}

// ---- INNER XML ----

impl QRead<Response> for Response {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "response").await?;
        let (mut status, mut responsedescription) = (None, None);
        let mut href = Vec::new();
        let mut propstat = Vec::new();

        loop {
            let mut dirty = false;
            xml.maybe_read::<Status>(&mut status, &mut dirty).await?;
            xml.maybe_push::<Href>(&mut href, &mut dirty).await?;
            xml.maybe_push::<PropStat>(&mut propstat, &mut dirty).await?;
            xml.maybe_read::<ResponseDescription>(&mut responsedescription, &mut dirty)
                .await?;

            if !dirty {
                match xml.peek() {
                    Event::End(_) => break,
                    _ => xml.skip().await?,
                };
            }
        }

        xml.close().await?;
        match (status, &propstat[..], &href[..]) {
            (Some(status), &[], &[_, ..]) => Ok(Response {
                status_or_propstat: StatusOrPropstat::Status(href, status),
                responsedescription,
            }),
            (None, &[_, ..], &[_, ..]) => Ok(Response {
                status_or_propstat: StatusOrPropstat::PropStat(
                    href.into_iter().next().unwrap(),
                    propstat,
                ),
                responsedescription,
            }),
            (Some(_), &[_, ..], _) => Err(ParsingError::InvalidValue),
            _ => Err(ParsingError::MissingChild),
        }
    }
}

impl QRead<PropStat> for PropStat {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "propstat").await?;

        let (mut m_prop, mut m_status) = (None, None);

        loop {
            let mut dirty = false;
            xml.maybe_read::<PropList>(&mut m_prop, &mut dirty).await?;
            xml.maybe_read::<Status>(&mut m_status, &mut dirty).await?;

            if !dirty {
                match xml.peek() {
                    Event::End(_) => break,
                    _ => xml.skip().await?,
                };
            }
        }

        xml.close().await?;
        match (m_prop, m_status) {
            (Some(prop), Some(status)) => Ok(PropStat { prop, status }),
            _ => Err(ParsingError::MissingChild),
        }
    }
}

impl QRead<PropList> for PropList {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "prop").await?;
        let acc = xml.collect::<Property>().await?;
        xml.close().await?;
        Ok(PropList(acc))
    }
}

impl QRead<Status> for Status {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "status").await?;
        let fullcode = xml.tag_string().await?;
        let txtcode = fullcode
            .splitn(3, ' ')
            .nth(1)
            .ok_or(ParsingError::InvalidValue)?;
        let code = http::status::StatusCode::from_bytes(txtcode.as_bytes())
            .or(Err(ParsingError::InvalidValue))?;
        xml.close().await?;
        Ok(Status(code))
    }
}

impl QRead<ResponseDescription> for ResponseDescription {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "responsedescription").await?;
        let cnt = xml.tag_string().await?;
        xml.close().await?;
        Ok(ResponseDescription(cnt))
    }
}

impl QRead<Href> for Href {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "href").await?;
        let url = xml.tag_string().await?;
        xml.close().await?;
        Ok(Href(url))
    }
}

// ---- PROPERTIES ----

impl QRead<Property> for Property {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        // RFC 4918 live properties
        if xml
            .maybe_open_start(DAV_URN, "creationdate")
            .await?
            .is_some()
        {
            let datestr = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::CreationDate(DateTime::parse_from_rfc3339(
                datestr.as_str(),
            )?));
        } else if xml
            .maybe_open_start(DAV_URN, "displayname")
            .await?
            .is_some()
        {
            let name = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::DisplayName(name));
        } else if xml
            .maybe_open_start(DAV_URN, "getcontentlength")
            .await?
            .is_some()
        {
            let cl = xml.tag_string().await?.trim().parse::<u64>()?;
            xml.close().await?;
            return Ok(Property::GetContentLength(cl));
        } else if xml
            .maybe_open_start(DAV_URN, "getcontenttype")
            .await?
            .is_some()
        {
            let ct = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetContentType(ct));
        } else if xml.maybe_open_start(DAV_URN, "getetag").await?.is_some() {
            let etag = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetEtag(etag));
        } else if xml
            .maybe_open_start(DAV_URN, "getlastmodified")
            .await?
            .is_some()
        {
            let datestr = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetLastModified(DateTime::parse_from_rfc2822(
                datestr.trim(),
            )?));
        }

        // structured properties
        if xml.maybe_open(DAV_URN, "resourcetype").await?.is_some() {
            let mut collection = false;
            while xml.parent_has_child() {
                if xml.maybe_open(DAV_URN, "collection").await?.is_some() {
                    xml.close().await?;
                    collection = true;
                    continue;
                }
                match xml.peek() {
                    Event::End(_) => break,
                    _ => {
                        xml.skip().await?;
                    }
                }
            }
            xml.close().await?;
            return Ok(Property::ResourceType { collection });
        } else if xml.maybe_open(DAV_URN, "lockdiscovery").await?.is_some() {
            let acc = xml.collect::<ActiveLock>().await?;
            xml.close().await?;
            return Ok(Property::LockDiscovery(acc));
        } else if xml.maybe_open(DAV_URN, "supportedlock").await?.is_some() {
            let acc = xml.collect::<LockEntry>().await?;
            xml.close().await?;
            return Ok(Property::SupportedLock(acc));
        } else if xml.maybe_open(DAV_URN, "getattr").await?.is_some() {
            let (mut readonly, mut hidden) = (None, None);
            while xml.parent_has_child() {
                if xml.maybe_open_start(DAV_URN, "readonly").await?.is_some() {
                    readonly = Some(xml.tag_string().await?);
                    xml.close().await?;
                    continue;
                }
                if xml.maybe_open_start(DAV_URN, "hidden").await?.is_some() {
                    hidden = Some(xml.tag_string().await?);
                    xml.close().await?;
                    continue;
                }
                match xml.peek() {
                    Event::End(_) => break,
                    _ => {
                        xml.skip().await?;
                    }
                }
            }
            xml.close().await?;
            return Ok(Property::GetAttr { readonly, hidden });
        } else if xml.maybe_open(DAV_URN, "getmetadata").await?.is_some() {
            let mut meta = Metadata::default();
            while xml.parent_has_child() {
                if xml.maybe_open_start(DAV_URN, "title").await?.is_some() {
                    meta.title = Some(xml.tag_string().await?);
                    xml.close().await?;
                    continue;
                }
                if xml.maybe_open_start(DAV_URN, "thumb").await?.is_some() {
                    meta.thumb = Some(xml.tag_string().await?);
                    xml.close().await?;
                    continue;
                }
                if xml
                    .maybe_open_start(DAV_URN, "thumb_image")
                    .await?
                    .is_some()
                {
                    meta.thumb_image = Some(xml.tag_string().await?);
                    xml.close().await?;
                    continue;
                }
                match xml.peek() {
                    Event::End(_) => break,
                    _ => {
                        xml.skip().await?;
                    }
                }
            }
            xml.close().await?;
            return Ok(Property::GetMetadata(meta));
        }

        // vendor text properties
        if xml
            .maybe_open_start(DAV_URN, "getuniqueid")
            .await?
            .is_some()
        {
            let v = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetUniqueId(v));
        } else if xml.maybe_open_start(DAV_URN, "getonline").await?.is_some() {
            let v = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetOnline(v));
        } else if xml.maybe_open_start(DAV_URN, "getmac").await?.is_some() {
            let v = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetMac(v));
        } else if xml.maybe_open_start(DAV_URN, "getip").await?.is_some() {
            let v = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetIp(v));
        } else if xml.maybe_open_start(DAV_URN, "gettype").await?.is_some() {
            let v = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetType(v));
        } else if xml
            .maybe_open_start(DAV_URN, "getuseragent")
            .await?
            .is_some()
        {
            let v = xml.tag_string().await?;
            xml.close().await?;
            return Ok(Property::GetUserAgent(v));
        } else if xml
            .maybe_open_start(DAV_URN, "getroutersync")
            .await?
            .is_some()
        {
            let v = xml.deep_text().await?;
            xml.close().await?;
            return Ok(Property::GetRouterSync(v));
        }

        // anything else is kept as a raw (name, text) pair
        let (namespace, local) = xml.peek_name().ok_or(ParsingError::Recoverable)?;
        xml.open_any().await?;
        let text = xml.deep_text().await?;
        xml.close().await?;
        Ok(Property::Unknown(PropertyName { namespace, local }, text))
    }
}

// ---- LOCKS ----

impl QRead<ActiveLock> for ActiveLock {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "activelock").await?;
        let mut lock = ActiveLock::default();

        loop {
            let mut dirty = false;
            xml.maybe_read::<LockScope>(&mut lock.lockscope, &mut dirty)
                .await?;
            xml.maybe_read::<LockType>(&mut lock.locktype, &mut dirty)
                .await?;
            xml.maybe_read::<Depth>(&mut lock.depth, &mut dirty).await?;
            xml.maybe_read::<Owner>(&mut lock.owner, &mut dirty).await?;
            xml.maybe_read::<Timeout>(&mut lock.timeout, &mut dirty)
                .await?;
            xml.maybe_read::<LockToken>(&mut lock.locktoken, &mut dirty)
                .await?;
            xml.maybe_read::<LockRoot>(&mut lock.lockroot, &mut dirty)
                .await?;

            if !dirty {
                match xml.peek() {
                    Event::End(_) => break,
                    _ => {
                        xml.skip().await?;
                    }
                }
            }
        }

        xml.close().await?;
        Ok(lock)
    }
}

impl QRead<Depth> for Depth {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "depth").await?;
        let depth_str = xml.tag_string().await?;
        xml.close().await?;
        match depth_str.trim() {
            "0" => Ok(Depth::Zero),
            "1" => Ok(Depth::One),
            "infinity" => Ok(Depth::Infinity),
            _ => Err(ParsingError::WrongToken),
        }
    }
}

impl QRead<Owner> for Owner {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "owner").await?;

        let mut owner = Owner::Unknown;
        while xml.parent_has_child() {
            match xml.peek() {
                Event::Text(_) | Event::CData(_) => {
                    let txt = xml.tag_string().await?;
                    if matches!(owner, Owner::Unknown) && !txt.trim().is_empty() {
                        owner = Owner::Txt(txt);
                    }
                }
                Event::Start(_) | Event::Empty(_) => match Href::qread(xml).await {
                    Ok(href) => {
                        owner = Owner::Href(href);
                    }
                    Err(ParsingError::Recoverable) => {
                        xml.skip().await?;
                    }
                    Err(e) => return Err(e),
                },
                Event::End(_) => break,
                _ => {
                    xml.skip().await?;
                }
            }
        }
        xml.close().await?;
        Ok(owner)
    }
}

impl QRead<Timeout> for Timeout {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        const SEC_PFX: &str = "Second-";
        xml.open(DAV_URN, "timeout").await?;

        let timeout = match xml.tag_string().await?.trim() {
            "Infinite" => Timeout::Infinite,
            seconds => match seconds.strip_prefix(SEC_PFX) {
                Some(secs) => Timeout::Seconds(secs.parse::<u32>()?),
                None => return Err(ParsingError::InvalidValue),
            },
        };

        xml.close().await?;
        Ok(timeout)
    }
}

impl QRead<LockToken> for LockToken {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "locktoken").await?;
        let href = xml.find::<Href>().await?;
        xml.close().await?;
        Ok(LockToken(href))
    }
}

impl QRead<LockRoot> for LockRoot {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "lockroot").await?;
        let href = xml.find::<Href>().await?;
        xml.close().await?;
        Ok(LockRoot(href))
    }
}

impl QRead<LockEntry> for LockEntry {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "lockentry").await?;
        let (mut maybe_scope, mut maybe_type) = (None, None);

        loop {
            let mut dirty = false;
            xml.maybe_read::<LockScope>(&mut maybe_scope, &mut dirty)
                .await?;
            xml.maybe_read::<LockType>(&mut maybe_type, &mut dirty)
                .await?;
            if !dirty {
                match xml.peek() {
                    Event::End(_) => break,
                    _ => xml.skip().await?,
                };
            }
        }

        xml.close().await?;
        match (maybe_scope, maybe_type) {
            (Some(lockscope), Some(locktype)) => Ok(LockEntry {
                lockscope,
                locktype,
            }),
            _ => Err(ParsingError::MissingChild),
        }
    }
}

impl QRead<LockScope> for LockScope {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "lockscope").await?;

        let lockscope = loop {
            if xml.maybe_open(DAV_URN, "exclusive").await?.is_some() {
                xml.close().await?;
                break LockScope::Exclusive;
            }

            if xml.maybe_open(DAV_URN, "shared").await?.is_some() {
                xml.close().await?;
                break LockScope::Shared;
            }

            xml.skip().await?;
        };

        xml.close().await?;
        Ok(lockscope)
    }
}

impl QRead<LockType> for LockType {
    async fn qread(xml: &mut Reader<impl IRead>) -> Result<Self, ParsingError> {
        xml.open(DAV_URN, "locktype").await?;

        let locktype = loop {
            if xml.maybe_open(DAV_URN, "write").await?.is_some() {
                xml.close().await?;
                break LockType::Write;
            }

            xml.skip().await?;
        };

        xml.close().await?;
        Ok(locktype)
    }
}
