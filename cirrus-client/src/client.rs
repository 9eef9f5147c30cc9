use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::Future;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Bytes;

use cirrus_dav::encoder::to_xml_string;
use cirrus_dav::types::{
    Depth, Href, LockInfoRequest, LockType, Owner, PropFind, PropertyRequest, PropertyUpdate,
};

use crate::config::{BasicAuth, ClientConfig};
use crate::error::{Error, MalformedResponse};
use crate::header::Headers;
use crate::lock::LockPhase;
use crate::request::{
    coded_token, ByteRange, DavMethod, LockParams, MediaListQuery, RequestSpec, RootCertParams,
    TwitterUploadParams, INFINITE_TIMEOUT,
};
use crate::response::{classify, DavResponse};
use crate::transport::Transport;

/// Client for one firmware WebDAV endpoint.
///
/// One verb, one method: each builds the verb's header set and body, sends
/// it, and classifies the answer. Paths are sent as given (callers
/// percent-encode); requests may run concurrently, and callers that need
/// ordering await each call before issuing the next.
pub struct Client {
    config: ClientConfig,
    transport: Transport,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            transport: Transport::new(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- send path ----

    async fn dispatch(&self, spec: RequestSpec) -> Result<DavResponse, Error> {
        let (status, headers, body) = self.send(&spec).await?;
        // firmware compatibility: a 501 is answered again, exactly once
        let (status, headers, body) = if status == StatusCode::NOT_IMPLEMENTED {
            tracing::warn!(
                verb = spec.method.as_str(),
                path = %spec.path,
                "server answered 501, retrying once"
            );
            self.send(&spec).await?
        } else {
            (status, headers, body)
        };
        classify(spec.method, status, headers, body).await
    }

    async fn send(&self, spec: &RequestSpec) -> Result<(StatusCode, Headers, Bytes), Error> {
        let url = format!("{}{}", self.config.base_url(), normalize_path(&spec.path));
        tracing::debug!(verb = spec.method.as_str(), url = %url, "request");

        let mut builder = http::Request::builder()
            .method(spec.method.http_method())
            .uri(url.as_str());
        if spec.header_value("authorization").is_none() {
            if let Some(auth) = self.config.auth.as_ref() {
                builder = builder.header("Authorization", basic_auth_value(auth));
            }
        }
        for (name, value) in &spec.headers {
            builder = builder.header(*name, value.as_str());
        }
        let req = builder
            .body(Full::new(spec.body.clone()))
            .map_err(|e| Error::Usage(format!("invalid request for {:?}: {}", spec.path, e)))?;

        self.transport.send(req).await
    }

    // ---- RFC 4918 verbs ----

    pub async fn build_propfind(
        &self,
        path: &str,
        depth: Option<Depth>,
        media_type: Option<&str>,
        auth: Option<&BasicAuth>,
    ) -> Result<RequestSpec, Error> {
        let body = to_xml_string(&PropFind::AllProp)
            .await
            .map_err(encode_err)?;
        Ok(RequestSpec::new(DavMethod::Propfind, path)
            .header("Depth", depth.unwrap_or(Depth::Zero).as_str())
            .opt_header("Mtype", media_type)
            .opt_header("Authorization", auth.map(basic_auth_value))
            .xml_body(body))
    }

    /// List `path`. Depth unset means `0`; `media_type` and `auth` are
    /// omitted from the request when absent.
    pub async fn propfind(
        &self,
        path: &str,
        depth: Option<Depth>,
        media_type: Option<&str>,
        auth: Option<&BasicAuth>,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_propfind(path, depth, media_type, auth).await?;
        self.dispatch(spec).await
    }

    pub fn build_get(&self, path: &str) -> RequestSpec {
        RequestSpec::new(DavMethod::Get, path)
    }

    pub async fn get(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(self.build_get(path)).await
    }

    pub fn build_put(
        &self,
        path: &str,
        content: impl Into<Bytes>,
        range: Option<ByteRange>,
        auto_create_folder: Option<bool>,
        locktoken: Option<&str>,
    ) -> RequestSpec {
        RequestSpec::new(DavMethod::Put, path)
            .opt_header(
                "Content-Range",
                range.map(|r| format!("bytes {}-{}/{}", r.start, r.stop, r.filesize)),
            )
            .opt_header(
                "Auto-CreateFolder",
                auto_create_folder.map(|b| if b { "T" } else { "F" }),
            )
            .opt_header("If", locktoken.map(coded_token))
            .body(content)
    }

    /// Upload `content` to `path`. `range` carries the
    /// `Content-Range: bytes {start}-{stop}/{filesize}` window of a
    /// resumable upload; `locktoken` protects a lock-guarded write.
    pub async fn put(
        &self,
        path: &str,
        content: impl Into<Bytes>,
        range: Option<ByteRange>,
        auto_create_folder: Option<bool>,
        locktoken: Option<&str>,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_put(path, content, range, auto_create_folder, locktoken);
        self.dispatch(spec).await
    }

    pub fn build_delete(&self, path: &str) -> RequestSpec {
        RequestSpec::new(DavMethod::Delete, path)
    }

    pub async fn delete(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(self.build_delete(path)).await
    }

    /// Delete several resources strictly one at a time: the next DELETE is
    /// issued only once the previous one resolved.
    pub async fn delete_all<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<DavResponse>, Error> {
        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            out.push(self.delete(path.as_ref()).await?);
        }
        Ok(out)
    }

    pub fn build_mkcol(&self, path: &str) -> RequestSpec {
        RequestSpec::new(DavMethod::Mkcol, path)
    }

    pub async fn mkcol(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(self.build_mkcol(path)).await
    }

    pub fn build_copy(
        &self,
        path: &str,
        topath: &str,
        overwrite: Option<bool>,
        locktoken: Option<&str>,
    ) -> RequestSpec {
        RequestSpec::new(DavMethod::Copy, path)
            .header("Destination", self.destination_url(topath))
            .opt_header("Overwrite", overwrite.map(|b| if b { "T" } else { "F" }))
            .opt_header("If", locktoken.map(coded_token))
    }

    pub async fn copy_resource(
        &self,
        path: &str,
        topath: &str,
        overwrite: Option<bool>,
        locktoken: Option<&str>,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_copy(path, topath, overwrite, locktoken);
        self.dispatch(spec).await
    }

    pub fn build_move(
        &self,
        path: &str,
        topath: &str,
        overwrite: Option<bool>,
        locktoken: Option<&str>,
    ) -> RequestSpec {
        RequestSpec::new(DavMethod::Move, path)
            .header("Destination", self.destination_url(topath))
            .opt_header("Overwrite", overwrite.map(|b| if b { "T" } else { "F" }))
            .opt_header("If", locktoken.map(coded_token))
    }

    pub async fn move_resource(
        &self,
        path: &str,
        topath: &str,
        overwrite: Option<bool>,
        locktoken: Option<&str>,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_move(path, topath, overwrite, locktoken);
        self.dispatch(spec).await
    }

    pub async fn build_proppatch(
        &self,
        path: &str,
        update: &PropertyUpdate,
    ) -> Result<RequestSpec, Error> {
        let body = to_xml_string(update).await.map_err(encode_err)?;
        Ok(RequestSpec::new(DavMethod::Proppatch, path).xml_body(body))
    }

    pub async fn proppatch(
        &self,
        path: &str,
        update: &PropertyUpdate,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_proppatch(path, update).await?;
        self.dispatch(spec).await
    }

    pub async fn build_lock(
        &self,
        path: &str,
        owner: &str,
        params: &LockParams,
    ) -> Result<RequestSpec, Error> {
        let owner = match owner {
            "" => None,
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Some(Owner::Href(Href(url.to_string())))
            }
            txt => Some(Owner::Txt(txt.to_string())),
        };
        let body = to_xml_string(&LockInfoRequest {
            lockscope: params.scope,
            locktype: LockType::Write,
            owner,
        })
        .await
        .map_err(encode_err)?;

        let timeout = match params.timeout_secs {
            Some(secs) => format!("Second-{}", secs),
            None => INFINITE_TIMEOUT.to_string(),
        };
        Ok(RequestSpec::new(DavMethod::Lock, path)
            .header("Depth", params.depth.as_str())
            .header("Timeout", timeout)
            .opt_header("If", params.locktoken.as_deref().map(coded_token))
            .xml_body(body))
    }

    /// Take (or refresh) a write lock. A 200 answer delivers the flattened
    /// [`LockInfo`](crate::LockInfo) as content.
    pub async fn lock(
        &self,
        path: &str,
        owner: &str,
        params: LockParams,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_lock(path, owner, &params).await?;
        self.dispatch(spec).await
    }

    pub fn build_unlock(&self, path: &str, locktoken: &str) -> RequestSpec {
        RequestSpec::new(DavMethod::Unlock, path).header("Lock-Token", coded_token(locktoken))
    }

    pub async fn unlock(&self, path: &str, locktoken: &str) -> Result<DavResponse, Error> {
        self.dispatch(self.build_unlock(path, locktoken)).await
    }

    pub async fn options(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::Options, path))
            .await
    }

    // ---- lock-guarded sequences ----

    /// MOVE under a fresh lock: LOCK, MOVE with `If: <token>`, UNLOCK —
    /// strictly in that order, the firmware UI's rename flow.
    pub async fn move_locked(
        &self,
        path: &str,
        topath: &str,
        overwrite: Option<bool>,
    ) -> Result<DavResponse, Error> {
        self.run_locked(path, |token| async move {
            self.move_resource(path, topath, overwrite, Some(&token))
                .await?
                .error_for_status()
        })
        .await
    }

    /// COPY under a fresh lock; same sequencing as [`Client::move_locked`].
    pub async fn copy_locked(
        &self,
        path: &str,
        topath: &str,
        overwrite: Option<bool>,
    ) -> Result<DavResponse, Error> {
        self.run_locked(path, |token| async move {
            self.copy_resource(path, topath, overwrite, Some(&token))
                .await?
                .error_for_status()
        })
        .await
    }

    async fn run_locked<F, Fut>(&self, path: &str, act: F) -> Result<DavResponse, Error>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<DavResponse, Error>>,
    {
        let mut phase = LockPhase::Locking;
        tracing::debug!(path, ?phase, "lock sequence");
        let locked = self
            .lock(path, "", LockParams::default())
            .await?
            .error_for_status()?;
        let token = locked
            .lock_token()
            .ok_or(Error::MalformedResponse(MalformedResponse::MissingLockToken))?;

        phase = LockPhase::Acting;
        tracing::debug!(path, ?phase, "lock sequence");
        let outcome = act(token.clone()).await;

        phase = LockPhase::Unlocking;
        tracing::debug!(path, ?phase, "lock sequence");
        if let Err(e) = self.unlock(path, &token).await {
            tracing::warn!(path, err = %e, "UNLOCK failed after lock-guarded operation");
        }

        phase = match outcome {
            Ok(_) => LockPhase::Done,
            Err(_) => LockPhase::Failed,
        };
        tracing::debug!(path, ?phase, "lock sequence");
        outcome
    }

    // ---- vendor verbs ----

    pub fn build_wol(&self, path: &str, mac: &str) -> RequestSpec {
        RequestSpec::new(DavMethod::Wol, path).header("WOLMAC", mac)
    }

    /// Wake a sleeping LAN host by MAC address.
    pub async fn wol(&self, path: &str, mac: &str) -> Result<DavResponse, Error> {
        self.dispatch(self.build_wol(path, mac)).await
    }

    pub fn build_gsl(
        &self,
        path: &str,
        url: &str,
        filename: &str,
        expire: u32,
        toshare: u32,
    ) -> RequestSpec {
        RequestSpec::new(DavMethod::Gsl, path)
            .header("URL", url)
            .header("FILENAME", filename)
            .header("EXPIRE", expire.to_string())
            .header("TOSHARE", toshare.to_string())
    }

    /// Generate a share link; the answer is a small
    /// `<result><sharelink>...` fragment delivered raw.
    pub async fn gsl(
        &self,
        path: &str,
        url: &str,
        filename: &str,
        expire: u32,
        toshare: u32,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_gsl(path, url, filename, expire, toshare);
        self.dispatch(spec).await
    }

    pub async fn gsll(
        &self,
        path: &str,
        encode_filename: Option<&str>,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::Gsll, path)
            .opt_header("ENCODE_FILENAME", encode_filename);
        self.dispatch(spec).await
    }

    pub async fn remove_share_link(&self, path: &str, sharelink: &str) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::RemoveSl, path).header("SHARELINK", sharelink);
        self.dispatch(spec).await
    }

    pub async fn logout(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::Logout, path))
            .await
    }

    /// Ask the samba layer to rescan the neighborhood for hosts.
    pub async fn rescan_smb_pc(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::RescanSmbPc, path))
            .await
    }

    pub async fn get_router_info(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetRouterInfo, path))
            .await
    }

    pub async fn get_disk_space(&self, path: &str, diskname: &str) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::GetDiskSpace, path).header("DISKNAME", diskname);
        self.dispatch(spec).await
    }

    pub async fn build_propfind_media_list(
        &self,
        path: &str,
        query: &MediaListQuery,
    ) -> Result<RequestSpec, Error> {
        // restricted body: only the properties the media browser renders
        let body = to_xml_string(&PropFind::Prop(vec![
            PropertyRequest::GetLastModified,
            PropertyRequest::GetContentLength,
            PropertyRequest::GetContentType,
            PropertyRequest::GetMetadata,
        ]))
        .await
        .map_err(encode_err)?;

        Ok(RequestSpec::new(DavMethod::PropfindMediaList, path)
            .opt_header("MediaType", query.media_type.as_deref())
            .opt_header("Start", query.start.map(|n| n.to_string()))
            .opt_header("End", query.end.map(|n| n.to_string()))
            .opt_header("Keyword", query.keyword.as_deref())
            .opt_header("Orderby", query.orderby.as_deref())
            .opt_header("Orderrule", query.orderrule.as_deref())
            .opt_header("Parentid", query.parentid.as_deref())
            .xml_body(body))
    }

    /// Query the media index (minidlna) rather than the filesystem.
    pub async fn propfind_media_list(
        &self,
        path: &str,
        query: &MediaListQuery,
    ) -> Result<DavResponse, Error> {
        let spec = self.build_propfind_media_list(path, query).await?;
        self.dispatch(spec).await
    }

    pub async fn get_music_classification(
        &self,
        path: &str,
        classify: &str,
    ) -> Result<DavResponse, Error> {
        let spec =
            RequestSpec::new(DavMethod::GetMusicClassification, path).header("Classify", classify);
        self.dispatch(spec).await
    }

    pub async fn get_account_info(&self, path: &str, username: &str) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::GetAccountInfo, path).header("USERNAME", username);
        self.dispatch(spec).await
    }

    pub async fn get_account_list(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetAccountList, path))
            .await
    }

    pub async fn upload_to_facebook(
        &self,
        path: &str,
        filename: &str,
        title: &str,
        token: &str,
        album: Option<&str>,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::UploadToFacebook, path)
            .header("FILENAME", filename)
            .header("TITLE", title)
            .header("TOKEN", token)
            .opt_header("ALBUM", album);
        self.dispatch(spec).await
    }

    pub async fn upload_to_flickr(
        &self,
        path: &str,
        filename: &str,
        title: &str,
        token: &str,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::UploadToFlickr, path)
            .header("FILENAME", filename)
            .header("TITLE", title)
            .header("TOKEN", token);
        self.dispatch(spec).await
    }

    pub async fn upload_to_picasa(
        &self,
        path: &str,
        filename: &str,
        title: &str,
        uid: &str,
        aid: &str,
        token: &str,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::UploadToPicasa, path)
            .header("FILENAME", filename)
            .header("TITLE", title)
            .header("UID", uid)
            .header("AID", aid)
            .header("TOKEN", token);
        self.dispatch(spec).await
    }

    pub async fn upload_to_twitter(
        &self,
        path: &str,
        params: &TwitterUploadParams,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::UploadToTwitter, path)
            .header("FILENAME", params.filename.clone())
            .header("TITLE", params.title.clone())
            .header("TOKEN", params.token.clone())
            .header("SECRET", params.secret.clone())
            .header("NONCE", params.nonce.clone())
            .header("TIMESTAMP", params.timestamp.clone())
            .header("SIGNATURE", params.signature.clone())
            .opt_header("PHOTOSIZELIMIT", params.photo_size_limit.as_deref());
        self.dispatch(spec).await
    }

    pub async fn gen_root_certificate(
        &self,
        path: &str,
        params: &RootCertParams,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::GenRootCertificate, path)
            .header("KEYLEN", params.keylen.clone())
            .header("CANAME", params.caname.clone())
            .opt_header("EMAIL", params.email.as_deref())
            .opt_header("COUNTRY", params.country.as_deref())
            .opt_header("STATE", params.state.as_deref())
            .opt_header("LN", params.ln.as_deref())
            .opt_header("ORAG", params.organization.as_deref())
            .opt_header("OUNIT", params.unit.as_deref())
            .opt_header("CN", params.cn.as_deref());
        self.dispatch(spec).await
    }

    pub async fn set_root_certificate(
        &self,
        path: &str,
        pem: impl Into<Bytes>,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::SetRootCertificate, path).body(pem);
        self.dispatch(spec).await
    }

    pub async fn apply_app(
        &self,
        path: &str,
        action_mode: &str,
        set_nvram: Option<&str>,
        rc_service: Option<&str>,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::ApplyApp, path)
            .header("ACTION_MODE", action_mode)
            .opt_header("SET_NVRAM", set_nvram)
            .opt_header("RC_SERVICE", rc_service);
        self.dispatch(spec).await
    }

    pub async fn nvram_get(&self, path: &str, key: &str) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::NvramGet, path).header("KEY", key);
        self.dispatch(spec).await
    }

    pub async fn get_cpu_usage(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetCpuUsage, path))
            .await
    }

    pub async fn get_memory_usage(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetMemoryUsage, path))
            .await
    }

    pub async fn open_streaming_port(&self, path: &str, open: &str) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::OpenStreamingPort, path).header("OPEN", open);
        self.dispatch(spec).await
    }

    pub async fn get_srv_time(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetSrvTime, path))
            .await
    }

    pub async fn get_router_mac(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetRouterMac, path))
            .await
    }

    pub async fn get_firmware_version(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetFirmVer, path))
            .await
    }

    pub async fn get_latest_version(&self, path: &str) -> Result<DavResponse, Error> {
        self.dispatch(RequestSpec::new(DavMethod::GetLatestVer, path))
            .await
    }

    pub async fn get_notice(&self, path: &str, timestamp: &str) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::GetNotice, path).header("TIMESTAMP", timestamp);
        self.dispatch(spec).await
    }

    pub async fn get_video_subtitle(
        &self,
        path: &str,
        filename: &str,
    ) -> Result<DavResponse, Error> {
        let spec = RequestSpec::new(DavMethod::GetVideoSubtitle, path).header("FILENAME", filename);
        self.dispatch(spec).await
    }

    fn destination_url(&self, topath: &str) -> String {
        format!("{}{}", self.config.base_url(), normalize_path(topath))
    }
}

fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{}", path))
    }
}

fn basic_auth_value(auth: &BasicAuth) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", auth.username, auth.password))
    )
}

fn encode_err(e: impl std::fmt::Display) -> Error {
    Error::Usage(format!("failed to encode request body: {}", e))
}
