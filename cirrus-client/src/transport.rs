use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::header::Headers;

/// Pooled HTTP(S) connection layer. One instance per [`Client`]; requests
/// may run concurrently, each resolves exactly once.
///
/// [`Client`]: crate::Client
pub(crate) struct Transport {
    client: HyperClient<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let builder = hyper_rustls::HttpsConnectorBuilder::new();
        let connector = if config.accept_invalid_certs {
            let tls = rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(std::sync::Arc::new(danger::NoVerifier::new()))
                .with_no_client_auth();
            builder
                .with_tls_config(tls)
                .https_or_http()
                .enable_http1()
                .build()
        } else {
            builder
                .with_native_roots()
                .map_err(Error::transport)?
                .https_or_http()
                .enable_http1()
                .build()
        };

        Ok(Self {
            client: HyperClient::builder(TokioExecutor::new()).build(connector),
        })
    }

    pub async fn send(
        &self,
        req: http::Request<Full<Bytes>>,
    ) -> Result<(StatusCode, Headers, Bytes), Error> {
        let resp = self.client.request(req).await.map_err(Error::transport)?;
        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await.map_err(Error::transport)?.to_bytes();
        Ok((
            parts.status,
            Headers::from_header_map(&parts.headers),
            bytes,
        ))
    }
}

/// Router firmware ships self-signed certificates; with
/// `accept_invalid_certs` the identity check is skipped while signature
/// verification stays on.
mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, SignatureScheme};

    #[derive(Debug)]
    pub(super) struct NoVerifier(CryptoProvider);

    impl NoVerifier {
        pub(super) fn new() -> Self {
            Self(rustls::crypto::ring::default_provider())
        }
    }

    impl ServerCertVerifier for NoVerifier {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0.signature_verification_algorithms.supported_schemes()
        }
    }
}
