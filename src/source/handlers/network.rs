use super::{FetchHandler, required};
use crate::core::FetchSettings;
use crate::helpers::download::{self, DownloadOptions};
use crate::helpers::internal::url_utils;
use crate::source::{
    Credentials, FetchCause, ProvenanceDescriptor, ProvenanceMode, SourceError, SourceMetadata,
};
use std::path::Path;

/// Transport selected from a network URL's scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Http,
    Smb,
    Nfs,
}

impl Transport {
    fn from_url(url: &str) -> Result<Self, FetchCause> {
        match url_utils::url_scheme(url).as_deref() {
            Some("http" | "https") => Ok(Self::Http),
            Some("smb" | "cifs") => Ok(Self::Smb),
            Some("nfs") => Ok(Self::Nfs),
            Some(other) => Err(FetchCause::UnsupportedTransport(other.to_string())),
            None => Err(FetchCause::UnsupportedTransport(format!(
                "not a network URL: {}",
                url
            ))),
        }
    }
}

/// Fetches a single artifact from a network location.
///
/// Only HTTP(S) is implemented. SMB/CIFS and NFS shares are recognized and
/// rejected with [`FetchCause::UnsupportedTransport`].
#[derive(Debug)]
pub struct NetworkHandler<'a> {
    url: &'a str,
    credentials: Option<&'a Credentials>,
    settings: &'a FetchSettings,
}

impl<'a> NetworkHandler<'a> {
    pub fn new(
        descriptor: &'a ProvenanceDescriptor,
        settings: &'a FetchSettings,
    ) -> Result<Self, SourceError> {
        let url = descriptor
            .location
            .as_deref()
            .ok_or_else(|| required(ProvenanceMode::Network, "location"))?;
        Ok(Self {
            url,
            credentials: descriptor.credentials.as_ref(),
            settings,
        })
    }

    fn fetch_http(&self, destination: &Path) -> Result<SourceMetadata, SourceError> {
        let options = DownloadOptions {
            credentials: self.credentials,
            timeout: self.settings.http_timeout,
            user_agent: &self.settings.user_agent,
        };
        let downloaded =
            download::download_into(self.url, destination, &options).map_err(|c| self.fail(c))?;

        Ok(SourceMetadata::new("network_http", destination)
            .with_origin(Some(self.url))
            .with_artifact(downloaded.path))
    }
}

impl FetchHandler for NetworkHandler<'_> {
    fn mode(&self) -> ProvenanceMode {
        ProvenanceMode::Network
    }

    fn fetch(&self, destination: &Path) -> Result<SourceMetadata, SourceError> {
        match Transport::from_url(self.url).map_err(|c| self.fail(c))? {
            Transport::Http => {
                self.prepare(destination)?;
                self.fetch_http(destination)
            }
            // TODO: mount-and-copy for SMB/NFS shares once a client crate is chosen
            Transport::Smb => Err(self.fail(FetchCause::UnsupportedTransport("smb".into()))),
            Transport::Nfs => Err(self.fail(FetchCause::UnsupportedTransport("nfs".into()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_err(url: &str) -> SourceError {
        let temp = tempfile::tempdir().unwrap();
        let desc = ProvenanceDescriptor::network(url);
        let settings = FetchSettings::default();
        NetworkHandler::new(&desc, &settings)
            .unwrap()
            .fetch(&temp.path().join("dest"))
            .unwrap_err()
    }

    #[test]
    fn test_transport_dispatch() {
        assert_eq!(Transport::from_url("https://nas/a").unwrap(), Transport::Http);
        assert_eq!(Transport::from_url("cifs://nas/share").unwrap(), Transport::Smb);
        assert_eq!(Transport::from_url("nfs://nas/export").unwrap(), Transport::Nfs);
        assert!(Transport::from_url("ftp://nas/a").is_err());
    }

    #[test]
    fn test_smb_is_explicitly_unsupported() {
        let err = fetch_err("smb://nas.lan/share/charts");
        match &err {
            SourceError::Fetch {
                mode: ProvenanceMode::Network,
                cause,
            } => {
                assert!(cause.is_unsupported());
                assert!(!err.is_retryable());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("not implemented for this transport: smb"));
    }

    #[test]
    fn test_nfs_is_explicitly_unsupported() {
        let err = fetch_err("nfs://nas.lan/export/charts");
        assert!(err.to_string().contains("not implemented for this transport: nfs"));
    }

    #[test]
    fn test_unknown_scheme_names_scheme() {
        let err = fetch_err("gopher://old.lan/charts");
        assert!(err.to_string().contains("gopher"));
    }

    mod mock_tests {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test(flavor = "multi_thread")]
        async fn test_http_fetch_records_artifact() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/bundles/values.yaml"))
                .respond_with(ResponseTemplate::new(200).set_body_string("replicas: 2\n"))
                .mount(&mock_server)
                .await;

            let temp = tempfile::tempdir().unwrap();
            let url = format!("{}/bundles/values.yaml", mock_server.uri());
            let desc = ProvenanceDescriptor::network(&url);
            let settings = FetchSettings::default();
            let dest = temp.path().join("dest");

            let meta = NetworkHandler::new(&desc, &settings)
                .unwrap()
                .fetch(&dest)
                .unwrap();

            assert_eq!(meta.source_type, "network_http");
            assert_eq!(meta.origin_location.as_deref(), Some(url.as_str()));
            assert_eq!(meta.artifact, Some(dest.join("values.yaml")));
            assert_eq!(
                std::fs::read_to_string(dest.join("values.yaml")).unwrap(),
                "replicas: 2\n"
            );
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_http_server_error_is_retryable() {
            let mock_server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&mock_server)
                .await;

            let url = format!("{}/flaky.tar.gz", mock_server.uri());
            let err = fetch_err(&url);
            assert!(err.is_retryable());
            assert_eq!(err.mode(), Some(ProvenanceMode::Network));
        }
    }
}
