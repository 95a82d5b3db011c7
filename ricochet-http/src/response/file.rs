//! Serving a filesystem resource with conditional GET and partial content
//! semantics.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha384};

use ricochet_core::error::{ErrorContext, OpaqueError};

use crate::headers::{Cacheable, ContentDisposition, FieldName, Headers};
use crate::range::RequestRange;
use crate::request::Request;
use crate::response::Response;
use crate::{Method, Status};

const DEFAULT_EXPIRES: Duration = Duration::from_secs(30 * 24 * 3600);

/// Options for a [`FileResponse`].
#[derive(Debug, Default, Clone)]
pub struct FileResponseOptions {
    pub etag: Option<String>,
    pub expires: Option<SystemTime>,
    pub filename: Option<String>,
    pub mime: Option<String>,
}

impl FileResponseOptions {
    #[must_use]
    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    #[must_use]
    pub fn expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Serve as an attachment under the given filename.
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// A [`Response`] serving a file, with conditional GET, byte ranges and
/// caching headers.
///
/// The entity tag defaults to a digest of the file content and the MIME
/// type is sniffed from the file name unless overridden. The status is
/// decided against the request at send time: `416` for an unsatisfiable
/// range, `206` for a partial one, `304` when the client's validators
/// still hold, `200` otherwise.
#[derive(Debug, Clone)]
pub struct FileResponse {
    response: Response,
    path: PathBuf,
    size: u64,
    modified: SystemTime,
    expires: SystemTime,
    range: Option<RequestRange>,
    request_headers: Headers,
    request_method: Method,
}

impl FileResponse {
    /// Create a response serving `path` to `request`.
    ///
    /// Fails when the target does not exist or is not a regular file, or
    /// when its metadata or content cannot be read.
    pub fn new(
        path: impl Into<PathBuf>,
        request: &Request,
        options: FileResponseOptions,
    ) -> Result<Self, OpaqueError> {
        let path = path.into();
        let metadata = fs::metadata(&path).context("read file metadata")?;
        if !metadata.is_file() {
            return Err(OpaqueError::from_display(format!(
                "`{}` is not a regular file",
                path.display()
            )));
        }
        let size = metadata.len();
        let modified = metadata.modified().context("read file mtime")?;

        let etag = match options.etag {
            Some(etag) => etag,
            None => digest_etag(&path)?,
        };
        let mime = options
            .mime
            .or_else(|| {
                mime_guess::from_path(&path)
                    .first()
                    .map(|mime| mime.essence_str().to_owned())
            })
            .unwrap_or_else(|| "application/octet-stream".to_owned());

        let mut response = Response::new(super::Body::None, Status::OK);
        response.headers.set(FieldName::Etag, etag.as_str());
        response.headers.set(FieldName::ContentType, mime);
        if let Some(filename) = options.filename {
            response.headers.set(
                FieldName::ContentDisposition,
                ContentDisposition::attachment(filename),
            );
            response.headers.set(
                FieldName::Other("Content-Transfer-Encoding".to_owned()),
                "binary",
            );
        }

        let range = RequestRange::resolve(request.headers(), size, &etag);

        Ok(Self {
            response,
            path,
            size,
            modified,
            expires: options
                .expires
                .unwrap_or_else(|| SystemTime::now() + DEFAULT_EXPIRES),
            range,
            request_headers: request.headers().clone(),
            request_method: request.method().unwrap_or_default(),
        })
    }

    /// The resolved byte range, if the request carried a live one.
    #[must_use]
    pub fn range(&self) -> Option<&RequestRange> {
        self.range.as_ref()
    }

    /// Whether the resource changed relative to the client's validators.
    ///
    /// Unmodified requires both a matching `If-None-Match` and an
    /// `If-Modified-Since` at least as recent as the file.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        let etag_matches = self
            .request_headers
            .get_text(&FieldName::IfNoneMatch)
            .is_some_and(|client| client.trim() == self.etag().unwrap_or_default());
        if !etag_matches {
            return true;
        }
        match self.request_headers.date_field(&FieldName::IfModifiedSince) {
            None => true,
            Some(since) => since.instant() < truncate_to_seconds(self.modified),
        }
    }

    /// Decide the final status against the request.
    fn resolve_status(&mut self) {
        if let Some(range) = &self.range {
            if !range.is_satisfiable() {
                self.response.status = Status::REQUESTED_RANGE_NOT_SATISFIABLE;
            } else if !range.is_total() {
                self.response.status = Status::PARTIAL_CONTENT;
            }
        }

        let no_cache = self
            .request_headers
            .cache_control()
            .is_some_and(|cc| cc.cacheable == Some(Cacheable::NoCache));
        if !no_cache && !self.is_modified() {
            self.response.status = Status::NOT_MODIFIED;
        }
    }

    /// Compute the caching headers and the status-dependent entity
    /// headers.
    pub fn finalize(&mut self) {
        let expires = self.expires;
        let max_age = expires
            .duration_since(SystemTime::now())
            .unwrap_or_default()
            .as_secs();
        self.response.headers.modify_cache_control(|cache_control| {
            cache_control.cacheable = Some(Cacheable::Public);
            cache_control.max_age = Some(max_age);
        });
        self.response.headers.set(FieldName::Expires, expires);

        if self.response.status == Status::NOT_MODIFIED {
            self.response.headers.remove(&FieldName::ContentLength);
        } else if self.response.status == Status::PARTIAL_CONTENT {
            self.set_last_modified();
            if let Some(range) = self.range {
                self.response
                    .headers
                    .set(FieldName::ContentRange, range.to_string());
                self.response
                    .headers
                    .set(FieldName::ContentLength, range.length());
            }
        } else {
            self.set_last_modified();
            if !self.response.headers.contains(&FieldName::AcceptRanges) {
                let accept = match self.request_method {
                    Method::Get | Method::Head => "bytes",
                    _ => "none",
                };
                self.response.headers.set(FieldName::AcceptRanges, accept);
            }
            self.response
                .headers
                .set(FieldName::ContentLength, self.size);
        }
    }

    fn set_last_modified(&mut self) {
        self.response
            .headers
            .set(FieldName::LastModified, self.modified);
    }

    /// Decide the status, finalize and write the response to `sink`,
    /// copying the file bytes according to the resolved range.
    pub fn send(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        let mut this = self.clone();
        this.resolve_status();
        this.finalize();
        this.response.send_head(sink)?;
        if this.response.status.is_empty() {
            return Ok(());
        }
        this.send_file(sink)
    }

    /// Copy the requested bytes of the file to `sink`: the resolved
    /// partial range when one is satisfiable, the whole file otherwise.
    fn send_file(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        let mut file = fs::File::open(&self.path)?;
        match self.range.filter(|range| range.is_satisfiable()) {
            Some(range) => {
                file.seek(SeekFrom::Start(range.offset()))?;
                match range.max_length() {
                    Some(max_length) => {
                        io::copy(&mut file.take(max_length), sink)?;
                    }
                    None => {
                        io::copy(&mut file, sink)?;
                    }
                }
            }
            None => {
                io::copy(&mut file, sink)?;
            }
        }
        Ok(())
    }
}

impl Deref for FileResponse {
    type Target = Response;

    fn deref(&self) -> &Response {
        &self.response
    }
}

impl DerefMut for FileResponse {
    fn deref_mut(&mut self) -> &mut Response {
        &mut self.response
    }
}

/// Base64 of a SHA-384 digest of the file content.
fn digest_etag(path: &Path) -> Result<String, OpaqueError> {
    let content = fs::read(path).context("read file content")?;
    let digest = Sha384::digest(&content);
    Ok(BASE64.encode(digest))
}

/// HTTP dates have second granularity.
fn truncate_to_seconds(instant: SystemTime) -> SystemTime {
    let Ok(since_epoch) = instant.duration_since(SystemTime::UNIX_EPOCH) else {
        return instant;
    };
    SystemTime::UNIX_EPOCH + Duration::from_secs(since_epoch.as_secs())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::headers::HttpDate;
    use crate::request::RequestOptions;

    fn fixture(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn request_with(headers: Headers) -> Request {
        Request::new(RequestOptions::default().headers(headers))
    }

    fn sent(response: &FileResponse) -> String {
        let mut wire = Vec::new();
        response.send(&mut wire).unwrap();
        String::from_utf8_lossy(&wire).into_owned()
    }

    #[test]
    fn plain_get_serves_the_whole_file() {
        let file = fixture(b"0123456789");
        let request = Request::from_uri("/file.txt");
        let response =
            FileResponse::new(file.path(), &request, FileResponseOptions::default()).unwrap();

        let wire = sent(&response);
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.contains("Content-Type: text/plain\r\n"));
        assert!(wire.contains("Content-Length: 10\r\n"));
        assert!(wire.contains("Accept-Ranges: bytes\r\n"));
        assert!(wire.contains("Cache-Control: public, max-age="));
        assert!(wire.ends_with("0123456789"));
    }

    #[test]
    fn satisfiable_range_yields_partial_content() {
        let file = fixture(b"0123456789");
        let mut headers = Headers::new();
        headers.set(FieldName::Range, "bytes=2-5");
        let request = request_with(headers);
        let response =
            FileResponse::new(file.path(), &request, FileResponseOptions::default()).unwrap();

        let wire = sent(&response);
        assert!(wire.starts_with("HTTP/1.1 206 Partial Content\r\n"));
        assert!(wire.contains("Content-Range: bytes 2-5/10\r\n"));
        assert!(wire.contains("Content-Length: 4\r\n"));
        assert!(wire.ends_with("2345"));
    }

    #[test]
    fn unsatisfiable_range_yields_416() {
        let file = fixture(b"0123456789");
        let mut headers = Headers::new();
        headers.set(FieldName::Range, "bytes=40-50");
        let request = request_with(headers);
        let response =
            FileResponse::new(file.path(), &request, FileResponseOptions::default()).unwrap();

        assert!(sent(&response).starts_with("HTTP/1.1 416 "));
    }

    #[test]
    fn matching_validators_yield_304_without_content_length() {
        let file = fixture(b"0123456789");
        let probe = FileResponse::new(
            file.path(),
            &Request::from_uri("/file.txt"),
            FileResponseOptions::default(),
        )
        .unwrap();
        let etag = probe.etag().unwrap();

        let mut headers = Headers::new();
        headers.set(FieldName::IfNoneMatch, etag.as_str());
        headers.set(FieldName::IfModifiedSince, HttpDate::now());
        let request = request_with(headers);
        let response =
            FileResponse::new(file.path(), &request, FileResponseOptions::default()).unwrap();

        assert!(!response.is_modified());
        let wire = sent(&response);
        assert!(wire.starts_with("HTTP/1.1 304 Not Modified\r\n"));
        assert!(!wire.contains("Content-Length:"));
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[test]
    fn no_cache_defeats_304() {
        let file = fixture(b"0123456789");
        let probe = FileResponse::new(
            file.path(),
            &Request::from_uri("/file.txt"),
            FileResponseOptions::default(),
        )
        .unwrap();
        let etag = probe.etag().unwrap();

        let mut headers = Headers::new();
        headers.set(FieldName::IfNoneMatch, etag.as_str());
        headers.set(FieldName::IfModifiedSince, HttpDate::now());
        headers.set(FieldName::CacheControl, "no-cache");
        let request = request_with(headers);
        let response =
            FileResponse::new(file.path(), &request, FileResponseOptions::default()).unwrap();

        assert!(sent(&response).starts_with("HTTP/1.1 200 OK\r\n"));
    }

    #[test]
    fn etag_mismatch_alone_forces_modified() {
        let file = fixture(b"0123456789");
        let mut headers = Headers::new();
        headers.set(FieldName::IfNoneMatch, "\"stale\"");
        headers.set(FieldName::IfModifiedSince, HttpDate::now());
        let request = request_with(headers);
        let response =
            FileResponse::new(file.path(), &request, FileResponseOptions::default()).unwrap();

        assert!(response.is_modified());
    }

    #[test]
    fn explicit_etag_and_mime_win() {
        let file = fixture(b"0123456789");
        let request = Request::from_uri("/file.txt");
        let response = FileResponse::new(
            file.path(),
            &request,
            FileResponseOptions::default()
                .etag("\"pinned\"")
                .mime("application/x-custom"),
        )
        .unwrap();

        assert_eq!(response.etag().as_deref(), Some("\"pinned\""));
        assert_eq!(
            response.headers.content_type().unwrap().mime,
            "application/x-custom"
        );
    }

    #[test]
    fn filename_sets_attachment_disposition() {
        let file = fixture(b"0123456789");
        let request = Request::from_uri("/file.txt");
        let response = FileResponse::new(
            file.path(),
            &request,
            FileResponseOptions::default().filename("report.txt"),
        )
        .unwrap();

        let disposition = response.headers.content_disposition().unwrap();
        assert_eq!(disposition.disposition, "attachment");
        assert_eq!(
            disposition.filename.as_ref().unwrap().value.as_str(),
            "report.txt"
        );
    }

    #[test]
    fn missing_or_non_regular_target_is_an_error() {
        let request = Request::from_uri("/file.txt");
        assert!(
            FileResponse::new(
                "/no/such/file",
                &request,
                FileResponseOptions::default()
            )
            .is_err()
        );

        let dir = tempfile::tempdir().unwrap();
        assert!(FileResponse::new(dir.path(), &request, FileResponseOptions::default()).is_err());
    }
}
