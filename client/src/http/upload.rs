//! Streamed batch uploads
//!
//! A file is pushed as the raw body of a POST under a batch id, then a
//! batch-execute call hands the uploaded blob to the target operation. The
//! file is read chunk by chunk as the transport pulls the body, so memory use
//! does not depend on the file size.

use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Body;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use super::automation_client::{read_response, AutomationClient, SuspendCheck};
use super::operations::{AutomationResponse, OperationRequest};
use crate::constants::{content_types, endpoints, headers, upload};
use crate::errors::{ClientError, Result};

/// Characters kept as-is in `X-File-Name`
const FILENAME_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'/');

/// A file pushed to a server-side batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpload {
    pub batch_id: String,
    pub file_index: u32,
    pub file_path: PathBuf,
}

impl BatchUpload {
    /// Upload of `file_path` at index 0 of a freshly generated batch
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            batch_id: generate_batch_id(),
            file_index: 0,
            file_path: file_path.into(),
        }
    }

    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = batch_id.into();
        self
    }

    pub fn file_index(mut self, file_index: u32) -> Self {
        self.file_index = file_index;
        self
    }
}

/// Timestamp plus a random part, unique enough for concurrent uploads
pub fn generate_batch_id() -> String {
    let now = Utc::now();
    format!(
        "{}.{:06}_{}",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        Uuid::new_v4().as_u128() % 1_000_000_000
    )
}

/// Replace characters that are invalid in file names
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '*' | ':' | '|' | '"' | '<' | '>' | '?' => '-',
            c => c,
        })
        .collect()
}

pub fn quote_filename(name: &str) -> String {
    utf8_percent_encode(&safe_filename(name), FILENAME_SAFE).to_string()
}

pub fn guess_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(content_types::OCTET_STREAM)
        .to_string()
}

/// Preferred I/O block size of the file's filesystem
#[cfg(unix)]
fn block_size(file: &File) -> usize {
    use std::os::unix::fs::MetadataExt;
    match file.metadata() {
        Ok(metadata) if metadata.blksize() > 0 => metadata.blksize() as usize,
        _ => upload::FILE_BUFFER_SIZE,
    }
}

#[cfg(not(unix))]
fn block_size(_file: &File) -> usize {
    upload::FILE_BUFFER_SIZE
}

/// Request body reader that pulls the file one chunk at a time
///
/// The suspend check runs before every chunk read from disk. When it fails
/// the read errors out and the reason is kept for the caller.
pub struct ChunkedFileReader {
    file: File,
    buffer: Vec<u8>,
    pos: usize,
    filled: usize,
    description: String,
    suspend_check: Option<SuspendCheck>,
    abort_reason: Arc<Mutex<Option<String>>>,
}

impl ChunkedFileReader {
    pub fn new(file: File, chunk_size: usize, description: String) -> Self {
        Self {
            file,
            buffer: vec![0; chunk_size.max(1)],
            pos: 0,
            filled: 0,
            description,
            suspend_check: None,
            abort_reason: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_suspend_check(mut self, check: Option<SuspendCheck>) -> Self {
        self.suspend_check = check;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    /// Shared slot holding the reason of an aborted read
    pub fn abort_reason(&self) -> Arc<Mutex<Option<String>>> {
        self.abort_reason.clone()
    }

    fn fill_chunk(&mut self) -> io::Result<()> {
        if let Some(check) = &self.suspend_check {
            if let Err(e) = check(&self.description) {
                let reason = e.to_string();
                if let Ok(mut slot) = self.abort_reason.lock() {
                    *slot = Some(reason.clone());
                }
                return Err(io::Error::new(io::ErrorKind::Other, reason));
            }
        }

        self.pos = 0;
        self.filled = 0;
        while self.filled < self.buffer.len() {
            match self.file.read(&mut self.buffer[self.filled..]) {
                Ok(0) => break,
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl Read for ChunkedFileReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.pos >= self.filled {
            self.fill_chunk()?;
            if self.filled == 0 {
                return Ok(0);
            }
        }

        let n = out.len().min(self.filled - self.pos);
        out[..n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl AutomationClient {
    /// Stream a file into a batch
    ///
    /// The filename defaults to the file's base name and the MIME type is
    /// guessed from it. Callers check `AutomationResponse::is_uploaded`
    /// before using the batch.
    #[instrument(skip(self, batch), fields(batch_id = %batch.batch_id, file = %batch.file_path.display()))]
    pub fn upload(
        &self,
        batch: &BatchUpload,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<AutomationResponse> {
        let file_path = &batch.file_path;
        let path_display = file_path.display().to_string();
        let io_error = |e: io::Error| ClientError::Io {
            path: path_display.clone(),
            reason: e.to_string(),
        };

        let filename = match filename {
            Some(name) => name.to_string(),
            None => default_filename(file_path),
        };
        let mime_type = mime_type
            .map(String::from)
            .unwrap_or_else(|| guess_mime_type(&filename));

        let file = File::open(file_path).map_err(io_error)?;
        let file_size = file.metadata().map_err(io_error)?.len();
        let chunk_size = block_size(&file);
        trace!(
            "Using file system block size for the streaming upload buffer: {} bytes",
            chunk_size
        );

        let reader = ChunkedFileReader::new(file, chunk_size, format!("File upload: {}", path_display))
            .with_suspend_check(self.suspend_check.clone());
        let abort_reason = reader.abort_reason();

        let url = format!(
            "{}{}",
            self.session.automation_url(),
            endpoints::BATCH_UPLOAD
        );
        debug!("Uploading {} ({} bytes, {}) to {}", path_display, file_size, mime_type, url);

        let mut builder = self
            .client
            .post(&url)
            .header(headers::BATCH_ID, batch.batch_id.as_str())
            .header(headers::FILE_IDX, batch.file_index.to_string())
            .header(headers::FILE_NAME, quote_filename(&filename))
            .header(headers::FILE_SIZE, file_size.to_string())
            .header(headers::FILE_TYPE, mime_type.as_str())
            .header(CONTENT_TYPE, content_types::OCTET_STREAM)
            .header(CONTENT_LENGTH, file_size.to_string());
        builder = self.apply_common_headers(builder);
        if let Some(timeout) = self.session.blob_timeout {
            builder = builder.timeout(timeout);
        }

        // The reader, and with it the file handle, is dropped whatever the outcome
        let result = builder.body(Body::sized(reader, file_size)).send();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let aborted = abort_reason.lock().ok().and_then(|mut slot| slot.take());
                if let Some(reason) = aborted {
                    info!("Upload of {} aborted: {}", path_display, reason);
                    return Err(ClientError::UploadAborted {
                        file_path: path_display,
                        reason,
                    });
                }
                debug!("Upload of {} to {} failed: {}", path_display, url, e);
                return Err(ClientError::from(e)
                    .with_context(&format!("Failed to upload {}", path_display)));
            }
        };

        let response = self.check_status(response, &url)?;
        read_response(response, &url)
    }

    /// Execute an operation with an uploaded batch as its input
    ///
    /// Parameters are not validated: the batch ones are synthetic.
    #[instrument(skip(self, request, batch), fields(operation = %request.operation, batch_id = %batch.batch_id))]
    pub fn execute_batch(
        &self,
        request: &OperationRequest,
        batch: &BatchUpload,
    ) -> Result<AutomationResponse> {
        let batch_request = OperationRequest::new(endpoints::BATCH_EXECUTE)
            .param("operationId", request.operation.as_str())
            .param("batchId", batch.batch_id.as_str())
            .param("fileIdx", batch.file_index.to_string())
            .params(request.params.iter().cloned())
            .void_op(request.void_op)
            .skip_validation();
        self.execute(&batch_request, None)
    }

    /// Upload a file under a new batch, then execute `request` against it
    pub fn execute_with_blob(
        &self,
        request: &OperationRequest,
        file_path: &Path,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<AutomationResponse> {
        let batch = BatchUpload::new(file_path);
        let upload_result = self.upload(&batch, filename, mime_type)?;
        if !upload_result.is_uploaded() {
            return Err(ClientError::UploadFailed {
                batch_id: batch.batch_id,
                file_path: file_path.display().to_string(),
            });
        }
        self.execute_batch(request, &batch)
    }
}

fn default_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
