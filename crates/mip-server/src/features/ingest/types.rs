//! Request decoding shared by the ingest handlers

use axum::http::HeaderMap;
use flate2::read::GzDecoder;
use std::io::Read;

use crate::error::AppError;

/// Parsed idempotency headers: `Idempotency-Key` plus `X-Batch-Seq` (alias
/// `Batch-Seq`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeaders {
    pub idempotency_key: String,
    pub seq: i64,
}

impl ChunkHeaders {
    /// Extract the header pair; both must be present.
    pub fn require(headers: &HeaderMap) -> Result<Self, AppError> {
        Self::extract(headers)?.ok_or_else(|| {
            AppError::Validation("Missing Idempotency-Key or X-Batch-Seq header".to_string())
        })
    }

    /// Extract the header pair if present. Exactly one of the two headers is
    /// a client error; neither means an untracked submission.
    pub fn extract(headers: &HeaderMap) -> Result<Option<Self>, AppError> {
        let idem = header_str(headers, "idempotency-key");
        let seq = header_str(headers, "x-batch-seq").or_else(|| header_str(headers, "batch-seq"));

        match (idem, seq) {
            (None, None) => Ok(None),
            (Some(_), None) | (None, Some(_)) => Err(AppError::Validation(
                "Idempotency-Key and X-Batch-Seq must be supplied together".to_string(),
            )),
            (Some(idem), Some(seq)) => {
                if idem.is_empty() {
                    return Err(AppError::Validation(
                        "Idempotency-Key must not be empty".to_string(),
                    ));
                }
                let seq: i64 = seq.parse().map_err(|_| {
                    AppError::Validation("X-Batch-Seq must be an integer".to_string())
                })?;
                if seq < 0 {
                    return Err(AppError::Validation(
                        "X-Batch-Seq must be a non-negative integer".to_string(),
                    ));
                }
                Ok(Some(ChunkHeaders {
                    idempotency_key: idem.to_string(),
                    seq,
                }))
            },
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

/// Decompress the request body when `Content-Encoding: gzip` is set,
/// enforcing the decompressed size limit.
pub fn decode_body(
    headers: &HeaderMap,
    body: &[u8],
    max_bytes: usize,
) -> Result<Vec<u8>, AppError> {
    let gzipped = header_str(headers, "content-encoding")
        .map(|v| v.eq_ignore_ascii_case("gzip"))
        .unwrap_or(false);

    if !gzipped {
        if body.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Body of {} bytes exceeds the {} byte limit; re-plan with a smaller chunk size",
                body.len(),
                max_bytes
            )));
        }
        return Ok(body.to_vec());
    }

    let mut decoder = GzDecoder::new(body).take(max_bytes as u64 + 1);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| AppError::BadRequest(format!("Invalid gzip stream: {}", e)))?;

    if decoded.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Decompressed body exceeds the {} byte limit; re-plan with a smaller chunk size",
            max_bytes
        )));
    }

    Ok(decoded)
}

/// Decode NDJSON lines into records.
///
/// Blank lines are skipped. A malformed line aborts the whole request rather
/// than silently dropping records; the error names the 1-based line.
pub fn decode_ndjson(bytes: &[u8]) -> Result<Vec<serde_json::Value>, AppError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::BadRequest(format!("Body is not valid UTF-8: {}", e)))?;

    let mut records = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            AppError::BadRequest(format!("Invalid JSON at line {}: {}", line_no + 1, e))
        })?;
        records.push(value);
    }

    Ok(records)
}
