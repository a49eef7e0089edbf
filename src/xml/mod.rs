//! XML parsing and building for S3 payloads.
//!
//! Parsers walk the document with a `quick_xml` event loop and match on
//! local element names, so namespaced and non-namespaced documents parse
//! the same way.

use crate::error::{ResponseError, S3Error, S3ErrorResponse};
use crate::types::*;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Namespace of S3 request documents.
pub const S3_XML_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

fn xml_error(e: impl std::fmt::Display) -> S3Error {
    S3Error::Response(ResponseError::XmlParseError {
        message: e.to_string(),
    })
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Name of the document's root element, if any.
pub fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn expect_root(xml: &str, expected: &str) -> Result<(), S3Error> {
    match root_element(xml) {
        Some(found) if found != expected => {
            Err(S3Error::Response(ResponseError::UnexpectedRoot {
                expected: expected.to_string(),
                found,
            }))
        }
        _ => Ok(()),
    }
}

/// Parse an `<Error>` document.
///
/// Every field is optional; an empty document yields an empty response.
pub fn parse_error_response(xml: &str) -> Result<S3ErrorResponse, S3Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut response = S3ErrorResponse::default();
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_element = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?.to_string();
                match current_element.as_str() {
                    "Code" => response.code = Some(text),
                    "Message" => response.message = Some(text),
                    "RequestId" => response.request_id = Some(text),
                    "Resource" => response.resource = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    Ok(response)
}

/// Parse an `InitiateMultipartUploadResult` document.
pub fn parse_create_multipart_upload(xml: &str) -> Result<CreateMultipartOutput, S3Error> {
    expect_root(xml, "InitiateMultipartUploadResult")?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut bucket = None;
    let mut key = None;
    let mut upload_id = None;
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_element = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?.to_string();
                match current_element.as_str() {
                    "Bucket" => bucket = Some(text),
                    "Key" => key = Some(text),
                    "UploadId" => upload_id = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    let upload_id = upload_id.filter(|id| !id.is_empty()).ok_or_else(|| {
        S3Error::Response(ResponseError::MissingField {
            field: "UploadId".to_string(),
        })
    })?;

    Ok(CreateMultipartOutput {
        bucket,
        key,
        upload_id,
    })
}

/// Parse a `CompleteMultipartUploadResult` document.
///
/// A success status can still carry an `<Error>` document; that is
/// rejected here so the caller classifies it.
pub fn parse_complete_multipart_upload(xml: &str) -> Result<CompleteMultipartOutput, S3Error> {
    expect_root(xml, "CompleteMultipartUploadResult")?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut output = CompleteMultipartOutput::default();
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_element = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?.to_string();
                match current_element.as_str() {
                    "Location" => output.location = Some(text),
                    "Bucket" => output.bucket = Some(text),
                    "Key" => output.key = Some(text),
                    "ETag" => output.etag = Some(strip_etag_quotes(&text)),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    Ok(output)
}

/// Parse a `ListMultipartUploadsResult` document.
pub fn parse_list_multipart_uploads(xml: &str) -> Result<ListUploadsOutput, S3Error> {
    expect_root(xml, "ListMultipartUploadsResult")?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut output = ListUploadsOutput::default();
    let mut current_upload: Option<MultipartUpload> = None;
    // Initiator/Owner blocks nest elements we do not want to misread.
    let mut nested_depth = 0usize;
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "Upload" => current_upload = Some(MultipartUpload::default()),
                    "Initiator" | "Owner" | "CommonPrefixes" => nested_depth += 1,
                    _ => {}
                }
                current_element = name;
            }
            Ok(Event::Text(e)) => {
                if nested_depth > 0 {
                    continue;
                }
                let text = e.unescape().map_err(xml_error)?.to_string();

                if let Some(upload) = current_upload.as_mut() {
                    match current_element.as_str() {
                        "Key" => upload.key = text,
                        "UploadId" => upload.upload_id = text,
                        "Initiated" => upload.initiated = parse_timestamp(&text),
                        "StorageClass" => upload.storage_class = Some(text),
                        _ => {}
                    }
                } else {
                    match current_element.as_str() {
                        "Bucket" => output.bucket = Some(text),
                        "IsTruncated" => output.is_truncated = text == "true",
                        "NextKeyMarker" => output.next_key_marker = Some(text),
                        "NextUploadIdMarker" => output.next_upload_id_marker = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Upload" => {
                        if let Some(upload) = current_upload.take() {
                            output.uploads.push(upload);
                        }
                    }
                    b"Initiator" | b"Owner" | b"CommonPrefixes" => {
                        nested_depth = nested_depth.saturating_sub(1);
                    }
                    _ => {}
                }
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    Ok(output)
}

/// Parse a `ListPartsResult` document.
pub fn parse_list_parts(xml: &str) -> Result<ListPartsOutput, S3Error> {
    expect_root(xml, "ListPartsResult")?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut output = ListPartsOutput::default();
    let mut current_part: Option<PartInfo> = None;
    let mut nested_depth = 0usize;
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "Part" => current_part = Some(PartInfo::default()),
                    "Initiator" | "Owner" => nested_depth += 1,
                    _ => {}
                }
                current_element = name;
            }
            Ok(Event::Text(e)) => {
                if nested_depth > 0 {
                    continue;
                }
                let text = e.unescape().map_err(xml_error)?.to_string();

                if let Some(part) = current_part.as_mut() {
                    match current_element.as_str() {
                        "PartNumber" => {
                            part.part_number = text
                                .parse::<u32>()
                                .ok()
                                .filter(|number| *number > 0)
                                .ok_or_else(|| {
                                    xml_error(format!("invalid PartNumber `{}`", text))
                                })?
                        }
                        "ETag" => part.etag = strip_etag_quotes(&text),
                        "Size" => part.size = text.parse().ok(),
                        "LastModified" => part.last_modified = parse_timestamp(&text),
                        _ => {}
                    }
                } else {
                    match current_element.as_str() {
                        "Bucket" => output.bucket = Some(text),
                        "Key" => output.key = Some(text),
                        "UploadId" => output.upload_id = Some(text),
                        "NextPartNumberMarker" => {
                            output.next_part_number_marker = text.parse().ok()
                        }
                        "IsTruncated" => output.is_truncated = text == "true",
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Part" => {
                        if let Some(part) = current_part.take() {
                            if part.part_number == 0 {
                                return Err(xml_error("Part element without a PartNumber"));
                            }
                            output.parts.push(part);
                        }
                    }
                    b"Initiator" | b"Owner" => {
                        nested_depth = nested_depth.saturating_sub(1);
                    }
                    _ => {}
                }
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    Ok(output)
}

/// Build the `CompleteMultipartUpload` manifest.
///
/// Parts are listed in ascending part-number order whatever order they were
/// recorded in. Duplicates are not removed.
pub fn build_complete_multipart_xml(parts: &[UploadedPart]) -> String {
    let mut sorted: Vec<&UploadedPart> = parts.iter().collect();
    sorted.sort_by_key(|part| part.part_number);

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<CompleteMultipartUpload xmlns=\"{}\">",
        S3_XML_NAMESPACE
    ));

    for part in sorted {
        xml.push_str(&format!(
            "<Part><PartNumber>{}</PartNumber><ETag>{}</ETag></Part>",
            part.part_number,
            escape_xml(&part.etag)
        ));
    }

    xml.push_str("</CompleteMultipartUpload>");
    xml
}

/// Escape XML special characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
