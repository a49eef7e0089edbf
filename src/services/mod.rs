//! S3 service implementations.
//!
//! - Objects: get, streaming get, put, head, delete
//! - Multipart: session lifecycle, part listing, one-shot upload
//! - Presign: presigned GET and PUT URLs

mod multipart;
mod objects;
mod presign;

pub use multipart::{
    MultipartCoordinator, MultipartSession, SessionState, MAX_PART_NUMBER, MIN_PART_NUMBER,
};
pub use objects::{format_http_date, parse_http_date, parse_object_metadata, ObjectsService};
pub use presign::PresignService;
