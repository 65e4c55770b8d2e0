pub mod request_id;
pub mod trace;

pub use request_id::{RequestId, RIDLayer};
