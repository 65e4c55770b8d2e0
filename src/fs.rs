pub mod path;
pub mod location;
pub mod etag;
pub mod meta;
pub mod ops;

pub use path::ResourcePath;
