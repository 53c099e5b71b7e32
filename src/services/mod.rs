pub mod digest;
pub mod file;
pub mod metadata;
pub mod sniff;

pub use digest::{digest_file, FileDigest};
pub use file::FileService;
pub use metadata::MetadataStore;
pub use sniff::{sniff_file, UNKNOWN_TYPE};
