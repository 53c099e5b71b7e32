use md5::Md5;
use sha1::{Digest, Sha1};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::error::Result;

const BLOCK_SIZE: usize = 64 * 1024;

/// Content digests and byte count for a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub sha1: String,
    pub md5: String,
    pub size: u64,
}

/// Hash a file in fixed-size blocks, feeding both hashers in a single
/// pass so memory use stays bounded regardless of file size
pub async fn digest_file(path: &Path) -> Result<FileDigest> {
    let mut file = tokio::fs::File::open(path).await?;

    let mut sha1 = Sha1::new();
    let mut md5 = Md5::new();
    let mut size: u64 = 0;
    let mut buf = vec![0u8; BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sha1.update(&buf[..n]);
        md5.update(&buf[..n]);
        size += n as u64;
    }

    Ok(FileDigest {
        sha1: hex::encode(sha1.finalize()),
        md5: hex::encode(md5.finalize()),
        size,
    })
}
