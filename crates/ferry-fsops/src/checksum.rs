//! Streaming SHA-256 digests for local files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{FsOpsError, FsOpsResult};

/// Bytes read per chunk while hashing.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the SHA-256 digest of `path` as 64 lowercase hex characters.
///
/// # Errors
///
/// Returns `FsOpsError::Io` when the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> FsOpsResult<String> {
    let mut file = File::open(path).map_err(|err| FsOpsError::io("checksum.open", path, err))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(FsOpsError::io("checksum.read", path, err)),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fs;

    #[test]
    fn digest_matches_known_vectors() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let empty = temp.path().join("empty.bin");
        fs::write(&empty, b"")?;
        assert_eq!(
            sha256_file(&empty)?,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        let abc = temp.path().join("abc.txt");
        fs::write(&abc, b"abc")?;
        assert_eq!(
            sha256_file(&abc)?,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        Ok(())
    }

    #[test]
    fn digest_spans_multiple_chunks() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("large.bin");
        let payload = vec![7_u8; CHUNK_SIZE * 2 + 17];
        fs::write(&path, &payload)?;

        let expected = hex::encode(Sha256::digest(&payload));
        assert_eq!(sha256_file(&path)?, expected);
        Ok(())
    }

    #[test]
    fn digest_is_stable_and_tracks_single_byte_changes() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("report.csv");
        let mut payload = b"id,value\n1,alpha\n2,bravo\n".to_vec();
        fs::write(&path, &payload)?;

        let first = sha256_file(&path)?;
        assert_eq!(sha256_file(&path)?, first);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        payload[12] ^= 0x01;
        fs::write(&path, &payload)?;
        assert_ne!(sha256_file(&path)?, first);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let result = sha256_file(&temp.path().join("absent"));
        assert!(matches!(
            result,
            Err(FsOpsError::Io {
                operation: "checksum.open",
                ..
            })
        ));
        Ok(())
    }
}
