use crate::error::Result;
use encoding_rs::WINDOWS_1252;
use std::path::Path;

/// Read a Latin-1 text file published by the meteorological service.
///
/// Valid UTF-8 is taken as is; anything else is decoded as windows-1252,
/// which is a superset of Latin-1 for printable characters.
pub fn read_latin1(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_latin1(&bytes))
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1() {
        // "NEUQUÉN" in Latin-1
        let bytes = b"NEUQU\xC9N";
        assert_eq!(decode_latin1(bytes), "NEUQUÉN");
        assert_eq!(decode_latin1("ÑANDÚ".as_bytes()), "ÑANDÚ");
    }
}
