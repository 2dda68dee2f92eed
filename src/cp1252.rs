//! Translation of the single byte code page used by non-Unicode pieces

use encoding_rs::WINDOWS_1252;
use once_cell::sync::Lazy;

static TABLE: Lazy<[u16; 256]> = Lazy::new(|| {
    let mut table = [0; 256];
    for (byte, slot) in table.iter_mut().enumerate() {
        let input = [byte as u8];
        let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&input);
        let mut units = decoded.encode_utf16();
        *slot = units.next().unwrap_or(0xFFFD);
    }
    table
});

/// Translate a Cp1252 byte to a UTF-16 code unit
#[inline]
pub fn to_unicode(byte: u8) -> u16 {
    TABLE[usize::from(byte)]
}
