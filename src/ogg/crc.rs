// Ogg page checksum
//
// CRC32 with polynomial 0x04c11db7, zero initial value, no bit reflection and
// no final xor. The lookup table is built at compile time.

static CRC_LOOKUP: [u32; 256] = lookup_table();

const fn table_entry(idx: u32) -> u32 {
    let mut r = idx << 24;
    let mut i = 0;
    while i < 8 {
        r = if r & 0x8000_0000 != 0 {
            (r << 1) ^ 0x04c1_1db7
        } else {
            r << 1
        };
        i += 1;
    }
    r
}

const fn lookup_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = table_entry(i as u32);
        i += 1;
    }
    table
}

/// Continue a checksum over `bytes`
pub fn crc32_update(crc: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(crc, |crc, &b| {
        (crc << 8) ^ CRC_LOOKUP[((crc >> 24) as u8 ^ b) as usize]
    })
}

pub fn crc32(bytes: &[u8]) -> u32 {
    crc32_update(0, bytes)
}
