//! RFC 4648 Base32 without padding
//!
//! Encoding emits the canonical uppercase alphabet. Decoding is
//! case-insensitive and skips any character outside the alphabet, so
//! padding, spaces and dashes in a hand-typed secret are ignored.

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encode bytes as unpadded Base32
pub fn encode(data: &[u8]) -> String {
    let mut output = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;

        while bits >= 5 {
            bits -= 5;
            output.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }

    // Left-align the trailing bits into one last symbol
    if bits > 0 {
        output.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    output
}

/// Decode Base32, ignoring characters outside the alphabet
pub fn decode(input: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for value in input.bytes().filter_map(symbol_value) {
        buffer = (buffer << 5) | u32::from(value);
        bits += 5;

        if bits >= 8 {
            bits -= 8;
            output.push((buffer >> bits) as u8);
        }
    }

    // Leftover bits (< 8) are encoder padding and carry no data
    output
}

fn symbol_value(c: u8) -> Option<u8> {
    match c.to_ascii_uppercase() {
        c @ b'A'..=b'Z' => Some(c - b'A'),
        c @ b'2'..=b'7' => Some(c - b'2' + 26),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc4648_vectors() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "MY");
        assert_eq!(encode(b"fo"), "MZXQ");
        assert_eq!(encode(b"foo"), "MZXW6");
        assert_eq!(encode(b"foob"), "MZXW6YQ");
        assert_eq!(encode(b"fooba"), "MZXW6YTB");
        assert_eq!(encode(b"foobar"), "MZXW6YTBOI");
    }

    #[test]
    fn test_decode_known_secret() {
        assert_eq!(decode("JBSWY3DPEHPK3PXP"), b"Hello!\xde\xad\xbe\xef".to_vec());
        assert_eq!(
            decode("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
            b"12345678901234567890".to_vec()
        );
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        assert_eq!(decode("mzxw6ytboi"), b"foobar".to_vec());
        assert_eq!(decode("MzXw6YtBoI"), b"foobar".to_vec());
    }

    #[test]
    fn test_decode_skips_foreign_characters() {
        assert_eq!(decode("MZXW6YTBOI======"), b"foobar".to_vec());
        assert_eq!(decode("MZXW 6YTB-OI"), b"foobar".to_vec());
        assert_eq!(decode("0189!"), Vec::<u8>::new());
    }

    #[test]
    fn test_round_trip_all_lengths() {
        use rand::RngCore;

        let mut rng = rand::rngs::OsRng;
        for len in 0..=64 {
            let mut data = vec![0u8; len];
            rng.fill_bytes(&mut data);
            assert_eq!(decode(&encode(&data)), data, "length {}", len);
        }
    }

    #[test]
    fn test_round_trip_extreme_bytes() {
        for len in 0..=64 {
            let zeros = vec![0u8; len];
            let ones = vec![0xffu8; len];
            assert_eq!(decode(&encode(&zeros)), zeros);
            assert_eq!(decode(&encode(&ones)), ones);
        }
    }
}
