use crc::{Crc, CRC_16_KERMIT};

/// Format bytes as colon-separated lowercase hex octets (aa:bb:cc)
pub fn format_octets(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// CRC-16/KERMIT, the IEEE 802.15.4 frame check sequence
const FCS: Crc<u16> = Crc::<u16>::new(&CRC_16_KERMIT);

/// Frame check sequence of `data`.
///
/// The result is sent least significant byte first.
pub fn crc16_kermit(data: &[u8]) -> u16 {
    FCS.checksum(data)
}

/// Center frequency in MHz of a 2.4 GHz IEEE 802.15.4 channel (11-26)
pub fn channel_frequency_mhz(channel: u8) -> u32 {
    (channel as u32).saturating_sub(10) * 5 + 2400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_octets() {
        assert_eq!(format_octets(&[0xaa, 0x0b, 0x00, 0xff]), "aa:0b:00:ff");
        assert_eq!(format_octets(&[0x01]), "01");
        assert_eq!(format_octets(&[]), "");
    }

    #[test]
    fn test_crc16_kermit_check_value() {
        assert_eq!(crc16_kermit(b"123456789"), 0x2189);
        assert_eq!(crc16_kermit(&[]), 0);
    }

    #[test]
    fn test_channel_frequency() {
        assert_eq!(channel_frequency_mhz(11), 2405);
        assert_eq!(channel_frequency_mhz(15), 2425);
        assert_eq!(channel_frequency_mhz(26), 2480);
    }
}
