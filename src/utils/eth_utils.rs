pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|octet| format!("{:02x}", octet))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parses `aa:bb:cc:dd:ee:ff` (case-insensitive).
pub fn parse_mac(input: &str) -> Result<[u8; 6], String> {
    let mut mac = [0u8; 6];
    let mut count = 0usize;

    for part in input.split(':') {
        if count >= 6 || part.len() != 2 {
            return Err(format!("invalid MAC address: {input}"));
        }
        mac[count] = u8::from_str_radix(part, 16)
            .map_err(|_| format!("invalid MAC address octet '{part}' in {input}"))?;
        count += 1;
    }

    if count != 6 {
        return Err(format!("invalid MAC address: {input}"));
    }
    Ok(mac)
}

/// Parses an ethertype written in hex, with or without `0x`.
pub fn parse_ethertype(input: &str) -> Result<u16, String> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    u16::from_str_radix(digits, 16).map_err(|_| format!("invalid ethertype: {input}"))
}
