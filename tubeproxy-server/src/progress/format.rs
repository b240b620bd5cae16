use byte_unit::{Byte, Unit, UnitType};

const MIB: f64 = 1024.0 * 1024.0;

/// `512 B`, `1.5 KiB`, `12.3 MiB`, `1.1 GiB`.
pub fn format_bytes(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    match adjusted.get_unit() {
        Unit::B => format!("{} B", bytes),
        unit => format!("{:.1} {}", adjusted.get_value(), unit),
    }
}

pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{:.1} MB/s", bytes_per_sec / MIB)
}

/// `m:ss`, minutes are not wrapped into hours.
pub fn format_eta(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub(crate) fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / MIB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }

    #[test]
    fn speed_and_eta() {
        assert_eq!(format_speed(2.5 * 1024.0 * 1024.0), "2.5 MB/s");
        assert_eq!(format_eta(0), "0:00");
        assert_eq!(format_eta(75), "1:15");
        assert_eq!(format_eta(3600), "60:00");
    }
}
