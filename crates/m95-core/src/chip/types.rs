//! Part type definitions and the built-in part table

/// Everything the driver needs to know about a part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    /// Array size in bytes
    pub total_size: u32,
    /// Write page size in bytes
    pub page_size: u32,
    /// Address bytes sent after READ/WRITE
    pub address_bytes: u8,
    /// Whether the part has a lockable identification page
    pub id_page: bool,
    /// Highest SPI clock in Hz the part accepts over its full supply range
    pub max_clock_hz: u32,
}

/// A named part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// Part name, e.g. "M95256"
    pub name: &'static str,
    /// Part geometry
    pub geometry: Geometry,
}

const MHZ: u32 = 1_000_000;

const fn part(
    name: &'static str,
    total_size: u32,
    page_size: u32,
    address_bytes: u8,
    id_page: bool,
    max_clock_hz: u32,
) -> Part {
    Part {
        name,
        geometry: Geometry {
            total_size,
            page_size,
            address_bytes,
            id_page,
            max_clock_hz,
        },
    }
}

/// Known parts
///
/// The "-D" variants carry the identification page. M95040 is absent: it
/// moves address bit A8 into the opcode.
pub static PARTS: &[Part] = &[
    part("M95010", 128, 16, 1, false, 5 * MHZ),
    part("M95020", 256, 16, 1, false, 5 * MHZ),
    part("M95080", 1024, 32, 2, false, 10 * MHZ),
    part("M95160", 2 * 1024, 32, 2, false, 10 * MHZ),
    part("M95320", 4 * 1024, 32, 2, false, 10 * MHZ),
    part("M95640", 8 * 1024, 32, 2, false, 10 * MHZ),
    part("M95128", 16 * 1024, 64, 2, false, 10 * MHZ),
    part("M95256", 32 * 1024, 64, 2, false, 10 * MHZ),
    part("M95256-D", 32 * 1024, 64, 2, true, 10 * MHZ),
    part("M95512", 64 * 1024, 128, 2, false, 10 * MHZ),
    part("M95512-D", 64 * 1024, 128, 2, true, 10 * MHZ),
    part("M95M01", 128 * 1024, 256, 3, false, 10 * MHZ),
    part("M95M01-D", 128 * 1024, 256, 3, true, 10 * MHZ),
    part("M95M02-D", 256 * 1024, 256, 3, true, 5 * MHZ),
    part("M95M04-D", 512 * 1024, 512, 3, true, 10 * MHZ),
];

/// Find a built-in part by name (case-insensitive)
pub fn find_part(name: &str) -> Option<&'static Part> {
    PARTS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_part() {
        let part = find_part("m95256-d").unwrap();
        assert_eq!(part.name, "M95256-D");
        assert_eq!(part.geometry.page_size, 64);
        assert!(part.geometry.id_page);
        assert!(find_part("M95040").is_none());
    }

    #[test]
    fn test_part_table_consistent() {
        for part in PARTS {
            let g = &part.geometry;
            assert!(g.page_size.is_power_of_two(), "{}", part.name);
            assert_eq!(g.total_size % g.page_size, 0, "{}", part.name);
            assert!((1..=3).contains(&g.address_bytes), "{}", part.name);
            // The whole array has to be reachable with the address width
            assert!(
                (g.total_size - 1) >> (8 * g.address_bytes as u32) == 0,
                "{}",
                part.name
            );
        }
    }
}
