//! Size formatting and dimension helpers.

/// Edge length of a GPU compression block.
pub const COMPRESSION_BLOCK_SIZE: u32 = 4;

/// 1024-based size units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum SizeUnit {
    Byte,
    KB,
    #[default]
    MB,
    GB,
    TB,
    PB,
    EB,
    ZB,
    YB,
}

impl SizeUnit {
    const fn exponent(self) -> i32 {
        match self {
            Self::Byte => 0,
            Self::KB => 1,
            Self::MB => 2,
            Self::GB => 3,
            Self::TB => 4,
            Self::PB => 5,
            Self::EB => 6,
            Self::ZB => 7,
            Self::YB => 8,
        }
    }

    /// Picks the largest unit that keeps the value at or above one.
    #[must_use]
    pub const fn best_fit(value: u64) -> Self {
        match value {
            0..1024 => Self::Byte,
            1024..1_048_576 => Self::KB,
            1_048_576..1_073_741_824 => Self::MB,
            1_073_741_824..1_099_511_627_776 => Self::GB,
            _ => Self::TB,
        }
    }
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Byte => "Byte",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
            Self::PB => "PB",
            Self::EB => "EB",
            Self::ZB => "ZB",
            Self::YB => "YB",
        };
        f.write_str(name)
    }
}

/// Formats a byte count in the given unit with two decimals, e.g. `1.50MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(value: u64, unit: SizeUnit) -> String {
    let scaled = value as f64 / 1024f64.powi(unit.exponent());
    format!("{scaled:.2}{unit}")
}

/// Formats a byte count in its best-fitting unit.
#[must_use]
pub fn format_size_auto(value: u64) -> String {
    format_size(value, SizeUnit::best_fit(value))
}

/// Returns true if `x` is a non-zero power of two.
#[must_use]
pub const fn is_power_of_two(x: u32) -> bool {
    x != 0 && (x & (x - 1)) == 0
}

/// Returns true if both dimensions are non-zero multiples of the block size.
#[must_use]
pub const fn is_block_aligned(width: u32, height: u32) -> bool {
    width != 0
        && height != 0
        && width % COMPRESSION_BLOCK_SIZE == 0
        && height % COMPRESSION_BLOCK_SIZE == 0
}
