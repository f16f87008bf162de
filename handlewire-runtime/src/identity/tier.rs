//! Capability tiers - version-gated operation sets
//!
//! A wrapper's tier only ever moves up. `TierCell` stores it atomically so a
//! promotion made by one thread is seen by every holder of the wrapper.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Packed native API version: variant 3 bits, major 7, minor 10, patch 12
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct ApiVersion(pub u32);

impl ApiVersion {
    pub const V1_0: Self = Self::new(1, 0, 0);
    pub const V1_1: Self = Self::new(1, 1, 0);
    pub const V1_2: Self = Self::new(1, 2, 0);
    pub const V1_3: Self = Self::new(1, 3, 0);

    #[inline]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self((major << 22) | (minor << 12) | patch)
    }

    #[inline]
    pub const fn major(self) -> u32 {
        (self.0 >> 22) & 0x7F
    }

    #[inline]
    pub const fn minor(self) -> u32 {
        (self.0 >> 12) & 0x3FF
    }

    #[inline]
    pub const fn patch(self) -> u32 {
        self.0 & 0xFFF
    }

    #[inline]
    pub const fn is_at_least(self, other: Self) -> bool {
        self.0 >= other.0
    }
}

impl core::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

/// Operation set a wrapper exposes, ordered from smallest to largest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum CapabilityTier {
    Core1_0 = 0,
    Core1_1 = 1,
    Core1_2 = 2,
    Core1_3 = 3,
}

impl CapabilityTier {
    pub const ALL: [Self; 4] = [Self::Core1_0, Self::Core1_1, Self::Core1_2, Self::Core1_3];

    /// Highest tier a negotiated API version allows
    pub fn from_api_version(version: ApiVersion) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| version.is_at_least(tier.min_version()))
            .unwrap_or(Self::Core1_0)
    }

    /// Smallest API version that unlocks this tier
    pub const fn min_version(self) -> ApiVersion {
        match self {
            Self::Core1_0 => ApiVersion::V1_0,
            Self::Core1_1 => ApiVersion::V1_1,
            Self::Core1_2 => ApiVersion::V1_2,
            Self::Core1_3 => ApiVersion::V1_3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core1_0 => "1.0",
            Self::Core1_1 => "1.1",
            Self::Core1_2 => "1.2",
            Self::Core1_3 => "1.3",
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Core1_0,
            1 => Self::Core1_1,
            2 => Self::Core1_2,
            _ => Self::Core1_3,
        }
    }
}

impl core::fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the store does when a handle is requested at a different tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierPolicy {
    /// Raise the stored wrapper in place; lower requests keep the current tier
    #[default]
    Promote,
    /// One tier per handle; any mismatch is an invariant violation
    Strict,
}

/// Monotonic, shareable tier slot embedded in every wrapper
#[derive(Debug)]
pub struct TierCell(AtomicU8);

impl TierCell {
    pub const fn new(tier: CapabilityTier) -> Self {
        Self(AtomicU8::new(tier as u8))
    }

    #[inline]
    pub fn get(&self) -> CapabilityTier {
        CapabilityTier::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Raise to at least `tier`, returning the previous tier
    #[inline]
    pub fn raise(&self, tier: CapabilityTier) -> CapabilityTier {
        CapabilityTier::from_u8(self.0.fetch_max(tier as u8, Ordering::AcqRel))
    }

    /// Whether the operation set of `tier` is available
    #[inline]
    pub fn supports(&self, tier: CapabilityTier) -> bool {
        self.get() >= tier
    }
}

impl Default for TierCell {
    fn default() -> Self {
        Self::new(CapabilityTier::Core1_0)
    }
}
