//! Build capability descriptor.
//!
//! Optional features (step monitoring, fused integrator kernels) are decided
//! when the library is built or loaded, not per call. The descriptor is handed
//! to a handle at construction and every gated setter queries it:
//! - `monitoring`: the monitor hook and its call interval may be stored.
//! - `fused_kernels`: the fused-kernel flag may be toggled, subject to the
//!   vector backend and allocation checks in the handle.

/// Which optional features this build exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BuildCapabilities {
    pub monitoring: bool,
    pub fused_kernels: bool,
}

impl BuildCapabilities {
    /// Nothing optional available.
    pub const NONE: Self = Self {
        monitoring: false,
        fused_kernels: false,
    };

    /// Every optional feature available.
    pub const ALL: Self = Self {
        monitoring: true,
        fused_kernels: true,
    };

    /// Capabilities selected through this crate's cargo features.
    #[must_use]
    pub const fn compiled() -> Self {
        Self {
            monitoring: cfg!(feature = "monitoring"),
            fused_kernels: cfg!(feature = "fused-kernels"),
        }
    }

    /// Parse a comma separated list (case-insensitive).
    ///
    /// Unknown entries are ignored; `all` and `none` reset the whole set.
    #[must_use]
    pub fn from_list_loose(s: &str) -> Self {
        let mut caps = Self::NONE;
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            match item.to_ascii_lowercase().as_str() {
                "monitoring" | "monitor" => caps.monitoring = true,
                "fused" | "fused-kernels" | "fused_kernels" => caps.fused_kernels = true,
                "all" => caps = Self::ALL,
                "none" | "off" => caps = Self::NONE,
                _ => {}
            }
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_capability_lists() {
        assert_eq!(BuildCapabilities::from_list_loose(""), BuildCapabilities::NONE);
        assert_eq!(
            BuildCapabilities::from_list_loose("Monitoring"),
            BuildCapabilities {
                monitoring: true,
                fused_kernels: false
            }
        );
        assert_eq!(
            BuildCapabilities::from_list_loose("monitor, fused"),
            BuildCapabilities::ALL
        );
        assert_eq!(BuildCapabilities::from_list_loose("ALL"), BuildCapabilities::ALL);
        assert_eq!(
            BuildCapabilities::from_list_loose("all,none"),
            BuildCapabilities::NONE
        );
        assert_eq!(
            BuildCapabilities::from_list_loose("bogus"),
            BuildCapabilities::NONE
        );
    }

    #[test]
    fn compiled_tracks_features() {
        let caps = BuildCapabilities::compiled();
        assert_eq!(caps.monitoring, cfg!(feature = "monitoring"));
        assert_eq!(caps.fused_kernels, cfg!(feature = "fused-kernels"));
    }
}
