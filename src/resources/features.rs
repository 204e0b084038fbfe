//! Material Feature Flags
//!
//! A material's texture-driven capabilities, packed into one byte. The set
//! is the identity of a shader variation: the cache keys on the canonical
//! [`fingerprint`](MaterialFeatures::fingerprint), so two materials with
//! equal flags always share one compiled program.

use bitflags::bitflags;

bitflags! {
    /// The eight texture-driven capabilities a material can enable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFeatures: u8 {
        const ALBEDO    = 1 << 0;
        const ROUGHNESS = 1 << 1;
        const METALLIC  = 1 << 2;
        const OCCLUSION = 1 << 3;
        const NORMAL    = 1 << 4;
        const HEIGHT    = 1 << 5;
        const MASK      = 1 << 6;
        const CUBEMAP   = 1 << 7;
    }
}

/// Flag name and `#define` symbol, in bit order.
const NAMED: [(MaterialFeatures, &str, &str); 8] = [
    (MaterialFeatures::ALBEDO, "albedo", "ALBEDO_MAP"),
    (MaterialFeatures::ROUGHNESS, "roughness", "ROUGHNESS_MAP"),
    (MaterialFeatures::METALLIC, "metallic", "METALLIC_MAP"),
    (MaterialFeatures::OCCLUSION, "occlusion", "OCCLUSION_MAP"),
    (MaterialFeatures::NORMAL, "normal", "NORMAL_MAP"),
    (MaterialFeatures::HEIGHT, "height", "HEIGHT_MAP"),
    (MaterialFeatures::MASK, "mask", "MASK_MAP"),
    (MaterialFeatures::CUBEMAP, "cubemap", "CUBE_MAP"),
];

impl MaterialFeatures {
    /// Capabilities that alter vertex-stage code. Everything else only
    /// touches the pixel stage, so vertex modules can be shared wider.
    pub const VERTEX_AFFECTING: Self = Self::NORMAL.union(Self::HEIGHT);

    /// Canonical cache key: flag names joined in bit order.
    ///
    /// Deterministic and independent of the order flags were set in; the
    /// same set always yields the same string.
    #[must_use]
    pub fn fingerprint(self) -> String {
        if self.is_empty() {
            return "mat-untextured".to_owned();
        }
        let mut out = String::from("mat");
        for (flag, name, _) in NAMED {
            if self.contains(flag) {
                out.push('-');
                out.push_str(name);
            }
        }
        out
    }

    /// The `#define` block that enables this set in the shader template.
    #[must_use]
    pub fn hlsl_defines(self) -> String {
        let mut out = String::new();
        for (flag, _, define) in NAMED {
            if self.contains(flag) {
                out.push_str("#define ");
                out.push_str(define);
                out.push_str(" 1\n");
            }
        }
        out
    }

    /// The subset of this set that changes vertex-stage code.
    #[must_use]
    pub fn vertex_subset(self) -> Self {
        self & Self::VERTEX_AFFECTING
    }
}
