//! Hardware configuration of the PPS FPGA.
//!
//! The defaults are generated at build time from `hw_flags.json` for the
//! current target architecture; see `build.rs`.

/// Constants generated from `hw_flags.json`.
pub mod build_flags {
    #![allow(dead_code)]
    #![allow(missing_docs)]
    include!(concat!(env!("OUT_DIR"), "/hw_flags.rs"));
}

use build_flags::{FPGA_BASE_ADDR, FPGA_BASE_ADDR_SIZE, FPGA_CLK_NS, PPS_IRQ};

/// Name the source is registered under.
pub const PPS_FPGA_NAME: &str = "pps-fpga";

/// Longest source name accepted by the PPS subsystem, terminator excluded.
pub const PPS_MAX_NAME_LEN: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpsFpgaConfig {
    /// Physical base address of the FPGA register block.
    pub base: usize,
    /// Size of the register window to map.
    pub size: usize,
    /// Period of the timestamp counter clock in nanoseconds.
    pub clk_ns: u32,
    /// Interrupt line wired to the PPS status.
    pub irq: usize,
    pub name: &'static str,
}

impl PpsFpgaConfig {
    pub const DEFAULT: PpsFpgaConfig = PpsFpgaConfig {
        base: FPGA_BASE_ADDR,
        size: FPGA_BASE_ADDR_SIZE,
        clk_ns: FPGA_CLK_NS as u32,
        irq: PPS_IRQ,
        name: PPS_FPGA_NAME,
    };

    pub const fn with_base(self, base: usize, size: usize) -> PpsFpgaConfig {
        PpsFpgaConfig { base, size, ..self }
    }

    pub const fn with_irq(self, irq: usize) -> PpsFpgaConfig {
        PpsFpgaConfig { irq, ..self }
    }

    pub const fn with_clk_ns(self, clk_ns: u32) -> PpsFpgaConfig {
        PpsFpgaConfig { clk_ns, ..self }
    }

    /// The source name, cut down to what the PPS subsystem stores.
    pub fn source_name(&self) -> &'static str {
        let mut end = self.name.len().min(PPS_MAX_NAME_LEN);
        while !self.name.is_char_boundary(end) {
            end -= 1;
        }
        &self.name[..end]
    }
}

impl Default for PpsFpgaConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_board() {
        let cfg = PpsFpgaConfig::default();
        assert_eq!(cfg.base, 0x8060_0000);
        assert_eq!(cfg.size, 0x2000);
        assert_eq!(cfg.clk_ns, 10);
        assert_eq!(cfg.irq, 64);
        assert_eq!(cfg.source_name(), "pps-fpga");
    }

    #[test]
    fn overrides_keep_other_fields() {
        let cfg = PpsFpgaConfig::DEFAULT.with_irq(12).with_clk_ns(8);
        assert_eq!(cfg.irq, 12);
        assert_eq!(cfg.clk_ns, 8);
        assert_eq!(cfg.base, PpsFpgaConfig::DEFAULT.base);
    }

    #[test]
    fn long_names_are_truncated() {
        let cfg = PpsFpgaConfig {
            name: "a-very-long-pps-source-name-that-overflows",
            ..PpsFpgaConfig::DEFAULT
        };
        assert_eq!(cfg.source_name().len(), PPS_MAX_NAME_LEN);
    }
}
