use serde::Deserialize;
use std::{collections::HashMap, env, fs, path::PathBuf};

/// One hardware target in `hw_flags.json`. Numbers are strings so that
/// addresses can be written in hex.
#[derive(Deserialize)]
struct HwFlags {
    #[serde(rename = "FPGA_BASE_ADDR")]
    base_addr: String,
    #[serde(rename = "FPGA_BASE_ADDR_SIZE")]
    base_addr_size: String,
    #[serde(rename = "FPGA_CLK_NS")]
    clk_ns: String,
    #[serde(rename = "PPS_IRQ")]
    irq: String,
}

fn parse_number(num_str: &str) -> Result<u64, std::num::ParseIntError> {
    let clean = num_str.trim().replace("_", "");
    match clean.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => clean.parse::<u64>(),
    }
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap();
    let flags_str =
        fs::read_to_string(PathBuf::from(manifest_dir.clone()).join("hw_flags.json")).unwrap();
    let flagmap: HashMap<String, HwFlags> = serde_json::from_str(&flags_str).unwrap();
    let flags = match flagmap.get(target_arch.as_str()) {
        Some(value) => value,
        None => flagmap
            .get("default")
            .unwrap_or_else(|| panic!("No hardware flags for '{}' and no default.", target_arch)),
    };
    make_flags(flags);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=hw_flags.json");
}

fn make_flags(flags: &HwFlags) {
    let entries = [
        ("FPGA_BASE_ADDR", &flags.base_addr),
        ("FPGA_BASE_ADDR_SIZE", &flags.base_addr_size),
        ("FPGA_CLK_NS", &flags.clk_ns),
        ("PPS_IRQ", &flags.irq),
    ];
    let mut s = String::from("");
    for (key, raw) in entries {
        let value = parse_number(raw)
            .unwrap_or_else(|err| panic!("Invalid value '{}' for '{}': {:?}", raw, key, err));
        s += format!("pub const {}: usize = {:#x};\n", key, value).as_str();
    }
    let out_dir = env::var("OUT_DIR").unwrap();
    let path = PathBuf::from(out_dir).join("hw_flags.rs");
    fs::write(path, s).unwrap();
}
