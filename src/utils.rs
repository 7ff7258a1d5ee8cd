use anyhow::Context;
use std::io::Read;

pub fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .context("read hook input from stdin")?;
    Ok(buf)
}

/// Loose boolean for env-style flags: anything but empty/0/false/no/off
pub fn truthy(val: &str) -> bool {
    let v = val.trim().to_ascii_lowercase();
    !v.is_empty() && !matches!(v.as_str(), "0" | "false" | "no" | "off")
}
