//! Memory sampler: resident-set, high-water-mark and swap usage in KiB.
//!
//! Reading this is an OS call / file parse, unlike the clock — it is only
//! ever invoked when a `trace_point!` call explicitly asks for a sample via
//! the `MEM` mask.

/// A point-in-time snapshot of process memory usage, in KiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Memory {
    pub rss: u64,
    pub hwm: u64,
    pub swap: u64,
}

impl Memory {
    pub fn rss_gib(&self) -> f64 {
        self.rss as f64 / 1024.0 / 1024.0
    }

    pub fn hwm_gib(&self) -> f64 {
        self.hwm as f64 / 1024.0 / 1024.0
    }

    pub fn swap_gib(&self) -> f64 {
        self.swap as f64 / 1024.0 / 1024.0
    }
}

/// Sample current process memory usage. Never surfaced as an error on the hot
/// path: if the underlying read fails (non-Linux, sandboxed `/proc`, ...) a
/// zeroed snapshot is returned.
pub fn snapshot() -> Memory {
    imp::snapshot()
}

#[cfg(target_os = "linux")]
mod imp {
    use super::Memory;

    pub fn snapshot() -> Memory {
        match std::fs::read_to_string("/proc/self/status") {
            Ok(text) => parse_status(&text),
            Err(_) => Memory::default(),
        }
    }

    fn parse_status(text: &str) -> Memory {
        let mut memory = Memory::default();
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                memory.rss = parse_kib(rest);
            } else if let Some(rest) = line.strip_prefix("VmHWM:") {
                memory.hwm = parse_kib(rest);
            } else if let Some(rest) = line.strip_prefix("VmSwap:") {
                memory.swap = parse_kib(rest);
            }
        }
        memory
    }

    fn parse_kib(field: &str) -> u64 {
        field.trim().trim_end_matches("kB").trim().parse().unwrap_or(0)
    }

}

#[cfg(not(target_os = "linux"))]
mod imp {
    use super::Memory;

    pub fn snapshot() -> Memory {
        Memory::default()
    }
}
