//! CPU name and subtarget feature string resolution
//!
//! The feature string is a comma-separated list of `+name` / `-name`
//! directives. Host features (for `-mcpu=native`) come first, then the
//! `-mattr` tokens in command-line order. A later directive for a name
//! replaces the earlier one in place, so each feature appears exactly once
//! and carries the last polarity requested for it.

/// Ordered set of feature directives, keyed by feature name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtargetFeatures {
    entries: Vec<(String, bool)>,
}

impl SubtargetFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw token: `+name`, `-name` or a bare `name` (enable).
    pub fn add_token(&mut self, token: &str) {
        let token = token.trim();
        let (name, enable) = match token.as_bytes().first() {
            Some(b'+') => (&token[1..], true),
            Some(b'-') => (&token[1..], false),
            _ => (token, true),
        };
        self.add_feature(name, enable);
    }

    pub fn add_feature(&mut self, name: &str, enable: bool) {
        if name.is_empty() {
            return;
        }
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = enable,
            None => self.entries.push((name, enable)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, enabled)` pairs in directive order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(name, enable)| (name.as_str(), *enable))
    }

    /// Parse a string previously produced by `to_feature_string`.
    pub fn parse(features: &str) -> Self {
        let mut set = Self::new();
        for token in features.split(',') {
            set.add_token(token);
        }
        set
    }

    pub fn to_feature_string(&self) -> String {
        self.entries
            .iter()
            .map(|(name, enable)| format!("{}{}", if *enable { '+' } else { '-' }, name))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Resolve the effective CPU name and feature string.
///
/// `cpu_flag == "native"` asks for host autodetection. No token is checked
/// against any target here; the target machine reports unknown names.
pub fn resolve_cpu_and_features(cpu_flag: &str, attr_flags: &[String]) -> (String, String) {
    let native = cpu_flag == "native";
    let cpu = if native {
        host_cpu_name()
    } else {
        cpu_flag.to_string()
    };

    let mut features = SubtargetFeatures::new();
    if native {
        for (name, present) in host_cpu_features() {
            features.add_feature(name, present);
        }
    }
    for token in attr_flags {
        features.add_token(token);
    }

    (cpu, features.to_feature_string())
}

/// Name of the host CPU, or an empty string when it cannot be determined.
pub fn host_cpu_name() -> String {
    host::cpu_name()
}

/// Features detected on the host, in detection order.
pub fn host_cpu_features() -> Vec<(&'static str, bool)> {
    host::features()
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod host {
    macro_rules! detect {
        ($($llvm:literal => $std:tt),* $(,)?) => {
            vec![$(($llvm, std::is_x86_feature_detected!($std))),*]
        };
    }

    pub fn features() -> Vec<(&'static str, bool)> {
        detect![
            "sse" => "sse",
            "sse2" => "sse2",
            "sse3" => "sse3",
            "ssse3" => "ssse3",
            "sse4.1" => "sse4.1",
            "sse4.2" => "sse4.2",
            "popcnt" => "popcnt",
            "cx16" => "cmpxchg16b",
            "avx" => "avx",
            "avx2" => "avx2",
            "fma" => "fma",
            "f16c" => "f16c",
            "bmi" => "bmi1",
            "bmi2" => "bmi2",
            "lzcnt" => "lzcnt",
            "aes" => "aes",
            "pclmul" => "pclmulqdq",
            "sha" => "sha",
            "rdrnd" => "rdrand",
            "rdseed" => "rdseed",
            "adx" => "adx",
            "xsave" => "xsave",
            "avx512f" => "avx512f",
            "avx512bw" => "avx512bw",
            "avx512cd" => "avx512cd",
            "avx512dq" => "avx512dq",
            "avx512vl" => "avx512vl",
        ]
    }

    /// Micro-architecture level implied by the detected features.
    #[cfg(target_arch = "x86_64")]
    pub fn cpu_name() -> String {
        let detected = features();
        let has = |name: &str| detected.iter().any(|(n, present)| *n == name && *present);
        let all = |names: &[&str]| names.iter().all(|name| has(name));

        let v2 = all(&["cx16", "popcnt", "sse3", "sse4.1", "sse4.2", "ssse3"]);
        let v3 = v2 && all(&["avx", "avx2", "bmi", "bmi2", "f16c", "fma", "lzcnt", "xsave"]);
        let v4 = v3 && all(&["avx512f", "avx512bw", "avx512cd", "avx512dq", "avx512vl"]);

        let level = if v4 {
            "x86-64-v4"
        } else if v3 {
            "x86-64-v3"
        } else if v2 {
            "x86-64-v2"
        } else {
            "x86-64"
        };
        level.to_string()
    }

    #[cfg(target_arch = "x86")]
    pub fn cpu_name() -> String {
        "i686".to_string()
    }
}

#[cfg(target_arch = "aarch64")]
mod host {
    macro_rules! detect {
        ($($llvm:literal => $std:tt),* $(,)?) => {
            vec![$(($llvm, std::arch::is_aarch64_feature_detected!($std))),*]
        };
    }

    pub fn features() -> Vec<(&'static str, bool)> {
        detect![
            "neon" => "neon",
            "aes" => "aes",
            "sha2" => "sha2",
            "crc" => "crc",
            "lse" => "lse",
            "rdm" => "rdm",
            "fullfp16" => "fp16",
            "dotprod" => "dotprod",
            "sve" => "sve",
        ]
    }

    pub fn cpu_name() -> String {
        "generic".to_string()
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
mod host {
    pub fn features() -> Vec<(&'static str, bool)> {
        Vec::new()
    }

    pub fn cpu_name() -> String {
        String::new()
    }
}
