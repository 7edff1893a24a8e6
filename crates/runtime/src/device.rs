// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Compute device probing.
//!
//! The probe inspects the host CPU immediately before each run and picks
//! the kernel variant the tensor ops dispatch on:
//!
//! | Host                          | Kernel   |
//! |-------------------------------|----------|
//! | x86_64 with AVX2 and FMA      | `wide`   |
//! | aarch64 with NEON             | `wide`   |
//! | anything else                 | `scalar` |
//!
//! A configured preference can only *restrict* the choice: `cpu` forces the
//! scalar kernel even on capable hosts, and `auto` takes what the probe
//! found. Nothing is cached across runs.

use tensor_core::Kernel;

/// Requested compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Use the fastest kernel the host supports.
    #[default]
    Auto,
    /// Portable scalar kernel only.
    Cpu,
}

impl DevicePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            DevicePreference::Auto => "auto",
            DevicePreference::Cpu => "cpu",
        }
    }
}

impl std::str::FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "cpu" => Ok(DevicePreference::Cpu),
            other => Err(format!("unknown device '{other}'; expected 'auto' or 'cpu'")),
        }
    }
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The device a run executes on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Device {
    kernel: Kernel,
    simd_features: Vec<&'static str>,
    cores: usize,
}

impl Device {
    /// Probes the host and applies `preference`.
    pub fn detect(preference: DevicePreference) -> Self {
        let simd_features = probe_simd();
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let kernel = match preference {
            DevicePreference::Auto if !simd_features.is_empty() => Kernel::Wide,
            _ => Kernel::Scalar,
        };
        let device = Self {
            kernel,
            simd_features,
            cores,
        };
        tracing::debug!(
            preference = %preference,
            kernel = %device.kernel,
            features = ?device.simd_features,
            cores,
            "device probed"
        );
        device
    }

    /// A scalar CPU device without probing.
    pub fn scalar() -> Self {
        Self {
            kernel: Kernel::Scalar,
            simd_features: Vec::new(),
            cores: 1,
        }
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// SIMD extensions found by the probe, even if the preference ignored them.
    pub fn simd_features(&self) -> &[&'static str] {
        &self.simd_features
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> String {
        match self.kernel {
            Kernel::Wide => format!("cpu-simd ({})", self.simd_features.join("+")),
            Kernel::Scalar => "cpu".to_string(),
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn probe_simd() -> Vec<&'static str> {
    if std::arch::is_x86_feature_detected!("avx2") && std::arch::is_x86_feature_detected!("fma")
    {
        vec!["avx2", "fma"]
    } else {
        Vec::new()
    }
}

#[cfg(target_arch = "aarch64")]
fn probe_simd() -> Vec<&'static str> {
    if std::arch::is_aarch64_feature_detected!("neon") {
        vec!["neon"]
    } else {
        Vec::new()
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn probe_simd() -> Vec<&'static str> {
    Vec::new()
}
