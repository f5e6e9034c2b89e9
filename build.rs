//! Build script that checks for the system libraries the crate links against.
//!
//! OpenCV is found through pkg-config; missing pieces produce installation
//! hints instead of failing the build here.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    if !has_pkg_config() {
        println!("cargo:warning=pkg-config not found. It is needed to locate OpenCV.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
        println!("cargo:warning=On macOS: brew install pkg-config");
        return;
    }

    match opencv_version() {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. Make sure OpenCV is installed.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

fn has_pkg_config() -> bool {
    Command::new("pkg-config")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Version reported by pkg-config for `opencv4`, falling back to `opencv`
fn opencv_version() -> Option<String> {
    ["opencv4", "opencv"].iter().find_map(|package| {
        let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    })
}
