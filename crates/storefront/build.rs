//! Build script for the storefront crate.
//!
//! Hashes the stylesheet so it can be served under a content-addressed name
//! and cached forever.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

const STYLESHEET: &str = "static/css/checkout.css";

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let css_path = Path::new(&manifest_dir).join(STYLESHEET);
    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = match fs::read(&css_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {STYLESHEET}: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
            return;
        }
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short_hash = digest.get(..8).unwrap_or(&digest);
    println!("cargo:rustc-env=CSS_HASH={short_hash}");

    let derived_dir = Path::new(&manifest_dir).join("static/css/derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived CSS directory");
    fs::copy(
        &css_path,
        derived_dir.join(format!("checkout.{short_hash}.css")),
    )
    .expect("Failed to copy CSS to derived directory");
}
