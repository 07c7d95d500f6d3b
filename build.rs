use std::env;
use std::fs;

fn main() {
    println!("cargo:rerun-if-changed=VERSION");

    let version = match fs::read_to_string("VERSION") {
        Ok(content) => content.trim().to_string(),
        Err(_) => {
            println!("cargo:warning=VERSION file not found, using default version");
            "0.1.0".to_string()
        }
    };

    println!("cargo:rustc-env=EDGE_SETUP_VERSION={}", version);

    // Distribution info: the platform this binary was built for
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    println!("cargo:rustc-env=EDGE_SETUP_DIST_OS={}", target_os);
    println!("cargo:rustc-env=EDGE_SETUP_DIST_ARCH={}", target_arch);
}
