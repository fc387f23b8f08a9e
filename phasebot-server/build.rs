fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    println!("cargo:rerun-if-env-changed=PHASEBOT_GIT_HASH");
    if let Ok(hash) = std::env::var("PHASEBOT_GIT_HASH") {
        println!("cargo:rustc-env=PHASEBOT_GIT_HASH={}", hash);
    }
}
