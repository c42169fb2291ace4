//! 设置编译平台, `/proc` 与 `tegrastats` 只存在于 Linux

fn main() {
    if cfg!(target_os = "linux") {
        println!("cargo:rerun-if-changed=build.rs");
    } else {
        println!("cargo:warning=gpu-stats reads /proc and can only be built on Linux!");
        std::process::exit(1);
    }
}
