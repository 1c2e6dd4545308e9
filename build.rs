// 构建脚本: 链接FFmpeg静态库所需的系统依赖
fn main() {
    // 仅在Windows MSVC环境下需要 (dshow 摄像头采集 + vcpkg 静态 FFmpeg)
    #[cfg(all(target_os = "windows", target_env = "msvc"))]
    {
        for lib in ["strmiids", "ole32", "oleaut32", "vfw32", "secur32"] {
            println!("cargo:rustc-link-lib=dylib={}", lib);
        }
    }
    println!("cargo:rerun-if-changed=build.rs");
}
