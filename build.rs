// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

// 构建脚本: Windows MSVC 下静态链接 ez-ffmpeg 时补充系统库
fn main() {
    #[cfg(all(target_os = "windows", target_env = "msvc"))]
    {
        // libmfx: QSV | libx264: 编码器 | oleaut32/vfw32: 设备枚举 | secur32: TLS
        const LIBS: [&str; 5] = ["libmfx", "libx264", "oleaut32", "vfw32", "secur32"];
        for lib in LIBS {
            println!("cargo:rustc-link-lib=dylib={}", lib);
        }
    }
}
