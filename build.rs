fn main() {
    // The module is loaded into nginx, which provides the ngx_* symbols at
    // runtime. macOS refuses undefined symbols in a dylib unless told to
    // resolve them lazily.
    #[cfg(target_os = "macos")]
    {
        println!("cargo:rustc-link-arg=-undefined");
        println!("cargo:rustc-link-arg=dynamic_lookup");
    }
}
