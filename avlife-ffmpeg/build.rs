fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "ffmpeg")]
    bindings::generate();
}

#[cfg(feature = "ffmpeg")]
mod bindings {
    use bindgen::FieldVisibilityKind;
    use std::env;
    use std::path::PathBuf;

    const LIBRARIES: [&str; 4] = ["avcodec", "avformat", "avutil", "avfilter"];

    fn include_paths() -> Vec<PathBuf> {
        println!("cargo:rerun-if-env-changed=FFMPEG_DIR");

        // An explicit install prefix wins over whatever pkg-config knows about.
        if let Ok(dir) = env::var("FFMPEG_DIR") {
            let dir = PathBuf::from(dir);
            println!("cargo:rustc-link-search={}", dir.join("lib").display());
            for library in LIBRARIES {
                println!("cargo:rustc-link-lib={}", library);
            }
            return vec![dir.join("include")];
        }

        LIBRARIES
            .iter()
            .flat_map(|library| {
                pkg_config::probe_library(&format!("lib{}", library))
                    .unwrap_or_else(|e| panic!("lib{} not found: {}", library, e))
                    .include_paths
            })
            .collect()
    }

    pub fn generate() {
        println!("cargo:rerun-if-changed=ffi/ffmpeg.h");

        let mut builder = bindgen::Builder::default()
            .header("./ffi/ffmpeg.h")
            .generate_comments(false)
            .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
            .derive_default(true)
            .blocklist_item("FP_NAN")
            .blocklist_item("FP_INFINITE")
            .blocklist_item("FP_ZERO")
            .blocklist_item("FP_SUBNORMAL")
            .blocklist_item("FP_NORMAL")
            .default_visibility(FieldVisibilityKind::PublicCrate)
            .merge_extern_blocks(true)
            .layout_tests(false);

        for path in include_paths() {
            builder = builder.clang_arg(format!("-I{}", path.display()));
        }

        let bindings = builder.generate().expect("Unable to generate bindings");

        let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
        bindings
            .write_to_file(out_path.join("bindings.rs"))
            .expect("Couldn't write bindings!");
    }
}
