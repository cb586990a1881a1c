// Build script that tries to generate a C header with `cbindgen`.
// If `cbindgen` is not available, it falls back to copying the
// checked-in `include/chiptone.h` to $OUT_DIR.
//
// Either way, consumers can include the header from:
//   - <repo>/chiptone-ffi/include/chiptone.h      (checked-in)
//   - $OUT_DIR/chiptone.h

use std::{env, fs, path::PathBuf, process::Command};

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=include/chiptone.h");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let header_repo = crate_dir.join("include").join("chiptone.h");
    let header_out = out_dir.join("chiptone.h");

    let cbindgen_ok = Command::new("cbindgen")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    if cbindgen_ok {
        let generated = Command::new("cbindgen")
            .args(["--crate", "chiptone-ffi", "--lang", "C", "--output"])
            .arg(&header_out)
            .current_dir(&crate_dir)
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if generated {
            println!("cargo:warning=chiptone-ffi: generated header with cbindgen -> {}", header_out.display());
            return;
        }
        println!("cargo:warning=chiptone-ffi: cbindgen failed; falling back to checked-in header");
    }

    if let Err(e) = fs::copy(&header_repo, &header_out) {
        println!("cargo:warning=chiptone-ffi: could not copy include/chiptone.h to OUT_DIR: {e}");
    }
}
