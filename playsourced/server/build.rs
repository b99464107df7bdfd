use std::{env, path::PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    tonic_build::configure()
        .file_descriptor_set_path(out_dir.join("playsource_descriptor.bin"))
        .compile_protos(&["../proto/playsource_rpc.proto"], &["../proto/"])
        .unwrap();
}
