fn main() {
    tonic_build::configure()
        .build_server(false)
        .compile_protos(&["../../proto/playsource_rpc.proto"], &["../../proto/"])
        .unwrap();
}
