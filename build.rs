use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = "proto";
    let proto_files = vec!["expose.proto"];
    let proto_paths: Vec<_> = proto_files
        .iter()
        .map(|file| Path::new(proto_root).join(file))
        .collect();

    // Don't depend on a system protoc
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&proto_paths, &[Path::new(proto_root).to_path_buf()])?;

    for proto_file in &proto_files {
        println!("cargo:rerun-if-changed=proto/{proto_file}");
    }

    Ok(())
}
