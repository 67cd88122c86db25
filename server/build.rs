use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use vendored protoc so we don't rely on system protoc
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    let well_known = protoc_bin_vendored::include_path()?;
    std::env::set_var("PROTOC", protoc);

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let protos = [
        PathBuf::from("proto/pb/hello/hello.proto"),
        PathBuf::from("proto/pb/ignored.proto"),
        PathBuf::from("proto/pb/http.proto"),
    ];
    let includes = [PathBuf::from("proto"), well_known];

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("hello_descriptor.bin"))
        .type_attribute(".pb.hello", "#[derive(serde::Serialize, serde::Deserialize)]")
        .compile(&protos, &includes)?;

    println!("cargo:rerun-if-changed=proto");
    Ok(())
}
