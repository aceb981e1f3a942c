//! Compiles the Terraform Plugin Protocol v6.9 definitions.
//!
//! A vendored `protoc` is used so the build does not depend on a system
//! installation.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    std::env::set_var("PROTOC", protoc);

    let well_known = protoc_bin_vendored::include_path()?;

    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(
            &["proto/tfplugin6.9.proto"],
            &[std::path::PathBuf::from("proto"), well_known],
        )?;

    println!("cargo:rerun-if-changed=proto/tfplugin6.9.proto");

    Ok(())
}
