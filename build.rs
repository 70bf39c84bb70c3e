use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Images the scene asks for at startup.
const SCENE_ASSETS: [&str; 3] = [
    "rockylaying.jpg",
    "aadilstanding.jpg",
    "canvasparticle-min.png",
];

fn main() -> Result<()> {
    // This tells Cargo to rerun this script if something in /assets/ changes.
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    for name in SCENE_ASSETS {
        if !assets_src.join(name).exists() {
            println!("cargo:warning=assets/{name} is missing, the scene will show placeholders");
        }
    }
    if !assets_src.exists() {
        return Ok(());
    }

    // OUT_DIR is target/<profile>/build/<crate>-<hash>/out; binaries run from target/<profile>
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let profile_dir = match out_dir.ancestors().nth(3) {
        Some(dir) => dir.to_path_buf(),
        None => out_dir.clone(),
    };
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], profile_dir, &copy_options)?;

    Ok(())
}
