use std::fs;
use std::path::Path;

fn main() {
    let out_dir = Path::new("static");
    let dist_dir = Path::new("../frontend/dist");

    if dist_dir.exists() {
        let _ = fs::remove_dir_all(out_dir);
        fs::create_dir_all(out_dir).unwrap();
        fs_extra::dir::copy(
            dist_dir,
            out_dir,
            &fs_extra::dir::CopyOptions::new().overwrite(true).copy_inside(true),
        )
        .unwrap();
    } else {
        // include_dir! needs static/dist to exist even before the frontend
        // has been built with trunk.
        let placeholder = out_dir.join("dist");
        fs::create_dir_all(&placeholder).unwrap();
        let index = placeholder.join("index.html");
        if !index.exists() {
            fs::write(
                &index,
                "<!doctype html><title>clipstream</title>\
                 <p>Frontend bundle missing. Run <code>trunk build</code> in frontend/.</p>\n",
            )
            .unwrap();
        }
    }
    println!("cargo:rerun-if-changed=../frontend/dist");
}
