//! Compresses everything under `res/` and generates the resource table
//! included by `src/catalog.rs`.

use flate2::{write::GzEncoder, Compression};
use std::{
    env, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

const RES_DIR: &str = "res";

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed={RES_DIR}");

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "OUT_DIR is not set")
    })?);

    let mut files = Vec::new();
    collect(Path::new(RES_DIR), &mut files)?;

    let mut entries = files
        .into_iter()
        .map(|path| Ok((route(Path::new(RES_DIR), &path)?, path)))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();

    let mut table = String::from("pub(crate) static RESOURCES: &[(&str, &[u8])] = &[\n");
    for (index, (route, path)) in entries.iter().enumerate() {
        println!("cargo:rerun-if-changed={}", path.display());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&fs::read(path)?)?;
        let compressed = out_dir.join(format!("resource_{index}.gz"));
        fs::write(&compressed, encoder.finish()?)?;

        table.push_str(&format!(
            "    ({route:?}, include_bytes!({:?})),\n",
            compressed.display().to_string()
        ));
    }
    table.push_str("];\n");

    fs::write(out_dir.join("resources.rs"), table)
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// `res/app/main.js` is served as `/app/main.js`, `res/index.html` as `/`.
fn route(root: &Path, path: &Path) -> io::Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let relative = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let route = format!("/{relative}");
    Ok(match route.strip_suffix("index.html") {
        Some(dir) => dir.to_string(),
        None => route,
    })
}
