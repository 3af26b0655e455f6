//! Command line tool for inspecting and converting schematic files.
//!
//! ```txt
//! schem info <file>               print a JSON summary of a schematic
//! schem convert <input> <output>  convert between formats, chosen by name
//! schem detect <path>...          print the detected type of each path
//! schem settings                  print the effective settings, writing
//!                                 them out if no settings file exists
//! ```

#[macro_use]
extern crate tracing;

mod logging;
mod settings;

use crate::settings::Settings;
use schematic::{
    CodecContext,
    FileType,
    Schematic,
    SchematicFormat,
    SchematicMetadata,
    read_schematic,
    read_schematic_bytes,
    write_schematic_bytes,
};
use std::{
    env,
    fs,
    path::Path,
    process::exit,
    time::{
        SystemTime,
        UNIX_EPOCH,
    },
};
use serde::Serialize;
use vek::*;
use anyhow::*;


const USAGE: &'static str = "\
usage:
    schem info <file>
    schem convert <input> <output>
    schem detect <path>...
    schem settings";


/// What `info` prints.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    file: String,
    format: String,
    size: Vec3<i32>,
    metadata: &'a SchematicMetadata,
    palette: Vec<String>,
    non_air_blocks: usize,
    entities: usize,
    block_entities: usize,
}

impl<'a> Summary<'a> {
    fn new(schematic: &'a Schematic, format: SchematicFormat) -> Self {
        Summary {
            file: schematic.file()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            format: format.to_string(),
            size: schematic.size(),
            metadata: schematic.metadata(),
            palette: schematic.blocks()
                .palette()
                .mapping()
                .iter()
                .map(|state| state.to_string())
                .collect(),
            non_air_blocks: schematic.blocks().count(|state| !state.is_air()),
            entities: schematic.entities().len(),
            block_entities: schematic.block_entities().len(),
        }
    }
}

fn main() {
    if let Err(e) = logging::init_logging() {
        eprintln!("{:?}", e);
        exit(1);
    }
    let args = env::args().skip(1).collect::<Vec<String>>();
    if let Err(e) = run(&args) {
        error!("{:?}", e);
        exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let settings = Settings::load()?;
    let ctx = CodecContext::passthrough(settings.data_version);
    match args.iter().map(String::as_str).collect::<Vec<&str>>().as_slice() {
        &["info", file] => info(Path::new(file), &ctx),
        &["convert", input, output] => convert(
            Path::new(input),
            Path::new(output),
            &settings,
            &ctx,
        ),
        &["detect", ref paths @ ..] if !paths.is_empty() => {
            for path in paths {
                println!("{}\t{:?}", path, FileType::from_path(Path::new(path)));
            }
            Ok(())
        }
        &["settings"] => show_settings(&settings),
        _ => {
            eprintln!("{}", USAGE);
            bail!("invalid arguments");
        }
    }
}

fn format_of(path: &Path) -> Result<SchematicFormat> {
    let file_type = FileType::from_path(path);
    ensure!(file_type != FileType::Invalid, "{} is not a readable file", path.display());
    Ok(SchematicFormat::from_file_type(file_type)?)
}

fn info(path: &Path, ctx: &CodecContext) -> Result<()> {
    let format = format_of(path)?;
    let schematic = read_schematic(path, ctx)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let summary = Summary::new(&schematic, format);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn convert(input: &Path, output: &Path, settings: &Settings, ctx: &CodecContext) -> Result<()> {
    let output_format = output.file_name()
        .and_then(|name| FileType::from_name(&name.to_string_lossy()).format())
        .ok_or_else(|| anyhow!("{} does not name a schematic file", output.display()))?;

    let mut schematic = read_schematic(input, ctx)
        .with_context(|| format!("failed to read {}", input.display()))?;
    schematic.update_counts();
    let metadata = schematic.metadata_mut();
    if metadata.author.is_empty() {
        if let Some(ref author) = settings.default_author {
            metadata.author = author.clone();
        }
    }
    metadata.time_modified = now_millis();
    if metadata.time_created == 0 {
        metadata.time_created = metadata.time_modified;
    }

    let bytes = write_schematic_bytes(&schematic, output_format, ctx)
        .with_context(|| format!("failed to encode as {}", output_format))?;
    if settings.compression_check {
        let decoded = read_schematic_bytes(&bytes, output_format, ctx)
            .context("written file does not decode")?;
        verify(&schematic, &decoded)?;
        debug!("written file decodes to the same content");
    }
    fs::write(output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        format = %output_format,
        bytes = bytes.len(),
        "converted schematic",
    );
    Ok(())
}

/// Check that a written schematic decoded to the same cells, entities and
/// block entities. Palette order is not compared, as formats without a
/// stored palette rebuild it.
fn verify(written: &Schematic, decoded: &Schematic) -> Result<()> {
    ensure!(
        written.size() == decoded.size(),
        "size changed from {:?} to {:?}", written.size(), decoded.size(),
    );
    if let Some((pos, state)) = written.blocks()
        .iter()
        .find(|&(pos, state)| decoded.block(pos) != state)
    {
        bail!("block at {:?} changed from {} to {}", pos, state, decoded.block(pos));
    }
    ensure!(
        written.entities() == decoded.entities(),
        "entities changed",
    );
    ensure!(
        written.block_entities() == decoded.block_entities(),
        "block entities changed",
    );
    Ok(())
}

fn show_settings(settings: &Settings) -> Result<()> {
    let path = Settings::path();
    if !path.exists() {
        settings.write(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote settings file");
    }
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use super::*;
    use schematic::{
        BlockState,
        write_schematic,
    };

    #[test]
    fn test_convert_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CodecContext::default();
        let settings = Settings {
            default_author: Some("converter".into()),
            ..Settings::default()
        };

        let mut original = Schematic::new(Vec3::new(2, 3, 2)).unwrap();
        original.set_block(Vec3::new(1, 2, 1), BlockState::new("minecraft:stone")).unwrap();
        let input = dir.path().join("in.litematic");
        write_schematic(&original, &input, SchematicFormat::Litematica, &ctx).unwrap();

        for name in ["out.schem", "out.nbt", "out.schematic"] {
            let output = dir.path().join(name);
            convert(&input, &output, &settings, &ctx).unwrap();
            let converted = read_schematic(&output, &ctx).unwrap();
            verify(&original, &converted).unwrap();
            assert_eq!(converted.metadata().author, "converter");
            assert_eq!(converted.metadata().total_blocks, 1);
        }

        let err = convert(&input, &dir.path().join("out.json"), &settings, &ctx);
        assert!(err.is_err());
    }

    #[test]
    fn test_verify_catches_changes() {
        let a = Schematic::new(Vec3::new(2, 2, 2)).unwrap();
        let mut b = a.clone();
        verify(&a, &b).unwrap();
        b.set_block(Vec3::new(0, 1, 0), BlockState::new("minecraft:dirt")).unwrap();
        assert!(verify(&a, &b).is_err());
        assert!(verify(&a, &Schematic::new(Vec3::new(2, 2, 3)).unwrap()).is_err());
    }

    #[test]
    fn test_summary() {
        let mut schematic = Schematic::new(Vec3::new(1, 2, 1)).unwrap();
        schematic.set_block(Vec3::new(0, 1, 0), BlockState::new("minecraft:torch")).unwrap();
        let summary = Summary::new(&schematic, SchematicFormat::Sponge);
        assert_eq!(summary.palette, vec!["minecraft:air", "minecraft:torch"]);
        assert_eq!(summary.non_air_blocks, 1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["format"], "sponge");
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(run(&["frobnicate".to_owned()]).is_err());
        assert!(run(&["detect".to_owned()]).is_err());
    }
}
