use ngine_asset::{AssetPackage, AssetPackageBuilder};
use ngine_base::HashSet;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

pub const DEFAULT_ASSET_TYPE: &str = "ng.raw";

#[derive(StructOpt, Debug)]
pub struct NginePackArgs {
    #[structopt(name = "trace", long)]
    pub trace: bool,
    #[structopt(subcommand)]
    pub command: NginePackCommand,
}

#[derive(StructOpt, Debug)]
pub enum NginePackCommand {
    /// Pack every matching file under a directory into one package
    Pack {
        #[structopt(name = "input", long, parse(from_os_str))]
        input: PathBuf,
        #[structopt(name = "output", long, parse(from_os_str))]
        output: PathBuf,
        #[structopt(name = "asset-type", long, default_value = DEFAULT_ASSET_TYPE)]
        asset_type: String,
        #[structopt(name = "pattern", long, default_value = "**")]
        pattern: String,
    },
    /// Print the entry table of a package
    List {
        #[structopt(name = "package", long, parse(from_os_str))]
        package: PathBuf,
    },
}

pub fn run(args: &NginePackArgs) -> Result<(), Box<dyn Error>> {
    match &args.command {
        NginePackCommand::Pack {
            input,
            output,
            asset_type,
            pattern,
        } => {
            let package = pack_directory(input, pattern, asset_type)?;
            let file = std::fs::File::create(output)?;
            package.write_to(std::io::BufWriter::new(file))?;
            log::info!(
                "Wrote {} entries ({} bytes of payload) to {:?}",
                package.len(),
                package.blob().len(),
                output
            );
            Ok(())
        }
        NginePackCommand::List { package } => {
            let file = std::fs::File::open(package)?;
            let package = AssetPackage::read_from(std::io::BufReader::new(file))?;
            let stdout = std::io::stdout();
            list_package(&package, &mut stdout.lock())?;
            Ok(())
        }
    }
}

// The entry name of a file is its path relative to the input directory, without extension and
// with '/' separators
fn entry_name(
    root_path: &Path,
    file_path: &Path,
) -> Result<String, Box<dyn Error>> {
    let relative = file_path.strip_prefix(root_path)?.with_extension("");
    let mut components = Vec::default();
    for component in relative.components() {
        let component = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| format!("File path {:?} is not valid UTF-8", file_path))?;
        components.push(component);
    }

    let name = components.join("/");
    // Asset paths are split on the last '.', an entry name containing one could never be loaded
    if name.is_empty() || name.contains('.') {
        Err(format!(
            "File {:?} does not produce a loadable entry name ({:?})",
            file_path, name
        ))?;
    }

    Ok(name)
}

/// Builds a package holding every regular file under `input` that matches `pattern`. Entries are
/// sorted by name so the output does not depend on directory iteration order.
pub fn pack_directory(
    input: &Path,
    pattern: &str,
    asset_type: &str,
) -> Result<AssetPackage, Box<dyn Error>> {
    profiling::scope!("pack_directory");

    let input = std::fs::canonicalize(input)?;
    let walker = globwalk::GlobWalkerBuilder::from_patterns(&input, &[pattern])
        .file_type(globwalk::FileType::FILE)
        .build()?;

    let mut files = Vec::default();
    for file in walker {
        let file = file?;
        let name = entry_name(&input, file.path())?;
        files.push((name, file.path().to_path_buf()));
    }

    files.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));

    let mut names = HashSet::default();
    let mut builder = AssetPackageBuilder::new();
    for (name, path) in files {
        if !names.insert(name.clone()) {
            Err(format!(
                "More than one file maps to entry {:?}, the second is {:?}",
                name, path
            ))?;
        }

        let bytes = std::fs::read(&path)?;
        log::debug!("Packing {:?} as {:?} ({} bytes)", path, name, bytes.len());
        builder.add_entry(name.as_str(), asset_type, 0, &bytes);
    }

    Ok(builder.build())
}

pub fn list_package<W: Write>(
    package: &AssetPackage,
    writer: &mut W,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "format version {}, {} entries, {} blob bytes",
        package.format_version(),
        package.len(),
        package.blob().len()
    )?;

    for (index, entry) in package.entries().iter().enumerate() {
        writeln!(
            writer,
            "{:>4} {:<32} {:<16} v{:<3} {:>10} @ {}",
            index, entry.name, entry.asset_type, entry.version, entry.size, entry.offset
        )?;
    }

    Ok(())
}
