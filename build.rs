use std::fmt::Write as _;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Every `*.rs` file in migrations/ is compiled in as a unit module and
    // registered under the identifier derived from its file name.
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let migrations_dir = manifest_dir.join("migrations");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    println!("cargo:rerun-if-changed={}", migrations_dir.display());

    let mut sources: Vec<PathBuf> = Vec::new();
    if migrations_dir.is_dir() {
        for entry in std::fs::read_dir(&migrations_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "rs") {
                sources.push(path);
            }
        }
    }
    sources.sort();

    let mut modules = String::new();
    let mut registrations = String::new();

    for path in &sources {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let identifier = unit_identifier(path);
        if identifier.is_empty() {
            return Err(format!("{file_name} has no name after its ordering prefix").into());
        }
        let module = module_name(&file_name);

        writeln!(modules, "#[path = {:?}]", path.display().to_string())?;
        writeln!(modules, "mod {module};")?;
        writeln!(
            registrations,
            "    registry.register({identifier:?}, |pool| {{\n        Box::new({module}::{identifier}::new(pool)) as Box<dyn Migration>\n    }})?;"
        )?;
    }

    let generated = format!(
        "// Generated by build.rs from the migrations/ directory.\n\
         {modules}\n\
         /// Register every unit bundled from the migrations/ directory.\n\
         #[allow(unused_variables)]\n\
         pub fn register_bundled(registry: &mut MigrationRegistry<MySqlPool>) -> Result<(), MigrationError> {{\n\
         {registrations}    Ok(())\n\
         }}\n"
    );

    std::fs::write(out_dir.join("bundled_migrations.rs"), generated)?;
    Ok(())
}

/// Same derivation the runtime registry uses for discovered entries.
fn unit_identifier(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.split('_')
        .skip(1)
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn module_name(file_name: &str) -> String {
    let stem = file_name.trim_end_matches(".rs");
    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("unit_{sanitized}")
}
