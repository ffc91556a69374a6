//! Command-line interface for xsd-model

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use tracing::info;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use xsd_model::dependencies::DependencyResolver;
#[cfg(feature = "cli")]
use xsd_model::exports::{selection_to_json, to_json, ExportConfig};
#[cfg(feature = "cli")]
use xsd_model::limits::Limits;
#[cfg(feature = "cli")]
use xsd_model::{Issue, SchemaSet, Selection, SelectiveExtractor, Settings};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsd-model")]
#[command(author, version, about = "Resolve multi-file XSD schema sets into a structural model", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Extract files on worker threads
    #[arg(long, global = true)]
    parallel: bool,

    /// Keep no-namespace includes in no namespace
    #[arg(long, global = true)]
    no_chameleon: bool,

    /// Use strict resource limits
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a schema set and display its structure
    Inspect {
        /// Path to the root XSD file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Show details of one element
        #[arg(short, long)]
        element: Option<String>,

        /// Show all global elements
        #[arg(long)]
        elements: bool,

        /// Show all types
        #[arg(long)]
        types: bool,

        /// Show every loaded file
        #[arg(long)]
        files: bool,

        /// Output the full model as JSON
        #[arg(short, long)]
        json: bool,

        /// Output file for JSON (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show type dependencies and inheritance chains
    Deps {
        /// Path to the root XSD file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Show the inheritance chain of one type
        #[arg(short = 't', long)]
        type_name: Option<String>,

        /// Only show edges crossing a namespace boundary
        #[arg(long)]
        cross_schema: bool,
    },

    /// Pick components from one or more schema files
    Select {
        /// Schema file to select from
        #[arg(value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Element names
        #[arg(short, long = "element")]
        elements: Vec<String>,

        /// Complex type names
        #[arg(short, long = "complex-type")]
        complex_types: Vec<String>,

        /// Simple type names
        #[arg(short, long = "simple-type")]
        simple_types: Vec<String>,

        /// Namespaces to pick entirely (`*` for everything)
        #[arg(short, long = "namespace")]
        namespaces: Vec<String>,

        /// Do not pull in dependencies
        #[arg(long)]
        no_dependencies: bool,

        /// Base directory for relative schema paths
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    // stderr keeps JSON on stdout clean for piping
    let filter = match cli.verbose {
        0 => EnvFilter::new("xsd_model=warn"),
        1 => EnvFilter::new("xsd_model=info"),
        _ => EnvFilter::new("xsd_model=debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::new()
        .with_parallel(cli.parallel)
        .with_chameleon_includes(!cli.no_chameleon);
    if cli.strict {
        settings = settings.with_limits(Limits::strict());
    }

    let result = match cli.command {
        Commands::Inspect {
            schema,
            element,
            elements,
            types,
            files,
            json,
            output,
        } => cmd_inspect(&settings, schema, element, elements, types, files, json, output),
        Commands::Deps {
            schema,
            type_name,
            cross_schema,
        } => cmd_deps(&settings, schema, type_name, cross_schema),
        Commands::Select {
            schemas,
            elements,
            complex_types,
            simple_types,
            namespaces,
            no_dependencies,
            base_dir,
            output,
        } => {
            let settings = match base_dir {
                Some(dir) => settings.with_base_dir(dir),
                None => settings,
            };
            let selections = schemas
                .into_iter()
                .map(|file| Selection {
                    file,
                    elements: elements.clone(),
                    complex_types: complex_types.clone(),
                    simple_types: simple_types.clone(),
                    namespaces: namespaces.clone(),
                    include_dependencies: !no_dependencies,
                })
                .collect();
            cmd_select(settings, selections, output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn emit(json: String, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            info!(path = %path.display(), "output.written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    println!();
    println!("Issues ({}):", issues.len());
    for issue in issues {
        println!("  - {}", issue);
    }
}

#[cfg(feature = "cli")]
#[allow(clippy::too_many_arguments)]
fn cmd_inspect(
    settings: &Settings,
    schema_path: PathBuf,
    element: Option<String>,
    show_elements: bool,
    show_types: bool,
    show_files: bool,
    json_output: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let set = SchemaSet::with_settings(&schema_path, settings)?;

    if json_output {
        return emit(to_json(&set, &ExportConfig::default())?, output);
    }

    if let Some(name) = element {
        return print_element_details(&set, &name);
    }

    print_schema_summary(&set);

    let show_all = !show_elements && !show_types && !show_files;

    if show_all || show_elements {
        println!("\n=== Root Elements ===");
        for element in &set.model.root_elements {
            let type_str = element
                .type_ref
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "anonymous".to_string());
            println!("  {} : {}", element.name, type_str);
        }
    }

    if show_all || show_types {
        println!("\n=== Complex Types ===");
        for (qname, complex_type) in &set.model.complex_types {
            match complex_type.base_type {
                Some(ref base) => println!("  {} ({:?} of {})", qname, complex_type.derivation, base),
                None => println!("  {}", qname),
            }
        }
        println!("\n=== Simple Types ===");
        for (qname, simple_type) in &set.model.simple_types {
            let base = simple_type
                .base_type()
                .map(|b| b.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("  {} : {}", qname, base);
        }
    }

    if show_files {
        println!("\n=== Files ===");
        for file in set.file_summary() {
            println!(
                "  {} [{}] {} components, {} dependencies",
                file.path.display(),
                file.target_namespace.as_deref().unwrap_or("(none)"),
                file.components,
                file.dependencies.len()
            );
        }
    }

    print_issues(&set.issues());
    Ok(())
}

#[cfg(feature = "cli")]
fn print_schema_summary(set: &SchemaSet) {
    let stats = set.statistics();
    println!("xsd-model v{}", xsd_model::VERSION);
    println!();
    println!("Schema Set:");
    println!("  Root: {}", set.resolution.root.display());
    match set.model.target_namespace {
        Some(ref ns) => println!("  Target Namespace: {}", ns),
        None => println!("  Target Namespace: (none)"),
    }
    println!("  Files: {}", set.resolution.file_count());
    println!("  Unresolved References: {}", set.resolution.unresolved().count());
    println!("  Namespaces: {}", set.resolution.namespaces().join(", "));
    println!();
    println!("Statistics:");
    println!("  Elements: {}", stats.total_elements);
    println!("  Complex Types: {}", stats.complex_types);
    println!("  Simple Types: {}", stats.simple_types);
    println!("  Attributes: {}", stats.total_attributes);
    println!("  Attribute Groups: {}", stats.attribute_groups);
    println!("  Max Depth: {}", stats.max_depth);
}

#[cfg(feature = "cli")]
fn print_element_details(set: &SchemaSet, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let element = set
        .model
        .find_element(name)
        .ok_or_else(|| format!("Element '{}' not found in schema", name))?;

    println!("Element: {}", element.qname());
    println!("  Path: {}", element.path);
    if let Some(ref type_ref) = element.type_ref {
        println!("  Type: {}", type_ref);
    }
    if let Some(ref reference) = element.reference {
        println!("  Ref: {}", reference);
    }
    println!("  Occurs: {}", element.cardinality);
    println!("  Nillable: {}", element.nillable);
    println!("  Abstract: {}", element.abstract_);
    if let Some(ref doc) = element.documentation {
        println!("  Documentation: {}", doc);
    }
    for attribute in &element.attributes {
        println!("  @{} ({:?})", attribute.name, attribute.use_);
    }
    for child in &element.children {
        println!("  - {} {}", child.name, child.cardinality);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_deps(
    settings: &Settings,
    schema_path: PathBuf,
    type_name: Option<String>,
    cross_schema_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let set = SchemaSet::with_settings(&schema_path, settings)?;

    if let Some(name) = type_name {
        let chain = DependencyResolver::new(&set.model)
            .inheritance_chain_by_name(&name)
            .ok_or_else(|| format!("Type '{}' not found in schema", name))??;
        println!("{}", chain.names().join(" -> "));
        return Ok(());
    }

    println!("=== Dependencies ===");
    for edge in &set.dependencies.edges {
        if cross_schema_only && !edge.cross_schema {
            continue;
        }
        let mut flags = Vec::new();
        if edge.cross_schema {
            flags.push("cross-schema");
        }
        if edge.cross_file {
            flags.push("cross-file");
        }
        if edge.resolved.is_none() && !edge.is_builtin() {
            flags.push("unresolved");
        }
        println!(
            "  {} -> {} ({:?}){}",
            edge.source,
            edge.target,
            edge.kind,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        );
    }

    if !cross_schema_only {
        println!("\n=== Inheritance ===");
        for chain in set.dependencies.chains.values() {
            println!("  {}", chain.names().join(" -> "));
        }
    }

    print_issues(&set.issues());
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_select(
    settings: Settings,
    selections: Vec<Selection>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut extractor = SelectiveExtractor::with_settings(settings);
    for selection in selections {
        extractor.add_selection(selection);
    }
    let result = extractor.run();
    for issue in &result.issues {
        eprintln!("warning: {}", issue);
    }
    emit(selection_to_json(&result, &ExportConfig::default())?, output)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
