//! Compile a layout definition file into a C header, a TunerStudio descriptor and a Java
//! field mirror, plus optional defines header and rendered template.
//!
//! Usage:
//!   config_definition [OPTIONS] DEFINITION
//!
//! Outputs are only written once the whole definition has compiled; a failed run leaves
//! existing files untouched.

use anyhow::Context;
use clap::Parser;
use configdef::template::GENERATOR_MESSAGE;
use configdef::{
    render_template, CHeaderConsumer, CHeaderOptions, JavaFieldsConsumer, JavaFieldsOptions,
    ReaderOptions, ReaderState, TsProjectConsumer, VariableRegistry,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "config_definition",
    version,
    about = "Compile a layout definition file into synchronized C, TunerStudio and Java outputs"
)]
struct Cli {
    /// Definition file to compile
    #[arg(value_name = "DEFINITION")]
    definition: PathBuf,

    /// File of #define lines read before the definition (repeatable)
    #[arg(long, value_name = "FILE")]
    prepend: Vec<PathBuf>,

    /// Destination of the generated C header
    #[arg(long, value_name = "FILE")]
    c_header: Option<PathBuf>,

    /// Destination of the TunerStudio descriptor lines
    #[arg(long, value_name = "FILE")]
    ts_output: Option<PathBuf>,

    /// Destination of the Java field mirror
    #[arg(long, value_name = "FILE")]
    java_output: Option<PathBuf>,

    #[arg(long, default_value = "com.rusefi.config.generated")]
    java_package: String,

    #[arg(long, default_value = "Fields")]
    java_class: String,

    /// Offset of the first structure in the descriptor and Java outputs
    #[arg(long, default_value_t = 0)]
    base_offset: usize,

    /// Destination of a header with every #define
    #[arg(long, value_name = "FILE")]
    defines_header: Option<PathBuf>,

    /// Template to render with the registered variables
    #[arg(long, value_name = "FILE", requires = "template_output")]
    template: Option<PathBuf>,

    #[arg(long, value_name = "FILE", requires = "template")]
    template_output: Option<PathBuf>,

    /// Platform word size in bytes
    #[arg(long, default_value_t = 4)]
    word_size: usize,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn read(path: &Path) -> anyhow::Result<String> {
    log::info!("Reading from {}", path.display());
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn write(path: &Path, content: &str) -> anyhow::Result<()> {
    log::info!("Writing to {}", path.display());
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(|e| anyhow::anyhow!("installing logger: {}", e))?;

    let source_name = cli
        .definition
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.definition.display().to_string());

    let mut registry = VariableRegistry::new();
    let mut header = CHeaderConsumer::new(CHeaderOptions {
        banner: format!(
            "this section was generated automatically by configdef based on {}",
            source_name
        ),
        ..CHeaderOptions::default()
    });
    let mut ts = TsProjectConsumer::with_start_position(cli.base_offset);
    let mut java = JavaFieldsConsumer::new(JavaFieldsOptions {
        package: cli.java_package.clone(),
        class_name: cli.java_class.clone(),
        base_offset: cli.base_offset,
    });

    {
        let options = ReaderOptions {
            word_size: cli.word_size,
            ..ReaderOptions::default()
        };
        let mut state = ReaderState::with_options(&mut registry, options);
        for prepend in &cli.prepend {
            let text = read(prepend)?;
            state.read_prepend(&text);
        }
        let source = read(&cli.definition)?;
        state
            .read_definition(&source, &mut [&mut header, &mut ts, &mut java])
            .with_context(|| format!("compiling {}", cli.definition.display()))?;
        log::info!(
            "{} structure(s), TS size {}",
            state.completed().len(),
            ts.ts_position()
        );
    }

    if let Some(path) = &cli.c_header {
        write(path, header.content())?;
    }
    if let Some(path) = &cli.ts_output {
        write(path, ts.content())?;
    }
    if let Some(path) = &cli.java_output {
        write(path, &java.content())?;
    }
    if let Some(path) = &cli.defines_header {
        write(path, &registry.render_defines())?;
    }
    if let (Some(template), Some(output)) = (&cli.template, &cli.template_output) {
        registry.register(
            GENERATOR_MESSAGE,
            &format!("Generated by configdef based on {}", source_name),
        );
        let text = read(template)?;
        write(output, &render_template(&registry, &text))?;
    }
    Ok(())
}
